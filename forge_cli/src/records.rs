//! Record document loading and artifact writing

use chrono::Utc;
use forge_engine::{RecordArtifact, RecordInput};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Maximum record document size (4MB). Upstream exports are a few
/// kilobytes; anything bigger is a wrong file.
pub const MAX_DOCUMENT_SIZE: u64 = 4 * 1024 * 1024;

/// Record file errors
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("Record file not found: {path}")]
    FileNotFound { path: String },

    #[error("Record file too large: {size} bytes (max: {max})")]
    FileTooLarge { size: u64, max: u64 },

    #[error("Record file is empty: {path}")]
    EmptyFile { path: String },

    #[error("Invalid JSON in {path}: {message}")]
    InvalidJson { path: String, message: String },

    #[error("I/O error on {path}: {message}")]
    Io { path: String, message: String },
}

/// Load the records of one document. A document holds either a single
/// record object or an array of records.
pub fn load_records(path: &Path) -> Result<Vec<RecordInput>, RecordError> {
    if !path.exists() {
        return Err(RecordError::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let metadata = fs::metadata(path).map_err(|e| RecordError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    if metadata.len() > MAX_DOCUMENT_SIZE {
        return Err(RecordError::FileTooLarge {
            size: metadata.len(),
            max: MAX_DOCUMENT_SIZE,
        });
    }

    let text = fs::read_to_string(path).map_err(|e| RecordError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    if text.trim().is_empty() {
        return Err(RecordError::EmptyFile {
            path: path.display().to_string(),
        });
    }

    let records = if text.trim_start().starts_with('[') {
        serde_json::from_str::<Vec<RecordInput>>(&text)
    } else {
        serde_json::from_str::<RecordInput>(&text).map(|record| vec![record])
    };

    records.map_err(|e| RecordError::InvalidJson {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

#[derive(Serialize)]
struct ArtifactDocument<'a> {
    generated_at: String,
    artifacts: &'a [RecordArtifact],
}

/// Write the artifacts produced from one document next to its input as
/// `<stem>.artifact.json`. Returns the output path.
pub fn write_artifacts(
    input_path: &Path,
    artifacts: &[RecordArtifact],
) -> Result<PathBuf, RecordError> {
    let stem = input_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("records");
    let output_path = input_path.with_file_name(format!("{}.artifact.json", stem));

    let document = ArtifactDocument {
        generated_at: Utc::now().to_rfc3339(),
        artifacts,
    };
    let json = serde_json::to_string_pretty(&document).map_err(|e| RecordError::Io {
        path: output_path.display().to_string(),
        message: e.to_string(),
    })?;

    fs::write(&output_path, json).map_err(|e| RecordError::Io {
        path: output_path.display().to_string(),
        message: e.to_string(),
    })?;

    Ok(output_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".json")
            .tempfile()
            .unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_single_record() {
        let file = write_temp(r#"{"id": "amber", "expressions": []}"#);
        let records = load_records(file.path()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "amber");
    }

    #[test]
    fn test_load_record_array() {
        let file = write_temp(r#"[{"id": "a"}, {"id": "b"}]"#);
        let records = load_records(file.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].id, "b");
    }

    #[test]
    fn test_load_full_record_shape() {
        let file = write_temp(
            r#"{
                "id": "hutao",
                "tables": {"e": ["技能伤害", "伤害提升"]},
                "const_doc": "stacks = 2",
                "thresholds": [{"name": "afterC2", "subject": "cons", "thresholds": [2.0]}],
                "allow": ["stacks"],
                "expressions": [{"name": "skill", "text": "attr.atk"}],
                "promote": [{"name": "e", "rows": [
                    {"level": 1, "params": [1.0], "template_text": "伤害|{param1:F1}"}
                ]}]
            }"#,
        );
        let records = load_records(file.path()).unwrap();
        assert_eq!(records[0].thresholds.len(), 1);
        assert_eq!(records[0].expressions.len(), 1);
        assert_eq!(records[0].promote[0].rows.len(), 1);
    }

    #[test]
    fn test_missing_file() {
        let error = load_records(Path::new("/nonexistent/records.json")).unwrap_err();
        assert!(matches!(error, RecordError::FileNotFound { .. }));
    }

    #[test]
    fn test_empty_file() {
        let file = write_temp("   ");
        let error = load_records(file.path()).unwrap_err();
        assert!(matches!(error, RecordError::EmptyFile { .. }));
    }

    #[test]
    fn test_invalid_json() {
        let file = write_temp("{not json");
        let error = load_records(file.path()).unwrap_err();
        assert!(matches!(error, RecordError::InvalidJson { .. }));
    }

    #[test]
    fn test_write_artifacts_path() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("amber.json");
        fs::write(&input, "{}").unwrap();

        let output = write_artifacts(&input, &[]).unwrap();
        assert_eq!(output, dir.path().join("amber.artifact.json"));

        let written = fs::read_to_string(output).unwrap();
        assert!(written.contains("generated_at"));
    }
}
