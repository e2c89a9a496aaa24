//! Batch processing of record documents
//!
//! Directory-based batch processing with sequential and parallel
//! execution modes. Parallelism lives here, in the caller: the engine is
//! synchronous and stateless per record, so documents are simply chunked
//! across a bounded pool of worker threads with no shared state beyond
//! result collection.

use crate::records::{load_records, write_artifacts};
use forge_engine::logging::codes;
use forge_engine::{condition_record, log_debug, log_error, log_info, log_success, log_warning};
use forge_engine::RuntimeConfig;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

// ============================================================================
// BATCH PROCESSING TYPES
// ============================================================================

/// Batch processing configuration
#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub max_threads: usize,
    pub recursive: bool,
    pub max_files: Option<usize>,
    pub progress_reporting: bool,
    pub fail_fast: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_threads: thread::available_parallelism()
                .map(|n| n.get().min(8))
                .unwrap_or(4),
            recursive: true,
            max_files: None,
            progress_reporting: true,
            fail_fast: false,
        }
    }
}

/// Outcome of one successfully processed document
#[derive(Debug, Clone)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub output: PathBuf,
    pub records: usize,
    pub rejected_expressions: usize,
}

/// Batch processing results
#[derive(Debug, Default)]
pub struct BatchResults {
    pub successful_files: Vec<FileOutcome>,
    pub failed_files: Vec<(PathBuf, String)>,
    pub processing_duration: Duration,
    pub files_processed: usize,
    pub files_discovered: usize,
}

impl BatchResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn success_count(&self) -> usize {
        self.successful_files.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failed_files.len()
    }

    pub fn success_rate(&self) -> f64 {
        if self.files_processed == 0 {
            0.0
        } else {
            self.successful_files.len() as f64 / self.files_processed as f64
        }
    }

    pub fn add_success(&mut self, outcome: FileOutcome) {
        self.successful_files.push(outcome);
        self.files_processed += 1;
    }

    pub fn add_failure(&mut self, file_path: PathBuf, reason: String) {
        self.failed_files.push((file_path, reason));
        self.files_processed += 1;
    }

    pub fn merge(&mut self, other: BatchResults) {
        self.successful_files.extend(other.successful_files);
        self.failed_files.extend(other.failed_files);
        self.files_processed += other.files_processed;
    }

    pub fn summary(&self) -> String {
        format!(
            "Batch processing completed: {} files processed, {} successful ({:.1}%), {} failed, {:.2}s total",
            self.files_processed,
            self.success_count(),
            self.success_rate() * 100.0,
            self.failure_count(),
            self.processing_duration.as_secs_f64()
        )
    }
}

/// Batch processing errors
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: String },

    #[error("No record files found in directory: {path}")]
    NoFilesFound { path: String },

    #[error("IO error during directory traversal: {error}")]
    IoError { error: String },
}

// ============================================================================
// FILE DISCOVERY
// ============================================================================

/// Discover record documents in a directory
pub fn discover_record_files(
    dir_path: &Path,
    config: &BatchConfig,
) -> Result<Vec<PathBuf>, BatchError> {
    log_info!("Starting file discovery",
        "directory" => dir_path.display(),
        "recursive" => config.recursive
    );

    if !dir_path.is_dir() {
        return Err(BatchError::DirectoryNotFound {
            path: dir_path.display().to_string(),
        });
    }

    let mut files = Vec::new();
    visit_directory(dir_path, &mut files, config)?;

    if files.is_empty() {
        return Err(BatchError::NoFilesFound {
            path: dir_path.display().to_string(),
        });
    }

    // Sort files for deterministic processing order
    files.sort();

    log_debug!("File discovery completed",
        "files_found" => files.len(),
        "directory" => dir_path.display()
    );

    Ok(files)
}

fn visit_directory(
    dir_path: &Path,
    files: &mut Vec<PathBuf>,
    config: &BatchConfig,
) -> Result<(), BatchError> {
    let entries = fs::read_dir(dir_path).map_err(|e| BatchError::IoError {
        error: e.to_string(),
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| BatchError::IoError {
            error: e.to_string(),
        })?;
        let path = entry.path();

        if path.is_dir() {
            if config.recursive {
                visit_directory(&path, files, config)?;
            }
        } else if is_record_file(&path) {
            files.push(path);

            if let Some(max_files) = config.max_files {
                if files.len() >= max_files {
                    log_warning!("Reached maximum file limit",
                        "files_found" => files.len(),
                        "limit" => max_files
                    );
                    return Ok(());
                }
            }
        }
    }

    Ok(())
}

/// A record file is a .json document that is not one of our own artifacts
fn is_record_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    path.is_file() && name.ends_with(".json") && !name.ends_with(".artifact.json")
}

// ============================================================================
// PROCESSING
// ============================================================================

/// Process one record document: load, condition every record, write the
/// artifact document. The error string is reported in the batch summary.
pub fn process_record_file(path: &Path, runtime: &RuntimeConfig) -> Result<FileOutcome, String> {
    let records = load_records(path).map_err(|e| e.to_string())?;

    let mut artifacts = Vec::with_capacity(records.len());
    for record in &records {
        let artifact = condition_record(record, runtime).map_err(|e| e.to_string())?;
        artifacts.push(artifact);
    }

    let rejected_expressions = artifacts.iter().map(|a| a.stats.rejected).sum();
    let output = write_artifacts(path, &artifacts).map_err(|e| e.to_string())?;

    Ok(FileOutcome {
        path: path.to_path_buf(),
        output,
        records: artifacts.len(),
        rejected_expressions,
    })
}

/// Process a directory of record documents sequentially
pub fn process_directory_sequential(
    dir_path: &Path,
    config: &BatchConfig,
    runtime: &RuntimeConfig,
) -> Result<BatchResults, BatchError> {
    let start_time = Instant::now();

    log_info!("Starting sequential batch processing",
        "directory" => dir_path.display()
    );

    let files = discover_record_files(dir_path, config)?;
    let mut results = BatchResults::new();
    results.files_discovered = files.len();

    for (file_id, file_path) in files.iter().enumerate() {
        if config.progress_reporting {
            println!(
                "Processing file {} of {}: {}",
                file_id + 1,
                files.len(),
                file_path.display()
            );
        }

        match process_record_file(file_path, runtime) {
            Ok(outcome) => results.add_success(outcome),
            Err(reason) => {
                log_error!(codes::system::INTERNAL_ERROR,
                    "Record file processing failed",
                    "file" => file_path.display(),
                    "reason" => reason.as_str()
                );
                results.add_failure(file_path.clone(), reason);

                if config.fail_fast {
                    log_warning!("Fail-fast mode enabled, stopping batch processing");
                    break;
                }
            }
        }
    }

    results.processing_duration = start_time.elapsed();
    log_batch_summary(&results);
    Ok(results)
}

/// Process record documents in parallel over a bounded worker pool
pub fn process_directory_parallel(
    dir_path: &Path,
    config: &BatchConfig,
    runtime: &RuntimeConfig,
) -> Result<BatchResults, BatchError> {
    let start_time = Instant::now();

    log_info!("Starting parallel batch processing",
        "directory" => dir_path.display(),
        "max_threads" => config.max_threads
    );

    let files = discover_record_files(dir_path, config)?;
    let mut results = BatchResults::new();
    results.files_discovered = files.len();

    let chunk_size = calculate_chunk_size(files.len(), config.max_threads);
    log_debug!("Parallel processing configuration",
        "total_files" => files.len(),
        "chunk_size" => chunk_size,
        "max_threads" => config.max_threads
    );

    thread::scope(|scope| {
        let mut handles = Vec::new();

        for chunk in files.chunks(chunk_size) {
            let handle = scope.spawn(move || {
                let mut chunk_results = BatchResults::new();
                for file_path in chunk {
                    match process_record_file(file_path, runtime) {
                        Ok(outcome) => chunk_results.add_success(outcome),
                        Err(reason) => {
                            log_error!(codes::system::INTERNAL_ERROR,
                                "Record file processing failed",
                                "file" => file_path.display(),
                                "reason" => reason.as_str()
                            );
                            chunk_results.add_failure(file_path.clone(), reason);
                        }
                    }
                }
                chunk_results
            });
            handles.push(handle);
        }

        for handle in handles {
            match handle.join() {
                Ok(chunk_results) => results.merge(chunk_results),
                Err(_) => log_error!(codes::system::INTERNAL_ERROR,
                    "Worker thread panicked"
                ),
            }
        }
    });

    results.processing_duration = start_time.elapsed();
    log_batch_summary(&results);
    Ok(results)
}

/// Chunk size balancing thread utilization against per-thread overhead
fn calculate_chunk_size(total_files: usize, max_threads: usize) -> usize {
    if total_files == 0 || max_threads == 0 {
        return 1;
    }
    total_files.div_ceil(max_threads).max(1)
}

fn log_batch_summary(results: &BatchResults) {
    log_success!(codes::success::BATCH_COMPLETE,
        "Batch processing completed",
        "files_processed" => results.files_processed,
        "successful" => results.success_count(),
        "failed" => results.failure_count(),
        "duration_ms" => format!("{:.2}", results.processing_duration.as_secs_f64() * 1000.0)
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_size_calculation() {
        assert_eq!(calculate_chunk_size(0, 4), 1);
        assert_eq!(calculate_chunk_size(10, 4), 3);
        assert_eq!(calculate_chunk_size(4, 4), 1);
        assert_eq!(calculate_chunk_size(100, 8), 13);
    }

    #[test]
    fn test_record_file_filter() {
        let dir = tempfile::tempdir().unwrap();
        let record = dir.path().join("amber.json");
        let artifact = dir.path().join("amber.artifact.json");
        let other = dir.path().join("notes.txt");
        fs::write(&record, "{}").unwrap();
        fs::write(&artifact, "{}").unwrap();
        fs::write(&other, "hi").unwrap();

        assert!(is_record_file(&record));
        assert!(!is_record_file(&artifact));
        assert!(!is_record_file(&other));
    }

    #[test]
    fn test_discovery_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.json"), "{}").unwrap();
        fs::write(dir.path().join("a.json"), "{}").unwrap();
        fs::write(dir.path().join("a.artifact.json"), "{}").unwrap();
        let nested = dir.path().join("nested");
        fs::create_dir(&nested).unwrap();
        fs::write(nested.join("c.json"), "{}").unwrap();

        let config = BatchConfig::default();
        let files = discover_record_files(dir.path(), &config).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["a.json", "b.json", "c.json"]);
    }

    #[test]
    fn test_discovery_non_recursive() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.json"), "{}").unwrap();
        let nested = dir.path().join("nested");
        fs::create_dir(&nested).unwrap();
        fs::write(nested.join("c.json"), "{}").unwrap();

        let config = BatchConfig {
            recursive: false,
            ..Default::default()
        };
        let files = discover_record_files(dir.path(), &config).unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_missing_directory() {
        let error =
            discover_record_files(Path::new("/nonexistent"), &BatchConfig::default()).unwrap_err();
        assert!(matches!(error, BatchError::DirectoryNotFound { .. }));
    }

    #[test]
    fn test_process_record_file_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("test.json");
        fs::write(
            &input,
            r#"{"id": "t", "expressions": [{"name": "a", "text": "attr.atk * 2"}]}"#,
        )
        .unwrap();

        let outcome = process_record_file(&input, &RuntimeConfig::default()).unwrap();
        assert_eq!(outcome.records, 1);
        assert_eq!(outcome.rejected_expressions, 0);
        assert!(outcome.output.exists());
    }

    #[test]
    fn test_process_sequential_continues_past_bad_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bad.json"), "{broken").unwrap();
        fs::write(dir.path().join("good.json"), r#"{"id": "g"}"#).unwrap();

        let config = BatchConfig {
            progress_reporting: false,
            ..Default::default()
        };
        let results =
            process_directory_sequential(dir.path(), &config, &RuntimeConfig::default()).unwrap();
        assert_eq!(results.success_count(), 1);
        assert_eq!(results.failure_count(), 1);
    }
}
