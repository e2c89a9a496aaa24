//! Pipeline output types

use crate::logging::codes;
use crate::template::RenderedTemplate;
use crate::log_success;
use serde::{Deserialize, Serialize};

/// What happened to one expression during conditioning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpressionStatus {
    /// A rule matched and the rewritten text passed the safety gate
    Rewritten,
    /// No rule matched (or the rewrite failed the gate); the original text
    /// passed and is emitted as-is
    Unchanged,
    /// Neither the rewrite nor the original passed the safety gate;
    /// nothing is emitted for this expression
    Rejected,
}

/// One conditioned expression
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionedExpression {
    pub name: String,
    pub status: ExpressionStatus,
    /// Emitted text; absent exactly when the expression was rejected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// One rendered promote group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderedGroup {
    pub name: String,
    pub templates: Vec<RenderedTemplate>,
}

/// Per-record conditioning statistics
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RecordStats {
    pub rewritten: usize,
    pub unchanged: usize,
    pub rejected: usize,
    pub symbols_resolved: usize,
    pub tables_rendered: usize,
}

impl RecordStats {
    pub fn count(&mut self, status: ExpressionStatus) {
        match status {
            ExpressionStatus::Rewritten => self.rewritten += 1,
            ExpressionStatus::Unchanged => self.unchanged += 1,
            ExpressionStatus::Rejected => self.rejected += 1,
        }
    }

    pub fn expressions_total(&self) -> usize {
        self.rewritten + self.unchanged + self.rejected
    }
}

/// Everything produced for one record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordArtifact {
    pub id: String,
    pub expressions: Vec<ConditionedExpression>,
    pub tables: Vec<RenderedGroup>,
    pub stats: RecordStats,
    pub duration_ms: u64,
}

impl RecordArtifact {
    pub fn log_summary(&self) {
        log_success!(codes::success::RECORD_CONDITIONED,
            "Record conditioned",
            "record" => self.id.as_str(),
            "expressions" => self.stats.expressions_total(),
            "rewritten" => self.stats.rewritten,
            "unchanged" => self.stats.unchanged,
            "rejected" => self.stats.rejected,
            "symbols" => self.stats.symbols_resolved,
            "tables" => self.stats.tables_rendered,
            "duration_ms" => self.duration_ms
        );
    }
}
