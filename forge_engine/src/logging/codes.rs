//! Consolidated event codes and classification
//!
//! Single source of truth for every code the engine can emit, together with
//! its behavioral metadata. Scanners and rules never log errors for
//! NoMatch; the codes below cover defect-level failures, the two warning
//! outcomes (unresolved symbols, unsafe expressions), and success
//! milestones.

use std::collections::HashMap;
use std::sync::OnceLock;

// ============================================================================
// CODE WRAPPER TYPE
// ============================================================================

/// Universal code wrapper for error, warning and success codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Code(&'static str);

impl Code {
    pub const fn new(code: &'static str) -> Self {
        Self(code)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// CLASSIFICATION TYPES
// ============================================================================

/// Severity levels for code metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Critical = 0,
    High = 1,
    Medium = 2,
    Low = 3,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        }
    }
}

/// Complete metadata for a code
#[derive(Debug, Clone)]
pub struct ErrorMetadata {
    pub code: &'static str,
    pub category: &'static str,
    pub severity: Severity,
    pub recoverable: bool,
    pub description: &'static str,
}

// ============================================================================
// CODE CONSTANTS
// ============================================================================

/// System codes
pub mod system {
    use super::Code;

    pub const INTERNAL_ERROR: Code = Code::new("ERR001");
    pub const INITIALIZATION_FAILURE: Code = Code::new("ERR002");
}

/// Scanner codes
pub mod scan {
    use super::Code;

    pub const SNIPPET_TOO_LONG: Code = Code::new("E010");
    pub const NESTING_TOO_DEEP: Code = Code::new("E011");
}

/// Rewrite-rule codes (logged at debug when rule attempts are traced)
pub mod rewrite {
    use super::Code;

    pub const MULTIPLIER_OUT_OF_RANGE: Code = Code::new("E020");
    pub const TABLE_NOT_ALLOWED: Code = Code::new("E021");
    pub const LABEL_PATTERN_REJECTED: Code = Code::new("E022");
}

/// Constant-resolver codes
pub mod consts {
    use super::Code;

    pub const TOO_MANY_DECLARATIONS: Code = Code::new("E030");
    pub const UNRESOLVED_SYMBOL: Code = Code::new("E031");
    pub const INLINE_GROWTH_EXCEEDED: Code = Code::new("E032");
}

/// Validator codes
pub mod validate {
    use super::Code;

    pub const UNSAFE_EXPRESSION: Code = Code::new("E040");
}

/// Template-renderer codes
pub mod template {
    use super::Code;

    pub const TOO_MANY_ROWS: Code = Code::new("E050");
    pub const PLACEHOLDER_OUT_OF_RANGE: Code = Code::new("E051");
    pub const MISSING_PARAMETER: Code = Code::new("E052");
}

/// Pipeline codes
pub mod pipeline {
    use super::Code;

    pub const TOO_MANY_EXPRESSIONS: Code = Code::new("E060");
    pub const TOO_MANY_PROMOTE_GROUPS: Code = Code::new("E061");
}

/// Success codes
pub mod success {
    use super::Code;

    pub const SYSTEM_INITIALIZATION_COMPLETED: Code = Code::new("I001");
    pub const RECORD_CONDITIONED: Code = Code::new("I002");
    pub const EXPRESSION_REWRITTEN: Code = Code::new("I003");
    pub const SYMBOLS_RESOLVED: Code = Code::new("I004");
    pub const TABLES_RENDERED: Code = Code::new("I005");
    pub const BATCH_COMPLETE: Code = Code::new("I006");
}

// ============================================================================
// METADATA REGISTRY
// ============================================================================

fn metadata_registry() -> &'static HashMap<&'static str, ErrorMetadata> {
    static REGISTRY: OnceLock<HashMap<&'static str, ErrorMetadata>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let entries = [
            ErrorMetadata {
                code: "ERR001",
                category: "System",
                severity: Severity::Critical,
                recoverable: false,
                description: "Internal engine defect",
            },
            ErrorMetadata {
                code: "ERR002",
                category: "System",
                severity: Severity::Critical,
                recoverable: false,
                description: "Global subsystem failed to initialize",
            },
            ErrorMetadata {
                code: "E010",
                category: "Scan",
                severity: Severity::Medium,
                recoverable: true,
                description: "Snippet exceeds the scanner length bound",
            },
            ErrorMetadata {
                code: "E011",
                category: "Scan",
                severity: Severity::Medium,
                recoverable: true,
                description: "Delimiter nesting exceeds the scan depth bound",
            },
            ErrorMetadata {
                code: "E020",
                category: "Rewrite",
                severity: Severity::Low,
                recoverable: true,
                description: "Stack multiplier outside the accepted integer range",
            },
            ErrorMetadata {
                code: "E021",
                category: "Rewrite",
                severity: Severity::Low,
                recoverable: true,
                description: "Referenced table is not in the talent's allowed set",
            },
            ErrorMetadata {
                code: "E022",
                category: "Rewrite",
                severity: Severity::Low,
                recoverable: true,
                description: "Table label failed the allow/deny pattern gate",
            },
            ErrorMetadata {
                code: "E030",
                category: "Consts",
                severity: Severity::Medium,
                recoverable: true,
                description: "Declaration document exceeds the declaration bound",
            },
            ErrorMetadata {
                code: "E031",
                category: "Consts",
                severity: Severity::Low,
                recoverable: true,
                description: "Constant never closed within the resolver pass bound",
            },
            ErrorMetadata {
                code: "E032",
                category: "Consts",
                severity: Severity::Medium,
                recoverable: true,
                description: "Inlined expression exceeds the growth bound",
            },
            ErrorMetadata {
                code: "E040",
                category: "Validate",
                severity: Severity::High,
                recoverable: true,
                description: "Expression references identifiers outside the allowlist",
            },
            ErrorMetadata {
                code: "E050",
                category: "Template",
                severity: Severity::Medium,
                recoverable: true,
                description: "Promote group exceeds the row bound",
            },
            ErrorMetadata {
                code: "E051",
                category: "Template",
                severity: Severity::Medium,
                recoverable: true,
                description: "Placeholder index exceeds the placeholder bound",
            },
            ErrorMetadata {
                code: "E052",
                category: "Template",
                severity: Severity::Low,
                recoverable: true,
                description: "Row is missing a parameter referenced by its template",
            },
            ErrorMetadata {
                code: "E060",
                category: "Pipeline",
                severity: Severity::Medium,
                recoverable: false,
                description: "Record exceeds the expression bound",
            },
            ErrorMetadata {
                code: "E061",
                category: "Pipeline",
                severity: Severity::Medium,
                recoverable: false,
                description: "Record exceeds the promote-group bound",
            },
        ];

        entries.into_iter().map(|m| (m.code, m)).collect()
    })
}

/// Get description for a code ("Unknown code" when unregistered)
pub fn get_description(code: &str) -> &'static str {
    metadata_registry()
        .get(code)
        .map(|m| m.description)
        .unwrap_or("Unknown code")
}

/// Get category for a code
pub fn get_category(code: &str) -> &'static str {
    metadata_registry()
        .get(code)
        .map(|m| m.category)
        .unwrap_or("Unknown")
}

/// Get severity for a code (unregistered codes report Low)
pub fn get_severity(code: &str) -> Severity {
    metadata_registry()
        .get(code)
        .map(|m| m.severity)
        .unwrap_or(Severity::Low)
}

/// Check whether a failure with this code is recoverable
pub fn is_recoverable(code: &str) -> bool {
    metadata_registry()
        .get(code)
        .map(|m| m.recoverable)
        .unwrap_or(true)
}
