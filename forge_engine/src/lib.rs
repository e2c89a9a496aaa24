// Internal modules
pub mod config;
pub mod consts;
#[macro_use]
pub mod logging;
pub mod pipeline;
pub mod rewrite;
pub mod scan;
pub mod template;
pub mod utils;
pub mod validate;

// Re-export key types for library consumers
pub use config::RuntimeConfig;
pub use consts::{resolve_constants, SymbolTable, ThresholdSpec};
pub use pipeline::{condition_record, PipelineError, RecordArtifact, RecordInput};
pub use rewrite::{RewriteResult, RuleSet, TableSets};
pub use template::{render_promote_rows, PromoteRow, RenderedTable};
pub use validate::{has_unknown_free_identifiers, IdentifierAllowlist};
