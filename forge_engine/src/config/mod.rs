//! Engine configuration
//!
//! `constants` holds compile-time bounds that protect termination and
//! memory and cannot be changed at runtime; `runtime` holds user
//! preferences that tune behavior within those bounds.

pub mod constants;
pub mod runtime;

pub use constants::compile_time;
pub use runtime::{
    ConfigError, LogLevel, LoggingPreferences, RenderPreferences, ResolvePreferences,
    RewritePreferences, RuntimeConfig,
};
