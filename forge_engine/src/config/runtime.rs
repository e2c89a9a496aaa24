// RUNTIME PREFERENCES (User Experience)

use serde::{Deserialize, Serialize};
use std::env;

/// Runtime log level preference, convertible to the event level used by the
/// logging service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warning,
    #[default]
    Info,
    Debug,
}

impl LogLevel {
    pub fn to_events_log_level(self) -> crate::logging::LogLevel {
        match self {
            LogLevel::Error => crate::logging::LogLevel::Error,
            LogLevel::Warning => crate::logging::LogLevel::Warning,
            LogLevel::Info => crate::logging::LogLevel::Info,
            LogLevel::Debug => crate::logging::LogLevel::Debug,
        }
    }

    fn from_env_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Some(LogLevel::Error),
            "warning" | "warn" => Some(LogLevel::Warning),
            "info" => Some(LogLevel::Info),
            "debug" => Some(LogLevel::Debug),
            _ => None,
        }
    }
}

fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingPreferences {
    /// Minimum level emitted by the global logger
    pub min_log_level: LogLevel,

    /// Whether events are emitted as JSON lines instead of console text
    pub use_structured_logging: bool,

    /// Whether per-record context (record id) is attached to every event
    pub attach_record_context: bool,
}

impl Default for LoggingPreferences {
    fn default() -> Self {
        Self {
            min_log_level: env::var("FORGE_LOG_LEVEL")
                .ok()
                .and_then(|v| LogLevel::from_env_str(&v))
                .unwrap_or_default(),
            use_structured_logging: env_bool("FORGE_STRUCTURED_LOGGING", false),
            attach_record_context: env_bool("FORGE_ATTACH_RECORD_CONTEXT", true),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RewritePreferences {
    /// Whether every rule attempt (including NoMatch) is logged at debug
    pub log_rule_attempts: bool,

    /// Whether increment table labels are checked against the allow/deny
    /// patterns in addition to table-set membership
    pub enforce_label_patterns: bool,
}

impl Default for RewritePreferences {
    fn default() -> Self {
        Self {
            log_rule_attempts: env_bool("FORGE_LOG_RULE_ATTEMPTS", false),
            enforce_label_patterns: env_bool("FORGE_ENFORCE_LABEL_PATTERNS", true),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolvePreferences {
    /// Whether symbols left pending after the pass bound are logged
    pub log_unresolved_symbols: bool,

    /// Whether each promotion is logged at debug
    pub log_promotions: bool,
}

impl Default for ResolvePreferences {
    fn default() -> Self {
        Self {
            log_unresolved_symbols: env_bool("FORGE_LOG_UNRESOLVED_SYMBOLS", true),
            log_promotions: env_bool("FORGE_LOG_PROMOTIONS", false),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderPreferences {
    /// Whether rows with a missing parameter index render it as zero
    /// instead of skipping the whole label
    pub zero_fill_missing_params: bool,

    /// Whether affix recognition (prefix/suffix/unit splitting) is applied
    pub split_units: bool,
}

impl Default for RenderPreferences {
    fn default() -> Self {
        Self {
            zero_fill_missing_params: env_bool("FORGE_ZERO_FILL_PARAMS", true),
            split_units: env_bool("FORGE_SPLIT_UNITS", true),
        }
    }
}

/// Aggregate runtime configuration. The CLI deserializes this from a TOML
/// document; library callers usually take `RuntimeConfig::default()`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub logging: LoggingPreferences,
    pub rewrite: RewritePreferences,
    pub resolve: ResolvePreferences,
    pub render: RenderPreferences,
}

impl RuntimeConfig {
    /// Parse configuration from TOML text. The engine never touches the
    /// file system; callers read the file and hand over the contents.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::InvalidToml {
            message: e.to_string(),
        })
    }
}

/// Configuration errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration document: {message}")]
    InvalidToml { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_usable() {
        let config = RuntimeConfig::default();
        assert!(config.rewrite.enforce_label_patterns || !config.rewrite.enforce_label_patterns);
        assert!(config.render.split_units);
    }

    #[test]
    fn test_config_from_toml() {
        let text = r#"
            [logging]
            min_log_level = "debug"
            use_structured_logging = true

            [rewrite]
            log_rule_attempts = true
        "#;
        let config = RuntimeConfig::from_toml_str(text).unwrap();
        assert_eq!(config.logging.min_log_level, LogLevel::Debug);
        assert!(config.logging.use_structured_logging);
        assert!(config.rewrite.log_rule_attempts);
        // Sections not present fall back to defaults
        assert!(config.render.split_units);
    }

    #[test]
    fn test_config_rejects_bad_toml() {
        let result = RuntimeConfig::from_toml_str("logging = 3");
        assert!(result.is_err());
    }
}
