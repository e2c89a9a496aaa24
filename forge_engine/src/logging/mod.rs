//! Global logging module for the conditioning engine
//!
//! Thread-safe global logging with per-record context and a clean macro
//! interface. The engine itself performs no I/O beyond these log sinks; the
//! enclosing application decides whether events render as console text or
//! JSON lines.

pub mod codes;
pub mod events;
pub mod macros;
pub mod service;

use std::cell::RefCell;
use std::sync::{Arc, OnceLock};

use crate::utils::Span;

// Re-export main types
pub use codes::Code;
pub use events::{LogEvent, LogLevel};
pub use service::{ConsoleLogger, Logger, LoggingService, MemoryLogger, StructuredLogger};

// ============================================================================
// GLOBAL STATE
// ============================================================================

static GLOBAL_LOGGER: OnceLock<Arc<LoggingService>> = OnceLock::new();

thread_local! {
    static RECORD_CONTEXT: RefCell<Option<String>> = RefCell::new(None);
}

// ============================================================================
// INITIALIZATION
// ============================================================================

/// Initialize global logging from runtime preferences
pub fn init_global_logging(
    preferences: &crate::config::LoggingPreferences,
) -> Result<(), String> {
    let service = Arc::new(LoggingService::from_preferences(preferences));
    init_global_logging_with_service(service)
}

/// Initialize with custom service (primarily for testing)
pub fn init_global_logging_with_service(service: Arc<LoggingService>) -> Result<(), String> {
    GLOBAL_LOGGER
        .set(service)
        .map_err(|_| "Global logger already initialized".to_string())?;

    let event = events::LogEvent::success(
        codes::success::SYSTEM_INITIALIZATION_COMPLETED,
        "Global logging system initialized",
    );
    if let Some(logger) = try_get_global_logger() {
        logger.log_event(event);
    }

    Ok(())
}

/// Check if global logging is initialized
pub fn is_initialized() -> bool {
    GLOBAL_LOGGER.get().is_some()
}

/// Get global logger if initialized. Library callers that never
/// initialize logging simply get silent sinks.
pub fn try_get_global_logger() -> Option<&'static LoggingService> {
    GLOBAL_LOGGER.get().map(|s| s.as_ref())
}

// ============================================================================
// RECORD CONTEXT
// ============================================================================

/// Run `f` with a record id attached to every event logged on this thread
pub fn with_record_context<T>(record_id: &str, f: impl FnOnce() -> T) -> T {
    RECORD_CONTEXT.with(|ctx| {
        *ctx.borrow_mut() = Some(record_id.to_string());
    });
    let result = f();
    RECORD_CONTEXT.with(|ctx| {
        *ctx.borrow_mut() = None;
    });
    result
}

/// Current record id, if a record context is active on this thread
pub fn current_record_context() -> Option<String> {
    RECORD_CONTEXT.with(|ctx| ctx.borrow().clone())
}

fn attach_record_context(mut event: LogEvent) -> LogEvent {
    if let Some(record) = current_record_context() {
        event = event.with_context("record", &record);
    }
    event
}

// ============================================================================
// MACRO SUPPORT FUNCTIONS
// ============================================================================

pub fn log_error_with_context(
    code: Code,
    message: &str,
    span: Option<Span>,
    context: Vec<(&str, &str)>,
) {
    let mut event = LogEvent::error(code, message);
    if let Some(span) = span {
        event = event.with_span(span);
    }
    for (key, value) in context {
        event = event.with_context(key, value);
    }
    if let Some(logger) = try_get_global_logger() {
        logger.log_event(attach_record_context(event));
    }
}

pub fn log_warning_with_context(code: Option<Code>, message: &str, context: Vec<(&str, &str)>) {
    let mut event = match code {
        Some(code) => LogEvent::warning_with_code(code, message),
        None => LogEvent::warning(message),
    };
    for (key, value) in context {
        event = event.with_context(key, value);
    }
    if let Some(logger) = try_get_global_logger() {
        logger.log_event(attach_record_context(event));
    }
}

pub fn log_info_with_context(message: &str, context: Vec<(&str, &str)>) {
    let mut event = LogEvent::info(message);
    for (key, value) in context {
        event = event.with_context(key, value);
    }
    if let Some(logger) = try_get_global_logger() {
        logger.log_event(attach_record_context(event));
    }
}

pub fn log_success_with_context(code: Code, message: &str, context: Vec<(&str, &str)>) {
    let mut event = LogEvent::success(code, message);
    for (key, value) in context {
        event = event.with_context(key, value);
    }
    if let Some(logger) = try_get_global_logger() {
        logger.log_event(attach_record_context(event));
    }
}

pub fn log_debug_with_context(message: &str, context: Vec<(&str, &str)>) {
    let mut event = LogEvent::debug(message);
    for (key, value) in context {
        event = event.with_context(key, value);
    }
    if let Some(logger) = try_get_global_logger() {
        logger.log_event(attach_record_context(event));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_context_scoping() {
        assert_eq!(current_record_context(), None);

        let inner = with_record_context("hutao", || current_record_context());
        assert_eq!(inner, Some("hutao".to_string()));

        assert_eq!(current_record_context(), None);
    }

    #[test]
    fn test_logging_without_init_is_silent() {
        // No global logger in unit tests: the macros must be no-ops, not
        // panics.
        crate::log_info!("nobody listening", "key" => 1);
        crate::log_debug!("still nobody");
    }
}
