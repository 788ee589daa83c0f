//! Logging and observability
//!
//! This module provides structured logging with support for:
//! - Console output with configurable log levels
//! - JSON-formatted local file logging with rotation
//!
//! # Example
//!
//! ```no_run
//! use deidb::logging::init_logging;
//! use deidb::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! // Use tracing macros for logging
//! tracing::info!("Application started");
//! ```

pub mod structured;

// Re-export commonly used items
pub use structured::{init_logging, LoggingGuard};

/// Log the start of a deidentification run
///
/// # Example
///
/// ```no_run
/// use deidb::log_run_start;
/// use std::path::Path;
///
/// log_run_start!(Path::new("/data/study").display(), 120, false);
/// ```
#[macro_export]
macro_rules! log_run_start {
    ($workspace:expr, $rows:expr, $dry_run:expr) => {
        tracing::info!(
            workspace = %$workspace,
            rows = $rows,
            dry_run = $dry_run,
            "Starting deidentification run"
        );
    };
}

/// Log the completion of a deidentification run
///
/// # Example
///
/// ```no_run
/// use deidb::log_run_complete;
/// use std::time::Duration;
///
/// log_run_complete!(120, 7, 113, Duration::from_millis(40));
/// ```
#[macro_export]
macro_rules! log_run_complete {
    ($rows:expr, $new_keys:expr, $reused_keys:expr, $duration:expr) => {
        tracing::info!(
            rows = $rows,
            new_keys = $new_keys,
            reused_keys = $reused_keys,
            duration_ms = $duration.as_millis() as u64,
            "Deidentification run complete"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use deidb::log_error_with_context;
/// use deidb::domain::DeidbError;
///
/// let error = DeidbError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}
