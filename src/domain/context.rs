//! Error context extension trait
//!
//! This module provides a context extension trait similar to `anyhow::Context`
//! that works with `Result<T, DeidbError>`. This allows adding rich context
//! to errors throughout the library code while maintaining type safety.
//!
//! # Examples
//!
//! ```rust
//! use deidb::domain::Result;
//! use deidb::domain::context::ResultExt;
//!
//! fn read_input(path: &str) -> Result<Vec<u8>> {
//!     std::fs::read(path).with_context(|| format!("Failed to read input file: {}", path))
//! }
//! ```

use crate::domain::errors::DeidbError;
use crate::domain::result::Result;

/// Extension trait for adding context to `Result` types
///
/// The key difference from anyhow is that this maintains the `DeidbError` type
/// throughout the library code.
pub trait ResultExt<T> {
    /// Add context to an error
    ///
    /// The context is evaluated eagerly, so use `.with_context()` if the
    /// context string is expensive to compute.
    fn context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static;

    /// Add context to an error using a closure (lazy evaluation)
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

/// Implementation for `Result<T, E>` where `E` can be converted to `DeidbError`
///
/// Deidentification errors keep their variant so callers can still match on
/// the offending columns; everything else is folded into `Other`.
impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<DeidbError>,
{
    fn context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|e| wrap(e.into(), context))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|e| wrap(e.into(), f()))
    }
}

fn wrap(base_error: DeidbError, context: impl std::fmt::Display) -> DeidbError {
    match base_error {
        DeidbError::Deidentify(e) => DeidbError::Deidentify(e),
        other => DeidbError::Other(format!("{context}: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::DeidentifyError;

    #[test]
    fn test_context_with_deidb_error() {
        let result: Result<()> = Err(DeidbError::Configuration("Invalid config".to_string()));
        let with_context = result.context("Failed to load configuration");

        let err_msg = with_context.unwrap_err().to_string();
        assert!(err_msg.contains("Failed to load configuration"));
        assert!(err_msg.contains("Invalid config"));
    }

    #[test]
    fn test_with_context_lazy_evaluation() {
        let called = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
        let called_clone = called.clone();

        let result: Result<i32> = Ok(42);
        let with_context = result.with_context(|| {
            called_clone.store(true, std::sync::atomic::Ordering::SeqCst);
            "Expensive context"
        });

        // Context should NOT be evaluated for Ok results
        assert!(with_context.is_ok());
        assert!(!called.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[test]
    fn test_context_chaining() {
        let result: Result<()> = Err(DeidbError::Csv("unequal lengths".to_string()));
        let with_context = result
            .context("Failed to parse row 3")
            .context("Failed to read export.csv");

        let err_msg = with_context.unwrap_err().to_string();
        assert!(err_msg.contains("Failed to read export.csv"));
        assert!(err_msg.contains("Failed to parse row 3"));
        assert!(err_msg.contains("unequal lengths"));
    }

    #[test]
    fn test_deidentify_errors_keep_variant() {
        let result: std::result::Result<(), DeidentifyError> =
            Err(DeidentifyError::SchemaMismatch {
                columns: vec!["ssn".to_string()],
            });
        let err = result.context("Failed to validate batch").unwrap_err();
        assert!(matches!(
            err,
            DeidbError::Deidentify(DeidentifyError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn test_io_error_with_context() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let result: std::result::Result<(), std::io::Error> = Err(io_error);
        let err_msg = result
            .context("Failed to read input file 'export.csv'")
            .unwrap_err()
            .to_string();
        assert!(err_msg.contains("Failed to read input file"));
        assert!(err_msg.contains("File not found"));
    }
}
