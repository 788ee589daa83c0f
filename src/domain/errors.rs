//! Domain error types
//!
//! This module defines the error hierarchy for deidb.
//! All errors are domain-specific and don't expose third-party types.

use thiserror::Error;

/// Main deidb error type
///
/// This is the primary error type used throughout the application.
/// It wraps specific error types and provides context for error handling.
#[derive(Debug, Error)]
pub enum DeidbError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Workspace layout or activation errors
    #[error("Workspace error: {0}")]
    Workspace(String),

    /// Deidentification run errors
    #[error("Deidentification error: {0}")]
    Deidentify(#[from] DeidentifyError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// CSV reading or writing errors
    #[error("CSV error: {0}")]
    Csv(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// Errors raised by a deidentification run
///
/// Validation failures carry every offending column so the operator sees the
/// full list of problems in one pass.
#[derive(Debug, Error)]
pub enum DeidentifyError {
    /// Batch contains columns that are neither included nor excluded
    #[error("Columns {columns:?} are not in the schema")]
    SchemaMismatch { columns: Vec<String> },

    /// Included columns whose transform does not resolve in the registry
    #[error("Columns {columns:?} reference functions that are not registered")]
    UnknownTransform { columns: Vec<String> },

    /// Snapshotting the pre-run state failed; nothing was committed
    #[error("Archive failed: {0}")]
    ArchiveFailure(String),

    /// Writing the key store or output failed after archiving
    #[error("Persistence failed: {0}")]
    PersistenceFailure(String),

    /// Schema file is unreadable or structurally invalid
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    /// Input batch is malformed
    #[error("Invalid batch: {0}")]
    InvalidBatch(String),

    /// Key store file could not be loaded
    #[error("Key store error: {0}")]
    KeyStore(String),

    /// A transform failed to produce a substitute
    #[error("Transform failed for column '{column}': {message}")]
    Transform { column: String, message: String },
}

impl DeidentifyError {
    /// Columns named by a validation failure, if any
    pub fn offending_columns(&self) -> &[String] {
        match self {
            Self::SchemaMismatch { columns } | Self::UnknownTransform { columns } => columns,
            _ => &[],
        }
    }

    /// Whether the error was raised before any durable mutation
    pub fn is_pre_commit(&self) -> bool {
        !matches!(self, Self::PersistenceFailure(_))
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for DeidbError {
    fn from(err: std::io::Error) -> Self {
        DeidbError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for DeidbError {
    fn from(err: serde_json::Error) -> Self {
        DeidbError::Serialization(err.to_string())
    }
}

// Conversion from serde_yaml::Error
impl From<serde_yaml::Error> for DeidbError {
    fn from(err: serde_yaml::Error) -> Self {
        DeidbError::Serialization(format!("YAML error: {err}"))
    }
}

// Conversion from csv::Error
impl From<csv::Error> for DeidbError {
    fn from(err: csv::Error) -> Self {
        DeidbError::Csv(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for DeidbError {
    fn from(err: toml::de::Error) -> Self {
        DeidbError::Configuration(format!("TOML parse error: {err}"))
    }
}
