//! Domain models and types for deidb.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Tabular batches** ([`Batch`]) read from and written to CSV
//! - **Strongly-typed identifiers** ([`ArchiveId`], [`RunId`])
//! - **Error types** ([`DeidbError`], [`DeidentifyError`])
//! - **Result type alias** ([`Result`])
//! - **Error context** ([`context::ResultExt`])
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, DeidbError>`]:
//!
//! ```rust
//! use deidb::domain::{Batch, Result};
//!
//! fn example() -> Result<usize> {
//!     let batch = Batch::from_reader("mrn\nA123\n".as_bytes())?;
//!     Ok(batch.len())
//! }
//! ```

pub mod batch;
pub mod context;
pub mod errors;
pub mod ids;
pub mod result;

// Re-export commonly used types for convenience
pub use batch::Batch;
pub use errors::{DeidbError, DeidentifyError};
pub use ids::{ArchiveId, RunId};
pub use result::Result;
