//! Deidentification module for deidb
//!
//! This module replaces identifying values in tabular batches with random
//! substitutes while keeping a durable original → substitute mapping per
//! column, so the same original always receives the same substitute and
//! outputs can be reversed.
//!
//! # Architecture
//!
//! The pipeline consists of:
//! - **Schema**: which columns are included, excluded, and how they are transformed
//! - **Validation**: column and registry checks before any work is done
//! - **Registry**: name-indexed substitution functions
//! - **Key store**: per-column dictionaries in `keydb/`
//! - **Archive**: pre-run snapshots of `config/` and `keydb/`
//! - **Commit**: staged writes renamed into place
//! - **Audit**: one record per run, never containing record values
//!
//! # Usage
//!
//! ```rust,ignore
//! use deidb::deidentify::DeidentificationEngine;
//!
//! let engine = DeidentificationEngine::default();
//! let outcome = engine.deidentify_file("export.csv", &workspace)?;
//! ```

pub mod archive;
pub mod audit;
pub mod commit;
pub mod engine;
pub mod keystore;
pub mod registry;
pub mod reidentify;
pub mod schema;
pub mod summary;
pub mod validation;

// Re-export main types
pub use archive::ArchiveManager;
pub use engine::{DeidentificationEngine, RunOutcome};
pub use keystore::KeyStore;
pub use registry::{TransformRegistry, ValueTransformer};
pub use reidentify::reidentify;
pub use schema::Schema;
pub use summary::{ColumnStats, ReidentifySummary, RunSummary};
pub use validation::validate;
