// deidb - Consistent, reversible pseudonymization of tabular records
// Copyright (c) 2025 deidb Contributors
// Licensed under the MIT License

//! # deidb - Consistent, reversible pseudonymization
//!
//! deidb replaces identifying values in tabular records with random
//! substitutes. Every original → substitute pair is kept in a per-column key
//! store, so the same original always receives the same substitute across
//! runs and outputs can be mapped back when needed.
//!
//! ## Overview
//!
//! This library provides:
//! - **Schemas** declaring which columns are de-identified and how
//! - **Validation** of a batch against the schema and the transform registry
//! - **Deidentification** with key reuse across runs
//! - **Archiving** of the schema and key store before every run
//! - **Re-identification** through the inverse key store
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`deidentify`] - Engine, registry, key store, archive, audit
//! - [`workspace`] - Workspace layout, registry and status
//! - [`domain`] - Batches, identifiers and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use deidb::deidentify::DeidentificationEngine;
//! use deidb::workspace::Workspace;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let workspace = Workspace::create("/data/study")?;
//!     let engine = DeidentificationEngine::default();
//!
//!     let outcome = engine.deidentify_file("/data/export.csv", &workspace)?;
//!     println!("Wrote {:?}", outcome.summary.output_path);
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! deidb uses the [`domain::DeidbError`] type for all library errors.
//! Validation failures carry the offending column names:
//!
//! ```rust,no_run
//! use deidb::domain::{DeidbError, DeidentifyError};
//!
//! fn report(error: &DeidbError) {
//!     if let DeidbError::Deidentify(DeidentifyError::SchemaMismatch { columns }) = error {
//!         eprintln!("Add these columns to the schema: {}", columns.join(", "));
//!     }
//! }
//! ```
//!
//! ## Logging
//!
//! deidb uses structured logging with the `tracing` crate. Run events carry
//! the `run_id`; record values are never logged.

pub mod cli;
pub mod config;
pub mod deidentify;
pub mod domain;
pub mod logging;
pub mod workspace;
