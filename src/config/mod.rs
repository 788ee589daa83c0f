//! Configuration management for deidb.
//!
//! This module provides TOML-based configuration loading, parsing, and validation.
//!
//! # Overview
//!
//! deidb reads an optional `deidb.toml` with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - Default values for every setting
//! - `DEIDB_*` environment overrides
//! - Validation on load
//!
//! The configuration covers the tool itself. What gets de-identified is
//! declared per workspace in `config/io.yaml` (see
//! [`crate::deidentify::schema`]).
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use deidb::config::load_config_or_default;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config_or_default("deidb.toml")?;
//! println!("Dry run: {}", config.deidentify.dry_run);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Log level
//! - [`WorkspaceConfig`] - Workspace registry location
//! - [`DeidentifyConfig`] - Substitution attempts and dry run
//! - [`AuditConfig`] - Audit trail format
//! - [`LoggingConfig`] - Local file logging
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [workspace]
//! registry_path = "${HOME}/.deidb"
//!
//! [deidentify]
//! max_substitution_attempts = 32
//!
//! [audit]
//! json_format = true
//! ```

pub mod loader;
pub mod schema;

// Re-export commonly used types
pub use loader::{load_config, load_config_or_default};
pub use schema::{
    ApplicationConfig, AuditConfig, DeidbConfig, DeidentifyConfig, LoggingConfig, WorkspaceConfig,
};
