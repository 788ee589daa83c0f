//! Workspace directory layout
//!
//! ```text
//! <root>/
//!   config/io.yaml     schema
//!   keydb/<col>.json   key store, one file per included column
//!   archive/<id>/      pre-run snapshots of config/ and keydb/
//!   files/             de-identified outputs
//!   logs/audit.log     run audit trail
//! ```

use crate::deidentify::schema::{Schema, SCHEMA_TEMPLATE};
use crate::domain::errors::{DeidbError, DeidentifyError};
use crate::domain::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// Schema directory name
pub const CONFIG_DIR: &str = "config";
/// Key store directory name
pub const KEYDB_DIR: &str = "keydb";
/// Archive directory name
pub const ARCHIVE_DIR: &str = "archive";
/// Output directory name
pub const FILES_DIR: &str = "files";
/// Log directory name
pub const LOGS_DIR: &str = "logs";
/// Schema file name inside [`CONFIG_DIR`]
pub const SCHEMA_FILE: &str = "io.yaml";
/// Audit log file name inside [`LOGS_DIR`]
pub const AUDIT_LOG_FILE: &str = "audit.log";

/// Handle to one workspace directory
///
/// Every engine operation receives a `Workspace` explicitly; nothing in the
/// library keeps a notion of the "current" workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Create the layout under `root` (idempotent)
    ///
    /// Missing directories are created and the schema template is written
    /// only if no schema exists yet, so re-creating never clobbers an
    /// operator's edits.
    ///
    /// # Errors
    ///
    /// Returns [`DeidbError::Workspace`] if a directory or the template
    /// cannot be written.
    pub fn create(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        if root.extension().is_some() && !root.is_dir() {
            return Err(DeidbError::Workspace(format!(
                "{} looks like a file, not a directory",
                root.display()
            )));
        }

        for dir in [CONFIG_DIR, KEYDB_DIR, ARCHIVE_DIR, FILES_DIR, LOGS_DIR] {
            fs::create_dir_all(root.join(dir)).map_err(|e| {
                DeidbError::Workspace(format!(
                    "Failed to create {}: {e}",
                    root.join(dir).display()
                ))
            })?;
        }

        let schema_path = root.join(CONFIG_DIR).join(SCHEMA_FILE);
        if !schema_path.exists() {
            fs::write(&schema_path, SCHEMA_TEMPLATE).map_err(|e| {
                DeidbError::Workspace(format!(
                    "Failed to write schema template {}: {e}",
                    schema_path.display()
                ))
            })?;
            tracing::info!(path = %schema_path.display(), "Wrote schema template");
        }

        Self::open(root)
    }

    /// Open an existing workspace
    ///
    /// # Errors
    ///
    /// Returns [`DeidbError::Workspace`] if `root` lacks a schema file or a
    /// key store directory.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let root = fs::canonicalize(root).map_err(|e| {
            DeidbError::Workspace(format!("Workspace {} is not accessible: {e}", root.display()))
        })?;

        let workspace = Self { root };
        if !workspace.schema_path().is_file() || !workspace.keydb_dir().is_dir() {
            return Err(DeidbError::Workspace(format!(
                "{} is not a deidb workspace (expected {}/{} and {}/)",
                workspace.root.display(),
                CONFIG_DIR,
                SCHEMA_FILE,
                KEYDB_DIR
            )));
        }
        Ok(workspace)
    }

    /// Workspace root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the schema
    pub fn config_dir(&self) -> PathBuf {
        self.root.join(CONFIG_DIR)
    }

    /// Schema file
    pub fn schema_path(&self) -> PathBuf {
        self.config_dir().join(SCHEMA_FILE)
    }

    /// Key store directory
    pub fn keydb_dir(&self) -> PathBuf {
        self.root.join(KEYDB_DIR)
    }

    /// Archive directory
    pub fn archive_dir(&self) -> PathBuf {
        self.root.join(ARCHIVE_DIR)
    }

    /// Output directory
    pub fn files_dir(&self) -> PathBuf {
        self.root.join(FILES_DIR)
    }

    /// Log directory
    pub fn logs_dir(&self) -> PathBuf {
        self.root.join(LOGS_DIR)
    }

    /// Audit log file
    pub fn audit_log_path(&self) -> PathBuf {
        self.logs_dir().join(AUDIT_LOG_FILE)
    }

    /// Load the workspace schema
    pub fn load_schema(&self) -> std::result::Result<Schema, DeidentifyError> {
        Schema::load(self.schema_path())
    }
}
