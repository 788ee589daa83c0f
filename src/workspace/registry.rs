//! Activated workspace registry
//!
//! A plain text file listing activated workspace roots, one per line, most
//! recently activated last. Only the CLI consults it to pick a default
//! workspace; library calls always take an explicit [`Workspace`].

use crate::domain::errors::DeidbError;
use crate::domain::Result;
use crate::workspace::Workspace;
use std::fs;
use std::path::{Path, PathBuf};

/// Registry file name under the home directory
pub const DEFAULT_REGISTRY_FILE: &str = ".deidb";

/// Durable list of activated workspaces
#[derive(Debug, Clone)]
pub struct WorkspaceRegistry {
    path: PathBuf,
}

impl WorkspaceRegistry {
    /// Registry backed by `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Registry at `~/.deidb`
    ///
    /// # Errors
    ///
    /// Returns [`DeidbError::Workspace`] when `HOME` is not set.
    pub fn default_location() -> Result<Self> {
        let home = std::env::var_os("HOME").ok_or_else(|| {
            DeidbError::Workspace("HOME is not set; configure workspace.registry_path".to_string())
        })?;
        Ok(Self::new(Path::new(&home).join(DEFAULT_REGISTRY_FILE)))
    }

    /// Backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Activated workspace roots, oldest first
    pub fn entries(&self) -> Result<Vec<PathBuf>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let contents = fs::read_to_string(&self.path).map_err(|e| {
            DeidbError::Workspace(format!(
                "Failed to read workspace registry {}: {e}",
                self.path.display()
            ))
        })?;

        Ok(contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(PathBuf::from)
            .collect())
    }

    /// Whether `root` has been activated before
    pub fn contains(&self, root: &Path) -> Result<bool> {
        Ok(self.entries()?.iter().any(|p| p == root))
    }

    /// Mark a workspace as the most recently activated one
    pub fn activate(&self, workspace: &Workspace) -> Result<()> {
        let root = workspace.root().to_path_buf();
        let mut entries = self.entries()?;
        entries.retain(|p| p != &root);
        entries.push(root);

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut contents = String::new();
        for entry in &entries {
            contents.push_str(&entry.to_string_lossy());
            contents.push('\n');
        }
        fs::write(&self.path, contents).map_err(|e| {
            DeidbError::Workspace(format!(
                "Failed to write workspace registry {}: {e}",
                self.path.display()
            ))
        })?;

        tracing::info!(workspace = %workspace.root().display(), "Workspace activated");
        Ok(())
    }

    /// Most recently activated workspace root
    ///
    /// # Errors
    ///
    /// Returns [`DeidbError::Workspace`] if nothing has been activated yet.
    pub fn active(&self) -> Result<PathBuf> {
        self.entries()?.pop().ok_or_else(|| {
            DeidbError::Workspace(
                "No active workspace found. Run 'deidb activate <directory>' first.".to_string(),
            )
        })
    }
}
