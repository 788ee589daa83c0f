//! Workspace status report

use crate::deidentify::archive::ArchiveManager;
use crate::deidentify::keystore::KeyStore;
use crate::domain::context::ResultExt;
use crate::domain::ids::ArchiveId;
use crate::domain::Result;
use crate::workspace::Workspace;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

/// Snapshot of what a workspace contains
#[derive(Debug, Clone)]
pub struct WorkspaceStatus {
    /// Workspace root
    pub root: PathBuf,
    /// Included columns in the schema
    pub included: Vec<String>,
    /// Excluded columns in the schema
    pub excluded: Vec<String>,
    /// Recorded keys per included column
    pub key_counts: BTreeMap<String, usize>,
    /// Archive snapshots, oldest first
    pub archives: Vec<ArchiveId>,
    /// Output files, sorted by name
    pub outputs: Vec<PathBuf>,
}

impl WorkspaceStatus {
    /// Gather the status of `workspace`
    pub fn collect(workspace: &Workspace) -> Result<Self> {
        let schema = workspace.load_schema()?;
        let keystore = KeyStore::load(&workspace.keydb_dir(), &schema)?;
        let archives = ArchiveManager::new(workspace).list()?;

        let mut outputs = Vec::new();
        let files_dir = workspace.files_dir();
        if files_dir.is_dir() {
            for entry in fs::read_dir(&files_dir)
                .with_context(|| format!("Failed to list {}", files_dir.display()))?
            {
                let path = entry?.path();
                let hidden = path
                    .file_name()
                    .is_some_and(|n| n.to_string_lossy().starts_with('.'));
                if path.is_file() && !hidden {
                    outputs.push(path);
                }
            }
        }
        outputs.sort();

        Ok(Self {
            root: workspace.root().to_path_buf(),
            included: schema.included.keys().cloned().collect(),
            excluded: schema.excluded.clone(),
            key_counts: keystore.sizes(),
            archives,
            outputs,
        })
    }

    /// Total recorded keys
    pub fn total_keys(&self) -> usize {
        self.key_counts.values().sum()
    }

    /// Most recent archive, if any
    pub fn latest_archive(&self) -> Option<&ArchiveId> {
        self.archives.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_collect_fresh_workspace() {
        let temp = TempDir::new().unwrap();
        let ws = Workspace::create(temp.path().join("ws")).unwrap();

        let status = WorkspaceStatus::collect(&ws).unwrap();
        assert_eq!(status.root, ws.root());
        assert_eq!(status.total_keys(), 0);
        assert!(status.archives.is_empty());
        assert!(status.outputs.is_empty());
        assert!(status.latest_archive().is_none());
    }

    #[test]
    fn test_collect_counts_keys_and_outputs() {
        let temp = TempDir::new().unwrap();
        let ws = Workspace::create(temp.path().join("ws")).unwrap();
        fs::write(
            ws.schema_path(),
            "included:\n  mrn:\n    function: random_number_substitution\n",
        )
        .unwrap();
        fs::write(
            ws.keydb_dir().join("mrn.json"),
            r#"{"A1":"A0000000001","B2":"B0000000002"}"#,
        )
        .unwrap();
        fs::write(ws.files_dir().join("x_deidentified-20241019153000.csv"), "mrn\n").unwrap();
        fs::write(ws.files_dir().join(".x.tmp"), "").unwrap();

        let status = WorkspaceStatus::collect(&ws).unwrap();
        assert_eq!(status.key_counts["mrn"], 2);
        assert_eq!(status.included, vec!["mrn"]);
        assert_eq!(status.outputs.len(), 1);
    }
}
