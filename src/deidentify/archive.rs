//! Archive manager
//!
//! Before a run overwrites anything, the current `config/` and `keydb/`
//! directories are copied into `archive/<archive_id>/`. The copy is built in a
//! hidden staging directory and renamed into place in one step, so a snapshot
//! is either complete under its final name or absent.

use crate::domain::errors::DeidentifyError;
use crate::domain::ids::ArchiveId;
use crate::workspace::layout::{CONFIG_DIR, KEYDB_DIR};
use crate::workspace::Workspace;
use chrono::{DateTime, Local};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Upper bound on same-second collision suffixes
const MAX_SUFFIX: u32 = 10_000;

/// Creates, lists and restores archive snapshots of one workspace
pub struct ArchiveManager<'a> {
    workspace: &'a Workspace,
}

impl<'a> ArchiveManager<'a> {
    /// Manager for `workspace`
    pub fn new(workspace: &'a Workspace) -> Self {
        Self { workspace }
    }

    /// Directory of a snapshot
    pub fn snapshot_dir(&self, id: &ArchiveId) -> PathBuf {
        self.workspace.archive_dir().join(id.as_str())
    }

    /// Snapshot the current schema and key store
    pub fn snapshot(&self) -> Result<ArchiveId, DeidentifyError> {
        self.snapshot_at(&Local::now())
    }

    /// Snapshot using `at` as the wall-clock time of the run
    ///
    /// If a snapshot with the same second already exists, the id gets the
    /// next free numeric suffix.
    ///
    /// # Errors
    ///
    /// Returns [`DeidentifyError::ArchiveFailure`] if the copy fails; the
    /// staging directory is removed in that case.
    pub fn snapshot_at(&self, at: &DateTime<Local>) -> Result<ArchiveId, DeidentifyError> {
        let archive_dir = self.workspace.archive_dir();
        fs::create_dir_all(&archive_dir).map_err(|e| {
            DeidentifyError::ArchiveFailure(format!(
                "Failed to create {}: {e}",
                archive_dir.display()
            ))
        })?;

        let (id, staging) = self.claim_staging(&ArchiveId::from_datetime(at))?;

        if let Err(e) = self.copy_state(&staging) {
            let _ = fs::remove_dir_all(&staging);
            return Err(DeidentifyError::ArchiveFailure(format!(
                "Failed to copy workspace state into archive {id}: {e}"
            )));
        }

        let target = self.snapshot_dir(&id);
        if let Err(e) = fs::rename(&staging, &target) {
            let _ = fs::remove_dir_all(&staging);
            return Err(DeidentifyError::ArchiveFailure(format!(
                "Failed to finalize archive {}: {e}",
                target.display()
            )));
        }

        tracing::info!(archive_id = %id, path = %target.display(), "Archived workspace state");
        Ok(id)
    }

    /// Reserve the first free id at or after `base` by creating its staging directory
    fn claim_staging(&self, base: &ArchiveId) -> Result<(ArchiveId, PathBuf), DeidentifyError> {
        let archive_dir = self.workspace.archive_dir();

        for n in 0..MAX_SUFFIX {
            let id = base.with_suffix(n);
            if self.snapshot_dir(&id).exists() {
                continue;
            }

            let staging = archive_dir.join(format!(".{id}.partial"));
            match fs::create_dir(&staging) {
                Ok(()) => return Ok((id, staging)),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    return Err(DeidentifyError::ArchiveFailure(format!(
                        "Failed to create staging directory {}: {e}",
                        staging.display()
                    )))
                }
            }
        }

        Err(DeidentifyError::ArchiveFailure(format!(
            "No free archive id for timestamp {}",
            base.timestamp()
        )))
    }

    fn copy_state(&self, staging: &Path) -> io::Result<()> {
        copy_dir_recursive(&self.workspace.config_dir(), &staging.join(CONFIG_DIR))?;
        copy_dir_recursive(&self.workspace.keydb_dir(), &staging.join(KEYDB_DIR))
    }

    /// Snapshot ids in chronological order
    ///
    /// Staging directories and unrelated entries are skipped.
    pub fn list(&self) -> Result<Vec<ArchiveId>, DeidentifyError> {
        let archive_dir = self.workspace.archive_dir();
        if !archive_dir.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&archive_dir).map_err(|e| {
            DeidentifyError::ArchiveFailure(format!(
                "Failed to list {}: {e}",
                archive_dir.display()
            ))
        })?;

        let mut ids: Vec<ArchiveId> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| ArchiveId::new(entry.file_name().to_string_lossy()).ok())
            .collect();
        ids.sort();
        Ok(ids)
    }

    /// Replace the live key store with the one archived under `id`
    ///
    /// Key files absent from the snapshot are removed, so the live `keydb/`
    /// ends up identical to the archived one.
    pub fn restore_keystore(&self, id: &ArchiveId) -> Result<(), DeidentifyError> {
        let source = self.snapshot_dir(id).join(KEYDB_DIR);
        if !source.is_dir() {
            return Err(DeidentifyError::ArchiveFailure(format!(
                "Archive {id} has no key store"
            )));
        }

        let live = self.workspace.keydb_dir();
        restore_dir(&source, &live).map_err(|e| {
            DeidentifyError::ArchiveFailure(format!("Failed to restore key store from {id}: {e}"))
        })?;

        tracing::warn!(archive_id = %id, "Restored key store from archive");
        Ok(())
    }
}

fn restore_dir(source: &Path, live: &Path) -> io::Result<()> {
    fs::create_dir_all(live)?;
    for entry in fs::read_dir(live)? {
        let entry = entry?;
        if entry.file_type()?.is_file() && !source.join(entry.file_name()).exists() {
            fs::remove_file(entry.path())?;
        }
    }
    for entry in fs::read_dir(source)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            fs::copy(entry.path(), live.join(entry.file_name()))?;
        }
    }
    Ok(())
}

/// Recursively copy `src` into a new directory `dst`
fn copy_dir_recursive(src: &Path, dst: &Path) -> io::Result<()> {
    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let target = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_recursive(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn workspace(temp: &TempDir) -> Workspace {
        let ws = Workspace::create(temp.path().join("ws")).unwrap();
        fs::write(ws.keydb_dir().join("mrn.json"), r#"{"A123":"A000"}"#).unwrap();
        ws
    }

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 10, 19, 15, 30, 0).unwrap()
    }

    #[test]
    fn test_snapshot_copies_state() {
        let temp = TempDir::new().unwrap();
        let ws = workspace(&temp);
        let manager = ArchiveManager::new(&ws);

        let id = manager.snapshot_at(&fixed_time()).unwrap();
        assert_eq!(id.as_str(), "20241019153000");

        let dir = manager.snapshot_dir(&id);
        assert!(dir.join(CONFIG_DIR).join("io.yaml").is_file());
        assert_eq!(
            fs::read_to_string(dir.join(KEYDB_DIR).join("mrn.json")).unwrap(),
            r#"{"A123":"A000"}"#
        );
    }

    #[test]
    fn test_same_second_snapshots_get_suffix() {
        let temp = TempDir::new().unwrap();
        let ws = workspace(&temp);
        let manager = ArchiveManager::new(&ws);

        let first = manager.snapshot_at(&fixed_time()).unwrap();
        let second = manager.snapshot_at(&fixed_time()).unwrap();
        let third = manager.snapshot_at(&fixed_time()).unwrap();

        assert_eq!(second.as_str(), "20241019153000-1");
        assert_eq!(third.as_str(), "20241019153000-2");
        assert_eq!(manager.list().unwrap(), vec![first, second, third]);
    }

    #[test]
    fn test_list_skips_staging_and_files() {
        let temp = TempDir::new().unwrap();
        let ws = workspace(&temp);
        fs::create_dir(ws.archive_dir().join(".20241019153000.partial")).unwrap();
        fs::write(ws.archive_dir().join("README"), "x").unwrap();

        assert!(ArchiveManager::new(&ws).list().unwrap().is_empty());
    }

    #[test]
    fn test_failed_copy_leaves_no_partial_snapshot() {
        let temp = TempDir::new().unwrap();
        let ws = workspace(&temp);
        fs::remove_dir_all(ws.keydb_dir()).unwrap();

        let manager = ArchiveManager::new(&ws);
        let err = manager.snapshot_at(&fixed_time()).unwrap_err();
        assert!(matches!(err, DeidentifyError::ArchiveFailure(_)));
        assert_eq!(fs::read_dir(ws.archive_dir()).unwrap().count(), 0);
    }

    #[test]
    fn test_restore_keystore() {
        let temp = TempDir::new().unwrap();
        let ws = workspace(&temp);
        let manager = ArchiveManager::new(&ws);
        let id = manager.snapshot_at(&fixed_time()).unwrap();

        fs::write(ws.keydb_dir().join("mrn.json"), r#"{"A123":"CHANGED"}"#).unwrap();
        fs::write(ws.keydb_dir().join("name.json"), r#"{}"#).unwrap();

        manager.restore_keystore(&id).unwrap();
        assert_eq!(
            fs::read_to_string(ws.keydb_dir().join("mrn.json")).unwrap(),
            r#"{"A123":"A000"}"#
        );
        assert!(!ws.keydb_dir().join("name.json").exists());
    }
}
