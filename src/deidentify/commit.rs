//! Staged file writes
//!
//! Files are first written to a hidden temporary sibling and only renamed over
//! their target once every file of a run has been staged. A rename within one
//! directory replaces the target in a single step.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// A fully written temporary file waiting to replace its target
#[derive(Debug)]
pub struct StagedFile {
    temp: PathBuf,
    target: PathBuf,
}

impl StagedFile {
    /// Write `contents` next to `target`, tagged with `tag` to avoid clashes
    pub fn write(target: impl Into<PathBuf>, tag: &str, contents: &[u8]) -> io::Result<Self> {
        let target = target.into();
        let file_name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("{} has no file name", target.display()),
                )
            })?;
        let temp = target.with_file_name(format!(".{file_name}.{tag}.tmp"));

        if let Err(e) = write_synced(&temp, contents) {
            let _ = fs::remove_file(&temp);
            return Err(e);
        }

        Ok(Self { temp, target })
    }

    /// Final location of the file
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Rename the temporary file over the target
    pub fn commit(self) -> io::Result<PathBuf> {
        fs::rename(&self.temp, &self.target)?;
        Ok(self.target)
    }

    /// Remove the temporary file, leaving the target untouched
    pub fn discard(self) {
        if let Err(e) = fs::remove_file(&self.temp) {
            tracing::warn!(path = %self.temp.display(), error = %e, "Failed to remove staged file");
        }
    }
}

/// Write `contents` and flush them to disk before returning
fn write_synced(path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(contents)?;
    file.sync_all()
}

/// Discard every staged file
pub fn discard_all(staged: Vec<StagedFile>) {
    for file in staged {
        file.discard();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_commit_replaces_target() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("mrn.json");
        fs::write(&target, "old").unwrap();

        let staged = StagedFile::write(&target, "run1", b"new").unwrap();
        // Target untouched until commit
        assert_eq!(fs::read_to_string(&target).unwrap(), "old");

        staged.commit().unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "new");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_discard_leaves_target() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("mrn.json");
        fs::write(&target, "old").unwrap();

        let staged = StagedFile::write(&target, "run1", b"new").unwrap();
        discard_all(vec![staged]);

        assert_eq!(fs::read_to_string(&target).unwrap(), "old");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_staged_contents_are_complete_before_commit() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("visits.csv");
        let contents = "mrn\n".repeat(10_000);

        let staged = StagedFile::write(&target, "run1", contents.as_bytes()).unwrap();
        assert!(!target.exists());
        assert_eq!(fs::read_to_string(&staged.temp).unwrap(), contents);

        assert_eq!(staged.commit().unwrap(), target);
        assert_eq!(fs::read_to_string(&target).unwrap(), contents);
    }

    #[test]
    fn test_write_into_missing_directory_fails() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("missing").join("mrn.json");
        assert!(StagedFile::write(&target, "run1", b"x").is_err());
    }
}
