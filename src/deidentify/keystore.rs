//! Persistent key store
//!
//! One original → substitute dictionary per included column, stored as a flat
//! JSON object in `keydb/<column>.json`. The store is loaded in full at the
//! start of a run, grown in memory, and staged back to disk at commit time.

use crate::deidentify::commit::{discard_all, StagedFile};
use crate::deidentify::schema::Schema;
use crate::domain::errors::DeidentifyError;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Key dictionary of a single column
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnKeys {
    forward: BTreeMap<String, String>,
    substitutes: HashSet<String>,
}

impl ColumnKeys {
    /// Build from a persisted mapping
    pub fn from_map(forward: BTreeMap<String, String>) -> Self {
        let substitutes = forward.values().cloned().collect();
        Self {
            forward,
            substitutes,
        }
    }

    /// Substitute recorded for `original`
    pub fn get(&self, original: &str) -> Option<&str> {
        self.forward.get(original).map(String::as_str)
    }

    /// Whether `value` is already used as a substitute
    pub fn is_substitute(&self, value: &str) -> bool {
        self.substitutes.contains(value)
    }

    /// Record a new pair; an already known original keeps its substitute
    pub fn insert(&mut self, original: impl Into<String>, substitute: impl Into<String>) -> bool {
        let original = original.into();
        if self.forward.contains_key(&original) {
            return false;
        }
        let substitute = substitute.into();
        self.substitutes.insert(substitute.clone());
        self.forward.insert(original, substitute);
        true
    }

    /// Number of recorded originals
    pub fn len(&self) -> usize {
        self.forward.len()
    }

    /// Whether nothing is recorded
    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// Whether two originals share a substitute
    pub fn has_ambiguous_substitutes(&self) -> bool {
        self.substitutes.len() != self.forward.len()
    }

    /// Pairs in original-value order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.forward.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Substitute → original lookup
    pub fn inverse(&self) -> HashMap<&str, &str> {
        self.forward
            .iter()
            .map(|(k, v)| (v.as_str(), k.as_str()))
            .collect()
    }

    fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec_pretty(&self.forward)
    }
}

/// Key dictionaries of all included columns
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyStore {
    columns: BTreeMap<String, ColumnKeys>,
}

impl KeyStore {
    /// Create an empty key store
    pub fn new() -> Self {
        Self::default()
    }

    /// Path of a column's key file inside `dir`
    pub fn key_file(dir: &Path, column: &str) -> PathBuf {
        dir.join(format!("{column}.json"))
    }

    /// Load the dictionaries of every column included in `schema`
    ///
    /// A column without a key file starts empty. Key files of columns that
    /// are no longer included are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`DeidentifyError::KeyStore`] if a key file exists but cannot
    /// be read or is not a flat string → string JSON object.
    pub fn load(dir: &Path, schema: &Schema) -> Result<Self, DeidentifyError> {
        let mut columns = BTreeMap::new();

        for column in schema.included.keys() {
            let path = Self::key_file(dir, column);
            let keys = if path.is_file() {
                let bytes = fs::read(&path).map_err(|e| {
                    DeidentifyError::KeyStore(format!("Failed to read {}: {e}", path.display()))
                })?;
                let map: BTreeMap<String, String> =
                    serde_json::from_slice(&bytes).map_err(|e| {
                        DeidentifyError::KeyStore(format!(
                            "Invalid key file {}: {e}",
                            path.display()
                        ))
                    })?;
                ColumnKeys::from_map(map)
            } else {
                ColumnKeys::default()
            };

            if keys.has_ambiguous_substitutes() {
                tracing::warn!(
                    column = %column,
                    "Key file maps several originals to one substitute; re-identification is ambiguous"
                );
            }

            tracing::debug!(column = %column, keys = keys.len(), "Loaded key dictionary");
            columns.insert(column.clone(), keys);
        }

        Ok(Self { columns })
    }

    /// Dictionary of one column
    pub fn column(&self, column: &str) -> Option<&ColumnKeys> {
        self.columns.get(column)
    }

    /// Dictionary of one column, created empty if missing
    pub fn column_mut(&mut self, column: &str) -> &mut ColumnKeys {
        self.columns.entry(column.to_string()).or_default()
    }

    /// Key count per column
    pub fn sizes(&self) -> BTreeMap<String, usize> {
        self.columns
            .iter()
            .map(|(name, keys)| (name.clone(), keys.len()))
            .collect()
    }

    /// Total number of recorded originals
    pub fn total_keys(&self) -> usize {
        self.columns.values().map(ColumnKeys::len).sum()
    }

    /// Write every column to a temporary sibling of its key file
    ///
    /// Nothing is visible under the final names until the returned files are
    /// committed. On failure every file staged so far is removed.
    pub fn stage(&self, dir: &Path, tag: &str) -> Result<Vec<StagedFile>, DeidentifyError> {
        let mut staged = Vec::with_capacity(self.columns.len());

        for (column, keys) in &self.columns {
            let result = keys
                .to_json()
                .map_err(|e| e.to_string())
                .and_then(|bytes| {
                    StagedFile::write(Self::key_file(dir, column), tag, &bytes)
                        .map_err(|e| e.to_string())
                });

            match result {
                Ok(file) => staged.push(file),
                Err(e) => {
                    discard_all(staged);
                    return Err(DeidentifyError::PersistenceFailure(format!(
                        "Failed to stage key file for column '{column}': {e}"
                    )));
                }
            }
        }

        Ok(staged)
    }
}
