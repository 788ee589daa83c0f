//! Run summaries
//!
//! Structures for tracking and reporting what a run did.

use crate::domain::ids::{ArchiveId, RunId};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Per-column substitution counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ColumnStats {
    /// Values resolved from the existing key store
    pub reused: usize,
    /// Values that received a new substitute during this run
    pub created: usize,
    /// Empty cells passed through
    pub blank: usize,
}

/// Summary of a deidentification run
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Unique id of the run
    pub run_id: RunId,

    /// When the run started
    pub started_at: DateTime<Utc>,

    /// Whether the run skipped archive and commit
    pub dry_run: bool,

    /// Input file, when the batch came from disk
    pub input_path: Option<PathBuf>,

    /// SHA-256 of the input file contents
    pub input_sha256: Option<String>,

    /// Output file written by the commit step
    pub output_path: Option<PathBuf>,

    /// Snapshot taken before the commit
    pub archive_id: Option<ArchiveId>,

    /// Number of data rows processed
    pub rows: usize,

    /// Substitution counts per included column
    pub columns: BTreeMap<String, ColumnStats>,

    /// Columns copied verbatim
    pub passthrough_columns: Vec<String>,

    /// Wall-clock duration
    pub duration: Duration,
}

impl RunSummary {
    /// Create an empty summary for a run starting now
    pub fn new(run_id: RunId, dry_run: bool) -> Self {
        Self {
            run_id,
            started_at: Utc::now(),
            dry_run,
            input_path: None,
            input_sha256: None,
            output_path: None,
            archive_id: None,
            rows: 0,
            columns: BTreeMap::new(),
            passthrough_columns: Vec::new(),
            duration: Duration::ZERO,
        }
    }

    /// Keys added to the key store by this run
    pub fn new_keys(&self) -> usize {
        self.columns.values().map(|s| s.created).sum()
    }

    /// Values resolved from earlier runs or earlier rows
    pub fn reused_keys(&self) -> usize {
        self.columns.values().map(|s| s.reused).sum()
    }

    /// New keys per column
    pub fn new_keys_by_column(&self) -> BTreeMap<String, usize> {
        self.columns
            .iter()
            .map(|(column, stats)| (column.clone(), stats.created))
            .collect()
    }
}

/// Summary of a re-identification pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReidentifySummary {
    /// Number of data rows processed
    pub rows: usize,
    /// Values mapped back to their original, per column
    pub restored: BTreeMap<String, usize>,
    /// Non-empty values with no key store entry, per column
    pub unmatched: BTreeMap<String, usize>,
}

impl ReidentifySummary {
    /// Total unmatched values across columns
    pub fn total_unmatched(&self) -> usize {
        self.unmatched.values().sum()
    }
}
