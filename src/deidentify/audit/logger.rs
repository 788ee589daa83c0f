//! Audit logger for deidentification runs

use crate::deidentify::summary::RunSummary;
use crate::domain::ids::RunId;
use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Audit log entry for a completed run
#[derive(Debug, Serialize)]
struct AuditLogEntry {
    timestamp: String,
    run_id: String,
    status: &'static str,
    input_path: Option<String>,
    /// SHA-256 of the input file (never log record values)
    input_sha256: Option<String>,
    output_path: Option<String>,
    archive_id: Option<String>,
    rows: usize,
    new_keys: BTreeMap<String, usize>,
    duration_ms: u64,
}

/// Audit log entry for a run that aborted
#[derive(Debug, Serialize)]
struct AuditFailureEntry {
    timestamp: String,
    run_id: String,
    status: &'static str,
    input_path: Option<String>,
    error: String,
}

/// Append-only audit trail of runs
pub struct AuditLogger {
    log_path: PathBuf,
    json_format: bool,
    enabled: bool,
}

impl AuditLogger {
    /// Create a new audit logger
    pub fn new(log_path: PathBuf, json_format: bool, enabled: bool) -> Result<Self> {
        if enabled {
            // Ensure parent directory exists
            if let Some(parent) = log_path.parent() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create audit log directory: {}", parent.display())
                })?;
            }
        }

        Ok(Self {
            log_path,
            json_format,
            enabled,
        })
    }

    /// Log a completed run
    pub fn log_run(&self, summary: &RunSummary) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        let entry = AuditLogEntry {
            timestamp: Utc::now().to_rfc3339(),
            run_id: summary.run_id.to_string(),
            status: "completed",
            input_path: summary.input_path.as_deref().map(display_path),
            input_sha256: summary.input_sha256.clone(),
            output_path: summary.output_path.as_deref().map(display_path),
            archive_id: summary.archive_id.as_ref().map(ToString::to_string),
            rows: summary.rows,
            new_keys: summary.new_keys_by_column(),
            duration_ms: u64::try_from(summary.duration.as_millis()).unwrap_or(u64::MAX),
        };

        if self.json_format {
            self.write_json(&entry)
        } else {
            self.write_line(&format!(
                "[{}] Run: {} | Deidentification complete. Input: {} Output: {} | Archive: {} | Rows: {} | New keys: {}",
                entry.timestamp,
                entry.run_id,
                entry.input_path.as_deref().unwrap_or("-"),
                entry.output_path.as_deref().unwrap_or("-"),
                entry.archive_id.as_deref().unwrap_or("-"),
                entry.rows,
                summary.new_keys()
            ))
        }
    }

    /// Log a run that aborted before completing
    pub fn log_failure(
        &self,
        run_id: &RunId,
        input_path: Option<&Path>,
        error: &dyn std::fmt::Display,
    ) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        let entry = AuditFailureEntry {
            timestamp: Utc::now().to_rfc3339(),
            run_id: run_id.to_string(),
            status: "failed",
            input_path: input_path.map(display_path),
            error: error.to_string(),
        };

        if self.json_format {
            self.write_json(&entry)
        } else {
            self.write_line(&format!(
                "[{}] Run: {} | Deidentification failed. Input: {} | Error: {}",
                entry.timestamp,
                entry.run_id,
                entry.input_path.as_deref().unwrap_or("-"),
                entry.error
            ))
        }
    }

    fn write_json<T: Serialize>(&self, entry: &T) -> Result<()> {
        let json_line = serde_json::to_string(entry).context("Failed to serialize audit entry")?;
        self.write_line(&json_line)
    }

    /// Append one line to the log file
    fn write_line(&self, line: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .with_context(|| format!("Failed to open audit log: {}", self.log_path.display()))?;

        writeln!(file, "{line}").context("Failed to write audit entry")?;
        file.sync_data().context("Failed to flush audit entry")?;
        Ok(())
    }
}

fn display_path(path: &Path) -> String {
    path.display().to_string()
}

/// Hash file contents using SHA-256
pub fn hash_contents(contents: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(contents);
    let result = hasher.finalize();
    format!("{result:x}")
}
