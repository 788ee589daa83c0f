//! Deid command implementation
//!
//! Runs the deidentification engine on one CSV file.

use super::{
    check_csv_input, exit_code_for, load_settings, report_error, resolve_workspace, EXIT_CONFIG,
    EXIT_FATAL, EXIT_OK,
};
use crate::deidentify::{DeidentificationEngine, TransformRegistry};
use clap::Args;
use std::path::PathBuf;

/// Arguments for the deid command
#[derive(Args, Debug)]
pub struct DeidArgs {
    /// CSV file to de-identify
    pub input: PathBuf,

    /// Workspace directory (defaults to the active workspace)
    #[arg(short, long)]
    pub workspace: Option<PathBuf>,

    /// Validate and transform without archiving or writing anything
    #[arg(long)]
    pub dry_run: bool,
}

impl DeidArgs {
    /// Execute the deid command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(input = %self.input.display(), "Starting deid command");

        let mut config = match load_settings(config_path) {
            Ok(c) => c,
            Err(code) => return Ok(code),
        };
        if self.dry_run {
            config.deidentify.dry_run = true;
        }

        if let Err(e) = check_csv_input(&self.input) {
            println!("❌ {e}");
            return Ok(EXIT_CONFIG);
        }

        let workspace = match resolve_workspace(self.workspace.as_deref(), &config) {
            Ok(ws) => ws,
            Err(e) => {
                println!("❌ {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        let engine = DeidentificationEngine::new(
            TransformRegistry::with_builtins(),
            config.deidentify.clone(),
            config.audit.clone(),
        );

        if engine.is_dry_run() {
            println!("🔍 Dry run: nothing will be archived or written");
        }
        println!("🔐 De-identifying {}", self.input.display());
        println!("   Workspace: {}", workspace.root().display());
        println!();
        let input = self.input.clone();
        let joined = tokio::task::spawn_blocking(move || engine.deidentify_file(&input, &workspace))
            .await;

        let outcome = match joined {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => {
                report_error(&e);
                return Ok(exit_code_for(&e));
            }
            Err(e) => {
                println!("❌ Deidentification task failed: {e}");
                return Ok(EXIT_FATAL);
            }
        };

        let summary = &outcome.summary;
        println!("✅ Processed {} rows in {:?}", summary.rows, summary.duration);
        println!();
        println!("{:<30} {:>10} {:>10} {:>10}", "Column", "New", "Reused", "Blank");
        println!("{}", "-".repeat(63));
        for (column, stats) in &summary.columns {
            println!(
                "{:<30} {:>10} {:>10} {:>10}",
                column, stats.created, stats.reused, stats.blank
            );
        }
        if !summary.passthrough_columns.is_empty() {
            println!();
            println!("Passed through: {}", summary.passthrough_columns.join(", "));
        }
        println!();

        if let Some(archive_id) = &summary.archive_id {
            println!("📦 Archived previous state as {archive_id}");
        }
        if let Some(output) = &summary.output_path {
            println!("📄 Output: {}", output.display());
        }
        Ok(EXIT_OK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::EXIT_VALIDATION;
    use crate::workspace::Workspace;
    use std::fs;
    use tempfile::TempDir;

    fn setup(temp: &TempDir) -> (Workspace, PathBuf) {
        let ws = Workspace::create(temp.path().join("ws")).unwrap();
        fs::write(
            ws.schema_path(),
            "included:\n  mrn:\n    function: random_number_substitution\nexcluded:\n  - notes\n",
        )
        .unwrap();
        let input = temp.path().join("export.csv");
        fs::write(&input, "mrn,notes\nA123,hello\n").unwrap();
        (ws, input)
    }

    #[tokio::test]
    async fn test_deid_writes_output() {
        let temp = TempDir::new().unwrap();
        let (ws, input) = setup(&temp);
        let args = DeidArgs {
            input,
            workspace: Some(ws.root().to_path_buf()),
            dry_run: false,
        };

        let code = args
            .execute(&temp.path().join("missing.toml").to_string_lossy())
            .await
            .unwrap();
        assert_eq!(code, EXIT_OK);
        assert_eq!(fs::read_dir(ws.files_dir()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_deid_dry_run_writes_nothing() {
        let temp = TempDir::new().unwrap();
        let (ws, input) = setup(&temp);
        let args = DeidArgs {
            input,
            workspace: Some(ws.root().to_path_buf()),
            dry_run: true,
        };

        let code = args
            .execute(&temp.path().join("missing.toml").to_string_lossy())
            .await
            .unwrap();
        assert_eq!(code, EXIT_OK);
        assert_eq!(fs::read_dir(ws.files_dir()).unwrap().count(), 0);
        assert_eq!(fs::read_dir(ws.archive_dir()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_deid_unknown_column_exit_code() {
        let temp = TempDir::new().unwrap();
        let (ws, _) = setup(&temp);
        let input = temp.path().join("other.csv");
        fs::write(&input, "ssn\n123\n").unwrap();
        let args = DeidArgs {
            input,
            workspace: Some(ws.root().to_path_buf()),
            dry_run: false,
        };

        let code = args
            .execute(&temp.path().join("missing.toml").to_string_lossy())
            .await
            .unwrap();
        assert_eq!(code, EXIT_VALIDATION);
    }

    #[tokio::test]
    async fn test_deid_rejects_non_csv() {
        let temp = TempDir::new().unwrap();
        let (ws, _) = setup(&temp);
        let input = temp.path().join("export.tsv");
        fs::write(&input, "mrn\nA123\n").unwrap();
        let args = DeidArgs {
            input,
            workspace: Some(ws.root().to_path_buf()),
            dry_run: false,
        };

        let code = args
            .execute(&temp.path().join("missing.toml").to_string_lossy())
            .await
            .unwrap();
        assert_eq!(code, EXIT_CONFIG);
    }
}
