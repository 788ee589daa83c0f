//! Reid command implementation
//!
//! Maps substitutes in a de-identified CSV file back to their originals.

use super::{
    check_csv_input, exit_code_for, load_settings, report_error, resolve_workspace, EXIT_CONFIG,
    EXIT_FATAL, EXIT_OK,
};
use crate::deidentify::reidentify::{reidentified_file_name, reidentify};
use crate::domain::Batch;
use clap::Args;
use std::fs::File;
use std::path::PathBuf;

/// Arguments for the reid command
#[derive(Args, Debug)]
pub struct ReidArgs {
    /// De-identified CSV file
    pub input: PathBuf,

    /// Workspace directory (defaults to the active workspace)
    #[arg(short, long)]
    pub workspace: Option<PathBuf>,

    /// Output path (defaults to `<stem>_reidentified.csv` in the workspace `files/`)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl ReidArgs {
    /// Execute the reid command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(input = %self.input.display(), "Starting reid command");

        let config = match load_settings(config_path) {
            Ok(c) => c,
            Err(code) => return Ok(code),
        };

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

        let batch = match Batch::from_path(&self.input) {
            Ok(b) => b,
            Err(e) => {
                report_error(&e);
                return Ok(exit_code_for(&e));
            }
        };

        let (restored, summary) = match reidentify(&batch, &workspace) {
            Ok(result) => result,
            Err(e) => {
                report_error(&e);
                return Ok(exit_code_for(&e));
            }
        };

        let output = self.output.clone().unwrap_or_else(|| {
            let stem = self
                .input
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "batch".to_string());
            workspace.files_dir().join(reidentified_file_name(&stem))
        });

        let written = File::create(&output)
            .map_err(crate::domain::DeidbError::from)
            .and_then(|file| restored.write_to(file));
        if let Err(e) = written {
            println!("❌ Failed to write {}", output.display());
            println!("   Error: {e}");
            return Ok(EXIT_FATAL);
        }

        println!("✅ Re-identified {} rows", summary.rows);
        for (column, count) in &summary.restored {
            println!("   {column}: {count} restored");
        }
        if summary.total_unmatched() > 0 {
            println!();
            println!("⚠️  Values without a key store entry were left unchanged:");
            for (column, count) in &summary.unmatched {
                println!("   {column}: {count}");
            }
        }
        println!();
        println!("📄 Output: {}", output.display());
        Ok(EXIT_OK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workspace::Workspace;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_reid_restores_values() {
        let temp = TempDir::new().unwrap();
        let ws = Workspace::create(temp.path().join("ws")).unwrap();
        fs::write(
            ws.schema_path(),
            "included:\n  mrn:\n    function: random_number_substitution\n",
        )
        .unwrap();
        fs::write(ws.keydb_dir().join("mrn.json"), r#"{"A123":"A0000000000123"}"#).unwrap();

        let input = temp.path().join("out.csv");
        fs::write(&input, "mrn\nA0000000000123\n").unwrap();
        let output = temp.path().join("back.csv");

        let args = ReidArgs {
            input,
            workspace: Some(ws.root().to_path_buf()),
            output: Some(output.clone()),
        };
        let code = args
            .execute(&temp.path().join("missing.toml").to_string_lossy())
            .await
            .unwrap();

        assert_eq!(code, EXIT_OK);
        assert_eq!(fs::read_to_string(output).unwrap(), "mrn\nA123\n");
    }
}
