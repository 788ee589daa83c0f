//! Status command implementation
//!
//! This module implements the `status` command for displaying key counts,
//! archives and outputs of a workspace.

use super::{exit_code_for, load_settings, report_error, resolve_workspace, EXIT_CONFIG, EXIT_OK};
use crate::workspace::WorkspaceStatus;
use clap::Args;
use std::path::PathBuf;

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Workspace directory (defaults to the active workspace)
    #[arg(short, long)]
    pub workspace: Option<PathBuf>,
}

impl StatusArgs {
    /// Execute the status command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Checking workspace status");

        println!("📊 Workspace Status");
        println!();

        let config = match load_settings(config_path) {
            Ok(c) => c,
            Err(code) => return Ok(code),
        };

        let workspace = match resolve_workspace(self.workspace.as_deref(), &config) {
            Ok(ws) => ws,
            Err(e) => {
                println!("❌ {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        let status = match WorkspaceStatus::collect(&workspace) {
            Ok(s) => s,
            Err(e) => {
                report_error(&e);
                return Ok(exit_code_for(&e));
            }
        };

        println!("Workspace: {}", status.root.display());
        println!("Excluded columns: {}", status.excluded.len());
        println!();

        if status.included.is_empty() {
            println!("No included columns. Edit {} to add some.", workspace.schema_path().display());
        } else {
            println!("{:<30} {:>10}", "Included column", "Keys");
            println!("{}", "-".repeat(41));
            for column in &status.included {
                let count = status.key_counts.get(column).copied().unwrap_or(0);
                println!("{:<30} {:>10}", column, count);
            }
        }
        println!();

        match status.latest_archive() {
            Some(latest) => println!("Archives: {} (latest {latest})", status.archives.len()),
            None => println!("Archives: none"),
        }

        if status.outputs.is_empty() {
            println!("No outputs yet.");
            println!("Run 'deidb deid <file.csv>' to produce one.");
        } else {
            println!("Outputs:");
            for output in &status.outputs {
                println!("  {}", output.display());
            }
        }
        println!();
        Ok(EXIT_OK)
    }
}
