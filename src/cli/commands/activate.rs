//! Activate command implementation
//!
//! Creates the workspace layout if needed and records the workspace as the
//! default target of later commands.

use super::{load_settings, EXIT_CONFIG, EXIT_OK};
use crate::workspace::Workspace;
use clap::Args;
use std::path::PathBuf;

/// Arguments for the activate command
#[derive(Args, Debug)]
pub struct ActivateArgs {
    /// Workspace directory
    pub directory: PathBuf,
}

impl ActivateArgs {
    /// Execute the activate command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(directory = %self.directory.display(), "Activating workspace");

        let config = match load_settings(config_path) {
            Ok(c) => c,
            Err(code) => return Ok(code),
        };

        let workspace = match Workspace::create(&self.directory) {
            Ok(ws) => ws,
            Err(e) => {
                println!("❌ Failed to create workspace");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        let registry = match config.workspace.registry() {
            Ok(r) => r,
            Err(e) => {
                println!("❌ {e}");
                return Ok(EXIT_CONFIG);
            }
        };
        if let Err(e) = registry.activate(&workspace) {
            println!("❌ Failed to activate workspace");
            println!("   Error: {e}");
            return Ok(EXIT_CONFIG);
        }

        println!("✅ Workspace active: {}", workspace.root().display());
        println!();
        println!("Next steps:");
        println!("  1. Edit {} to list included and excluded columns", workspace.schema_path().display());
        println!("  2. Check a file: deidb validate <file.csv>");
        println!("  3. De-identify it: deidb deid <file.csv>");
        Ok(EXIT_OK)
    }
}
