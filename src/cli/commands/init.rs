//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use super::{EXIT_CONFIG, EXIT_FATAL, EXIT_OK};
use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "deidb.toml")]
    pub output: String,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing deidb configuration");
        println!();

        // Check if file already exists
        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(EXIT_CONFIG);
        }

        match fs::write(&self.output, Self::generate_config()) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} if the defaults do not fit", self.output);
                println!("  2. Create and activate a workspace: deidb activate <directory>");
                println!("  3. Describe your columns in <directory>/config/io.yaml");
                println!("  4. Check a file: deidb validate <file.csv>");
                println!("  5. De-identify it: deidb deid <file.csv>");
                println!();
                Ok(EXIT_OK)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {}", e);
                Ok(EXIT_FATAL)
            }
        }
    }

    /// Generate the configuration file contents
    fn generate_config() -> String {
        r#"# deidb Configuration File
# Every setting is optional; the values below are the defaults.

[application]
# Log level: trace, debug, info, warn, error
log_level = "info"

[workspace]
# File listing activated workspaces (most recent last)
# registry_path = "~/.deidb"

[deidentify]
# Draws of a fresh substitute before a run fails on collisions
max_substitution_attempts = 32

# Validate and transform only; never archive or write
dry_run = false

[audit]
# Append one record per run to <workspace>/logs/audit.log
enabled = true

# JSON lines (true) or plain text (false)
json_format = true

[logging]
# Also write JSON logs to local files
local_enabled = false
local_path = "logs"

# Rotation: daily, hourly, never
local_rotation = "daily"
"#
        .to_string()
    }
}
