//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for deidb using clap.
//!
//! Exit codes:
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | Success |
//! | 1 | Batch rejected by validation |
//! | 2 | Configuration or workspace error |
//! | 3 | Archive or persistence failure |
//! | 5 | Fatal error |

pub mod commands;

use clap::{Parser, Subcommand};

/// deidb - consistent, reversible pseudonymization of tabular records
#[derive(Parser, Debug)]
#[command(name = "deidb")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "deidb.toml", env = "DEIDB_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "DEIDB_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create (if needed) and activate a workspace
    Activate(commands::activate::ActivateArgs),

    /// De-identify a CSV file
    Deid(commands::deid::DeidArgs),

    /// Restore original values in a de-identified CSV file
    Reid(commands::reid::ReidArgs),

    /// Check a CSV file against the workspace schema
    Validate(commands::validate::ValidateArgs),

    /// Show workspace status
    Status(commands::status::StatusArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_cli_parse_deid() {
        let cli = Cli::parse_from(["deidb", "deid", "export.csv"]);
        assert_eq!(cli.config, "deidb.toml");
        match cli.command {
            Commands::Deid(args) => {
                assert_eq!(args.input, PathBuf::from("export.csv"));
                assert!(!args.dry_run);
                assert!(args.workspace.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_deid_with_flags() {
        let cli = Cli::parse_from([
            "deidb",
            "deid",
            "export.csv",
            "--workspace",
            "/data/study",
            "--dry-run",
        ]);
        match cli.command {
            Commands::Deid(args) => {
                assert!(args.dry_run);
                assert_eq!(args.workspace, Some(PathBuf::from("/data/study")));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_with_config() {
        let cli = Cli::parse_from(["deidb", "--config", "custom.toml", "status"]);
        assert_eq!(cli.config, "custom.toml");
        assert!(matches!(cli.command, Commands::Status(_)));
    }

    #[test]
    fn test_cli_parse_with_log_level() {
        let cli = Cli::parse_from(["deidb", "--log-level", "debug", "status"]);
        assert_eq!(cli.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_cli_parse_activate() {
        let cli = Cli::parse_from(["deidb", "activate", "/data/study"]);
        assert!(matches!(cli.command, Commands::Activate(_)));
    }

    #[test]
    fn test_cli_parse_reid_with_output() {
        let cli = Cli::parse_from(["deidb", "reid", "out.csv", "--output", "back.csv"]);
        match cli.command {
            Commands::Reid(args) => assert_eq!(args.output, Some(PathBuf::from("back.csv"))),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_validate() {
        let cli = Cli::parse_from(["deidb", "validate", "export.csv"]);
        assert!(matches!(cli.command, Commands::Validate(_)));
    }

    #[test]
    fn test_cli_parse_init() {
        let cli = Cli::parse_from(["deidb", "init"]);
        assert!(matches!(cli.command, Commands::Init(_)));
    }

    #[test]
    fn test_cli_requires_input_file() {
        assert!(Cli::try_parse_from(["deidb", "deid"]).is_err());
    }
}
