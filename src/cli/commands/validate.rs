//! Validate command implementation
//!
//! Checks a CSV file against the workspace schema and the transform registry
//! without reading the key store or writing anything.

use super::{
    check_csv_input, exit_code_for, load_settings, report_error, resolve_workspace, EXIT_CONFIG,
    EXIT_OK,
};
use crate::deidentify::engine::included_value_counts;
use crate::deidentify::{validate, DeidentificationEngine, TransformRegistry};
use crate::domain::{Batch, DeidbError};
use clap::Args;
use std::path::PathBuf;

/// Arguments for the validate command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// CSV file to check
    pub input: PathBuf,

    /// Workspace directory (defaults to the active workspace)
    #[arg(short, long)]
    pub workspace: Option<PathBuf>,
}

impl ValidateArgs {
    /// Execute the validate command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(input = %self.input.display(), "Validating batch");

        println!("🔍 Validating {}", self.input.display());
        println!();

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

        let schema = match workspace.load_schema() {
            Ok(s) => {
                println!("✅ Schema loaded: {}", workspace.schema_path().display());
                s
            }
            Err(e) => {
                let e = DeidbError::from(e);
                report_error(&e);
                return Ok(exit_code_for(&e));
            }
        };

        let batch = match Batch::from_path(&self.input) {
            Ok(b) => b,
            Err(e) => {
                report_error(&e);
                return Ok(exit_code_for(&e));
            }
        };

        // Same registry a deid run would resolve functions against
        let engine = DeidentificationEngine::new(
            TransformRegistry::with_builtins(),
            config.deidentify.clone(),
            config.audit.clone(),
        );
        let registry = engine.registry();
        if let Err(e) = validate(&schema, batch.columns(), registry) {
            let e = DeidbError::from(e);
            report_error(&e);
            if matches!(
                e,
                DeidbError::Deidentify(crate::domain::DeidentifyError::UnknownTransform { .. })
            ) {
                println!();
                println!("Registered functions: {}", registry.names().join(", "));
            }
            return Ok(exit_code_for(&e));
        }

        println!("✅ Batch is valid ({} rows)", batch.len());
        println!();
        println!("{:<30} {:>10}", "Included column", "Values");
        println!("{}", "-".repeat(41));
        for (column, count) in included_value_counts(&batch, &schema) {
            println!("{:<30} {:>10}", column, count);
        }
        println!();
        Ok(EXIT_OK)
    }
}
