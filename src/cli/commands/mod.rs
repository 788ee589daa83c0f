//! CLI command implementations
//!
//! This module contains all CLI command implementations and the helpers they
//! share for loading configuration and resolving the target workspace.

pub mod activate;
pub mod deid;
pub mod init;
pub mod reid;
pub mod status;
pub mod validate;

use crate::config::{load_config_or_default, DeidbConfig};
use crate::domain::errors::{DeidbError, DeidentifyError};
use crate::domain::Result;
use crate::workspace::Workspace;
use std::path::Path;

/// Success
pub const EXIT_OK: i32 = 0;
/// Batch rejected by validation
pub const EXIT_VALIDATION: i32 = 1;
/// Configuration or workspace error
pub const EXIT_CONFIG: i32 = 2;
/// Archive or persistence failure
pub const EXIT_PERSISTENCE: i32 = 3;
/// Fatal error
pub const EXIT_FATAL: i32 = 5;

/// Load configuration, printing the failure the way every command does
pub(crate) fn load_settings(config_path: &str) -> std::result::Result<DeidbConfig, i32> {
    load_config_or_default(config_path).map_err(|e| {
        println!("❌ Failed to load configuration file");
        println!("   Error: {e}");
        EXIT_CONFIG
    })
}

/// Workspace named on the command line, or the most recently activated one
pub(crate) fn resolve_workspace(explicit: Option<&Path>, config: &DeidbConfig) -> Result<Workspace> {
    match explicit {
        Some(root) => Workspace::open(root),
        None => {
            let root = config.workspace.registry()?.active()?;
            Workspace::open(root)
        }
    }
}

/// Input files must be CSV
pub(crate) fn check_csv_input(path: &Path) -> std::result::Result<(), String> {
    let is_csv = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if !is_csv {
        return Err(format!("{} is not a .csv file", path.display()));
    }
    if !path.is_file() {
        return Err(format!("{} does not exist", path.display()));
    }
    Ok(())
}

/// Exit code for a library error
pub(crate) fn exit_code_for(error: &DeidbError) -> i32 {
    match error {
        DeidbError::Deidentify(
            DeidentifyError::SchemaMismatch { .. }
            | DeidentifyError::UnknownTransform { .. }
            | DeidentifyError::InvalidBatch(_)
            | DeidentifyError::Transform { .. },
        ) => EXIT_VALIDATION,
        DeidbError::Deidentify(
            DeidentifyError::ArchiveFailure(_) | DeidentifyError::PersistenceFailure(_),
        ) => EXIT_PERSISTENCE,
        DeidbError::Deidentify(DeidentifyError::InvalidSchema(_) | DeidentifyError::KeyStore(_))
        | DeidbError::Configuration(_)
        | DeidbError::Workspace(_) => EXIT_CONFIG,
        _ => EXIT_FATAL,
    }
}

/// Print a library error, listing offending columns one per line
pub(crate) fn report_error(error: &DeidbError) {
    println!("❌ {error}");
    if let DeidbError::Deidentify(e) = error {
        for column in e.offending_columns() {
            println!("   - {column}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use test_case::test_case;

    #[test_case(DeidentifyError::SchemaMismatch { columns: vec![] }, EXIT_VALIDATION ; "schema mismatch")]
    #[test_case(DeidentifyError::UnknownTransform { columns: vec![] }, EXIT_VALIDATION ; "unknown transform")]
    #[test_case(DeidentifyError::ArchiveFailure("x".into()), EXIT_PERSISTENCE ; "archive failure")]
    #[test_case(DeidentifyError::PersistenceFailure("x".into()), EXIT_PERSISTENCE ; "persistence failure")]
    #[test_case(DeidentifyError::InvalidSchema("x".into()), EXIT_CONFIG ; "invalid schema")]
    fn test_exit_code_for(error: DeidentifyError, expected: i32) {
        assert_eq!(exit_code_for(&DeidbError::Deidentify(error)), expected);
    }

    #[test]
    fn test_check_csv_input() {
        let temp = TempDir::new().unwrap();
        let csv = temp.path().join("export.csv");
        let txt = temp.path().join("export.txt");
        std::fs::write(&csv, "mrn\n").unwrap();
        std::fs::write(&txt, "mrn\n").unwrap();

        assert!(check_csv_input(&csv).is_ok());
        assert!(check_csv_input(&txt).is_err());
        assert!(check_csv_input(&temp.path().join("missing.csv")).is_err());
    }

    #[test]
    fn test_resolve_workspace_from_registry() {
        let temp = TempDir::new().unwrap();
        let ws = Workspace::create(temp.path().join("ws")).unwrap();
        let mut config = DeidbConfig::default();
        config.workspace.registry_path =
            Some(temp.path().join("registry").to_string_lossy().into_owned());

        assert!(resolve_workspace(None, &config).is_err());

        config.workspace.registry().unwrap().activate(&ws).unwrap();
        assert_eq!(resolve_workspace(None, &config).unwrap(), ws);
        assert_eq!(resolve_workspace(Some(ws.root()), &config).unwrap(), ws);
    }
}
