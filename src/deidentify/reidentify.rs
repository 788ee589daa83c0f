//! Re-identification
//!
//! Maps substitutes in a previously de-identified batch back to their
//! originals using the inverse of each column's key dictionary. Read-only:
//! the key store is never modified and nothing is archived.

use crate::deidentify::keystore::KeyStore;
use crate::deidentify::schema::ColumnRole;
use crate::deidentify::summary::ReidentifySummary;
use crate::domain::{Batch, Result};
use crate::workspace::Workspace;

/// Output file name for a re-identified input stem
pub fn reidentified_file_name(stem: &str) -> String {
    format!("{stem}_reidentified.csv")
}

/// Restore original values in `batch`
///
/// Included columns are looked up in the inverse key dictionary. Values with
/// no entry are left as they are and counted as unmatched. Excluded and
/// unknown columns are copied verbatim.
///
/// # Errors
///
/// Returns an error if the schema or key store cannot be loaded.
pub fn reidentify(batch: &Batch, workspace: &Workspace) -> Result<(Batch, ReidentifySummary)> {
    let schema = workspace.load_schema()?;
    let keystore = KeyStore::load(&workspace.keydb_dir(), &schema)?;

    let mut rows: Vec<Vec<String>> = batch.rows().to_vec();
    let mut summary = ReidentifySummary {
        rows: batch.len(),
        ..Default::default()
    };

    for (index, column) in batch.columns().iter().enumerate() {
        if !matches!(schema.role(column), ColumnRole::Included(_)) {
            continue;
        }
        let Some(keys) = keystore.column(column) else {
            continue;
        };
        if keys.has_ambiguous_substitutes() {
            tracing::warn!(column = %column, "Key store maps several originals to one substitute");
        }

        let inverse = keys.inverse();
        let mut restored = 0;
        let mut unmatched = 0;

        for row in rows.iter_mut() {
            let cell = &mut row[index];
            if cell.is_empty() {
                continue;
            }
            match inverse.get(cell.as_str()) {
                Some(original) => {
                    *cell = (*original).to_string();
                    restored += 1;
                }
                None => unmatched += 1,
            }
        }

        summary.restored.insert(column.clone(), restored);
        if unmatched > 0 {
            tracing::warn!(column = %column, unmatched, "Values without a key store entry");
            summary.unmatched.insert(column.clone(), unmatched);
        }
    }

    let output = Batch::new(batch.columns().to_vec(), rows)?;
    Ok((output, summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deidentify::DeidentificationEngine;
    use std::fs;
    use tempfile::TempDir;

    fn workspace(temp: &TempDir) -> Workspace {
        let ws = Workspace::create(temp.path().join("ws")).unwrap();
        fs::write(
            ws.schema_path(),
            "included:\n  mrn:\n    function: random_number_substitution\nexcluded:\n  - notes\n",
        )
        .unwrap();
        ws
    }

    #[test]
    fn test_round_trip() {
        let temp = TempDir::new().unwrap();
        let ws = workspace(&temp);
        let input = Batch::new(
            vec!["mrn".into(), "notes".into()],
            vec![
                vec!["A123".into(), "first".into()],
                vec!["".into(), "blank".into()],
                vec!["B456".into(), "second".into()],
            ],
        )
        .unwrap();

        let outcome = DeidentificationEngine::default()
            .deidentify(&input, "export", &ws)
            .unwrap();
        let (restored, summary) = reidentify(&outcome.output, &ws).unwrap();

        assert_eq!(restored, input);
        assert_eq!(summary.restored["mrn"], 2);
        assert_eq!(summary.total_unmatched(), 0);
    }

    #[test]
    fn test_unmatched_values_are_kept() {
        let temp = TempDir::new().unwrap();
        let ws = workspace(&temp);
        fs::write(ws.keydb_dir().join("mrn.json"), r#"{"A123":"A0000000000123"}"#).unwrap();

        let input = Batch::new(
            vec!["mrn".into()],
            vec![vec!["A0000000000123".into()], vec!["Z999".into()]],
        )
        .unwrap();
        let (restored, summary) = reidentify(&input, &ws).unwrap();

        assert_eq!(restored.rows()[0][0], "A123");
        assert_eq!(restored.rows()[1][0], "Z999");
        assert_eq!(summary.unmatched["mrn"], 1);
    }

    #[test]
    fn test_reidentified_file_name() {
        assert_eq!(
            reidentified_file_name("export_deidentified-20241019153000"),
            "export_deidentified-20241019153000_reidentified.csv"
        );
    }
}
