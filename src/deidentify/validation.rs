//! Schema/batch validation
//!
//! Purely a column-name and registry-level check; row values are never read.

use crate::deidentify::registry::TransformRegistry;
use crate::deidentify::schema::{ColumnRole, Schema};
use crate::domain::errors::DeidentifyError;

/// Check that a batch can be processed under `schema`
///
/// Fails with [`DeidentifyError::SchemaMismatch`] naming every batch column
/// (in batch order) that is neither included nor excluded. Otherwise collects
/// every included column whose function does not resolve in `registry` and
/// fails with [`DeidentifyError::UnknownTransform`] naming all of them.
///
/// # Examples
///
/// ```
/// use deidb::deidentify::{registry::TransformRegistry, schema::Schema, validation::validate};
///
/// let schema = Schema::from_yaml_str("included:\n  mrn:\n    function: random_token\n").unwrap();
/// let registry = TransformRegistry::with_builtins();
/// assert!(validate(&schema, &["mrn".to_string()], &registry).is_ok());
/// assert!(validate(&schema, &["age".to_string()], &registry).is_err());
/// ```
pub fn validate(
    schema: &Schema,
    batch_columns: &[String],
    registry: &TransformRegistry,
) -> Result<(), DeidentifyError> {
    let unrecognized: Vec<String> = batch_columns
        .iter()
        .filter(|c| schema.role(c) == ColumnRole::Unknown)
        .cloned()
        .collect();
    if !unrecognized.is_empty() {
        return Err(DeidentifyError::SchemaMismatch {
            columns: unrecognized,
        });
    }

    let unresolved: Vec<String> = schema
        .included
        .keys()
        .filter(|column| {
            schema
                .resolve_function(column)
                .map_or(true, |name| !registry.contains(name))
        })
        .cloned()
        .collect();
    if !unresolved.is_empty() {
        return Err(DeidentifyError::UnknownTransform {
            columns: unresolved,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn schema() -> Schema {
        Schema::from_yaml_str(
            r#"
included:
  mrn:
    function: random_number_substitution
  name:
    type: name
excluded:
  - notes
type_functions:
  name: random_alphanumeric_substitution
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_valid_batch() {
        let registry = TransformRegistry::with_builtins();
        assert!(validate(&schema(), &columns(&["mrn", "name", "notes"]), &registry).is_ok());
    }

    #[test]
    fn test_subset_of_schema_is_valid() {
        let registry = TransformRegistry::with_builtins();
        assert!(validate(&schema(), &columns(&["notes"]), &registry).is_ok());
    }

    #[test]
    fn test_unrecognized_columns_all_reported() {
        let registry = TransformRegistry::with_builtins();
        let err = validate(
            &schema(),
            &columns(&["age", "mrn", "postcode"]),
            &registry,
        )
        .unwrap_err();

        match err {
            DeidentifyError::SchemaMismatch { columns } => {
                assert_eq!(columns, vec!["age", "postcode"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unknown_functions_all_reported() {
        let schema = Schema::from_yaml_str(
            r#"
included:
  mrn:
    function: rot13
  name:
    type: person
  code:
    function: random_token
  dob: {}
"#,
        )
        .unwrap();
        let registry = TransformRegistry::with_builtins();

        let err = validate(&schema, &columns(&["mrn"]), &registry).unwrap_err();
        match err {
            DeidentifyError::UnknownTransform { columns } => {
                assert_eq!(columns, vec!["dob", "mrn", "name"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_column_check_precedes_function_check() {
        let schema = Schema::from_yaml_str("included:\n  mrn:\n    function: rot13\n").unwrap();
        let registry = TransformRegistry::with_builtins();
        let err = validate(&schema, &columns(&["age"]), &registry).unwrap_err();
        assert!(matches!(err, DeidentifyError::SchemaMismatch { .. }));
    }
}
