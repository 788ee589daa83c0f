//! Workspace schema (`config/io.yaml`)
//!
//! Declares which columns are de-identified and with which transform, and
//! which columns pass through unchanged.
//!
//! ```yaml
//! included:
//!   mrn:
//!     type: identifier
//!     options:
//!       padded_length: 10
//!   name:
//!     function: random_alphanumeric_substitution
//! excluded:
//!   - notes
//! type_functions:
//!   identifier: random_number_substitution
//! ```

use crate::deidentify::registry::TransformOptions;
use crate::domain::errors::DeidentifyError;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Schema written into freshly created workspaces
pub const SCHEMA_TEMPLATE: &str = r#"# deidb workspace schema
#
# Every column of an input file must be listed either under `included`
# (values are replaced and recorded in keydb/) or under `excluded`
# (values are copied unchanged).

included:
  # mrn:
  #   type: identifier
  #   options:
  #     padded_length: 10
  # name:
  #   function: random_alphanumeric_substitution

excluded:
  # - notes

# Default function per type, used when a column sets `type` but no `function`
type_functions:
  identifier: random_number_substitution
  name: random_alphanumeric_substitution
  token: random_token
"#;

/// One included column
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Semantic type, resolved through `type_functions` when `function` is unset
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub column_type: Option<String>,

    /// Registry name of the transform
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,

    /// Static transform configuration
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, serde_yaml::Value>,
}

impl ColumnSpec {
    /// Options wrapped for transform consumption
    pub fn transform_options(&self) -> TransformOptions {
        TransformOptions::new(self.options.clone())
    }
}

/// How a batch column is treated by a run
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColumnRole<'a> {
    /// Values are substituted
    Included(&'a ColumnSpec),
    /// Values are copied verbatim
    Excluded,
    /// Column is not covered by the schema
    Unknown,
}

/// Included/excluded column declaration for a workspace
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Columns to de-identify
    #[serde(default, deserialize_with = "null_as_default")]
    pub included: BTreeMap<String, ColumnSpec>,

    /// Columns passed through unchanged
    #[serde(default, deserialize_with = "null_as_default")]
    pub excluded: Vec<String>,

    /// Type name → default function name
    #[serde(default, deserialize_with = "null_as_default")]
    pub type_functions: BTreeMap<String, String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Schema {
    /// Parse a schema from YAML text and check its structure
    ///
    /// # Errors
    ///
    /// Returns [`DeidentifyError::InvalidSchema`] on YAML errors or when
    /// [`check`](Self::check) fails.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, DeidentifyError> {
        let schema: Schema = serde_yaml::from_str(yaml)
            .map_err(|e| DeidentifyError::InvalidSchema(format!("YAML parse error: {e}")))?;
        schema.check()?;
        Ok(schema)
    }

    /// Load a schema file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DeidentifyError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            DeidentifyError::InvalidSchema(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&contents)
    }

    /// Structural checks that do not depend on a batch or a registry
    ///
    /// Included column names become key-store file stems, so they must be
    /// non-empty and free of path components. A column cannot be both
    /// included and excluded.
    pub fn check(&self) -> Result<(), DeidentifyError> {
        let unsafe_names: Vec<&str> = self
            .included
            .keys()
            .filter(|name| !is_file_safe(name))
            .map(String::as_str)
            .collect();
        if !unsafe_names.is_empty() {
            return Err(DeidentifyError::InvalidSchema(format!(
                "included column names cannot be used as key file names: {unsafe_names:?}"
            )));
        }

        let overlap: Vec<&str> = self
            .excluded
            .iter()
            .filter(|name| self.included.contains_key(name.as_str()))
            .map(String::as_str)
            .collect();
        if !overlap.is_empty() {
            return Err(DeidentifyError::InvalidSchema(format!(
                "columns are both included and excluded: {overlap:?}"
            )));
        }

        Ok(())
    }

    /// Classify a batch column
    pub fn role(&self, column: &str) -> ColumnRole<'_> {
        if let Some(spec) = self.included.get(column) {
            ColumnRole::Included(spec)
        } else if self.excluded.iter().any(|c| c == column) {
            ColumnRole::Excluded
        } else {
            ColumnRole::Unknown
        }
    }

    /// Function name bound to an included column
    ///
    /// An explicit `function` wins; otherwise the column's `type` is looked
    /// up in `type_functions`. Returns `None` when neither resolves.
    pub fn resolve_function(&self, column: &str) -> Option<&str> {
        let spec = self.included.get(column)?;
        spec.function.as_deref().or_else(|| {
            spec.column_type
                .as_deref()
                .and_then(|t| self.type_functions.get(t))
                .map(String::as_str)
        })
    }
}

fn is_file_safe(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
included:
  mrn:
    type: identifier
    options:
      padded_length: 12
  name:
    function: random_alphanumeric_substitution
  dob:
    type: date
excluded:
  - notes
  - ward
type_functions:
  identifier: random_number_substitution
"#;

    #[test]
    fn test_parse_sample() {
        let schema = Schema::from_yaml_str(SAMPLE).unwrap();
        assert_eq!(schema.included.len(), 3);
        assert_eq!(schema.excluded, vec!["notes", "ward"]);
        let options = schema.included["mrn"].transform_options();
        assert_eq!(options.get_usize("padded_length", 10).unwrap(), 12);
    }

    #[test]
    fn test_resolve_function_precedence() {
        let schema = Schema::from_yaml_str(SAMPLE).unwrap();
        assert_eq!(
            schema.resolve_function("mrn"),
            Some("random_number_substitution")
        );
        assert_eq!(
            schema.resolve_function("name"),
            Some("random_alphanumeric_substitution")
        );
        // type without a type_functions entry
        assert_eq!(schema.resolve_function("dob"), None);
        // not included at all
        assert_eq!(schema.resolve_function("notes"), None);
    }

    #[test]
    fn test_roles() {
        let schema = Schema::from_yaml_str(SAMPLE).unwrap();
        assert!(matches!(schema.role("mrn"), ColumnRole::Included(_)));
        assert_eq!(schema.role("notes"), ColumnRole::Excluded);
        assert_eq!(schema.role("age"), ColumnRole::Unknown);
    }

    #[test]
    fn test_template_parses_with_null_sections() {
        let schema = Schema::from_yaml_str(SCHEMA_TEMPLATE).unwrap();
        assert!(schema.included.is_empty());
        assert!(schema.excluded.is_empty());
        assert_eq!(
            schema.type_functions.get("identifier").map(String::as_str),
            Some("random_number_substitution")
        );
    }

    #[test]
    fn test_unsafe_column_name_rejected() {
        let yaml = "included:\n  \"../mrn\":\n    function: random_token\n";
        let err = Schema::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, DeidentifyError::InvalidSchema(_)));
        assert!(err.to_string().contains("../mrn"));
    }

    #[test]
    fn test_overlap_rejected() {
        let yaml = "included:\n  mrn:\n    function: random_token\nexcluded:\n  - mrn\n";
        let err = Schema::from_yaml_str(yaml).unwrap_err();
        assert!(err.to_string().contains("both included and excluded"));
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(Schema::from_yaml_str("included: [unclosed").is_err());
    }
}
