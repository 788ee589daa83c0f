//! Substitution registry
//!
//! Name-indexed collection of value transformers. The engine and the
//! validator both go through [`TransformRegistry::lookup`]; adding a transform
//! means implementing [`ValueTransformer`] and registering it under a new name.

pub mod alphanumeric;
pub mod digits;
pub mod token;

use anyhow::{bail, Result};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

pub use alphanumeric::RandomAlphanumericSubstitution;
pub use digits::RandomNumberSubstitution;
pub use token::RandomToken;

/// Static per-column configuration baked into a schema entry
///
/// Wraps the free-form `options` mapping of an included column. Transforms
/// read typed values from it and reject malformed ones.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformOptions {
    values: BTreeMap<String, serde_yaml::Value>,
}

impl TransformOptions {
    /// Wraps an options mapping
    pub fn new(values: BTreeMap<String, serde_yaml::Value>) -> Self {
        Self { values }
    }

    /// Reads a non-negative integer option, falling back to `default`
    pub fn get_usize(&self, key: &str, default: usize) -> Result<usize> {
        match self.values.get(key) {
            None => Ok(default),
            Some(value) => match value.as_u64() {
                Some(n) => Ok(usize::try_from(n)?),
                None => bail!("option '{key}' must be a non-negative integer, got {value:?}"),
            },
        }
    }

    /// Reads an optional string option
    pub fn get_str(&self, key: &str) -> Result<Option<&str>> {
        match self.values.get(key) {
            None => Ok(None),
            Some(value) => match value.as_str() {
                Some(s) => Ok(Some(s)),
                None => bail!("option '{key}' must be a string, got {value:?}"),
            },
        }
    }
}

/// Capability that turns one original value into one substitute
///
/// Implementations see only the original value and the column's static
/// options, never other columns or rows. They may be randomized; the engine
/// records every substitute it keeps, so determinism is not required.
pub trait ValueTransformer: Send + Sync {
    /// Name the transform is registered under
    fn name(&self) -> &'static str;

    /// Produce a substitute for `original`
    fn transform(&self, original: &str, options: &TransformOptions) -> Result<String>;
}

/// Lookup of a name that is not registered
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown function '{0}'")]
pub struct UnknownFunction(pub String);

/// Name → transformer mapping, built once at startup
pub struct TransformRegistry {
    transforms: HashMap<&'static str, Box<dyn ValueTransformer>>,
}

impl TransformRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            transforms: HashMap::new(),
        }
    }

    /// Create a registry holding every built-in transform
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(RandomNumberSubstitution);
        registry.register(RandomAlphanumericSubstitution);
        registry.register(RandomToken);
        registry
    }

    /// Register a transform under its own name, returning any transform it replaced
    pub fn register<T>(&mut self, transform: T) -> Option<Box<dyn ValueTransformer>>
    where
        T: ValueTransformer + 'static,
    {
        self.transforms.insert(transform.name(), Box::new(transform))
    }

    /// Resolve a transform by name
    ///
    /// # Errors
    ///
    /// Returns [`UnknownFunction`] if nothing is registered under `name`.
    pub fn lookup(&self, name: &str) -> std::result::Result<&dyn ValueTransformer, UnknownFunction> {
        self.transforms
            .get(name)
            .map(|t| t.as_ref())
            .ok_or_else(|| UnknownFunction(name.to_string()))
    }

    /// Whether a transform is registered under `name`
    pub fn contains(&self, name: &str) -> bool {
        self.transforms.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.transforms.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl Default for TransformRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Upper;

    impl ValueTransformer for Upper {
        fn name(&self) -> &'static str {
            "upper"
        }

        fn transform(&self, original: &str, _options: &TransformOptions) -> Result<String> {
            Ok(original.to_uppercase())
        }
    }

    #[test]
    fn test_builtins_registered() {
        let registry = TransformRegistry::with_builtins();
        assert_eq!(
            registry.names(),
            vec![
                "random_alphanumeric_substitution",
                "random_number_substitution",
                "random_token"
            ]
        );
    }

    #[test]
    fn test_lookup_unknown() {
        let registry = TransformRegistry::with_builtins();
        let err = registry.lookup("rot13").err().unwrap();
        assert_eq!(err, UnknownFunction("rot13".to_string()));
        assert_eq!(err.to_string(), "unknown function 'rot13'");
    }

    #[test]
    fn test_register_custom_transform() {
        let mut registry = TransformRegistry::new();
        assert!(!registry.contains("upper"));
        assert!(registry.register(Upper).is_none());

        let upper = registry.lookup("upper").unwrap();
        let out = upper.transform("abc", &TransformOptions::default()).unwrap();
        assert_eq!(out, "ABC");

        // Re-registering replaces the previous instance
        assert!(registry.register(Upper).is_some());
    }

    #[test]
    fn test_options_typed_access() {
        let mut values = BTreeMap::new();
        values.insert("padded_length".to_string(), serde_yaml::Value::from(12));
        values.insert("prefix".to_string(), serde_yaml::Value::from("PT"));
        let options = TransformOptions::new(values);

        assert_eq!(options.get_usize("padded_length", 10).unwrap(), 12);
        assert_eq!(options.get_usize("missing", 10).unwrap(), 10);
        assert_eq!(options.get_str("prefix").unwrap(), Some("PT"));
        assert!(options.get_usize("prefix", 0).is_err());
        assert!(options.get_str("padded_length").is_err());
    }
}
