//! Configuration schema types
//!
//! This module defines the structure of `deidb.toml`. Every section and field
//! has a default, so an empty file (or no file) is a valid configuration.

use crate::domain::Result;
use crate::workspace::WorkspaceRegistry;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main deidb configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeidbConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Workspace registry settings
    #[serde(default)]
    pub workspace: WorkspaceConfig,

    /// Deidentification run settings
    #[serde(default)]
    pub deidentify: DeidentifyConfig,

    /// Audit trail settings
    #[serde(default)]
    pub audit: AuditConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl DeidbConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> std::result::Result<(), String> {
        self.application.validate()?;
        self.workspace.validate()?;
        self.deidentify.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl ApplicationConfig {
    fn validate(&self) -> std::result::Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Workspace registry configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// Registry file of activated workspaces (default `~/.deidb`)
    #[serde(default)]
    pub registry_path: Option<String>,
}

impl WorkspaceConfig {
    fn validate(&self) -> std::result::Result<(), String> {
        if let Some(path) = &self.registry_path {
            if path.trim().is_empty() {
                return Err("workspace.registry_path cannot be empty".to_string());
            }
        }
        Ok(())
    }

    /// Registry selected by this configuration
    ///
    /// A leading `~/` is expanded against `HOME`.
    pub fn registry(&self) -> Result<WorkspaceRegistry> {
        match &self.registry_path {
            Some(path) => Ok(WorkspaceRegistry::new(expand_home(path))),
            None => WorkspaceRegistry::default_location(),
        }
    }
}

/// Deidentification run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeidentifyConfig {
    /// Attempts at drawing an unused substitute before a run fails
    #[serde(default = "default_max_substitution_attempts")]
    pub max_substitution_attempts: usize,

    /// Validate and transform without archiving or committing
    #[serde(default)]
    pub dry_run: bool,
}

impl DeidentifyConfig {
    fn validate(&self) -> std::result::Result<(), String> {
        if self.max_substitution_attempts == 0 {
            return Err("deidentify.max_substitution_attempts must be > 0".to_string());
        }
        Ok(())
    }
}

impl Default for DeidentifyConfig {
    fn default() -> Self {
        Self {
            max_substitution_attempts: default_max_substitution_attempts(),
            dry_run: false,
        }
    }
}

/// Audit trail configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Append a record to `logs/audit.log` for every run
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Write JSON lines instead of plain text
    #[serde(default = "default_true")]
    pub json_format: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            json_format: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> std::result::Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }

        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path cannot be empty when local logging is enabled".to_string());
        }

        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    PathBuf::from(path)
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_substitution_attempts() -> usize {
    32
}

fn default_local_path() -> String {
    "logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_application_config_validation() {
        let mut config = ApplicationConfig {
            log_level: "info".to_string(),
        };

        assert!(config.validate().is_ok());

        config.log_level = "invalid".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deidentify_config_validation() {
        let mut config = DeidentifyConfig::default();
        assert!(config.validate().is_ok());

        config.max_substitution_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_logging_config_default() {
        let config = LoggingConfig::default();
        assert!(!config.local_enabled);
        assert_eq!(config.local_path, "logs");
        assert_eq!(config.local_rotation, "daily");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_logging_config_rejects_unknown_rotation() {
        let config = LoggingConfig {
            local_rotation: "weekly".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: DeidbConfig = toml::from_str("").unwrap();
        assert_eq!(config.application.log_level, "info");
        assert_eq!(config.deidentify.max_substitution_attempts, 32);
        assert!(!config.deidentify.dry_run);
        assert!(config.audit.enabled);
        assert!(config.audit.json_format);
        assert!(config.workspace.registry_path.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_explicit_registry_path() {
        let config = WorkspaceConfig {
            registry_path: Some("/tmp/registry".to_string()),
        };
        let registry = config.registry().unwrap();
        assert_eq!(registry.path(), std::path::Path::new("/tmp/registry"));
    }

    #[test]
    fn test_default_values() {
        assert_eq!(default_log_level(), "info");
        assert_eq!(default_max_substitution_attempts(), 32);
        assert_eq!(default_local_rotation(), "daily");
    }
}
