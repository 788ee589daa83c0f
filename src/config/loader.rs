//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::DeidbConfig;
use crate::domain::errors::DeidbError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into DeidbConfig
/// 4. Applies environment variable overrides (DEIDB_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if:
/// - File cannot be read
/// - TOML parsing fails
/// - A referenced environment variable is not set
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use deidb::config::loader::load_config;
///
/// let config = load_config("deidb.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<DeidbConfig> {
    let path = path.as_ref();

    // Check if file exists
    if !path.exists() {
        return Err(DeidbError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    // Read file contents
    let contents = fs::read_to_string(path).map_err(|e| {
        DeidbError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    // Perform environment variable substitution
    let contents = substitute_env_vars(&contents)?;

    // Parse TOML
    let config: DeidbConfig = toml::from_str(&contents)
        .map_err(|e| DeidbError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    finish(config)
}

/// Loads configuration, falling back to defaults when the file does not exist
///
/// Environment overrides and validation still apply to the defaults.
pub fn load_config_or_default(path: impl AsRef<Path>) -> Result<DeidbConfig> {
    let path = path.as_ref();
    if path.exists() {
        load_config(path)
    } else {
        tracing::debug!(path = %path.display(), "No configuration file, using defaults");
        finish(DeidbConfig::default())
    }
}

fn finish(mut config: DeidbConfig) -> Result<DeidbConfig> {
    // Apply environment variable overrides
    apply_env_overrides(&mut config);

    // Validate configuration
    config.validate().map_err(|e| {
        DeidbError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap_or_else(|e| unreachable!("{e}"))
    })
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// # Errors
///
/// Returns an error if a referenced environment variable is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = env_var_pattern();
    let mut result = String::new();
    let mut missing_vars = Vec::new();

    // Process line by line to skip comments
    for line in input.lines() {
        let trimmed = line.trim_start();

        // Skip comment lines - don't process env vars in comments
        if trimmed.starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{}}}", var_name);
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.contains(&var_name.to_string()) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(DeidbError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Applies environment variable overrides using DEIDB_* prefix
///
/// Environment variables follow the pattern: DEIDB_<SECTION>_<KEY>
/// For example: DEIDB_AUDIT_ENABLED, DEIDB_DEIDENTIFY_DRY_RUN
fn apply_env_overrides(config: &mut DeidbConfig) {
    // Application overrides
    if let Ok(val) = std::env::var("DEIDB_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // Workspace overrides
    if let Ok(val) = std::env::var("DEIDB_REGISTRY_PATH") {
        config.workspace.registry_path = Some(val);
    }

    // Deidentify overrides
    if let Ok(val) = std::env::var("DEIDB_DEIDENTIFY_MAX_SUBSTITUTION_ATTEMPTS") {
        if let Ok(attempts) = val.parse() {
            config.deidentify.max_substitution_attempts = attempts;
        }
    }
    if let Ok(val) = std::env::var("DEIDB_DEIDENTIFY_DRY_RUN") {
        config.deidentify.dry_run = val.parse().unwrap_or(false);
    }

    // Audit overrides
    if let Ok(val) = std::env::var("DEIDB_AUDIT_ENABLED") {
        config.audit.enabled = val.parse().unwrap_or(true);
    }
    if let Ok(val) = std::env::var("DEIDB_AUDIT_JSON_FORMAT") {
        config.audit.json_format = val.parse().unwrap_or(true);
    }

    // Logging overrides
    if let Ok(val) = std::env::var("DEIDB_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(false);
    }
    if let Ok(val) = std::env::var("DEIDB_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
    if let Ok(val) = std::env::var("DEIDB_LOGGING_LOCAL_ROTATION") {
        config.logging.local_rotation = val;
    }
}
