//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::paths::normalize_path;
use crate::types::KeelConfig;
use std::path::Path;

/// Name of the project configuration file.
pub const CONFIG_FILE_NAME: &str = "keel.toml";

/// Loads and validates `<project_dir>/keel.toml`.
///
/// A missing file yields the default configuration. Relative paths in the
/// file are resolved against `project_dir`.
pub fn load_config(project_dir: &Path) -> Result<KeelConfig, ConfigError> {
    let config_path = project_dir.join(CONFIG_FILE_NAME);
    if !config_path.exists() {
        let mut config = KeelConfig::default();
        resolve_paths(&mut config, project_dir);
        return Ok(config);
    }
    load_config_file(&config_path, project_dir)
}

/// Loads and validates a configuration file at an explicit path, resolving
/// relative paths against `project_dir`.
pub fn load_config_file(path: &Path, project_dir: &Path) -> Result<KeelConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut config = load_config_from_str(&content)?;
    resolve_paths(&mut config, project_dir);
    Ok(config)
}

/// Parses and validates a `keel.toml` configuration from a string.
///
/// Paths are left as written.
pub fn load_config_from_str(content: &str) -> Result<KeelConfig, ConfigError> {
    let config: KeelConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

fn resolve_paths(config: &mut KeelConfig, root: &Path) {
    let solc = &mut config.compiler.solc;
    for list in [
        &mut solc.allow_paths,
        &mut solc.exclude_paths,
        &mut solc.include_paths,
    ] {
        for p in list.iter_mut() {
            *p = normalize_path(root, p);
        }
    }
}

/// Validates that configuration values are consistent.
fn validate_config(config: &KeelConfig) -> Result<(), ConfigError> {
    let svm = &config.svm;
    if svm.min_version > svm.max_version {
        return Err(ConfigError::ValidationError(format!(
            "svm.min_version {} exceeds svm.max_version {}",
            svm.min_version, svm.max_version
        )));
    }
    if config.build.jobs == Some(0) {
        return Err(ConfigError::ValidationError(
            "build.jobs must be at least 1".to_string(),
        ));
    }
    Ok(())
}
