//! Configuration loading and discovery for `gsmaterial.toml`
//!
//! Provides functions to find, load, and merge configuration. Values are
//! layered: file (or defaults), then environment, then CLI overrides.

use super::schema::AppConfig;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file name searched for when no path is given.
pub const CONFIG_FILENAME: &str = "gsmaterial.toml";

/// Configuration loading error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error
    #[error("Failed to parse gsmaterial.toml: {0}")]
    Parse(#[from] toml::de::Error),
    /// Environment variable with an unusable value
    #[error("Invalid value for {name}: '{value}'")]
    Env { name: &'static str, value: String },
    /// Validation error
    #[error("Config validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<String>),
}

/// CLI arguments that can override config values
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    /// Override data directory
    pub data_dir: Option<PathBuf>,
    /// Override 3-star filtering
    pub skip_three: Option<bool>,
    /// Override asset mirror prefix
    pub mirror: Option<String>,
}

/// Find `gsmaterial.toml` by walking up from the current working directory.
pub fn find_config() -> Option<PathBuf> {
    env::current_dir().ok().and_then(find_config_from)
}

/// Find `gsmaterial.toml` by walking up from a specific directory.
pub fn find_config_from(start: PathBuf) -> Option<PathBuf> {
    let mut current = start;

    loop {
        let config_path = current.join(CONFIG_FILENAME);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Load configuration from a file, or defaults when none is found.
///
/// If a path is provided it must exist. Otherwise `find_config()` is used and
/// a missing file yields `AppConfig::default()`.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => find_config(),
    };

    match config_path {
        Some(p) => {
            let contents = fs::read_to_string(&p)?;
            Ok(toml::from_str(&contents)?)
        }
        None => Ok(AppConfig::default()),
    }
}

/// Apply `GSMATERIAL_*` environment variables.
///
/// | Variable | Field |
/// |----------|-------|
/// | `GSMATERIAL_DATA_DIR` | `storage.data_dir` |
/// | `GSMATERIAL_SKIP_THREE` | `render.skip_three` |
/// | `GSMATERIAL_SCHEDULER` | `schedule.time`, or `schedule.enabled` for a boolean |
/// | `GSMATERIAL_MIRROR` | `network.mirror` |
pub fn apply_env_overrides(config: &mut AppConfig) -> Result<(), ConfigError> {
    if let Ok(dir) = env::var("GSMATERIAL_DATA_DIR") {
        if !dir.trim().is_empty() {
            config.storage.data_dir = PathBuf::from(dir.trim());
        }
    }

    if let Ok(value) = env::var("GSMATERIAL_SKIP_THREE") {
        config.render.skip_three = parse_bool(&value)
            .ok_or(ConfigError::Env { name: "GSMATERIAL_SKIP_THREE", value })?;
    }

    if let Ok(value) = env::var("GSMATERIAL_SCHEDULER") {
        match parse_bool(&value) {
            Some(enabled) => config.schedule.enabled = enabled,
            None => config.schedule.time = value.trim().to_string(),
        }
    }

    if let Ok(mirror) = env::var("GSMATERIAL_MIRROR") {
        let mirror = mirror.trim();
        config.network.mirror = (!mirror.is_empty()).then(|| mirror.to_string());
    }

    Ok(())
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Merge CLI overrides into a configuration. CLI wins over file and env.
pub fn merge_cli_overrides(config: &mut AppConfig, overrides: &CliOverrides) {
    if let Some(ref dir) = overrides.data_dir {
        config.storage.data_dir = dir.clone();
    }
    if let Some(skip_three) = overrides.skip_three {
        config.render.skip_three = skip_three;
    }
    if let Some(ref mirror) = overrides.mirror {
        config.network.mirror = Some(mirror.clone());
    }
}

/// Build the effective configuration: file, env, CLI, then validation.
pub fn resolve_config(
    path: Option<&Path>,
    overrides: &CliOverrides,
) -> Result<AppConfig, ConfigError> {
    let mut config = load_config(path)?;
    apply_env_overrides(&mut config)?;
    merge_cli_overrides(&mut config, overrides);

    let issues = config.validate();
    if !issues.is_empty() {
        return Err(ConfigError::Validation(issues.into_iter().map(|e| e.to_string()).collect()));
    }

    Ok(config)
}
