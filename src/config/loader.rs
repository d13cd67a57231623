// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::RunConfig;
use crate::config::validate::validate_config;
use crate::errors::Result;

/// Environment variable overriding the default config location.
pub const CONFIG_ENV_VAR: &str = "RUNCTL_CONFIG";

/// Deserialize a config from TOML text. No semantic validation.
pub fn load_from_str(contents: &str) -> Result<RunConfig> {
    Ok(toml::from_str(contents)?)
}

/// Read and deserialize a config file. No semantic validation; use
/// [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RunConfig> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    debug!(path = %path.display(), bytes = contents.len(), "read config file");
    load_from_str(&contents)
}

/// Read, deserialize and validate a config file.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<RunConfig> {
    let config = load_from_path(&path)?;
    validate_config(&config)?;
    Ok(config)
}

/// `$RUNCTL_CONFIG` if set, else `Runctl.toml` in the working directory.
pub fn default_config_path() -> PathBuf {
    std::env::var_os(CONFIG_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("Runctl.toml"))
}
