//! Configuration file handling for zeeho-cli

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use zeeho_coordinator::ZeehoConfig;

/// Get the default config file path
pub fn default_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .context("Could not determine config directory")?
        .join("zeeho");

    Ok(config_dir.join("config.toml"))
}

/// Explicit path wins over the platform default
pub fn resolve_path(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => default_config_path(),
    }
}

/// Load, apply environment overrides and validate
pub fn load(explicit: Option<&Path>) -> Result<ZeehoConfig> {
    let path = resolve_path(explicit)?;
    tracing::debug!(path = %path.display(), "Loading config");
    ZeehoConfig::load(&path)
        .with_context(|| format!("Failed to load config file: {}", path.display()))
}
