//! Configuration storage for the CLI.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use directories::ProjectDirs;

use hubspot_core::{Config, ConfigOptions, Connection};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// Overrides the stored API base URL.
pub const BASE_URL_ENV: &str = "HUBSPOT_BASE_URL";

/// Get the config file path.
pub fn config_path() -> Result<PathBuf> {
    let dirs =
        ProjectDirs::from("", "", "hubspot").context("Could not determine config directory")?;

    let config_dir = dirs.config_dir();
    fs::create_dir_all(config_dir).context("Failed to create config directory")?;

    Ok(config_dir.join("config.json"))
}

/// Save options to disk, readable by the owner only.
pub fn save(options: &ConfigOptions) -> Result<PathBuf> {
    let path = config_path()?;
    let json = serde_json::to_string_pretty(options)?;

    fs::write(&path, &json).context("Failed to write config file")?;

    #[cfg(unix)]
    {
        let mut perms = fs::metadata(&path)?.permissions();
        perms.set_mode(0o600);
        fs::set_permissions(&path, perms)?;
    }

    Ok(path)
}

/// Load stored options, if any.
pub fn load() -> Result<Option<ConfigOptions>> {
    let path = config_path()?;

    if !path.exists() {
        return Ok(None);
    }

    let json = fs::read_to_string(&path).context("Failed to read config file")?;
    let options = serde_json::from_str(&json).context("Invalid config file")?;

    Ok(Some(options))
}

/// Open a connection from the stored configuration.
pub fn connect() -> Result<Connection> {
    let mut options = load()?.context("No configuration found. Run 'hubspot configure' first.")?;

    if let Ok(base_url) = std::env::var(BASE_URL_ENV) {
        tracing::debug!(%base_url, "base URL overridden from environment");
        options.base_url = Some(base_url);
    }

    let config = Config::configure(options).context("Invalid configuration")?;
    hubspot_http::connect(config).context("Failed to create HTTP client")
}
