//! Configuration loader
//!
//! Loads client configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `ROSTERLINK_ENDPOINT`: Identity server base URL
//! - `ROSTERLINK_CLIENT_ID`, `ROSTERLINK_CLIENT_SECRET`: OAuth client
//! - `ROSTERLINK_USERNAME`, `ROSTERLINK_PASSWORD`: Resource owner
//! - `ROSTERLINK_SCOPE`: Requested scopes, space separated
//! - `ROSTERLINK_GRANT_TYPE`: Grant type (optional, defaults to `password`)
//! - `ROSTERLINK_SCOPE_ACCOUNT_INFO`, `ROSTERLINK_SCOPE_USERINFO`,
//!   `ROSTERLINK_SCOPE_INFORMATION`, `ROSTERLINK_SCOPE_ROSTER`,
//!   `ROSTERLINK_SCOPE_LOG_UPLOAD`: Discovery keys
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.json` or `./config.toml` (current working directory)
//! 2. `./rosterlink.json` or `./rosterlink.toml` (current working directory)
//! 3. `../config.json` or `../config.toml` (parent directory)
//! 4. `../../config.json` or `../../config.toml` (grandparent directory)
//! 5. Relative to executable location

use std::path::{Path, PathBuf};

use rosterlink_domain::constants::DEFAULT_GRANT_TYPE;
use rosterlink_domain::{ClientConfig, Credentials, Result, RosterLinkError, ScopeCatalog};

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `RosterLinkError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - Required fields are missing
pub fn load() -> Result<ClientConfig> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = %e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// All required environment variables must be present. Returns an error
/// if any are missing.
///
/// # Errors
/// Returns `RosterLinkError::Config` if required variables are missing
/// or empty.
pub fn load_from_env() -> Result<ClientConfig> {
    let endpoint = env_var("ROSTERLINK_ENDPOINT")?;

    let scope: Vec<String> =
        env_var("ROSTERLINK_SCOPE")?.split_whitespace().map(str::to_string).collect();
    let grant_type = std::env::var("ROSTERLINK_GRANT_TYPE")
        .ok()
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_GRANT_TYPE.to_string());

    let credentials = Credentials::new(
        env_var("ROSTERLINK_CLIENT_ID")?,
        env_var("ROSTERLINK_CLIENT_SECRET")?,
        env_var("ROSTERLINK_USERNAME")?,
        env_var("ROSTERLINK_PASSWORD")?,
        scope,
        grant_type,
    );

    let scopes = ScopeCatalog::new(
        env_var("ROSTERLINK_SCOPE_ACCOUNT_INFO")?,
        env_var("ROSTERLINK_SCOPE_USERINFO")?,
        env_var("ROSTERLINK_SCOPE_INFORMATION")?,
        env_var("ROSTERLINK_SCOPE_ROSTER")?,
        env_var("ROSTERLINK_SCOPE_LOG_UPLOAD")?,
    );

    Ok(ClientConfig { endpoint, credentials, scopes })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Arguments
/// * `path` - Optional path to config file. If `None`, uses
///   [`probe_config_paths`].
///
/// # Errors
/// Returns `RosterLinkError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - Required fields are missing
pub fn load_from_file(path: Option<PathBuf>) -> Result<ClientConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(RosterLinkError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            RosterLinkError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| RosterLinkError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`); a file
/// without extension is read as JSON.
fn parse_config(contents: &str, path: &Path) -> Result<ClientConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| RosterLinkError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| RosterLinkError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(RosterLinkError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files
///
/// Searches for config files in the following locations (in order):
/// 1. Current working directory (`./config.{json,toml}`,
///    `./rosterlink.{json,toml}`)
/// 2. Parent directories (up to 2 levels)
/// 3. Relative to executable location
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(candidates_in(&cwd));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(candidates_in(exe_dir));
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

fn candidates_in(dir: &Path) -> Vec<PathBuf> {
    vec![
        dir.join("config.json"),
        dir.join("config.toml"),
        dir.join("rosterlink.json"),
        dir.join("rosterlink.toml"),
        dir.join("../config.json"),
        dir.join("../config.toml"),
        dir.join("../../config.json"),
        dir.join("../../config.toml"),
    ]
}

/// Get a required, non-empty environment variable
///
/// # Errors
/// Returns `RosterLinkError::Config` if the variable is unset or empty.
fn env_var(key: &str) -> Result<String> {
    match std::env::var(key) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(RosterLinkError::Config(format!("Missing required environment variable: {key}"))),
    }
}
