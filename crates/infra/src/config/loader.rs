//! Configuration loader
//!
//! Loads [`SdkConfig`] from environment variables or files.
//!
//! ## Loading Strategy
//! 1. Reads a `.env` file into the environment if one exists
//! 2. Attempts to load from environment variables
//! 3. If incomplete, falls back to loading from file
//! 4. Probes multiple paths for config files (TOML or JSON)
//!
//! The result is validated before it is returned.
//!
//! ## Environment Variables
//! - `COURIER_APP_ID`: Application id (required)
//! - `COURIER_APP_SECRET`: Application secret (required)
//! - `COURIER_TOKEN`: Callback signing token (required)
//! - `COURIER_ACCOUNT_ID`: Account callbacks must be addressed to
//! - `COURIER_ENCODING_AES_KEY`: 43 character callback key
//! - `COURIER_API_BASE_URL`: Platform API base URL
//! - `COURIER_REQUEST_TIMEOUT_SECS`: Outbound request timeout
//! - `COURIER_CONVERGENCE_WINDOW_SECS`: Refresh convergence window (2 to 5)
//! - `COURIER_RETRY_INTERVAL_SECS`: Renewal retry back-off
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./courier.toml` or `./courier.json` (current working directory)
//! 2. The same names in the parent and grandparent directories
//! 3. Relative to executable location

use std::path::{Path, PathBuf};

use courier_domain::{CourierError, Result, SdkConfig};

const CONFIG_FILE_NAMES: [&str; 2] = ["courier.toml", "courier.json"];

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `CourierError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - The loaded configuration fails validation
pub fn load() -> Result<SdkConfig> {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env file"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!(error = %e, "Ignoring unreadable .env file"),
    }

    let config = match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            config
        }
        Err(e) => {
            tracing::debug!(error = %e, "Failed to load from environment, trying file");
            load_from_file(None)?
        }
    };

    config.validate()?;
    Ok(config)
}

/// Load configuration from environment variables
///
/// `COURIER_APP_ID`, `COURIER_APP_SECRET` and `COURIER_TOKEN` must be set;
/// everything else falls back to the defaults.
///
/// # Errors
/// Returns `CourierError::Config` if required variables are missing
/// or numeric variables have invalid values.
pub fn load_from_env() -> Result<SdkConfig> {
    let mut config =
        SdkConfig::new(env_var("COURIER_APP_ID")?, env_var("COURIER_APP_SECRET")?, env_var("COURIER_TOKEN")?);

    if let Some(account_id) = env_opt("COURIER_ACCOUNT_ID") {
        config.account_id = Some(account_id);
    }
    if let Some(key) = env_opt("COURIER_ENCODING_AES_KEY") {
        config.encoding_aes_key = Some(key.into());
    }
    if let Some(base_url) = env_opt("COURIER_API_BASE_URL") {
        config.api_base_url = base_url;
    }
    if let Some(secs) = env_secs("COURIER_REQUEST_TIMEOUT_SECS")? {
        config.request_timeout_secs = secs;
    }
    if let Some(secs) = env_secs("COURIER_CONVERGENCE_WINDOW_SECS")? {
        config.convergence_window_secs = secs;
    }
    if let Some(secs) = env_secs("COURIER_RETRY_INTERVAL_SECS")? {
        config.retry_interval_secs = secs;
    }

    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `CourierError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<SdkConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(CourierError::Config(format!("Config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            CourierError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| CourierError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<SdkConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| CourierError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| CourierError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(CourierError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files
///
/// Searches the working directory and up to two parents, then the
/// executable's directory and its parents.
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut roots = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        roots.push(cwd);
    }
    if let Some(exe_dir) = std::env::current_exe().ok().and_then(|p| p.parent().map(Path::to_path_buf)) {
        roots.push(exe_dir);
    }

    roots.iter().find_map(|root| probe_from(root))
}

fn probe_from(root: &Path) -> Option<PathBuf> {
    root.ancestors()
        .take(3)
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.exists())
}

/// Get required environment variable
///
/// # Errors
/// Returns `CourierError::Config` if the variable is not set or empty.
fn env_var(key: &str) -> Result<String> {
    env_opt(key).ok_or_else(|| {
        CourierError::Config(format!("Missing required environment variable: {key}"))
    })
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn env_secs(key: &str) -> Result<Option<u64>> {
    env_opt(key)
        .map(|raw| {
            raw.trim()
                .parse::<u64>()
                .map_err(|e| CourierError::Config(format!("Invalid value for {key}: {e}")))
        })
        .transpose()
}
