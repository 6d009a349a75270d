//! Configuration loading and setting resolution
//!
//! Every setting resolves with the same priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback, may be "not configured")
//!
//! A missing TOML file is not an error: defaults are used and a warning is logged.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const ENV_CONFIG_PATH: &str = "ROOMIFY_CONFIG";
pub const ENV_WORKER_URL: &str = "ROOMIFY_WORKER_URL";
pub const ENV_HOSTING_URL: &str = "ROOMIFY_HOSTING_URL";
pub const ENV_RENDER_URL: &str = "ROOMIFY_RENDER_URL";
pub const ENV_AUTH_URL: &str = "ROOMIFY_AUTH_URL";
pub const ENV_AUTH_TOKEN: &str = "ROOMIFY_AUTH_TOKEN";
pub const ENV_DATABASE_PATH: &str = "ROOMIFY_DATABASE_PATH";
pub const ENV_PORT: &str = "ROOMIFY_PORT";

/// Default worker port
pub const DEFAULT_PORT: u16 = 8787;

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Base URL of the worker API (client side)
    #[serde(default)]
    pub worker_url: Option<String>,

    /// Base URL of the object hosting service
    #[serde(default)]
    pub hosting_url: Option<String>,

    /// Endpoint of the render generator
    #[serde(default)]
    pub render_url: Option<String>,

    /// Base URL of the auth provider (`/whoami`)
    #[serde(default)]
    pub auth_url: Option<String>,

    /// Bearer token of the signed-in user (client side)
    #[serde(default)]
    pub auth_token: Option<String>,

    /// Worker HTTP port
    #[serde(default)]
    pub port: Option<u16>,

    /// SQLite database for the worker's key-value store
    ///
    /// When absent the worker keeps projects in memory.
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Static sessions accepted by the worker (token -> user)
    #[serde(default)]
    pub sessions: Vec<SessionEntry>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// One statically configured session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionEntry {
    pub token: String,
    pub user_id: String,
    #[serde(default)]
    pub username: Option<String>,
}

/// Default config file location: `<config dir>/roomify/roomify.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("roomify").join("roomify.toml"))
}

/// Locate the config file: explicit path, then `ROOMIFY_CONFIG`, then the default
pub fn config_file_path(cli_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_path {
        return Some(path.to_path_buf());
    }
    if let Some(path) = non_blank_env(ENV_CONFIG_PATH) {
        return Some(PathBuf::from(path));
    }
    default_config_path()
}

/// Load the TOML config
///
/// A missing file yields defaults. An unreadable or malformed file is an error.
pub fn load_toml_config(path: Option<&Path>) -> Result<TomlConfig> {
    let Some(path) = config_file_path(path) else {
        warn!("Could not determine config directory, using defaults");
        return Ok(TomlConfig::default());
    };

    if !path.exists() {
        warn!("Config file not found at {}, using defaults", path.display());
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(&path)?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;

    info!("Loaded config from {}", path.display());
    Ok(config)
}

/// Resolve one string setting: CLI -> ENV -> TOML
///
/// Blank values at any tier are treated as absent.
pub fn resolve_setting(
    cli_value: Option<&str>,
    env_var_name: &str,
    toml_value: Option<&str>,
) -> Option<String> {
    if let Some(value) = cli_value.filter(|v| !v.trim().is_empty()) {
        return Some(value.to_string());
    }
    if let Some(value) = non_blank_env(env_var_name) {
        return Some(value);
    }
    toml_value
        .filter(|v| !v.trim().is_empty())
        .map(str::to_string)
}

fn non_blank_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Endpoints and credentials used by the client action layer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientSettings {
    pub worker_url: Option<String>,
    pub hosting_url: Option<String>,
    pub render_url: Option<String>,
    pub auth_url: Option<String>,
    pub auth_token: Option<String>,
}

impl ClientSettings {
    /// Merge CLI overrides with environment and TOML values
    pub fn resolve(cli: &ClientSettings, toml: &TomlConfig) -> Self {
        Self {
            worker_url: resolve_setting(
                cli.worker_url.as_deref(),
                ENV_WORKER_URL,
                toml.worker_url.as_deref(),
            ),
            hosting_url: resolve_setting(
                cli.hosting_url.as_deref(),
                ENV_HOSTING_URL,
                toml.hosting_url.as_deref(),
            ),
            render_url: resolve_setting(
                cli.render_url.as_deref(),
                ENV_RENDER_URL,
                toml.render_url.as_deref(),
            ),
            auth_url: resolve_setting(
                cli.auth_url.as_deref(),
                ENV_AUTH_URL,
                toml.auth_url.as_deref(),
            ),
            auth_token: resolve_setting(
                cli.auth_token.as_deref(),
                ENV_AUTH_TOKEN,
                toml.auth_token.as_deref(),
            ),
        }
    }
}

/// Worker bootstrap settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerSettings {
    pub port: u16,
    pub database_path: Option<PathBuf>,
    pub auth_url: Option<String>,
    pub sessions: Vec<SessionEntry>,
}

impl WorkerSettings {
    pub fn resolve(
        cli_port: Option<u16>,
        cli_database: Option<&Path>,
        toml: &TomlConfig,
    ) -> Result<Self> {
        let port = match cli_port {
            Some(port) => port,
            None => match non_blank_env(ENV_PORT) {
                Some(raw) => raw
                    .parse::<u16>()
                    .map_err(|e| Error::Config(format!("{} is not a port: {}", ENV_PORT, e)))?,
                None => toml.port.unwrap_or(DEFAULT_PORT),
            },
        };

        let database_path = resolve_setting(
            cli_database.and_then(|p| p.to_str()),
            ENV_DATABASE_PATH,
            toml.database_path.as_deref().and_then(|p| p.to_str()),
        )
        .map(PathBuf::from);

        Ok(Self {
            port,
            database_path,
            auth_url: resolve_setting(None, ENV_AUTH_URL, toml.auth_url.as_deref()),
            sessions: toml.sessions.clone(),
        })
    }
}
