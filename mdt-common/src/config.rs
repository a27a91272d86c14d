//! Bootstrap configuration loading
//!
//! Configuration sources, highest priority first:
//! 1. Command-line arguments (`--config`, `--port`)
//! 2. Environment variables (`MDT_*`)
//! 3. TOML configuration file
//! 4. Compiled defaults
//!
//! A missing config file is not an error: a warning is logged and the
//! compiled defaults are used.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "MDT_CONFIG";
/// Environment override for the local database path
pub const DATABASE_PATH_ENV: &str = "MDT_DATABASE_PATH";
/// Environment override for the remote (identity) database URL
pub const REMOTE_DB_URL_ENV: &str = "MDT_REMOTE_DB_URL";
/// Environment override for the registry base URL
pub const REGISTRY_URL_ENV: &str = "MDT_REGISTRY_URL";
/// Environment override for the registry API token
pub const REGISTRY_TOKEN_ENV: &str = "MDT_REGISTRY_TOKEN";

/// Default registry request timeout
pub const DEFAULT_REGISTRY_TIMEOUT_MS: u64 = 5000;

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Path to the local SQLite database (debtors and phone cache)
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Remote identity database. Absent means phone enrichment is disabled.
    #[serde(default)]
    pub remote_database: Option<RemoteDatabaseConfig>,

    /// External registry (EDR) client settings
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Remote identity database connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteDatabaseConfig {
    /// sqlx connection URL, e.g. `sqlite:///var/lib/mdt/clients.db`
    pub url: String,
}

/// What to do when the remote store resolves an identifier that fails the
/// registry format check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidIdentifierPolicy {
    /// Stop without writing; the identity is re-resolved on every lookup
    #[default]
    LeaveUnchecked,
    /// Persist a "checked, no number" row so the identity is not retried
    MarkChecked,
}

/// External registry client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default = "default_registry_url")]
    pub base_url: String,

    #[serde(default = "default_registry_timeout_ms")]
    pub timeout_ms: u64,

    /// Sent as `Authorization: Token <token>` when present
    #[serde(default)]
    pub api_token: Option<String>,

    #[serde(default)]
    pub invalid_identifier_policy: InvalidIdentifierPolicy,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            base_url: default_registry_url(),
            timeout_ms: default_registry_timeout_ms(),
            api_token: None,
            invalid_identifier_policy: InvalidIdentifierPolicy::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error); `RUST_LOG` takes precedence
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

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            database_path: default_database_path(),
            remote_database: None,
            registry: RegistryConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

fn default_port() -> u16 {
    5750
}

fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("mdt").join("mdt.db"))
        .unwrap_or_else(|| PathBuf::from("./mdt_data/mdt.db"))
}

fn default_registry_url() -> String {
    "http://localhost:8090/api".to_string()
}

fn default_registry_timeout_ms() -> u64 {
    DEFAULT_REGISTRY_TIMEOUT_MS
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    /// Whether the remote identity database is configured
    pub fn remote_db_enabled(&self) -> bool {
        self.remote_database
            .as_ref()
            .map(|r| !r.url.trim().is_empty())
            .unwrap_or(false)
    }

    /// Apply `MDT_*` environment overrides on top of file values
    pub fn apply_env_overrides(&mut self) {
        if let Some(path) = non_empty_env(DATABASE_PATH_ENV) {
            self.database_path = PathBuf::from(path);
        }
        if let Some(url) = non_empty_env(REMOTE_DB_URL_ENV) {
            self.remote_database = Some(RemoteDatabaseConfig { url });
        }
        if let Some(url) = non_empty_env(REGISTRY_URL_ENV) {
            self.registry.base_url = url;
        }
        if let Some(token) = non_empty_env(REGISTRY_TOKEN_ENV) {
            self.registry.api_token = Some(token);
        }
    }

    /// Reject values that would make the service unusable
    pub fn validate(&self) -> Result<()> {
        if self.registry.base_url.trim().is_empty() {
            return Err(Error::Config("registry.base_url must not be empty".to_string()));
        }
        if self.registry.timeout_ms == 0 {
            return Err(Error::Config("registry.timeout_ms must be greater than 0".to_string()));
        }
        Ok(())
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: TomlConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Locate the config file: CLI argument, then `MDT_CONFIG`, then the
/// platform config directory. Returns `None` when no candidate exists.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Some(path) = non_empty_env(CONFIG_PATH_ENV) {
        return Some(PathBuf::from(path));
    }

    dirs::config_dir()
        .map(|d| d.join("mdt").join("mdt-debtors.toml"))
        .filter(|p| p.exists())
}

/// Load the effective configuration
///
/// A config file that exists must parse. A missing file falls back to
/// compiled defaults.
pub fn load_config(cli_arg: Option<&Path>) -> Result<TomlConfig> {
    let mut config = match resolve_config_path(cli_arg) {
        Some(path) if path.exists() => {
            info!("Loading configuration from {}", path.display());
            load_toml_config(&path)?
        }
        Some(path) => {
            warn!(
                "Config file {} not found, using compiled defaults",
                path.display()
            );
            TomlConfig::default()
        }
        None => {
            warn!("No config file found, using compiled defaults");
            TomlConfig::default()
        }
    };

    config.apply_env_overrides();
    config.validate()?;

    Ok(config)
}
