//! Configuration loading and config file resolution
//!
//! Bootstrap configuration lives in a single TOML file. Every field has a
//! built-in default, so a missing file is never fatal.
//!
//! # Config File Priority
//!
//! 1. Command-line argument (`--config`)
//! 2. Environment variable (`QKD_CONFIG`)
//! 3. Platform config directory (`<config_dir>/qkd-ingest/config.toml`)
//! 4. Built-in defaults
//!
//! `QKD_ENRICHMENT_URL` overrides `enrichment.endpoint` after the file is read.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "QKD_CONFIG";

/// Environment variable overriding the enrichment endpoint
pub const ENRICHMENT_URL_ENV_VAR: &str = "QKD_ENRICHMENT_URL";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,

    /// HTTP server configuration (optional)
    #[serde(default)]
    pub server: ServerConfig,

    /// Enrichment collaborator configuration (optional)
    #[serde(default)]
    pub enrichment: EnrichmentConfig,

    /// Secure key rate calculator parameters (optional)
    #[serde(default)]
    pub skr: SkrConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    ///
    /// `RUST_LOG` takes precedence when set.
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

/// HTTP server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address for `serve`
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

/// Enrichment collaborator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentConfig {
    /// Collaborator URL; enrichment is skipped when absent
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Total request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Fail the pipeline when enrichment fails (otherwise continue without it)
    #[serde(default)]
    pub required: bool,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            required: false,
        }
    }
}

/// Secure key rate calculator parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkrConfig {
    /// Error-correction efficiency used when the record carries none
    #[serde(default = "default_ec_efficiency")]
    pub default_ec_efficiency: f64,

    /// Highest QBER accepted before the calculation is refused
    #[serde(default = "default_qber_threshold")]
    pub qber_threshold: f64,
}

impl Default for SkrConfig {
    fn default() -> Self {
        Self {
            default_ec_efficiency: default_ec_efficiency(),
            qber_threshold: default_qber_threshold(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_bind() -> String {
    "127.0.0.1:5790".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_ec_efficiency() -> f64 {
    1.1
}

fn default_qber_threshold() -> f64 {
    0.11 // BB84 error threshold
}

impl TomlConfig {
    /// Parse configuration from a TOML file
    ///
    /// # Errors
    /// `Error::Config` if the file cannot be read or is not valid TOML
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(ENRICHMENT_URL_ENV_VAR) {
            if url.trim().is_empty() {
                warn!("{} is set but empty, ignoring", ENRICHMENT_URL_ENV_VAR);
            } else {
                info!("Enrichment endpoint overridden by {}", ENRICHMENT_URL_ENV_VAR);
                self.enrichment.endpoint = Some(url);
            }
        }
    }
}

/// Default config file location for the platform
///
/// e.g. `~/.config/qkd-ingest/config.toml` on Linux
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("qkd-ingest").join("config.toml"))
}

/// Resolve which config file to read
///
/// Explicit sources (argument, environment) are returned even when the file
/// does not exist so that `load_config` can report them. The platform default
/// is only returned when it exists.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: Platform config directory
    default_config_path().filter(|p| p.exists())
}

/// Load configuration following the documented priority order
///
/// # Errors
/// `Error::Config` when an explicitly named file is missing or malformed
pub fn load_config(cli_arg: Option<&Path>) -> Result<TomlConfig> {
    let mut config = match resolve_config_path(cli_arg) {
        Some(path) => {
            debug!("Loading configuration from {}", path.display());
            TomlConfig::load(&path)?
        }
        None => {
            debug!("No config file found, using built-in defaults");
            TomlConfig::default()
        }
    };

    config.apply_env_overrides();
    Ok(config)
}
