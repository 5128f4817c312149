//! Bootstrap configuration
//!
//! # Settings Sources Priority
//!
//! 1. Command-line arguments
//! 2. Environment variables (merged with the arguments by clap)
//! 3. TOML configuration file
//! 4. Built-in defaults (code constants)

use crate::{Error, Result};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DATA_PATH: &str = "./chinese-poetry";
pub const DEFAULT_DB_PATH: &str = "./poems.db";
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 24 * 7;
pub const DEFAULT_REFRESH_WINDOW_MINUTES: i64 = 30;

/// Signing secret used when none is configured. Development only.
pub const DEV_JWT_SECRET: &str = "shici-development-secret-change-me-in-production";

/// Configuration loaded from TOML file
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TomlConfig {
    /// HTTP server port
    #[serde(default)]
    pub port: Option<u16>,

    /// Root of the chinese-poetry source tree
    #[serde(default)]
    pub data_path: Option<PathBuf>,

    /// SQLite database file
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Entity store backend: "memory" or "sqlite"
    #[serde(default)]
    pub backend: Option<String>,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub auth: AuthConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
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

/// Credential settings
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub secret: Option<String>,

    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,

    #[serde(default = "default_refresh_window_minutes")]
    pub refresh_window_minutes: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret: None,
            token_ttl_hours: default_token_ttl_hours(),
            refresh_window_minutes: default_refresh_window_minutes(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_token_ttl_hours() -> i64 {
    DEFAULT_TOKEN_TTL_HOURS
}

fn default_refresh_window_minutes() -> i64 {
    DEFAULT_REFRESH_WINDOW_MINUTES
}

impl TomlConfig {
    /// Parse a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Load the explicit file if given, else the per-user default if it exists
    ///
    /// An explicit path that does not exist is an error. A missing default
    /// file yields built-in defaults.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            info!("Loading configuration from {}", path.display());
            return Self::load(path);
        }

        match default_config_path() {
            Some(path) if path.exists() => {
                info!("Loading configuration from {}", path.display());
                Self::load(&path)
            }
            _ => {
                debug!("No configuration file found, using built-in defaults");
                Ok(Self::default())
            }
        }
    }
}

/// `<config_dir>/shici/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("shici").join("config.toml"))
}

/// First present value wins: argument/environment, then TOML, then default
pub fn resolve<T>(cli: Option<T>, toml: Option<T>, default: T) -> T {
    cli.or(toml).unwrap_or(default)
}

/// Which entity store serves corpus queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Index built from the source files at start-up
    Memory,
    /// Database populated by the ingestion job
    Sqlite,
}

impl FromStr for Backend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "file" => Ok(Backend::Memory),
            "sqlite" | "db" => Ok(Backend::Sqlite),
            other => Err(Error::Config(format!("unknown backend: {}", other))),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Memory => f.write_str("memory"),
            Backend::Sqlite => f.write_str("sqlite"),
        }
    }
}
