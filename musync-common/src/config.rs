//! Configuration resolution
//!
//! Every setting is resolved in priority order:
//! 1. Command-line argument or environment variable (both surface through clap)
//! 2. TOML config file
//! 3. Built-in default
//!
//! The catalog database path has no built-in default. Running without one is a
//! configuration error, raised before any connection is opened.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Base URL of the published Mutopia archive
pub const DEFAULT_ARCHIVE_BASE: &str = "http://www.mutopiaproject.org/ftp";

/// Upper bound on a single metadata document fetch
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// On-disk TOML configuration. All keys optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Path to the SQLite catalog database
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Archive base URL, or a local mirror directory
    #[serde(default)]
    pub archive_base: Option<String>,

    /// Document fetch timeout in seconds
    #[serde(default)]
    pub fetch_timeout_secs: Option<u64>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when RUST_LOG is unset (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, stderr only if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    /// Load and parse a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Cannot read config file {}: {}", path.display(), e))
        })?;
        Self::parse(&content, path)
    }

    fn parse(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|source| Error::ConfigFile {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Values supplied on the command line (or via environment, through clap)
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_file: Option<PathBuf>,
    pub database_path: Option<PathBuf>,
    pub archive_base: Option<String>,
    pub fetch_timeout_secs: Option<u64>,
    pub log_file: Option<PathBuf>,
}

/// Fully resolved configuration, passed explicitly into components at startup
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub database_path: PathBuf,
    pub archive_base: String,
    pub fetch_timeout: Duration,
    pub logging: LoggingConfig,
}

impl SyncConfig {
    /// Resolve configuration from overrides and the TOML config file
    ///
    /// An explicitly named config file must exist. Otherwise the platform
    /// config locations are checked and silently skipped when absent.
    pub fn resolve(overrides: ConfigOverrides) -> Result<Self> {
        let toml_config = match &overrides.config_file {
            Some(path) => TomlConfig::load(path)?,
            None => match default_config_file() {
                Some(path) => {
                    debug!("Using config file {}", path.display());
                    TomlConfig::load(&path)?
                }
                None => TomlConfig::default(),
            },
        };

        Self::from_sources(overrides, toml_config)
    }

    /// Merge overrides over a parsed TOML config, then apply defaults
    pub fn from_sources(overrides: ConfigOverrides, toml_config: TomlConfig) -> Result<Self> {
        let database_path = overrides
            .database_path
            .or(toml_config.database_path)
            .ok_or_else(|| {
                Error::Config(
                    "Catalog database is not configured. Set one of:\n\
                     1. Command line: --database /path/to/catalog.db\n\
                     2. Environment: MUSYNC_DATABASE=/path/to/catalog.db\n\
                     3. TOML config: database_path = \"/path/to/catalog.db\""
                        .to_string(),
                )
            })?;

        let archive_base = overrides
            .archive_base
            .or(toml_config.archive_base)
            .unwrap_or_else(|| DEFAULT_ARCHIVE_BASE.to_string());
        let archive_base = archive_base.trim_end_matches('/').to_string();
        if archive_base.is_empty() {
            return Err(Error::Config("Archive base must not be empty".to_string()));
        }

        let timeout_secs = overrides
            .fetch_timeout_secs
            .or(toml_config.fetch_timeout_secs)
            .unwrap_or(DEFAULT_FETCH_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(Error::Config(
                "Fetch timeout must be at least one second".to_string(),
            ));
        }

        let mut logging = toml_config.logging;
        if overrides.log_file.is_some() {
            logging.file = overrides.log_file;
        }

        Ok(Self {
            database_path,
            archive_base,
            fetch_timeout: Duration::from_secs(timeout_secs),
            logging,
        })
    }
}

/// First existing config file among the platform locations
fn default_config_file() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("musync").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(unix) {
        let system_config = PathBuf::from("/etc/musync/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}
