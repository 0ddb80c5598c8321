//! Common error types for musync

use std::path::PathBuf;
use thiserror::Error;

/// Common result type for musync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while bootstrapping configuration and the catalog database
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Required setting missing or invalid. Fatal: nothing has been written yet.
    #[error("Configuration error: {0}")]
    Config(String),

    /// TOML configuration file could not be parsed
    #[error("Invalid config file {path}: {source}")]
    ConfigFile {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
