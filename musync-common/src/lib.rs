//! # musync common library
//!
//! Shared code for the musync catalog synchronizer:
//! - Error and result types
//! - Configuration resolution (CLI/env, TOML file, built-in defaults)
//! - SQLite schema bootstrap for the catalog tables
//! - Row models for the reference ("dimension") tables and pending entries

pub mod config;
pub mod db;
pub mod error;

pub use config::{ConfigOverrides, LoggingConfig, SyncConfig};
pub use error::{Error, Result};
