//! Configuration loading traits and types.
//!
//! This module provides a standardized way to load TOML configuration files
//! across all Cadence applications.
//!
//! # Usage
//!
//! ```rust,no_run
//! use cadence_common::config::{ConfigLoader, SharedConfig, ConfigError};
//! use serde::Deserialize;
//! use std::path::Path;
//!
//! #[derive(Debug, Deserialize)]
//! struct MyRobotConfig {
//!     shared: SharedConfig,
//!     period_ms: u64,
//! }
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = MyRobotConfig::load(Path::new("robot.toml"))?;
//!     println!("Service: {}", config.shared.service_name);
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("configuration file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// The path exists but could not be read (permissions, a directory).
    #[error("cannot read {}: {message}", path.display())]
    Io { path: PathBuf, message: String },

    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    #[error("invalid configuration: {0}")]
    ValidationError(String),
}

/// Verbosity of the `tracing` subscriber, lowercase in TOML.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

/// `[shared]` section common to every Cadence binary.
///
/// ```toml
/// [shared]
/// service_name = "cadence-robot"
/// log_level = "debug"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedConfig {
    /// Instance name used in logs.
    pub service_name: String,
    #[serde(default)]
    pub log_level: LogLevel,
}

impl SharedConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "shared.service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self {
            service_name: "cadence".to_string(),
            log_level: LogLevel::default(),
        }
    }
}

/// TOML loading for any deserializable configuration type.
///
/// A missing file is `FileNotFound`, any other read failure is `Io`, and
/// malformed or mistyped content is `ParseError`. Semantic checks are left
/// to each type's own `validate`.
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConfigError::FileNotFound(path.to_path_buf()),
            _ => ConfigError::Io {
                path: path.to_path_buf(),
                message: e.to_string(),
            },
        })?;
        Self::from_toml(&content)
    }

    fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}
