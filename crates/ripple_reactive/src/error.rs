//! # Reactive Error Types
//!
//! Reactive systems themselves never return errors: misuse of the listener
//! protocol is fatal. The only recoverable failures are in loading
//! configuration.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading a [`crate::ReactiveConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("cannot read config {path}: {source}")]
    Io {
        /// Path that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The config text is not valid TOML for this schema.
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The starting buffer capacity must be non-zero.
    #[error("invalid initial buffer capacity: {0}")]
    InvalidCapacity(usize),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
