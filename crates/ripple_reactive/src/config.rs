//! # Reactive Configuration
//!
//! Tuning knobs for reactive systems, loaded once at startup.
//!
//! ```toml
//! initial_buffer_capacity = 64
//! large_batch_warning = 10000
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::buffer::DEFAULT_BUFFER_CAPACITY;
use crate::error::{ConfigError, ConfigResult};

/// Settings shared by reactive systems built from it.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReactiveConfig {
    /// Starting capacity of each reactive buffer.
    pub initial_buffer_capacity: usize,
    /// Batches longer than this are logged at warn level.
    pub large_batch_warning: Option<usize>,
}

impl Default for ReactiveConfig {
    fn default() -> Self {
        Self {
            initial_buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            large_batch_warning: None,
        }
    }
}

impl ReactiveConfig {
    /// Parses and validates a TOML document.
    ///
    /// Missing keys take their default values.
    ///
    /// # Errors
    ///
    /// Returns error if the text is not valid TOML for this schema or fails
    /// [`Self::validate`].
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or its content is invalid.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!("loaded reactive config from {}: {:?}", path.display(), config);
        Ok(config)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidCapacity`] for a zero starting capacity.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.initial_buffer_capacity == 0 {
            return Err(ConfigError::InvalidCapacity(self.initial_buffer_capacity));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ReactiveConfig::default();
        assert_eq!(config.initial_buffer_capacity, 32);
        assert!(config.large_batch_warning.is_none());
        assert_eq!(ReactiveConfig::from_toml_str("").unwrap(), config);
    }

    #[test]
    fn test_parse_overrides() {
        let config = ReactiveConfig::from_toml_str(
            "initial_buffer_capacity = 128\nlarge_batch_warning = 5000\n",
        )
        .unwrap();
        assert_eq!(config.initial_buffer_capacity, 128);
        assert_eq!(config.large_batch_warning, Some(5000));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = ReactiveConfig::from_toml_str("initial_buffer_capacity = 0").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidCapacity(0)));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = ReactiveConfig::from_toml_str("buffer = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let path = std::env::temp_dir().join("ripple_reactive_missing_config.toml");
        let err = ReactiveConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_load_file() {
        let id = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let path = std::env::temp_dir().join(format!("ripple_reactive_config_{id}.toml"));
        std::fs::write(&path, "initial_buffer_capacity = 8\n").unwrap();

        let config = ReactiveConfig::load(&path).unwrap();
        assert_eq!(config.initial_buffer_capacity, 8);

        std::fs::remove_file(&path).ok();
    }
}
