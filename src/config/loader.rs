//! Configuration file loader.

use super::error::{ConfigError, ConfigResult};
use super::validation::Validate;
use serde::de::DeserializeOwned;
use std::path::Path;

/// Loads TOML configuration and runs its validation.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConfigLoader;

impl ConfigLoader {
    /// Create a new configuration loader.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Load configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file does not exist
    /// - The file cannot be read
    /// - The TOML is malformed
    /// - Validation fails
    pub fn load<T, P>(&self, path: P) -> ConfigResult<T>
    where
        T: DeserializeOwned + Validate,
        P: AsRef<Path>,
    {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        self.load_str(&content)
    }

    /// Load configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or validation fails.
    pub fn load_str<T>(&self, content: &str) -> ConfigResult<T>
    where
        T: DeserializeOwned + Validate,
    {
        let config: T = toml::from_str(content)?;

        config.validate().into_result().map_err(ConfigError::Invalid)?;
        Ok(config)
    }

    /// Load configuration or return default if the file doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_or_default<T, P>(&self, path: P) -> ConfigResult<T>
    where
        T: DeserializeOwned + Validate + Default,
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        if path.exists() {
            self.load(path)
        } else {
            Ok(T::default())
        }
    }
}
