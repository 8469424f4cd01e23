//! Configuration error types.

use super::validation::ValidationError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading inspection configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("cannot read '{path}': {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed TOML or a field of the wrong type.
    #[error("invalid TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// The configuration parsed but failed validation.
    #[error("invalid configuration: {}", join(.0))]
    Invalid(Vec<ValidationError>),

    /// No file at the given path.
    #[error("configuration file not found: {0}")]
    NotFound(PathBuf),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
