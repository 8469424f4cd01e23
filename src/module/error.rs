//! Module error types and result aliases.

use thiserror::Error;

/// Result type alias for module operations.
pub type ModuleResult<T> = Result<T, ModuleError>;

/// Errors that can occur during module lifecycle transitions.
#[derive(Debug, Clone, Error)]
pub enum ModuleError {
    /// Module failed to initialize.
    #[error("initialization failed: {0}")]
    InitializationFailed(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// Module is in an invalid state for the requested operation.
    #[error("invalid state: current={current}, expected={expected}")]
    InvalidState {
        /// Current state of the module.
        current: String,
        /// Expected state for the operation.
        expected: String,
    },
}

impl ModuleError {
    /// Builds an [`ModuleError::InvalidState`] from anything displayable.
    pub(crate) fn invalid_state(current: impl std::fmt::Display, expected: &str) -> Self {
        Self::InvalidState {
            current: current.to_string(),
            expected: expected.to_string(),
        }
    }
}
