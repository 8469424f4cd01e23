//! Inspection error types

use super::phase::Phase;
use thiserror::Error;

/// Errors returned by transaction and handler operations.
///
/// Every engine rejection maps to the variant of the phase that was
/// rejected. None of them are retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InspectionError {
    /// The engine could not create a transaction context
    #[error("could not initialize transaction")]
    EngineInit,

    /// The engine rejected the connection parameters
    #[error("could not process connection {remote}:{remote_port} -> {local}:{local_port}")]
    ConnectionProcessing {
        /// Client address
        remote: String,
        /// Client port
        remote_port: u16,
        /// Server address
        local: String,
        /// Server port
        local_port: u16,
    },

    /// The engine rejected the request line
    #[error("could not process URI {method} {uri}")]
    UriProcessing {
        /// Request target
        uri: String,
        /// Request method
        method: String,
    },

    /// The engine refused a request or response header
    #[error("could not add {phase} header '{name}'")]
    HeaderAddition {
        /// Phase the header belonged to
        phase: Phase,
        /// Header name
        name: String,
    },

    /// Header analysis failed
    #[error("could not process {0}")]
    HeaderProcessing(Phase),

    /// A body chunk was empty or refused by the engine
    #[error("could not append {phase}: {reason}")]
    BodyAppend {
        /// Phase the chunk belonged to
        phase: Phase,
        /// Why the chunk was rejected
        reason: String,
    },

    /// Body analysis failed
    #[error("could not process {0}")]
    BodyProcessing(Phase),

    /// The logging phase failed
    #[error("could not process logging")]
    Logging,

    /// The transaction was already cleaned up
    #[error("transaction {0} has already been cleaned up")]
    TransactionClosed(u64),

    /// Inspection is disabled by configuration
    #[error("inspection is disabled")]
    Disabled,

    /// The inspection module is not running
    #[error("inspection module is not running")]
    NotRunning,
}

/// Result type for inspection operations
pub type InspectionResult<T> = Result<T, InspectionError>;

impl InspectionError {
    /// Phase the error originated from, if it came from the engine
    pub fn phase(&self) -> Option<Phase> {
        match self {
            Self::EngineInit | Self::ConnectionProcessing { .. } => Some(Phase::Connection),
            Self::UriProcessing { .. } => Some(Phase::Uri),
            Self::HeaderAddition { phase, .. } | Self::BodyAppend { phase, .. } => Some(*phase),
            Self::HeaderProcessing(phase) | Self::BodyProcessing(phase) => Some(*phase),
            Self::Logging => Some(Phase::Logging),
            Self::TransactionClosed(_) | Self::Disabled | Self::NotRunning => None,
        }
    }

    /// Whether the transaction can never be used again after this error
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::EngineInit | Self::TransactionClosed(_))
    }
}
