//! Inspection phases

use serde::{Deserialize, Serialize};

/// One discrete inspection step of a transaction, in protocol order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Connection open (client and server endpoints)
    Connection,
    /// Request line: URI, method and HTTP version
    Uri,
    /// Request headers
    RequestHeaders,
    /// Request body
    RequestBody,
    /// Response status line and headers
    ResponseHeaders,
    /// Response body
    ResponseBody,
    /// Audit logging
    Logging,
}

impl Phase {
    /// All phases in protocol order
    pub const ALL: [Phase; 7] = [
        Self::Connection,
        Self::Uri,
        Self::RequestHeaders,
        Self::RequestBody,
        Self::ResponseHeaders,
        Self::ResponseBody,
        Self::Logging,
    ];

    /// Get display name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connection => "connection",
            Self::Uri => "URI",
            Self::RequestHeaders => "request headers",
            Self::RequestBody => "request body",
            Self::ResponseHeaders => "response headers",
            Self::ResponseBody => "response body",
            Self::Logging => "logging",
        }
    }

    /// Whether the phase belongs to the response side
    pub fn is_response(&self) -> bool {
        matches!(self, Self::ResponseHeaders | Self::ResponseBody)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
