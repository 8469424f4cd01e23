//! The external inspection engine seam
//!
//! The engine evaluates rules; this crate only drives it. Implementations
//! wrap a concrete engine (for example a libmodsecurity binding) and expose
//! its per-transaction calls through [`InspectionEngine`].

use super::buffer::TrackedBuffer;
use thiserror::Error;

/// The engine rejected a call. Engines report no further detail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Error)]
#[error("inspection engine reported a failure")]
pub struct EngineFault;

/// Outcome of a single engine call
pub type EngineStatus = Result<(), EngineFault>;

/// Pending intervention reported by the engine.
///
/// The descriptor carries the action the engine wants (status, redirect,
/// pause) and a free-text log. It has no structured rule id; see
/// [`super::intervention::extract_rule_id`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Intervention {
    /// HTTP status the engine wants returned
    pub status: u16,

    /// Requested pause in milliseconds
    pub pause: u32,

    /// Redirect target, if the action is a redirect
    pub url: Option<String>,

    /// Free-text log of the rule that fired
    pub log: Option<String>,

    /// Whether the action is disruptive
    pub disruptive: bool,
}

impl Intervention {
    /// Create a disruptive intervention with the given status
    pub fn new(status: u16) -> Self {
        Self {
            status,
            disruptive: true,
            ..Self::default()
        }
    }

    /// Builder: set log text
    pub fn with_log(mut self, log: impl Into<String>) -> Self {
        self.log = Some(log.into());
        self
    }

    /// Builder: set redirect URL
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Builder: set pause
    pub fn with_pause(mut self, pause: u32) -> Self {
        self.pause = pause;
        self
    }

    /// Log text, empty when the engine supplied none
    pub fn log_text(&self) -> &str {
        self.log.as_deref().unwrap_or("")
    }

    /// Whether the action redirects the client
    pub fn is_redirect(&self) -> bool {
        self.url.is_some() && (300..400).contains(&self.status)
    }
}

/// Per-transaction operations of an inspection engine.
///
/// `Context` is the engine's opaque transaction handle. It is created by
/// [`InspectionEngine::new_transaction_context`] and handed back exactly
/// once to [`InspectionEngine::release_transaction_context`].
///
/// Buffers are passed by reference; an engine that needs them past the
/// call may clone them, and they stay valid until the transaction is
/// cleaned up.
///
/// One engine is shared by all transactions, so it must allow concurrent
/// context creation.
pub trait InspectionEngine: Send + Sync {
    /// Per-transaction engine state
    type Context: Send;

    /// Create the context for a new transaction
    fn new_transaction_context(&self) -> Result<Self::Context, EngineFault>;

    /// Inspect the connection endpoints
    fn process_connection(
        &self,
        ctx: &mut Self::Context,
        remote_host: &TrackedBuffer,
        remote_port: u16,
        local_host: &TrackedBuffer,
        local_port: u16,
    ) -> EngineStatus;

    /// Inspect the request line
    fn process_uri(
        &self,
        ctx: &mut Self::Context,
        uri: &TrackedBuffer,
        method: &TrackedBuffer,
        http_version: &TrackedBuffer,
    ) -> EngineStatus;

    /// Add one request header to the engine's collection
    fn add_request_header(
        &self,
        ctx: &mut Self::Context,
        name: &TrackedBuffer,
        value: &TrackedBuffer,
    ) -> EngineStatus;

    /// Analyse the collected request headers
    fn process_request_headers(&self, ctx: &mut Self::Context) -> EngineStatus;

    /// Buffer a request body chunk
    fn append_request_body(&self, ctx: &mut Self::Context, chunk: &TrackedBuffer)
        -> EngineStatus;

    /// Analyse the buffered request body
    fn process_request_body(&self, ctx: &mut Self::Context) -> EngineStatus;

    /// Add one response header to the engine's collection
    fn add_response_header(
        &self,
        ctx: &mut Self::Context,
        name: &TrackedBuffer,
        value: &TrackedBuffer,
    ) -> EngineStatus;

    /// Analyse the response status and collected headers
    fn process_response_headers(
        &self,
        ctx: &mut Self::Context,
        status_code: u16,
        http_version: &TrackedBuffer,
    ) -> EngineStatus;

    /// Buffer a response body chunk
    fn append_response_body(
        &self,
        ctx: &mut Self::Context,
        chunk: &TrackedBuffer,
    ) -> EngineStatus;

    /// Analyse the buffered response body
    fn process_response_body(&self, ctx: &mut Self::Context) -> EngineStatus;

    /// Run audit logging for the transaction
    fn process_logging(&self, ctx: &mut Self::Context) -> EngineStatus;

    /// Take the pending intervention, if any
    fn query_intervention(&self, ctx: &mut Self::Context) -> Option<Intervention>;

    /// Release the transaction context
    fn release_transaction_context(&self, ctx: Self::Context);
}
