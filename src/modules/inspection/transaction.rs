//! Per-request inspection transaction
//!
//! A [`Transaction`] drives one HTTP request/response through the engine's
//! phases and keeps the state the intervention protocol needs: the ignore
//! policy, the bypass and force-log flags, and the rules that blocked it.
//!
//! Typical order of calls, each `process_*` followed by
//! [`Transaction::should_intervene`]:
//!
//! 1. [`Transaction::begin_connection`]
//! 2. [`Transaction::process_uri`]
//! 3. [`Transaction::add_request_header`]* then [`Transaction::process_request_headers`]
//! 4. [`Transaction::append_request_body`]* then [`Transaction::process_request_body`] (optional)
//! 5. [`Transaction::add_response_header`]* then [`Transaction::process_response_headers`]
//! 6. [`Transaction::append_response_body`]* then [`Transaction::process_response_body`] (optional)
//! 7. [`Transaction::process_logging`]
//! 8. [`Transaction::cleanup`] (also run on drop)

use super::buffer::ResourceTracker;
use super::engine::InspectionEngine;
use super::error::{InspectionError, InspectionResult};
use super::intervention::InterventionOutcome;
use super::phase::Phase;
use super::policy::IgnorePolicy;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

static NEXT_TRANSACTION_ID: AtomicU64 = AtomicU64::new(1);

/// One HTTP transaction under inspection.
///
/// The engine context and every buffer handed to the engine are owned
/// here and released together by [`Transaction::cleanup`]. Not meant to be
/// shared between threads while in use; independent transactions may run
/// on different threads against the same engine.
pub struct Transaction<E: InspectionEngine> {
    id: u64,
    engine: Arc<E>,
    context: Option<E::Context>,
    resources: ResourceTracker,
    ignore_rules: IgnorePolicy,
    bypassed: bool,
    force_log: bool,
    logged: bool,
    blocked_by: Vec<String>,
    last_phase: Option<Phase>,
    remote_addr: String,
    request_line: Option<String>,
}

type Parts<'a, E> = (
    &'a E,
    &'a mut <E as InspectionEngine>::Context,
    &'a mut ResourceTracker,
);

impl<E: InspectionEngine> Transaction<E> {
    /// Open a transaction and run connection processing.
    ///
    /// If the engine rejects the connection the new context is released
    /// before returning.
    pub fn begin_connection(
        engine: Arc<E>,
        remote_host: &str,
        remote_port: u16,
        local_host: &str,
        local_port: u16,
    ) -> InspectionResult<Self> {
        let mut context = engine.new_transaction_context().map_err(|_| {
            warn!("Engine could not create a transaction context");
            InspectionError::EngineInit
        })?;

        let mut resources = ResourceTracker::new();
        let remote = resources.text(remote_host);
        let local = resources.text(local_host);

        if engine
            .process_connection(&mut context, &remote, remote_port, &local, local_port)
            .is_err()
        {
            engine.release_transaction_context(context);
            resources.release_all();

            let err = InspectionError::ConnectionProcessing {
                remote: remote_host.to_string(),
                remote_port,
                local: local_host.to_string(),
                local_port,
            };
            warn!("{}", err);
            return Err(err);
        }

        let id = NEXT_TRANSACTION_ID.fetch_add(1, Ordering::Relaxed);
        debug!(
            "Transaction {} opened for {}:{} -> {}:{}",
            id, remote_host, remote_port, local_host, local_port
        );

        Ok(Self {
            id,
            engine,
            context: Some(context),
            resources,
            ignore_rules: IgnorePolicy::default(),
            bypassed: false,
            force_log: false,
            logged: false,
            blocked_by: Vec::new(),
            last_phase: Some(Phase::Connection),
            remote_addr: format!("{remote_host}:{remote_port}"),
            request_line: None,
        })
    }

    /// Builder: set the ignore list
    pub fn with_ignore_rules(mut self, list: &str) -> Self {
        self.set_ignore_rules(list);
        self
    }

    /// Builder: set force-log
    pub fn with_force_log(mut self, force_log: bool) -> Self {
        self.force_log = force_log;
        self
    }

    /// Replace the ignore list
    pub fn set_ignore_rules(&mut self, list: &str) {
        self.ignore_rules = IgnorePolicy::parse(list);
    }

    /// Run logging even when bypassed
    pub fn set_force_log(&mut self, force_log: bool) {
        self.force_log = force_log;
    }

    fn parts(&mut self) -> InspectionResult<Parts<'_, E>> {
        let id = self.id;
        let context = self
            .context
            .as_mut()
            .ok_or(InspectionError::TransactionClosed(id))?;
        Ok((&*self.engine, context, &mut self.resources))
    }

    fn complete(&mut self, phase: Phase) {
        debug!("Transaction {} completed {}", self.id, phase);
        self.last_phase = Some(phase);
    }

    fn rejected(&self, err: InspectionError) -> InspectionError {
        warn!("Transaction {}: {}", self.id, err);
        err
    }

    /// Inspect the request line.
    ///
    /// Call once, after the connection and before the request headers.
    pub fn process_uri(
        &mut self,
        uri: &str,
        method: &str,
        http_version: &str,
    ) -> InspectionResult<()> {
        if self.request_line.is_some() {
            warn!("Transaction {} processed its URI more than once", self.id);
        }

        let (engine, ctx, resources) = self.parts()?;
        let c_uri = resources.text(uri);
        let c_method = resources.text(method);
        let c_version = resources.text(http_version);

        if engine.process_uri(ctx, &c_uri, &c_method, &c_version).is_err() {
            return Err(self.rejected(InspectionError::UriProcessing {
                uri: uri.to_string(),
                method: method.to_string(),
            }));
        }

        self.request_line = Some(format!("{method} {uri} HTTP/{http_version}"));
        self.complete(Phase::Uri);
        Ok(())
    }

    /// Add a request header. Analysis happens in
    /// [`Transaction::process_request_headers`].
    pub fn add_request_header(&mut self, name: &str, value: &str) -> InspectionResult<()> {
        self.add_header(Phase::RequestHeaders, name, value)
    }

    /// Analyse every request header added so far (possibly none)
    pub fn process_request_headers(&mut self) -> InspectionResult<()> {
        let (engine, ctx, _) = self.parts()?;
        if engine.process_request_headers(ctx).is_err() {
            return Err(self.rejected(InspectionError::HeaderProcessing(
                Phase::RequestHeaders,
            )));
        }
        self.complete(Phase::RequestHeaders);
        Ok(())
    }

    /// Feed a chunk of the request body. Empty chunks are rejected.
    pub fn append_request_body(&mut self, chunk: &[u8]) -> InspectionResult<()> {
        self.append_body(Phase::RequestBody, chunk)
    }

    /// Analyse the buffered request body.
    ///
    /// Optional: requests without a body may skip both append and process.
    pub fn process_request_body(&mut self) -> InspectionResult<()> {
        let (engine, ctx, _) = self.parts()?;
        if engine.process_request_body(ctx).is_err() {
            return Err(self.rejected(InspectionError::BodyProcessing(Phase::RequestBody)));
        }
        self.complete(Phase::RequestBody);
        Ok(())
    }

    /// Add a response header. Analysis happens in
    /// [`Transaction::process_response_headers`].
    pub fn add_response_header(&mut self, name: &str, value: &str) -> InspectionResult<()> {
        self.add_header(Phase::ResponseHeaders, name, value)
    }

    /// Analyse the response status and every response header added so far
    pub fn process_response_headers(
        &mut self,
        status_code: u16,
        http_version: &str,
    ) -> InspectionResult<()> {
        let (engine, ctx, resources) = self.parts()?;
        let c_version = resources.text(http_version);
        if engine
            .process_response_headers(ctx, status_code, &c_version)
            .is_err()
        {
            return Err(self.rejected(InspectionError::HeaderProcessing(
                Phase::ResponseHeaders,
            )));
        }
        self.complete(Phase::ResponseHeaders);
        Ok(())
    }

    /// Feed a chunk of the response body. Empty chunks are rejected.
    pub fn append_response_body(&mut self, chunk: &[u8]) -> InspectionResult<()> {
        self.append_body(Phase::ResponseBody, chunk)
    }

    /// Analyse the buffered response body. Optional, like the request side.
    pub fn process_response_body(&mut self) -> InspectionResult<()> {
        let (engine, ctx, _) = self.parts()?;
        if engine.process_response_body(ctx).is_err() {
            return Err(self.rejected(InspectionError::BodyProcessing(Phase::ResponseBody)));
        }
        self.complete(Phase::ResponseBody);
        Ok(())
    }

    /// Run the engine's audit logging.
    ///
    /// Skipped without an engine call when the transaction is bypassed,
    /// unless force-log is set. The response may already have been sent.
    pub fn process_logging(&mut self) -> InspectionResult<()> {
        let skip = self.bypassed && !self.force_log;
        let (engine, ctx, _) = self.parts()?;

        if skip {
            debug!("Transaction bypassed, skipping logging");
            return Ok(());
        }

        if engine.process_logging(ctx).is_err() {
            return Err(self.rejected(InspectionError::Logging));
        }
        self.logged = true;
        self.complete(Phase::Logging);
        Ok(())
    }

    fn add_header(&mut self, phase: Phase, name: &str, value: &str) -> InspectionResult<()> {
        let (engine, ctx, resources) = self.parts()?;
        let c_name = resources.text(name);
        let c_value = resources.text(value);

        let status = if phase.is_response() {
            engine.add_response_header(ctx, &c_name, &c_value)
        } else {
            engine.add_request_header(ctx, &c_name, &c_value)
        };

        status.map_err(|_| {
            self.rejected(InspectionError::HeaderAddition {
                phase,
                name: name.to_string(),
            })
        })
    }

    fn append_body(&mut self, phase: Phase, chunk: &[u8]) -> InspectionResult<()> {
        let (engine, ctx, resources) = self.parts()?;

        if chunk.is_empty() {
            return Err(InspectionError::BodyAppend {
                phase,
                reason: "empty chunk".to_string(),
            });
        }

        let buffer = resources.bytes(chunk);
        let status = if phase.is_response() {
            engine.append_response_body(ctx, &buffer)
        } else {
            engine.append_request_body(ctx, &buffer)
        };

        status.map_err(|_| {
            self.rejected(InspectionError::BodyAppend {
                phase,
                reason: "rejected by engine".to_string(),
            })
        })
    }

    /// Take the engine's pending intervention and decide on it.
    ///
    /// An ignored rule bypasses the whole transaction: this and every later
    /// intervention is suppressed. Blocking rules are appended to
    /// [`Transaction::blocked_by`].
    pub fn evaluate_intervention(&mut self) -> InterventionOutcome {
        let Some(ctx) = self.context.as_mut() else {
            warn!("Transaction {} queried after cleanup", self.id);
            return InterventionOutcome::None;
        };

        let pending = self.engine.query_intervention(ctx);
        let outcome = InterventionOutcome::assess(pending, &self.ignore_rules, self.bypassed);

        match &outcome {
            InterventionOutcome::None => {},
            InterventionOutcome::Suppressed { rule_id } => {
                if !self.bypassed {
                    info!(
                        "Transaction {} bypassed by ignored rule {}",
                        self.id, rule_id
                    );
                }
                self.bypassed = true;
            },
            InterventionOutcome::Block {
                rule_id,
                intervention,
            } => {
                info!(
                    "Transaction {} blocked by rule {} (status {})",
                    self.id, rule_id, intervention.status
                );
                self.blocked_by.push(rule_id.clone());
            },
        }

        outcome
    }

    /// Whether the caller should block after the last phase
    pub fn should_intervene(&mut self) -> bool {
        self.evaluate_intervention().is_blocking()
    }

    /// Release the engine context and every tracked buffer.
    ///
    /// Safe to call more than once; only the first call releases anything.
    pub fn cleanup(&mut self) {
        if let Some(context) = self.context.take() {
            self.engine.release_transaction_context(context);
            debug!("Transaction {} released its engine context", self.id);
        }
        self.resources.release_all();
    }

    /// Process-unique transaction id
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Rules that blocked this transaction, in detection order
    pub fn blocked_by(&self) -> &[String] {
        &self.blocked_by
    }

    /// Whether an ignored rule bypassed the transaction
    pub fn is_bypassed(&self) -> bool {
        self.bypassed
    }

    /// Whether logging runs even when bypassed
    pub fn force_log(&self) -> bool {
        self.force_log
    }

    /// Whether the engine's logging phase ran
    pub fn was_logged(&self) -> bool {
        self.logged
    }

    /// The configured ignore list
    pub fn ignore_rules(&self) -> &IgnorePolicy {
        &self.ignore_rules
    }

    /// Last phase the engine accepted
    pub fn last_phase(&self) -> Option<Phase> {
        self.last_phase
    }

    /// Client endpoint as `host:port`
    pub fn remote_addr(&self) -> &str {
        &self.remote_addr
    }

    /// Request line, once the URI has been processed
    pub fn request_line(&self) -> Option<&str> {
        self.request_line.as_deref()
    }

    /// Buffers awaiting release
    pub fn pending_buffers(&self) -> usize {
        self.resources.len()
    }

    /// Whether [`Transaction::cleanup`] has run
    pub fn is_closed(&self) -> bool {
        self.context.is_none()
    }
}

impl<E: InspectionEngine> Drop for Transaction<E> {
    fn drop(&mut self) {
        if self.context.is_some() {
            debug!("Transaction {} dropped without cleanup", self.id);
        }
        self.cleanup();
    }
}

impl<E: InspectionEngine> std::fmt::Debug for Transaction<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("id", &self.id)
            .field("remote_addr", &self.remote_addr)
            .field("request_line", &self.request_line)
            .field("ignore_rules", &self.ignore_rules.as_str())
            .field("bypassed", &self.bypassed)
            .field("force_log", &self.force_log)
            .field("blocked_by", &self.blocked_by)
            .field("last_phase", &self.last_phase)
            .field("pending_buffers", &self.resources.len())
            .field("closed", &self.context.is_none())
            .finish()
    }
}
