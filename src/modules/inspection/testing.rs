//! Scripted engine for unit tests

use super::buffer::TrackedBuffer;
use super::engine::{EngineFault, EngineStatus, InspectionEngine, Intervention};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Engine that records every call and raises interventions on cue.
#[derive(Debug, Default)]
pub(crate) struct ScriptedEngine {
    calls: Mutex<Vec<String>>,
    retained_at_release: Mutex<Vec<String>>,
    triggers: HashMap<&'static str, Intervention>,
    failures: HashSet<&'static str>,
    refuse_contexts: bool,
    created: AtomicUsize,
    released: AtomicUsize,
}

#[derive(Debug, Default)]
pub(crate) struct ScriptedContext {
    pending: Option<Intervention>,
    retained: Vec<TrackedBuffer>,
}

impl ScriptedEngine {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Raise `intervention` after every call to `call`
    pub(crate) fn intervene_after(mut self, call: &'static str, intervention: Intervention) -> Self {
        self.triggers.insert(call, intervention);
        self
    }

    /// Make every call to `call` fail
    pub(crate) fn fail_on(mut self, call: &'static str) -> Self {
        self.failures.insert(call);
        self
    }

    pub(crate) fn refuse_contexts(mut self) -> Self {
        self.refuse_contexts = true;
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, call: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == call).count()
    }

    pub(crate) fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    pub(crate) fn live_contexts(&self) -> usize {
        self.created.load(Ordering::SeqCst) - self.released()
    }

    /// Text of every buffer the engine still held when contexts were released
    pub(crate) fn retained_at_release(&self) -> Vec<String> {
        self.retained_at_release.lock().unwrap().clone()
    }

    fn record(
        &self,
        ctx: &mut ScriptedContext,
        call: &'static str,
        buffers: &[&TrackedBuffer],
    ) -> EngineStatus {
        self.calls.lock().unwrap().push(call.to_string());
        ctx.retained.extend(buffers.iter().map(|b| (*b).clone()));

        if self.failures.contains(call) {
            return Err(EngineFault);
        }
        if let Some(intervention) = self.triggers.get(call) {
            ctx.pending = Some(intervention.clone());
        }
        Ok(())
    }
}

impl InspectionEngine for ScriptedEngine {
    type Context = ScriptedContext;

    fn new_transaction_context(&self) -> Result<Self::Context, EngineFault> {
        self.calls
            .lock()
            .unwrap()
            .push("new_transaction_context".to_string());
        if self.refuse_contexts {
            return Err(EngineFault);
        }
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(ScriptedContext::default())
    }

    fn process_connection(
        &self,
        ctx: &mut Self::Context,
        remote_host: &TrackedBuffer,
        _remote_port: u16,
        local_host: &TrackedBuffer,
        _local_port: u16,
    ) -> EngineStatus {
        self.record(ctx, "process_connection", &[remote_host, local_host])
    }

    fn process_uri(
        &self,
        ctx: &mut Self::Context,
        uri: &TrackedBuffer,
        method: &TrackedBuffer,
        http_version: &TrackedBuffer,
    ) -> EngineStatus {
        self.record(ctx, "process_uri", &[uri, method, http_version])
    }

    fn add_request_header(
        &self,
        ctx: &mut Self::Context,
        name: &TrackedBuffer,
        value: &TrackedBuffer,
    ) -> EngineStatus {
        self.record(ctx, "add_request_header", &[name, value])
    }

    fn process_request_headers(&self, ctx: &mut Self::Context) -> EngineStatus {
        self.record(ctx, "process_request_headers", &[])
    }

    fn append_request_body(
        &self,
        ctx: &mut Self::Context,
        chunk: &TrackedBuffer,
    ) -> EngineStatus {
        self.record(ctx, "append_request_body", &[chunk])
    }

    fn process_request_body(&self, ctx: &mut Self::Context) -> EngineStatus {
        self.record(ctx, "process_request_body", &[])
    }

    fn add_response_header(
        &self,
        ctx: &mut Self::Context,
        name: &TrackedBuffer,
        value: &TrackedBuffer,
    ) -> EngineStatus {
        self.record(ctx, "add_response_header", &[name, value])
    }

    fn process_response_headers(
        &self,
        ctx: &mut Self::Context,
        _status_code: u16,
        http_version: &TrackedBuffer,
    ) -> EngineStatus {
        self.record(ctx, "process_response_headers", &[http_version])
    }

    fn append_response_body(
        &self,
        ctx: &mut Self::Context,
        chunk: &TrackedBuffer,
    ) -> EngineStatus {
        self.record(ctx, "append_response_body", &[chunk])
    }

    fn process_response_body(&self, ctx: &mut Self::Context) -> EngineStatus {
        self.record(ctx, "process_response_body", &[])
    }

    fn process_logging(&self, ctx: &mut Self::Context) -> EngineStatus {
        self.record(ctx, "process_logging", &[])
    }

    fn query_intervention(&self, ctx: &mut Self::Context) -> Option<Intervention> {
        self.calls
            .lock()
            .unwrap()
            .push("query_intervention".to_string());
        ctx.pending.take()
    }

    fn release_transaction_context(&self, ctx: Self::Context) {
        self.calls
            .lock()
            .unwrap()
            .push("release_transaction_context".to_string());
        self.retained_at_release
            .lock()
            .unwrap()
            .extend(ctx.retained.iter().map(|b| b.as_text().into_owned()));
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}
