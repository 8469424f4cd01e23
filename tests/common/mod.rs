#![allow(dead_code)]
//! Shared test support: a keyword-matching inspection engine.

use r0n_inspection::modules::inspection::{
    EngineFault, EngineStatus, InspectionEngine, Intervention, TrackedBuffer,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Raises an intervention whenever a phase sees one of its keywords.
///
/// Interventions carry a log line in the engine's usual format, with the
/// rule id in an `[id "..."]` token. Rules registered with an empty id
/// produce a log without that token.
#[derive(Debug, Default)]
pub struct KeywordEngine {
    rules: Vec<(String, String)>,
    calls: Mutex<Vec<&'static str>>,
    created: AtomicUsize,
    released: AtomicUsize,
}

#[derive(Debug, Default)]
pub struct KeywordContext {
    pending: Option<Intervention>,
    request_headers: Vec<String>,
    request_body: Vec<u8>,
    response_headers: Vec<String>,
    response_body: Vec<u8>,
    retained: Vec<TrackedBuffer>,
}

impl KeywordEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rule(mut self, keyword: &str, rule_id: &str) -> Self {
        self.rules.push((keyword.to_string(), rule_id.to_string()));
        self
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| **c == call)
            .count()
    }

    pub fn live_contexts(&self) -> usize {
        self.created.load(Ordering::SeqCst) - self.released.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    fn log(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }

    fn scan(&self, ctx: &mut KeywordContext, phase: u8, data: &str) {
        for (keyword, rule_id) in &self.rules {
            if data.contains(keyword.as_str()) {
                let id = if rule_id.is_empty() {
                    String::new()
                } else {
                    format!(r#"[id "{rule_id}"] "#)
                };
                let log = format!(
                    r#"ModSecurity: Access denied with code 403 (phase {phase}). {id}[msg "matched {keyword}"]"#
                );
                ctx.pending = Some(Intervention::new(403).with_log(log));
                return;
            }
        }
    }
}

impl InspectionEngine for KeywordEngine {
    type Context = KeywordContext;

    fn new_transaction_context(&self) -> Result<Self::Context, EngineFault> {
        self.log("new_transaction_context");
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(KeywordContext::default())
    }

    fn process_connection(
        &self,
        ctx: &mut Self::Context,
        remote_host: &TrackedBuffer,
        _remote_port: u16,
        local_host: &TrackedBuffer,
        _local_port: u16,
    ) -> EngineStatus {
        self.log("process_connection");
        if remote_host.is_empty() {
            return Err(EngineFault);
        }
        ctx.retained.push(remote_host.clone());
        ctx.retained.push(local_host.clone());
        Ok(())
    }

    fn process_uri(
        &self,
        ctx: &mut Self::Context,
        uri: &TrackedBuffer,
        method: &TrackedBuffer,
        http_version: &TrackedBuffer,
    ) -> EngineStatus {
        self.log("process_uri");
        ctx.retained
            .extend([uri.clone(), method.clone(), http_version.clone()]);
        let uri = uri.as_text().into_owned();
        self.scan(ctx, 1, &uri);
        Ok(())
    }

    fn add_request_header(
        &self,
        ctx: &mut Self::Context,
        name: &TrackedBuffer,
        value: &TrackedBuffer,
    ) -> EngineStatus {
        self.log("add_request_header");
        ctx.request_headers
            .push(format!("{}: {}", name.as_text(), value.as_text()));
        Ok(())
    }

    fn process_request_headers(&self, ctx: &mut Self::Context) -> EngineStatus {
        self.log("process_request_headers");
        let headers = ctx.request_headers.join("\n");
        self.scan(ctx, 1, &headers);
        Ok(())
    }

    fn append_request_body(
        &self,
        ctx: &mut Self::Context,
        chunk: &TrackedBuffer,
    ) -> EngineStatus {
        self.log("append_request_body");
        ctx.request_body.extend_from_slice(chunk.as_bytes());
        Ok(())
    }

    fn process_request_body(&self, ctx: &mut Self::Context) -> EngineStatus {
        self.log("process_request_body");
        let body = String::from_utf8_lossy(&ctx.request_body).into_owned();
        self.scan(ctx, 2, &body);
        Ok(())
    }

    fn add_response_header(
        &self,
        ctx: &mut Self::Context,
        name: &TrackedBuffer,
        value: &TrackedBuffer,
    ) -> EngineStatus {
        self.log("add_response_header");
        ctx.response_headers
            .push(format!("{}: {}", name.as_text(), value.as_text()));
        Ok(())
    }

    fn process_response_headers(
        &self,
        ctx: &mut Self::Context,
        status_code: u16,
        _http_version: &TrackedBuffer,
    ) -> EngineStatus {
        self.log("process_response_headers");
        let headers = format!("status {status_code}\n{}", ctx.response_headers.join("\n"));
        self.scan(ctx, 3, &headers);
        Ok(())
    }

    fn append_response_body(
        &self,
        ctx: &mut Self::Context,
        chunk: &TrackedBuffer,
    ) -> EngineStatus {
        self.log("append_response_body");
        ctx.response_body.extend_from_slice(chunk.as_bytes());
        Ok(())
    }

    fn process_response_body(&self, ctx: &mut Self::Context) -> EngineStatus {
        self.log("process_response_body");
        let body = String::from_utf8_lossy(&ctx.response_body).into_owned();
        self.scan(ctx, 4, &body);
        Ok(())
    }

    fn process_logging(&self, _ctx: &mut Self::Context) -> EngineStatus {
        self.log("process_logging");
        Ok(())
    }

    fn query_intervention(&self, ctx: &mut Self::Context) -> Option<Intervention> {
        self.log("query_intervention");
        ctx.pending.take()
    }

    fn release_transaction_context(&self, _ctx: Self::Context) {
        self.log("release_transaction_context");
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}
