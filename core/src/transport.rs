//! Executes `HttpRequest` values against the network.
//!
//! # Design
//! The request contract in `api` never performs I/O. A `Transport` owns the
//! one blocking exchange per operation, so tests and embedders can swap in
//! their own. `UreqTransport` is the default: it attaches bodies to GET and
//! DELETE (the backend reads filters from the body) and hands every status
//! back as data so `ApiClient` alone decides what counts as success.
//!
//! Response bodies are read whole by default. Once a status is in hand, a
//! body that cannot be read is a `Decode` error, not a `Transport` one.

use std::sync::Arc;
use std::time::Duration;

use ureq::typestate::WithBody;
use ureq::{Agent, RequestBuilder};

use crate::config::ClientConfig;
use crate::error::{MarcSyncError, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// One synchronous request/response exchange.
///
/// Implementations return `Err(MarcSyncError::Transport)` only when no
/// status was obtained. Any status, including 4xx/5xx, is a successful
/// exchange.
pub trait Transport: Send + Sync {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.as_ref().execute(request)
    }
}

/// Blocking transport backed by a `ureq::Agent`.
#[derive(Clone)]
pub struct UreqTransport {
    agent: Agent,
    response_limit: u64,
}

impl std::fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UreqTransport")
            .field("response_limit", &self.response_limit)
            .finish_non_exhaustive()
    }
}

impl UreqTransport {
    /// Transport with no cap on response body size.
    pub fn new(timeout: Option<Duration>) -> Self {
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(timeout)
            .build()
            .new_agent();
        Self {
            agent,
            response_limit: u64::MAX,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.get_timeout()).response_limit(config.get_response_limit())
    }

    /// Largest response body accepted, in bytes.
    pub fn response_limit(mut self, bytes: u64) -> Self {
        self.response_limit = bytes;
        self
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let HttpRequest {
            method,
            path,
            headers,
            body,
            timeout,
        } = request;
        let prep = |builder: RequestBuilder<WithBody>| prepare(builder, &headers, timeout);

        let result = match (method, body) {
            (HttpMethod::Get, None) => prepare(self.agent.get(&path), &headers, timeout).call(),
            (HttpMethod::Delete, None) => prepare(self.agent.delete(&path), &headers, timeout).call(),
            (HttpMethod::Get, Some(body)) => prep(self.agent.get(&path).force_send_body()).send(body.as_bytes()),
            (HttpMethod::Delete, Some(body)) => prep(self.agent.delete(&path).force_send_body()).send(body.as_bytes()),
            (HttpMethod::Post, Some(body)) => prep(self.agent.post(&path)).send(body.as_bytes()),
            (HttpMethod::Post, None) => prep(self.agent.post(&path)).send_empty(),
            (HttpMethod::Put, Some(body)) => prep(self.agent.put(&path)).send(body.as_bytes()),
            (HttpMethod::Put, None) => prep(self.agent.put(&path)).send_empty(),
        };
        let mut response = result.map_err(|e| MarcSyncError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
            .collect();
        // A status was obtained; an unreadable body is a response problem.
        let body = response
            .body_mut()
            .with_config()
            .limit(self.response_limit)
            .read_to_string()
            .map_err(|e| MarcSyncError::Decode(format!("reading HTTP {status} body: {e}")))?;

        Ok(HttpResponse { status, headers, body })
    }
}

fn prepare<B>(
    mut builder: RequestBuilder<B>,
    headers: &[(String, String)],
    timeout: Option<Duration>,
) -> RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    if let Some(timeout) = timeout {
        builder = builder.config().timeout_global(Some(timeout)).build();
    }
    builder
}
