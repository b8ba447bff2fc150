//! Entry point holding the access token.
//!
//! `Client` is a factory for `Collection` handles. Only `fetch_collection`
//! and `create_collection` talk to the backend; `get_collection` is free.
//!
//! `with_timeout` on any handle returns a copy whose requests carry their
//! own deadline, overriding `ClientConfig::timeout` for those calls only:
//!
//! ```no_run
//! # use std::time::Duration;
//! # fn main() -> marcsync::Result<()> {
//! let users = marcsync::Client::new("token").get_collection("users");
//! let all = users
//!     .with_timeout(Duration::from_secs(30))
//!     .get_entries(&marcsync::EntryData::new())?;
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::api::ApiClient;
use crate::collection::Collection;
use crate::config::ClientConfig;
use crate::error::Result;
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::{Transport, UreqTransport};

/// What every handle shares: the request contract, the transport and an
/// optional per-call deadline.
pub(crate) struct Context {
    pub(crate) api: ApiClient,
    transport: Arc<dyn Transport>,
    timeout: Option<Duration>,
}

impl Context {
    pub(crate) fn send(&self, mut request: HttpRequest) -> Result<HttpResponse> {
        if request.timeout.is_none() {
            request.timeout = self.timeout;
        }
        debug!(method = %request.method, path = %request.path, timeout = ?request.timeout, "sending request");
        let response = self.transport.execute(request)?;
        debug!(status = response.status, "received response");
        Ok(response)
    }

    /// Same api and transport, with `timeout` stamped on every request.
    pub(crate) fn with_timeout(&self, timeout: Duration) -> Arc<Context> {
        Arc::new(Context {
            api: self.api.clone(),
            transport: Arc::clone(&self.transport),
            timeout: Some(timeout),
        })
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("api", &self.api)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// MarcSync client bound to one access token.
#[derive(Debug, Clone)]
pub struct Client {
    ctx: Arc<Context>,
}

impl Client {
    /// Client for the hosted backend. The token is sent verbatim in the
    /// `authorization` header.
    pub fn new(access_token: &str) -> Self {
        Self::with_config(access_token, ClientConfig::default())
    }

    pub fn with_config(access_token: &str, config: ClientConfig) -> Self {
        let transport = UreqTransport::from_config(&config);
        Self::with_transport(access_token, &config, transport)
    }

    /// Client using a caller-supplied transport. The config's timeout and
    /// response limit are the transport's business and are ignored here.
    /// Pass an `Arc` to share one transport between clients.
    pub fn with_transport(access_token: &str, config: &ClientConfig, transport: impl Transport + 'static) -> Self {
        Self {
            ctx: Arc::new(Context {
                api: ApiClient::new(config.get_base_url(), access_token),
                transport: Arc::new(transport),
                timeout: None,
            }),
        }
    }

    /// A copy of this client whose requests, and those of the handles it
    /// hands out, carry `timeout`.
    pub fn with_timeout(&self, timeout: Duration) -> Client {
        Client {
            ctx: self.ctx.with_timeout(timeout),
        }
    }

    /// Handle for `name` without contacting the backend.
    pub fn get_collection(&self, name: &str) -> Collection {
        Collection::new(Arc::clone(&self.ctx), name)
    }

    /// Handle for `name`, after the backend confirmed the collection exists.
    pub fn fetch_collection(&self, name: &str) -> Result<Collection> {
        let response = self.ctx.send(self.ctx.api.build_fetch_collection(name))?;
        self.ctx.api.parse_status(response)?;
        Ok(self.get_collection(name))
    }

    /// Creates `name` on the backend. Fails with `Remote` when the collection
    /// already exists or the token may not create it.
    pub fn create_collection(&self, name: &str) -> Result<Collection> {
        let response = self.ctx.send(self.ctx.api.build_create_collection(name))?;
        self.ctx.api.parse_status(response)?;
        Ok(self.get_collection(name))
    }
}
