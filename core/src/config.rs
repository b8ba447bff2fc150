//! Client configuration.
//!
//! Defaults target the hosted backend with no timeout override and no cap
//! on response size.
//! `from_env` lets deployments point at another backend without code changes.

use std::time::Duration;

use crate::error::{MarcSyncError, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.marcsync.dev";

pub const BASE_URL_ENV: &str = "MARCSYNC_BASE_URL";
pub const TIMEOUT_ENV: &str = "MARCSYNC_TIMEOUT_SECS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    base_url: String,
    timeout: Option<Duration>,
    response_limit: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
            response_limit: u64::MAX,
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads `MARCSYNC_BASE_URL` and `MARCSYNC_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(url) = lookup(BASE_URL_ENV).filter(|u| !u.trim().is_empty()) {
            config = config.base_url(&url);
        }
        if let Some(raw) = lookup(TIMEOUT_ENV) {
            let secs: u64 = raw
                .trim()
                .parse()
                .map_err(|_| MarcSyncError::Config(format!("{TIMEOUT_ENV}={raw} is not a number of seconds")))?;
            config = config.timeout(Duration::from_secs(secs));
        }
        Ok(config)
    }

    pub fn base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim().trim_end_matches('/').to_string();
        self
    }

    /// Upper bound on a whole request/response exchange.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Largest response body accepted, in bytes. Unlimited by default so a
    /// filter matching a large collection is read whole.
    pub fn response_limit(mut self, bytes: u64) -> Self {
        self.response_limit = bytes;
        self
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }

    pub fn get_timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn get_response_limit(&self) -> u64 {
        self.response_limit
    }
}
