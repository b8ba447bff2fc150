//! Error types for the MarcSync client.
//!
//! # Design
//! Callers need to tell "the backend rejected the call" (`Remote`) apart from
//! "the backend was never reached" (`Transport`) and "the backend answered
//! with something we cannot read" (`Decode`). Every handle operation returns
//! one of these directly; nothing is retried or recovered locally except the
//! `Collection::exists` soft-check.

use thiserror::Error;

/// Errors returned by `Client`, `Collection` and `Entry` operations.
#[derive(Debug, Error)]
pub enum MarcSyncError {
    /// The backend answered with a status other than 200.
    #[error("HTTP {status}: {message}")]
    Remote { status: u16, message: String },

    /// No status was obtained: DNS failure, refused connection, timeout,
    /// malformed URL.
    #[error("transport failed: {0}")]
    Transport(String),

    /// The response body was not JSON or did not have the expected shape.
    #[error("deserialization failed: {0}")]
    Decode(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// `get_entry_by_id` matched nothing.
    #[error("no entry with id {id} in collection {collection}")]
    EmptyResult { collection: String, id: String },

    /// The entry's cached record has no string `_id` to address it by.
    #[error("entry in collection {collection} has no _id")]
    MissingId { collection: String },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl MarcSyncError {
    /// True when the backend responded with a non-success status.
    pub fn is_remote(&self) -> bool {
        matches!(self, MarcSyncError::Remote { .. })
    }

    /// The HTTP status carried by a `Remote` error.
    pub fn status(&self) -> Option<u16> {
        match self {
            MarcSyncError::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, MarcSyncError>;
