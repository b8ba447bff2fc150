//! Synchronous client for the MarcSync document-store API.
//!
//! # Overview
//! Three handles, composed top-down:
//! - `Client` holds the access token and hands out `Collection` handles.
//! - `Collection` manages one named collection and the CRUD operations on
//!   its entries.
//! - `Entry` wraps one fetched or created record and addresses the backend
//!   by that record's `_id`.
//!
//! ```no_run
//! use marcsync::{Client, EntryData};
//!
//! # fn main() -> marcsync::Result<()> {
//! let client = Client::new("my-access-token");
//! let users = client.fetch_collection("users")?;
//!
//! let data: EntryData = [("name", "ann")].into_iter().collect();
//! let entry = users.create_entry(data)?;
//! entry.update_value("age", 31)?;
//! # Ok(())
//! # }
//! ```
//!
//! # Design
//! - `ApiClient` is the request contract: `build_*` produces an
//!   `HttpRequest`, `parse_*` consumes an `HttpResponse`. It never does I/O.
//! - A `Transport` performs the one blocking exchange per operation.
//!   `UreqTransport` is the default; anything implementing the trait can
//!   replace it.
//! - No operation retries, caches or re-fetches. Handles are cheap to clone
//!   and safe to share across threads.
//! - `with_timeout` on `Client`, `Collection` or `Entry` gives a copy whose
//!   calls carry their own deadline; `ClientConfig::timeout` is the default.

pub mod api;
pub mod client;
pub mod collection;
pub mod config;
pub mod entry;
pub mod error;
pub mod http;
pub mod transport;
pub mod types;

pub use api::ApiClient;
pub use client::Client;
pub use collection::Collection;
pub use config::ClientConfig;
pub use entry::Entry;
pub use error::{MarcSyncError, Result};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use transport::{Transport, UreqTransport};
pub use types::{EntryData, ID_FIELD};
