//! Handle for one fetched or created entry.
//!
//! # Design
//! An `Entry` caches the record it was built from and never re-fetches.
//! Updates are addressed by the cached `_id` and do not touch the cache:
//! `update_value` and `update_values` hand back the pre-update record.
//! Call `Collection::get_entry_by_id` for the backend's current state.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::client::Context;
use crate::error::{MarcSyncError, Result};
use crate::types::{EntryData, ID_FIELD};

#[derive(Debug, Clone)]
pub struct Entry {
    ctx: Arc<Context>,
    collection: String,
    data: EntryData,
}

impl Entry {
    pub(crate) fn new(ctx: Arc<Context>, collection: &str, data: EntryData) -> Self {
        Self {
            ctx,
            collection: collection.to_string(),
            data,
        }
    }

    /// The cached record.
    pub fn values(&self) -> &EntryData {
        &self.data
    }

    pub fn into_values(self) -> EntryData {
        self.data
    }

    /// A single cached field; `None` when absent.
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// A copy of this handle whose requests carry `timeout`.
    pub fn with_timeout(&self, timeout: Duration) -> Entry {
        Entry {
            ctx: self.ctx.with_timeout(timeout),
            collection: self.collection.clone(),
            data: self.data.clone(),
        }
    }

    pub fn collection_name(&self) -> &str {
        &self.collection
    }

    /// The `_id` when it is a string. Use `value("_id")` for other id types.
    pub fn id(&self) -> Option<&str> {
        self.data.id()
    }

    /// Sets one field on the backend. Returns the cached, pre-update record.
    pub fn update_value(&self, key: &str, value: impl Into<Value>) -> Result<&EntryData> {
        let patch: EntryData = [(key, value.into())].into_iter().collect();
        self.update_values(&patch)
    }

    /// Merges `data` into the entry on the backend. Returns the cached,
    /// pre-update record.
    pub fn update_values(&self, data: &EntryData) -> Result<&EntryData> {
        let filters = self.id_filter()?;
        let request = self.ctx.api.build_update_entries(&self.collection, &filters, data)?;
        let response = self.ctx.send(request)?;
        self.ctx.api.parse_status(response)?;
        Ok(&self.data)
    }

    /// Deletes the entry on the backend. The handle stays usable for reads;
    /// further writes address an id that no longer exists.
    pub fn delete(&self) -> Result<()> {
        let filters = self.id_filter()?;
        let request = self.ctx.api.build_delete_entries(&self.collection, &filters)?;
        let response = self.ctx.send(request)?;
        self.ctx.api.parse_status(response)
    }

    /// `{_id: <cached value>}`, whatever JSON type the backend assigned.
    fn id_filter(&self) -> Result<EntryData> {
        let id = self.data.get(ID_FIELD).cloned().ok_or_else(|| MarcSyncError::MissingId {
            collection: self.collection.clone(),
        })?;
        Ok([(ID_FIELD, id)].into_iter().collect())
    }
}
