//! Handle for one named collection.
//!
//! # Design
//! A `Collection` is identified by its name for its whole lifetime. Renaming
//! returns a new handle instead of mutating this one, so a handle can never
//! silently point at a name the backend no longer knows.
//!
//! Filter-based deletes and updates forward the filter verbatim. An empty
//! filter matches every entry in the collection; it is sent as-is and only
//! logged.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::client::Context;
use crate::entry::Entry;
use crate::error::{MarcSyncError, Result};
use crate::types::EntryData;

#[derive(Debug, Clone)]
pub struct Collection {
    ctx: Arc<Context>,
    name: String,
}

impl Collection {
    pub(crate) fn new(ctx: Arc<Context>, name: &str) -> Self {
        Self {
            ctx,
            name: name.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// A copy of this handle whose requests carry `timeout`. Entries it
    /// returns inherit the deadline.
    pub fn with_timeout(&self, timeout: Duration) -> Collection {
        Collection {
            ctx: self.ctx.with_timeout(timeout),
            name: self.name.clone(),
        }
    }

    /// Deletes the collection and all of its entries. Irreversible.
    pub fn drop(self) -> Result<()> {
        let response = self.ctx.send(self.ctx.api.build_drop_collection(&self.name))?;
        self.ctx.api.parse_status(response)
    }

    /// Renames the collection on the backend and returns a handle bound to
    /// the new name. `self` keeps the old name.
    pub fn set_name(&self, new_name: &str) -> Result<Collection> {
        let request = self.ctx.api.build_rename_collection(&self.name, new_name)?;
        let response = self.ctx.send(request)?;
        self.ctx.api.parse_status(response)?;
        Ok(Collection::new(Arc::clone(&self.ctx), new_name))
    }

    /// Soft existence check: every failure, remote or transport, reads as
    /// `false`.
    pub fn exists(&self) -> bool {
        let result = self
            .ctx
            .send(self.ctx.api.build_fetch_collection(&self.name))
            .and_then(|response| self.ctx.api.parse_status(response));
        match result {
            Ok(()) => true,
            Err(e) => {
                debug!(collection = %self.name, error = %e, "collection does not exist");
                false
            }
        }
    }

    /// Stores `data` and returns a handle over it. The handle wraps the
    /// submitted record, completed with the backend-assigned `_id` when the
    /// backend reports one.
    pub fn create_entry(&self, data: EntryData) -> Result<Entry> {
        let request = self.ctx.api.build_create_entry(&self.name, &data)?;
        let response = self.ctx.send(request)?;
        let data = self.ctx.api.parse_create_entry(response, data)?;
        Ok(self.entry(data))
    }

    /// The entry whose `_id` is `id`. Zero matches is `EmptyResult`.
    pub fn get_entry_by_id(&self, id: &str) -> Result<Entry> {
        let mut entries = self.fetch(&EntryData::with_id(id))?;
        if entries.is_empty() {
            return Err(MarcSyncError::EmptyResult {
                collection: self.name.clone(),
                id: id.to_string(),
            });
        }
        Ok(self.entry(entries.swap_remove(0)))
    }

    /// All entries matching `filters`, in backend order. An empty filter
    /// returns every entry.
    pub fn get_entries(&self, filters: &EntryData) -> Result<Vec<Entry>> {
        let entries = self.fetch(filters)?;
        Ok(entries.into_iter().map(|data| self.entry(data)).collect())
    }

    pub fn delete_entry_by_id(&self, id: &str) -> Result<()> {
        self.delete_matching(&EntryData::with_id(id))
    }

    /// Deletes every entry matching `filters`. An empty filter empties the
    /// collection.
    pub fn delete_entries(&self, filters: &EntryData) -> Result<()> {
        if filters.is_empty() {
            warn!(collection = %self.name, "deleting with an empty filter removes every entry");
        }
        self.delete_matching(filters)
    }

    /// Merges `data` into the entry whose `_id` is `id`.
    pub fn update_entry_by_id(&self, id: &str, data: &EntryData) -> Result<()> {
        self.update_matching(&EntryData::with_id(id), data)
    }

    /// Merges `data` into every entry matching `filters`. Fields absent from
    /// `data` are left untouched.
    pub fn update_entries(&self, filters: &EntryData, data: &EntryData) -> Result<()> {
        if filters.is_empty() {
            warn!(collection = %self.name, "updating with an empty filter touches every entry");
        }
        self.update_matching(filters, data)
    }

    fn fetch(&self, filters: &EntryData) -> Result<Vec<EntryData>> {
        let request = self.ctx.api.build_get_entries(&self.name, filters)?;
        let response = self.ctx.send(request)?;
        self.ctx.api.parse_get_entries(response)
    }

    fn delete_matching(&self, filters: &EntryData) -> Result<()> {
        let request = self.ctx.api.build_delete_entries(&self.name, filters)?;
        let response = self.ctx.send(request)?;
        self.ctx.api.parse_status(response)
    }

    fn update_matching(&self, filters: &EntryData, data: &EntryData) -> Result<()> {
        let request = self.ctx.api.build_update_entries(&self.name, filters, data)?;
        let response = self.ctx.send(request)?;
        self.ctx.api.parse_status(response)
    }

    pub(crate) fn entry(&self, data: EntryData) -> Entry {
        Entry::new(Arc::clone(&self.ctx), &self.name, data)
    }
}
