//! Records and wire payloads for the MarcSync API.
//!
//! # Design
//! A record has no schema, so `EntryData` wraps a JSON object map and its
//! values are `serde_json::Value`: string, number, bool, null, array or
//! nested object. Arbitrary backend JSON round-trips through it unchanged.
//! The same type serves as a record, a filter and a patch.
//!
//! The payload structs are private to the crate and borrow their records;
//! they exist only to give each request body its exact shape.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Name of the backend-assigned identifier field.
pub const ID_FIELD: &str = "_id";

/// A schema-less record: field name to dynamically typed value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryData(Map<String, Value>);

impl EntryData {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// A single-field record `{_id: id}`, the filter addressing one entry.
    pub fn with_id(id: impl Into<String>) -> Self {
        let mut data = Self::new();
        data.insert(ID_FIELD, Value::String(id.into()));
        data
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Inserts a field, returning the previous value if there was one.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> serde_json::map::Iter<'_> {
        self.0.iter()
    }

    /// The `_id` field, when present and a string.
    pub fn id(&self) -> Option<&str> {
        self.0.get(ID_FIELD).and_then(Value::as_str)
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for EntryData {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for EntryData {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl<'a> IntoIterator for &'a EntryData {
    type Item = (&'a String, &'a Value);
    type IntoIter = serde_json::map::Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Body of filtered GET and DELETE requests.
#[derive(Debug, Serialize)]
pub(crate) struct EntryFilterPayload<'a> {
    pub filters: &'a EntryData,
}

/// Body of update requests. `data` is merged into every matched entry.
#[derive(Debug, Serialize)]
pub(crate) struct EntryUpdatePayload<'a> {
    pub filters: &'a EntryData,
    pub data: &'a EntryData,
}

/// Body of create-entry requests.
#[derive(Debug, Serialize)]
pub(crate) struct EntryDataPayload<'a> {
    pub data: &'a EntryData,
}

/// Body of collection rename requests.
#[derive(Debug, Serialize)]
pub(crate) struct CollectionUpdatePayload<'a> {
    pub name: &'a str,
}

/// Response of filtered entry reads.
#[derive(Debug, Deserialize)]
pub(crate) struct EntriesResponse {
    pub entries: Vec<EntryData>,
}

/// Response of entry creation. Only the assigned id is of interest; it is
/// kept in whatever JSON type the backend uses.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct CreateEntryResponse {
    #[serde(rename = "objectId")]
    pub object_id: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn entry_data_preserves_nested_values() {
        let raw = r#"{"_id":"1","tags":["a","b"],"meta":{"n":1.5,"ok":true,"none":null}}"#;
        let data = EntryData::from_json(raw).unwrap();
        assert_eq!(data.id(), Some("1"));
        assert_eq!(data.get("tags"), Some(&json!(["a", "b"])));
        assert_eq!(data.get("meta").unwrap()["none"], Value::Null);

        let back: Value = serde_json::from_str(&data.to_json().unwrap()).unwrap();
        assert_eq!(back, serde_json::from_str::<Value>(raw).unwrap());
    }

    #[test]
    fn id_requires_a_string() {
        let data: EntryData = [("_id", json!(42))].into_iter().collect();
        assert!(data.contains_key(ID_FIELD));
        assert_eq!(data.id(), None);
    }

    #[test]
    fn with_id_builds_single_field_filter() {
        let filter = EntryData::with_id("abc");
        assert_eq!(filter.len(), 1);
        assert_eq!(serde_json::to_value(&filter).unwrap(), json!({"_id": "abc"}));
    }

    #[test]
    fn update_payload_shape() {
        let filters = EntryData::with_id("abc");
        let data: EntryData = [("name", "x")].into_iter().collect();
        let payload = EntryUpdatePayload {
            filters: &filters,
            data: &data,
        };
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({"filters": {"_id": "abc"}, "data": {"name": "x"}})
        );
    }

    #[test]
    fn entries_response_requires_entries_field() {
        assert!(serde_json::from_str::<EntriesResponse>(r#"{"items":[]}"#).is_err());
        let parsed: EntriesResponse = serde_json::from_str(r#"{"entries":[{"a":1}]}"#).unwrap();
        assert_eq!(parsed.entries.len(), 1);
    }

    #[test]
    fn create_response_tolerates_missing_object_id() {
        let parsed: CreateEntryResponse = serde_json::from_str(r#"{"success":true}"#).unwrap();
        assert!(parsed.object_id.is_none());
        let parsed: CreateEntryResponse = serde_json::from_str(r#"{"objectId":7}"#).unwrap();
        assert_eq!(parsed.object_id, Some(json!(7)));
    }
}
