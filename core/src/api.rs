//! Stateless request builder and response parser for the MarcSync REST API.
//!
//! # Design
//! `ApiClient` holds only the base URL and the access token and carries no
//! mutable state between calls. Each backend operation is split into a
//! `build_*` method that produces an `HttpRequest` and a `parse_*` method
//! that consumes an `HttpResponse`. The handles in `collection` and `entry`
//! glue the two together through a `Transport`.
//!
//! Collection management lives under `/v0/collection/{name}`, entry
//! operations under `/v1/entries/{collection}`. Every endpoint signals
//! success with exactly 200.

use serde::Serialize;
use tracing::warn;
use ureq::http::StatusCode;

use crate::error::{MarcSyncError, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{
    CollectionUpdatePayload, CreateEntryResponse, EntriesResponse, EntryData, EntryDataPayload,
    EntryFilterPayload, EntryUpdatePayload, ID_FIELD,
};

#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    token: String,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl ApiClient {
    pub fn new(base_url: &str, token: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_fetch_collection(&self, name: &str) -> HttpRequest {
        self.request(HttpMethod::Get, self.collection_url(name), None)
    }

    pub fn build_create_collection(&self, name: &str) -> HttpRequest {
        self.request(HttpMethod::Post, self.collection_url(name), None)
    }

    pub fn build_rename_collection(&self, name: &str, new_name: &str) -> Result<HttpRequest> {
        let body = to_json(&CollectionUpdatePayload { name: new_name })?;
        Ok(self.request(HttpMethod::Put, self.collection_url(name), Some(body)))
    }

    pub fn build_drop_collection(&self, name: &str) -> HttpRequest {
        self.request(HttpMethod::Delete, self.collection_url(name), None)
    }

    pub fn build_create_entry(&self, collection: &str, data: &EntryData) -> Result<HttpRequest> {
        let body = to_json(&EntryDataPayload { data })?;
        Ok(self.request(HttpMethod::Post, self.entries_url(collection), Some(body)))
    }

    /// A GET carrying the filter as its JSON body.
    pub fn build_get_entries(&self, collection: &str, filters: &EntryData) -> Result<HttpRequest> {
        let body = to_json(&EntryFilterPayload { filters })?;
        Ok(self.request(HttpMethod::Get, self.entries_url(collection), Some(body)))
    }

    pub fn build_delete_entries(&self, collection: &str, filters: &EntryData) -> Result<HttpRequest> {
        let body = to_json(&EntryFilterPayload { filters })?;
        Ok(self.request(HttpMethod::Delete, self.entries_url(collection), Some(body)))
    }

    pub fn build_update_entries(
        &self,
        collection: &str,
        filters: &EntryData,
        data: &EntryData,
    ) -> Result<HttpRequest> {
        let body = to_json(&EntryUpdatePayload { filters, data })?;
        Ok(self.request(HttpMethod::Put, self.entries_url(collection), Some(body)))
    }

    /// For endpoints whose body carries nothing the caller needs.
    pub fn parse_status(&self, response: HttpResponse) -> Result<()> {
        check_status(&response)
    }

    /// Returns the submitted record, completed with the backend-assigned
    /// `objectId` as `_id` when the record did not carry one already.
    pub fn parse_create_entry(&self, response: HttpResponse, mut data: EntryData) -> Result<EntryData> {
        check_status(&response)?;
        if data.contains_key(ID_FIELD) {
            return Ok(data);
        }
        if response.body.trim().is_empty() {
            return Ok(data);
        }
        // The entry is stored either way; an unreadable body only costs the id.
        match serde_json::from_str::<CreateEntryResponse>(&response.body) {
            Ok(CreateEntryResponse { object_id: Some(id) }) => {
                data.insert(ID_FIELD, id);
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "create-entry response unreadable, entry has no _id"),
        }
        Ok(data)
    }

    pub fn parse_get_entries(&self, response: HttpResponse) -> Result<Vec<EntryData>> {
        check_status(&response)?;
        let parsed: EntriesResponse =
            serde_json::from_str(&response.body).map_err(|e| MarcSyncError::Decode(e.to_string()))?;
        Ok(parsed.entries)
    }

    fn collection_url(&self, name: &str) -> String {
        format!("{}/v0/collection/{}", self.base_url, urlencoding::encode(name))
    }

    fn entries_url(&self, collection: &str) -> String {
        format!("{}/v1/entries/{}", self.base_url, urlencoding::encode(collection))
    }

    fn request(&self, method: HttpMethod, path: String, body: Option<String>) -> HttpRequest {
        let mut headers = vec![
            ("accept".to_string(), "application/json".to_string()),
            ("authorization".to_string(), self.token.clone()),
        ];
        if body.is_some() {
            headers.push(("content-type".to_string(), "application/json".to_string()));
        }
        HttpRequest {
            method,
            path,
            headers,
            body,
            timeout: None,
        }
    }
}

fn to_json<T: Serialize>(payload: &T) -> Result<String> {
    serde_json::to_string(payload).map_err(|e| MarcSyncError::Serialization(e.to_string()))
}

/// Anything but 200 becomes `Remote`, carrying the body or, when the body is
/// empty, the status reason phrase.
fn check_status(response: &HttpResponse) -> Result<()> {
    if response.status == 200 {
        return Ok(());
    }
    let message = if response.body.trim().is_empty() {
        StatusCode::from_u16(response.status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or_default()
            .to_string()
    } else {
        response.body.clone()
    };
    Err(MarcSyncError::Remote {
        status: response.status,
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn client() -> ApiClient {
        ApiClient::new("http://localhost:3000", "secret-token")
    }

    fn body(req: &HttpRequest) -> Value {
        serde_json::from_str(req.body.as_deref().unwrap()).unwrap()
    }

    #[test]
    fn build_fetch_collection_produces_correct_request() {
        let req = client().build_fetch_collection("users");
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.path, "http://localhost:3000/v0/collection/users");
        assert!(req.body.is_none());
        assert_eq!(
            req.headers,
            vec![
                ("accept".to_string(), "application/json".to_string()),
                ("authorization".to_string(), "secret-token".to_string()),
            ]
        );
    }

    #[test]
    fn built_requests_leave_timeout_to_the_caller() {
        let req = client().build_get_entries("users", &EntryData::new()).unwrap();
        assert_eq!(req.timeout, None);
    }

    #[test]
    fn build_create_collection_is_bodyless_post() {
        let req = client().build_create_collection("users");
        assert_eq!(req.method, HttpMethod::Post);
        assert!(req.body.is_none());
        assert!(req.header("content-type").is_none());
    }

    #[test]
    fn build_rename_collection_sends_new_name() {
        let req = client().build_rename_collection("users", "people").unwrap();
        assert_eq!(req.method, HttpMethod::Put);
        assert_eq!(req.path, "http://localhost:3000/v0/collection/users");
        assert_eq!(req.header("Content-Type"), Some("application/json"));
        assert_eq!(body(&req), json!({"name": "people"}));
    }

    #[test]
    fn build_drop_collection_produces_correct_request() {
        let req = client().build_drop_collection("users");
        assert_eq!(req.method, HttpMethod::Delete);
        assert!(req.body.is_none());
    }

    #[test]
    fn collection_name_is_percent_encoded() {
        let req = client().build_fetch_collection("my stuff/2");
        assert_eq!(req.path, "http://localhost:3000/v0/collection/my%20stuff%2F2");
    }

    #[test]
    fn build_create_entry_wraps_record() {
        let data: EntryData = [("a", json!(1)), ("b", json!("x"))].into_iter().collect();
        let req = client().build_create_entry("users", &data).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.path, "http://localhost:3000/v1/entries/users");
        assert_eq!(body(&req), json!({"data": {"a": 1, "b": "x"}}));
    }

    #[test]
    fn build_get_entries_is_get_with_body() {
        let filter: EntryData = [("age", 30)].into_iter().collect();
        let req = client().build_get_entries("users", &filter).unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert_eq!(body(&req), json!({"filters": {"age": 30}}));
    }

    #[test]
    fn empty_filter_is_sent_verbatim() {
        let req = client().build_delete_entries("users", &EntryData::new()).unwrap();
        assert_eq!(req.method, HttpMethod::Delete);
        assert_eq!(body(&req), json!({"filters": {}}));
    }

    #[test]
    fn build_update_entries_pairs_filter_and_patch() {
        let patch: EntryData = [("name", "bob")].into_iter().collect();
        let req = client()
            .build_update_entries("users", &EntryData::with_id("42"), &patch)
            .unwrap();
        assert_eq!(req.method, HttpMethod::Put);
        assert_eq!(body(&req), json!({"filters": {"_id": "42"}, "data": {"name": "bob"}}));
    }

    #[test]
    fn parse_status_only_accepts_200() {
        assert!(client().parse_status(HttpResponse::new(200, "")).is_ok());
        let err = client().parse_status(HttpResponse::new(201, "")).unwrap_err();
        assert_eq!(err.status(), Some(201));
    }

    #[test]
    fn remote_error_carries_body() {
        let err = client()
            .parse_status(HttpResponse::new(409, "collection already exists"))
            .unwrap_err();
        match err {
            MarcSyncError::Remote { status, message } => {
                assert_eq!(status, 409);
                assert_eq!(message, "collection already exists");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn remote_error_falls_back_to_reason_phrase() {
        let err = client().parse_status(HttpResponse::new(404, "")).unwrap_err();
        assert_eq!(err.to_string(), "HTTP 404: Not Found");
    }

    #[test]
    fn parse_get_entries_success() {
        let response = HttpResponse::new(200, r#"{"entries":[{"_id":"1","a":1},{"_id":"2","a":2}]}"#);
        let entries = client().parse_get_entries(response).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].id(), Some("2"));
    }

    #[test]
    fn parse_get_entries_bad_json() {
        let err = client().parse_get_entries(HttpResponse::new(200, "not json")).unwrap_err();
        assert!(matches!(err, MarcSyncError::Decode(_)));
    }

    #[test]
    fn parse_get_entries_wrong_shape() {
        let err = client().parse_get_entries(HttpResponse::new(200, "[]")).unwrap_err();
        assert!(matches!(err, MarcSyncError::Decode(_)));
    }

    #[test]
    fn parse_create_entry_adopts_object_id() {
        let data: EntryData = [("a", 1)].into_iter().collect();
        let response = HttpResponse::new(200, r#"{"success":true,"objectId":"abc"}"#);
        let created = client().parse_create_entry(response, data).unwrap();
        assert_eq!(created.id(), Some("abc"));
        assert_eq!(created.get("a"), Some(&json!(1)));
    }

    #[test]
    fn parse_create_entry_adopts_non_string_object_id() {
        let response = HttpResponse::new(200, r#"{"objectId":7}"#);
        let created = client().parse_create_entry(response, EntryData::new()).unwrap();
        assert_eq!(created.get("_id"), Some(&json!(7)));
    }

    #[test]
    fn parse_create_entry_survives_malformed_body() {
        let data: EntryData = [("a", 1)].into_iter().collect();
        let response = HttpResponse::new(200, "<html>ok</html>");
        let created = client().parse_create_entry(response, data.clone()).unwrap();
        assert_eq!(created, data);
        assert!(!created.contains_key("_id"));
    }

    #[test]
    fn parse_create_entry_keeps_existing_id() {
        let data = EntryData::with_id("mine");
        let response = HttpResponse::new(200, r#"{"objectId":"theirs"}"#);
        let created = client().parse_create_entry(response, data).unwrap();
        assert_eq!(created.id(), Some("mine"));
    }

    #[test]
    fn parse_create_entry_tolerates_empty_body() {
        let data: EntryData = [("a", 1)].into_iter().collect();
        let created = client().parse_create_entry(HttpResponse::new(200, ""), data.clone()).unwrap();
        assert_eq!(created, data);
    }

    #[test]
    fn parse_create_entry_wrong_status() {
        let err = client()
            .parse_create_entry(HttpResponse::new(500, "internal error"), EntryData::new())
            .unwrap_err();
        assert!(matches!(err, MarcSyncError::Remote { status: 500, .. }));
    }

    #[test]
    fn debug_output_hides_token() {
        let rendered = format!("{:?}", client());
        assert!(!rendered.contains("secret-token"));
    }
}
