//! In-memory stand-in for the MarcSync backend.
//!
//! Implements the collection endpoints under `/v0/collection/{name}` and the
//! entry endpoints under `/v1/entries/{collection}`, including filtered GET
//! and DELETE requests that carry a JSON body. Every success is a 200.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{DefaultBodyLimit, Path, State},
    http::{HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

/// Request bodies up to this size are accepted, so large entries can be stored.
pub const MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

pub type Record = Map<String, Value>;

pub type Db = Arc<RwLock<HashMap<String, Vec<Record>>>>;

#[derive(Clone)]
pub struct AppState {
    db: Db,
    token: Option<String>,
}

#[derive(Deserialize)]
pub struct RenameCollection {
    pub name: String,
}

#[derive(Deserialize)]
pub struct CreateEntry {
    pub data: Record,
}

#[derive(Deserialize)]
pub struct FilterEntries {
    #[serde(default)]
    pub filters: Record,
}

#[derive(Deserialize)]
pub struct UpdateEntries {
    #[serde(default)]
    pub filters: Record,
    pub data: Record,
}

type Reply = Result<Json<Value>, (StatusCode, Json<Value>)>;

/// Router accepting any non-empty `authorization` header.
pub fn app() -> Router {
    router(None)
}

/// Router accepting only `token`.
pub fn app_with_token(token: &str) -> Router {
    router(Some(token.to_string()))
}

fn router(token: Option<String>) -> Router {
    let state = AppState {
        db: Arc::new(RwLock::new(HashMap::new())),
        token,
    };
    Router::new()
        .route(
            "/v0/collection/{name}",
            get(fetch_collection)
                .post(create_collection)
                .put(rename_collection)
                .delete(drop_collection),
        )
        .route(
            "/v1/entries/{collection}",
            get(find_entries)
                .post(create_entry)
                .put(update_entries)
                .delete(delete_entries),
        )
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

pub async fn run(listener: TcpListener, token: Option<String>) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "mock backend listening");
    }
    axum::serve(listener, router(token)).await
}

/// True when every filter field is present in `record` with an equal value.
/// An empty filter matches everything.
pub fn matches(record: &Record, filters: &Record) -> bool {
    filters.iter().all(|(k, v)| record.get(k) == Some(v))
}

fn fail(status: StatusCode, message: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({"success": false, "message": message})))
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), (StatusCode, Json<Value>)> {
    let presented = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty());
    match (presented, state.token.as_deref()) {
        (None, _) => Err(fail(StatusCode::UNAUTHORIZED, "missing access token")),
        (Some(p), Some(expected)) if p != expected => Err(fail(StatusCode::UNAUTHORIZED, "invalid access token")),
        _ => Ok(()),
    }
}

fn missing_collection(name: &str) -> (StatusCode, Json<Value>) {
    fail(StatusCode::NOT_FOUND, &format!("collection {name} not found"))
}

async fn fetch_collection(State(state): State<AppState>, Path(name): Path<String>, headers: HeaderMap) -> Reply {
    authorize(&state, &headers)?;
    let db = state.db.read().await;
    let entries = db.get(&name).ok_or_else(|| missing_collection(&name))?;
    Ok(Json(json!({"success": true, "collection": {"name": name, "entries": entries.len()}})))
}

async fn create_collection(State(state): State<AppState>, Path(name): Path<String>, headers: HeaderMap) -> Reply {
    authorize(&state, &headers)?;
    let mut db = state.db.write().await;
    if db.contains_key(&name) {
        return Err(fail(StatusCode::CONFLICT, &format!("collection {name} already exists")));
    }
    db.insert(name.clone(), Vec::new());
    debug!(collection = %name, "created collection");
    Ok(Json(json!({"success": true})))
}

async fn rename_collection(
    State(state): State<AppState>,
    Path(name): Path<String>,
    headers: HeaderMap,
    Json(input): Json<RenameCollection>,
) -> Reply {
    authorize(&state, &headers)?;
    let mut db = state.db.write().await;
    if !db.contains_key(&name) {
        return Err(missing_collection(&name));
    }
    if input.name != name && db.contains_key(&input.name) {
        return Err(fail(StatusCode::CONFLICT, &format!("collection {} already exists", input.name)));
    }
    let entries = db.remove(&name).unwrap_or_default();
    db.insert(input.name, entries);
    Ok(Json(json!({"success": true})))
}

async fn drop_collection(State(state): State<AppState>, Path(name): Path<String>, headers: HeaderMap) -> Reply {
    authorize(&state, &headers)?;
    state
        .db
        .write()
        .await
        .remove(&name)
        .ok_or_else(|| missing_collection(&name))?;
    Ok(Json(json!({"success": true})))
}

async fn create_entry(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    headers: HeaderMap,
    Json(input): Json<CreateEntry>,
) -> Reply {
    authorize(&state, &headers)?;
    let mut db = state.db.write().await;
    let entries = db.get_mut(&collection).ok_or_else(|| missing_collection(&collection))?;
    let id = Uuid::new_v4().simple().to_string();
    let mut record = input.data;
    record.insert("_id".to_string(), Value::String(id.clone()));
    entries.push(record);
    Ok(Json(json!({"success": true, "objectId": id})))
}

async fn find_entries(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    headers: HeaderMap,
    Json(input): Json<FilterEntries>,
) -> Reply {
    authorize(&state, &headers)?;
    let db = state.db.read().await;
    let entries = db.get(&collection).ok_or_else(|| missing_collection(&collection))?;
    let found: Vec<&Record> = entries.iter().filter(|r| matches(r, &input.filters)).collect();
    Ok(Json(json!({"success": true, "entries": found})))
}

async fn update_entries(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    headers: HeaderMap,
    Json(input): Json<UpdateEntries>,
) -> Reply {
    authorize(&state, &headers)?;
    let mut db = state.db.write().await;
    let entries = db.get_mut(&collection).ok_or_else(|| missing_collection(&collection))?;
    let mut modified = 0;
    for record in entries.iter_mut().filter(|r| matches(r, &input.filters)) {
        for (k, v) in &input.data {
            if k != "_id" {
                record.insert(k.clone(), v.clone());
            }
        }
        modified += 1;
    }
    Ok(Json(json!({"success": true, "modifiedEntries": modified})))
}

async fn delete_entries(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    headers: HeaderMap,
    Json(input): Json<FilterEntries>,
) -> Reply {
    authorize(&state, &headers)?;
    let mut db = state.db.write().await;
    let entries = db.get_mut(&collection).ok_or_else(|| missing_collection(&collection))?;
    let before = entries.len();
    entries.retain(|r| !matches(r, &input.filters));
    Ok(Json(json!({"success": true, "deletedEntries": before - entries.len()})))
}
