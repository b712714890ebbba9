use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::config::DEFAULT_KV_NAMESPACE;
use crate::persistence::sync::{ENTRIES_KEY, TEMPLATES_KEY};
use crate::persistence::{KeyValueStore, PersistenceError, RosterSnapshot};

#[derive(Clone)]
pub struct AppState {
    kv: Arc<dyn KeyValueStore>,
}

impl AppState {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    fn kv(&self) -> Arc<dyn KeyValueStore> {
        self.kv.clone()
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[derive(Debug)]
enum ApiError {
    NotFound(String),
    Invalid(String),
    Internal(String),
}

impl ApiError {
    fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    fn invalid(message: impl Into<String>) -> Self {
        ApiError::Invalid(message.into())
    }
}

impl From<PersistenceError> for ApiError {
    fn from(value: PersistenceError) -> Self {
        match value {
            PersistenceError::InvalidData(message) => ApiError::Invalid(message),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, "not_found", message),
            ApiError::Invalid(message) => (StatusCode::BAD_REQUEST, "invalid_request", message),
            ApiError::Internal(message) => {
                tracing::warn!(%message, "kv request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
            }
        };
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct KeyQuery {
    namespace: Option<String>,
    key: String,
}

#[derive(Debug, Deserialize)]
struct NamespaceQuery {
    namespace: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PutPayload {
    namespace: Option<String>,
    key: String,
    value: Value,
}

fn namespace_or_default(namespace: Option<String>) -> Result<String, ApiError> {
    let namespace = namespace.unwrap_or_else(|| DEFAULT_KV_NAMESPACE.to_string());
    if namespace.trim().is_empty() {
        return Err(ApiError::invalid("namespace must not be empty"));
    }
    Ok(namespace)
}

fn require_key(key: &str) -> Result<(), ApiError> {
    if key.trim().is_empty() {
        return Err(ApiError::invalid("key must not be empty"));
    }
    Ok(())
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/kv", get(get_value).put(put_value).delete(delete_value))
        .route("/api/roster", get(get_roster))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, kv: Arc<dyn KeyValueStore>) -> std::io::Result<()> {
    let app = router(AppState::new(kv));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn get_value(
    State(state): State<AppState>,
    Query(query): Query<KeyQuery>,
) -> Result<Json<Value>, ApiError> {
    let namespace = namespace_or_default(query.namespace)?;
    require_key(&query.key)?;
    match state.kv().get(&namespace, &query.key)? {
        Some(value) => Ok(Json(json!({ "value": value }))),
        None => Err(ApiError::not_found(format!(
            "no value for {namespace}/{}",
            query.key
        ))),
    }
}

async fn put_value(
    State(state): State<AppState>,
    Json(payload): Json<PutPayload>,
) -> Result<StatusCode, ApiError> {
    let namespace = namespace_or_default(payload.namespace)?;
    require_key(&payload.key)?;
    state.kv().put(&namespace, &payload.key, &payload.value)?;
    tracing::debug!(%namespace, key = %payload.key, "kv value stored");
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_value(
    State(state): State<AppState>,
    Query(query): Query<KeyQuery>,
) -> Result<StatusCode, ApiError> {
    let namespace = namespace_or_default(query.namespace)?;
    require_key(&query.key)?;
    if !state.kv().delete(&namespace, &query.key)? {
        return Err(ApiError::not_found(format!(
            "no value for {namespace}/{}",
            query.key
        )));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Decoded view of the roster keys in a namespace.
async fn get_roster(
    State(state): State<AppState>,
    Query(query): Query<NamespaceQuery>,
) -> Result<Json<RosterSnapshot>, ApiError> {
    let namespace = namespace_or_default(query.namespace)?;
    let kv = state.kv();
    let entries = match kv.get(&namespace, ENTRIES_KEY)? {
        Some(value) => serde_json::from_value(value)
            .map_err(|err| ApiError::invalid(format!("stored entries are invalid: {err}")))?,
        None => Vec::new(),
    };
    let templates = match kv.get(&namespace, TEMPLATES_KEY)? {
        Some(value) => serde_json::from_value(value)
            .map_err(|err| ApiError::invalid(format!("stored templates are invalid: {err}")))?,
        None => Vec::new(),
    };
    Ok(Json(RosterSnapshot::new(templates, entries)))
}
