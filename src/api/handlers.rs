//! API Handlers
//!
//! HTTP request handlers for each cache endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;
use tokio::sync::RwLock;

use crate::cache::{CacheConfig, CacheStats, CacheStore, SharedCache};
use crate::error::{CacheError, Result};
use crate::models::{CleanupResponse, GetResponse, HealthResponse, MessageResponse, SetRequest};

/// Application state shared across all handlers.
///
/// Holds one long-lived store of arbitrary JSON values.
#[derive(Clone)]
pub struct AppState {
    /// Thread-safe cache store
    pub cache: SharedCache<Value>,
}

impl AppState {
    /// Creates a new AppState with the given cache store.
    pub fn new(cache: CacheStore<Value>) -> Self {
        Self {
            cache: Arc::new(RwLock::new(cache)),
        }
    }

    /// Creates a new AppState from cache configuration.
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(CacheStore::new(config.clone()))
    }
}

/// Handler for PUT /cache
///
/// Stores a JSON value with optional TTL.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<MessageResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let mut cache = state.cache.write().await;
    cache.set(req.key.clone(), req.value, req.ttl_ms);

    Ok(Json(MessageResponse::set(req.key)))
}

/// Handler for GET /cache/:key
///
/// Retrieves a value by key. Misses and expired entries are 404.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    // Write lock: a read updates stats and access counts
    let mut cache = state.cache.write().await;
    let value = cache
        .get(&key)
        .ok_or_else(|| CacheError::NotFound(key.clone()))?;

    Ok(Json(GetResponse::new(key, value)))
}

/// Handler for DELETE /cache/:key
///
/// Removes a key. Succeeds whether or not the key existed.
pub async fn remove_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<MessageResponse> {
    state.cache.write().await.remove(&key);
    Json(MessageResponse::removed(key))
}

/// Handler for DELETE /cache
pub async fn clear_handler(State(state): State<AppState>) -> Json<MessageResponse> {
    state.cache.write().await.clear();
    Json(MessageResponse::cleared())
}

/// Handler for POST /cache/cleanup
///
/// Runs an expiry sweep immediately instead of waiting for the background task.
pub async fn cleanup_handler(State(state): State<AppState>) -> Json<CleanupResponse> {
    let removed = state.cache.write().await.cleanup();
    Json(CleanupResponse { removed })
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<CacheStats> {
    let cache = state.cache.read().await;
    Json(cache.stats())
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
