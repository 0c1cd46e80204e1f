//! Request handling that does not depend on HTTP types.
//!
//! Every function returns an [`ApiError`] whose [`ErrorCode`] the router maps
//! to a status code.

use std::sync::Arc;

use serde_json::Value;
use shared::{
    error::{ApiError, ErrorCode},
    protocol::{SegmentTextRequest, SegmentTextResponse, StorageEntry},
    text::segment_paragraphs,
};
use storage::KeyValueStore;
use tracing::{debug, info};

pub const MAX_KEY_BYTES: usize = 128;

#[derive(Clone)]
pub struct ApiContext {
    pub store: Arc<dyn KeyValueStore>,
}

impl ApiContext {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }
}

pub fn segment_text_route() -> &'static str {
    "/api/segment-text"
}

pub fn storage_route() -> &'static str {
    "/api/storage"
}

pub async fn health(ctx: &ApiContext) -> Result<(), ApiError> {
    ctx.store.keys().await.map_err(internal)?;
    Ok(())
}

pub fn segment_text(req: &SegmentTextRequest) -> SegmentTextResponse {
    info!(chars = req.text.chars().count(), "segmenting text");
    let segments = segment_paragraphs(&req.text);
    info!(segments = segments.len(), "segmentation finished");
    SegmentTextResponse { segments }
}

pub async fn list_keys(ctx: &ApiContext) -> Result<Vec<String>, ApiError> {
    ctx.store.keys().await.map_err(internal)
}

pub async fn get_entry(ctx: &ApiContext, key: &str) -> Result<StorageEntry, ApiError> {
    validate_key(key)?;
    let value = ctx
        .store
        .get(key)
        .await
        .map_err(internal)?
        .ok_or_else(|| not_found(key))?;
    Ok(StorageEntry {
        key: key.to_string(),
        value,
    })
}

pub async fn put_entry(ctx: &ApiContext, key: &str, value: Value) -> Result<StorageEntry, ApiError> {
    validate_key(key)?;
    ctx.store
        .set(key, value.clone())
        .await
        .map_err(internal)?;
    debug!(key, "entry written");
    Ok(StorageEntry {
        key: key.to_string(),
        value,
    })
}

pub async fn delete_entry(ctx: &ApiContext, key: &str) -> Result<(), ApiError> {
    validate_key(key)?;
    let removed = ctx.store.remove(key).await.map_err(internal)?;
    if !removed {
        return Err(not_found(key));
    }
    debug!(key, "entry removed");
    Ok(())
}

fn validate_key(key: &str) -> Result<(), ApiError> {
    if key.is_empty() {
        return Err(ApiError::new(ErrorCode::Validation, "key cannot be empty"));
    }
    if key.len() > MAX_KEY_BYTES {
        return Err(ApiError::new(
            ErrorCode::Validation,
            format!("key exceeds {MAX_KEY_BYTES} bytes"),
        ));
    }
    if !key
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        return Err(ApiError::new(
            ErrorCode::Validation,
            "key may only contain ASCII letters, digits, '_', '-' and '.'",
        ));
    }
    Ok(())
}

fn not_found(key: &str) -> ApiError {
    ApiError::new(ErrorCode::NotFound, format!("no value stored under '{key}'"))
}

fn internal(err: anyhow::Error) -> ApiError {
    ApiError::new(ErrorCode::Internal, format!("{err:#}"))
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;
