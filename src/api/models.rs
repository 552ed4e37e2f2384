use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::{caller_from_headers, AppState};
use crate::domain::{Digest32, ModelSnapshot, NewModelSnapshot};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelRequest {
    pub version: String,
    pub external_file_ref: String,
    /// 32-byte hex digest, `0x` prefix optional.
    pub content_hash: String,
    pub performance_score: u32,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedResponse {
    pub index: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelResponse {
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<ModelSnapshot>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveModelResponse {
    pub snapshot: ModelSnapshot,
    pub integrity_digest: Digest32,
}

pub async fn post_model(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ModelRequest>,
) -> Result<Json<CreatedResponse>, AppError> {
    let caller = caller_from_headers(&headers)?;
    let content_hash = Digest32::from_str(&body.content_hash)
        .map_err(|e| AppError::BadRequest(format!("Invalid contentHash: {}", e)))?;

    let index = state
        .ledger
        .create_model_snapshot(
            caller,
            NewModelSnapshot {
                version: body.version,
                external_file_ref: body.external_file_ref,
                content_hash,
                performance_score: body.performance_score,
                description: body.description,
            },
        )
        .await?;
    Ok(Json(CreatedResponse { index }))
}

pub async fn activate_model(
    Path(index): Path<u64>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    let caller = caller_from_headers(&headers)?;
    state.ledger.activate_model_snapshot(caller, index).await?;
    Ok(Json(serde_json::json!({ "activeIndex": index })))
}

/// A missing index is `found: false`, not an error.
pub async fn get_model(
    Path(index): Path<u64>,
    State(state): State<AppState>,
) -> Json<ModelResponse> {
    let snapshot = state.ledger.read().await.model(index).cloned();
    Json(ModelResponse {
        found: snapshot.is_some(),
        snapshot,
    })
}

pub async fn get_latest_active(
    State(state): State<AppState>,
) -> Result<Json<ActiveModelResponse>, AppError> {
    let vault = state.ledger.read().await;
    let (snapshot, integrity_digest) = vault.latest_active_model()?;
    Ok(Json(ActiveModelResponse {
        snapshot: snapshot.clone(),
        integrity_digest,
    }))
}
