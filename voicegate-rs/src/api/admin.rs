//! Admin API handlers
//!
//! Operator-triggered maintenance over the code store. Not part of the
//! redemption hot path.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

use super::handlers::{ApiError, AppState};
use crate::error::GateError;
use crate::seed;
use crate::store::SerialCode;

/// One code row as the admin surface reports it.
#[derive(Debug, Serialize)]
pub struct CodeResponse {
    pub code: String,
    pub audio_url: String,
    pub usage_count: i64,
    pub max_uses: i64,
    pub created_at: String,
    pub last_redeemed_at: Option<String>,
}

impl From<SerialCode> for CodeResponse {
    fn from(code: SerialCode) -> Self {
        Self {
            code: code.code,
            audio_url: code.audio_url,
            usage_count: code.usage_count,
            max_uses: code.max_uses,
            created_at: code.created_at,
            last_redeemed_at: code.last_redeemed_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ResetAllResponse {
    pub reset: u64,
}

#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub created: u64,
    pub updated: u64,
}

type AdminResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

fn internal(msg: &str) -> (StatusCode, Json<ApiError>) {
    (StatusCode::INTERNAL_SERVER_ERROR, Json(ApiError::new(msg)))
}

/// GET /admin/codes - list every serial code.
pub async fn list_codes(State(state): State<Arc<AppState>>) -> AdminResult<Json<Vec<CodeResponse>>> {
    info!("Admin: Listing codes");

    let codes = state.store.list().await.map_err(|e| {
        error!("Failed to list codes: {}", e);
        internal("Failed to list codes")
    })?;

    Ok(Json(codes.into_iter().map(CodeResponse::from).collect()))
}

/// POST /admin/codes/:code/reset - reset one code's usage count.
pub async fn reset_code(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> AdminResult<Json<CodeResponse>> {
    info!("Admin: Resetting code {}", code);

    let reset = state.store.reset_one(&code).await.map_err(|e| {
        error!("Failed to reset code {}: {}", code, e);
        internal("Failed to reset code")
    })?;

    match reset {
        Some(code) => Ok(Json(CodeResponse::from(code))),
        None => Err((StatusCode::NOT_FOUND, Json(ApiError::new("Code not found")))),
    }
}

/// POST /admin/reset_all - reset every code's usage count.
pub async fn reset_all(State(state): State<Arc<AppState>>) -> AdminResult<Json<ResetAllResponse>> {
    info!("Admin: Resetting all codes");

    let reset = state.store.reset_all().await.map_err(|e| {
        error!("Failed to reset codes: {}", e);
        internal("Failed to reset codes")
    })?;

    Ok(Json(ResetAllResponse { reset }))
}

/// POST /admin/sync - upsert every entry from the seed file.
pub async fn sync_codes(State(state): State<Arc<AppState>>) -> AdminResult<Json<SyncResponse>> {
    let path = std::path::Path::new(&state.config.storage.seed_path);
    info!("Admin: Syncing codes from {}", path.display());

    if !path.exists() {
        return Err((
            StatusCode::NOT_FOUND,
            Json(ApiError::new("Seed file not found")),
        ));
    }

    let report = seed::sync_from_file(&state.store, path).await.map_err(|e| {
        error!("Sync failed: {}", e);
        match e {
            GateError::InvalidCode(_) | GateError::Json(_) => (
                StatusCode::BAD_REQUEST,
                Json(ApiError::new("Seed file rejected")),
            ),
            _ => internal("Sync failed"),
        }
    })?;

    Ok(Json(SyncResponse {
        created: report.created,
        updated: report.updated,
    }))
}
