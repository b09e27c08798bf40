use crate::constants::{BLOCKCHAIN_PATH, MAX_CHAIN_BODY_BYTES, MINE_PATH, SYNC_PATH};
use crate::error::ApiError;
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use ledger_core::Block;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::trace::TraceLayer;

/// Envelope shared by every `/api` response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MineRequest {
    pub data: Value,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SyncOutcome {
    pub replaced: bool,
    pub length: usize,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(Health { status: "ok" }) }))
        .route(BLOCKCHAIN_PATH, get(get_blockchain))
        .route(MINE_PATH, post(mine_block))
        .route(
            SYNC_PATH,
            post(sync_chain).layer(DefaultBodyLimit::max(MAX_CHAIN_BODY_BYTES)),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn get_blockchain(State(state): State<AppState>) -> Json<ApiResponse<Vec<Block>>> {
    Json(ApiResponse::ok(state.chain().await))
}

async fn mine_block(
    State(state): State<AppState>,
    payload: Result<Json<MineRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<Block>>), ApiError> {
    let Json(req) = payload?;
    let block = state.mine(req.data).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(block))))
}

async fn sync_chain(
    State(state): State<AppState>,
    payload: Result<Json<Vec<Block>>, JsonRejection>,
) -> Result<Json<ApiResponse<SyncOutcome>>, ApiError> {
    let Json(chain) = payload?;
    let replaced = state.receive_chain(chain).await;
    let length = state.len().await;
    Ok(Json(ApiResponse::ok(SyncOutcome { replaced, length })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_decodes_block_payload() {
        let wire = serde_json::to_string(&ApiResponse::ok(Block::genesis())).unwrap();
        let back: ApiResponse<Block> = serde_json::from_str(&wire).unwrap();
        assert!(back.success);
        assert_eq!(back.data, Some(Block::genesis()));
        assert!(back.error.is_none());
    }

    #[test]
    fn envelope_decodes_error_without_data() {
        let back: ApiResponse<SyncOutcome> =
            serde_json::from_str(r#"{"success":false,"error":"boom"}"#).unwrap();
        assert!(!back.success);
        assert!(back.data.is_none());
        assert_eq!(back.error.as_deref(), Some("boom"));
    }
}
