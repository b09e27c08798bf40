use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ledger_core::LedgerError;
use thiserror::Error;
use tracing::warn;

use crate::api::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("chain kept changing under the miner, giving up")]
    MiningConflict,

    #[error("bad request body: {message}")]
    Rejected { status: StatusCode, message: String },

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Ledger(LedgerError::Serialization(_)) => StatusCode::BAD_REQUEST,
            ApiError::Ledger(LedgerError::StaleBlock { .. }) | ApiError::MiningConflict => {
                StatusCode::CONFLICT
            }
            ApiError::Ledger(LedgerError::InvalidBlock(_)) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Rejected { status, .. } => *status,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::Internal(format!("mining task failed: {err}"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        warn!("request failed with {}: {}", status, self);
        (status, Json(ApiResponse::<()>::error(self.to_string()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn statuses_follow_error_kind() {
        let stale = ApiError::Ledger(LedgerError::StaleBlock {
            expected: "a".into(),
            found: "b".into(),
        });
        assert_eq!(stale.status(), StatusCode::CONFLICT);
        assert_eq!(ApiError::MiningConflict.status(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::Internal("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        let rejected = ApiError::Rejected {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: "missing field `data`".into(),
        };
        assert_eq!(rejected.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn serialization_failure_is_a_bad_request() {
        let err = serde_json::from_value::<u8>(json!("nope")).unwrap_err();
        let api = ApiError::from(LedgerError::from(err));
        assert_eq!(api.status(), StatusCode::BAD_REQUEST);
    }
}
