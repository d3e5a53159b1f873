// Error handling
// The only place that decides HTTP status codes. Engine failures keep the
// 200 + {success: false} envelope; malformed bodies are transport-level 400s.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rewards_ledger::Error as LedgerError;
use thiserror::Error;
use tracing::error;

use crate::models::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Ledger(#[from] LedgerError),

    #[error("Malformed request body: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Ledger(LedgerError::Concurrency(_))
            | ApiError::Ledger(LedgerError::Config(_))
            | ApiError::Ledger(LedgerError::Io(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Ledger(_) => StatusCode::OK,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        match self {
            ApiError::BadRequest(msg) => (status, msg).into_response(),
            ApiError::Ledger(e) => {
                if status.is_server_error() {
                    error!("Ledger unavailable: {}", e);
                }
                (status, Json(ApiResponse::<()>::failure(e.public_message()))).into_response()
            }
            ApiError::Internal(msg) => {
                error!("{}", msg);
                (status, Json(ApiResponse::<()>::failure(msg))).into_response()
            }
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}
