use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tagtrail_domain::DomainError;
use thiserror::Error;
use tracing::error;

/// Transport-level error mapping. Every response body carries a machine
/// readable code plus a human readable message.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("no trail recorded for tag {0}")]
    TrailNotFound(String),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::TrailNotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::Domain(DomainError::AuthenticationFailed(_)) => {
                (StatusCode::UNAUTHORIZED, "authentication_failed")
            }
            ApiError::Domain(DomainError::InvalidPayload(_) | DomainError::InvalidTagId(_)) => {
                (StatusCode::BAD_REQUEST, "invalid_payload")
            }
            ApiError::Domain(DomainError::StoreError(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "store_error")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = self.to_string();
        if status.is_server_error() {
            error!(code, message = %message, "request failed");
        }
        (
            status,
            Json(json!({ "error": code, "message": message })),
        )
            .into_response()
    }
}
