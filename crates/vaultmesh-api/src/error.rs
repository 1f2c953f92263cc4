//! API error wire format.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use vaultmesh_types::VaultMeshError;

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    #[serde(skip)]
    pub status: StatusCode,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status;
        (status, Json(self)).into_response()
    }
}

impl From<VaultMeshError> for ApiError {
    fn from(err: VaultMeshError) -> Self {
        if err.is_server_error() {
            tracing::error!(code = err.error_code(), "internal error serving request");
        } else {
            tracing::debug!(code = err.error_code(), "request rejected");
        }
        let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self {
            code: err.error_code().to_string(),
            message: err.client_message(),
            status,
        }
    }
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            code: "VALIDATION_FAILED".to_string(),
            message: message.into(),
            status: StatusCode::BAD_REQUEST,
        }
    }

    pub fn unauthorized() -> Self {
        Self {
            code: "AUTH_INVALID".to_string(),
            message: "invalid session".to_string(),
            status: StatusCode::UNAUTHORIZED,
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
