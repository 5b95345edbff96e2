use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use cni_core::CoreError;
use serde_json::json;
use tracing::error;

/// HTTP-facing error: a status code and a message rendered as
/// `{"error": "..."}`. Core errors map onto it via `From`, so handlers can
/// use `?` on storage calls directly.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            message: message.into(),
        }
    }

    pub fn too_many_requests(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::TOO_MANY_REQUESTS,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

/// Unwrap a storage-assigned row id. Rows coming back from storage always
/// carry one; a missing id is a bug, not a client error.
pub fn row_id(id: Option<uuid::Uuid>) -> ApiResult<uuid::Uuid> {
    id.ok_or_else(|| ApiError::internal("missing row id"))
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(message) => Self::bad_request(message),
            CoreError::NotFound(what) => Self::not_found(format!("{what} not found")),
            CoreError::Conflict(message) => Self::conflict(message),
            CoreError::Unauthorized(message) => Self::unauthorized(message),
            CoreError::Forbidden(message) => Self::forbidden(message),
            other => {
                error!("internal error: {other}");
                Self::internal("internal server error")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}
