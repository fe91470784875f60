use axum::extract::rejection::{BytesRejection, JsonRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use service::ServiceError;
use thiserror::Error;
use tracing::{error, warn};

/// Client-facing detail for store faults. The store's own message can carry
/// request ids and endpoints, so it only goes to the log.
pub const STORE_FAILURE_DETAIL: &str = "backing store request failed";

/// Error returned by every handler, rendered as `{"error": ..., "detail": ...}`.
#[derive(Debug, Error)]
#[error("{status}: {error}")]
pub struct ApiError {
    pub status: StatusCode,
    pub error: &'static str,
    pub detail: Option<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, error: &'static str, detail: Option<String>) -> Self {
        Self { status, error, detail }
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Validation(msg) => Self::new(StatusCode::BAD_REQUEST, "Validation Error", Some(msg)),
            ServiceError::NotFound(msg) => Self::new(StatusCode::NOT_FOUND, "Not Found", Some(msg)),
            // 后端存储不可用/被限流：上游故障，按 502 返回；完整错误链只写日志
            ServiceError::Store(msg) => {
                error!(error = %msg, "backing store request failed");
                Self::new(StatusCode::BAD_GATEWAY, "Store Unavailable", Some(STORE_FAILURE_DETAIL.into()))
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(rejection.status(), "Invalid JSON Body", Some(rejection.body_text()))
    }
}

impl From<BytesRejection> for ApiError {
    fn from(rejection: BytesRejection) -> Self {
        Self::new(rejection.status(), "Unreadable Body", Some(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = %self.status, detail = ?self.detail, "request failed");
        } else {
            warn!(status = %self.status, detail = ?self.detail, "request rejected");
        }
        let body = serde_json::json!({ "error": self.error, "detail": self.detail });
        (self.status, Json(body)).into_response()
    }
}
