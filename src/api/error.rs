//! MenuError → HTTP 响应
//!
//! 响应体统一为 `{"detail": "..."}`；内部错误只记录日志，对外返回通用信息。

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::core::MenuError;

impl MenuError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            MenuError::Validation(_) => StatusCode::BAD_REQUEST,
            MenuError::NotFound(_) => StatusCode::NOT_FOUND,
            MenuError::Conflict(_) => StatusCode::CONFLICT,
            MenuError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            MenuError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for MenuError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            MenuError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                json!({ "detail": "Internal server error" })
            }
            MenuError::Conflict(names) => json!({
                "detail": self.to_string(),
                "conflicting_locations": names,
            }),
            MenuError::ServiceUnavailable(detail) => {
                tracing::warn!("Service unavailable: {}", detail);
                json!({ "detail": self.to_string() })
            }
            _ => json!({ "detail": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}
