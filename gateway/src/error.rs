//! HTTP 错误响应

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use enro_errors::AppError;
use serde_json::json;
use tracing::error;

/// 将 [`AppError`] 转换为 Problem Details 响应
///
/// 附带 `message` 字段以兼容只读取该字段的客户端
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.0.is_server_error() {
            error!(error = %self.0, "Request failed");
        }

        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let problem = self.0.to_problem_details();

        let body = json!({
            "type": problem.r#type,
            "title": problem.title,
            "status": problem.status,
            "detail": problem.detail,
            "message": self.0.message(),
        });

        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// 以 `{ "message": ... }` 形式返回的简单错误
pub fn message_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let response = ApiError(AppError::conflict("taken")).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = ApiError(AppError::cache("down")).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
