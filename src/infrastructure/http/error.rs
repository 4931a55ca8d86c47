//! HTTP Error Handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::application::ApplicationError;

/// 统一错误响应格式
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub errno: i32,
    pub error: String,
    pub data: Option<()>,
}

impl ErrorResponse {
    pub fn new(errno: i32, error: impl Into<String>) -> Self {
        Self {
            errno,
            error: error.into(),
            data: None,
        }
    }
}

/// 错误码定义
pub mod errno {
    pub const BAD_REQUEST: i32 = 400;
    pub const NOT_FOUND: i32 = 404;
    pub const INTERNAL_ERROR: i32 = 500;
    pub const BAD_GATEWAY: i32 = 502;
    pub const SERVICE_UNAVAILABLE: i32 = 503;
}

/// API 错误
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Internal(String),
    /// 上游 LLM 失败
    BadGateway(String),
    /// 下游语音服务失败
    ServiceUnavailable(String),
}

impl ApiError {
    fn errno(&self) -> i32 {
        match self {
            ApiError::NotFound(_) => errno::NOT_FOUND,
            ApiError::BadRequest(_) => errno::BAD_REQUEST,
            ApiError::Internal(_) => errno::INTERNAL_ERROR,
            ApiError::BadGateway(_) => errno::BAD_GATEWAY,
            ApiError::ServiceUnavailable(_) => errno::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let errno = self.errno();
        let msg = match self {
            ApiError::NotFound(msg) => {
                tracing::warn!(errno, error = %msg, "Resource not found");
                msg
            }
            ApiError::BadRequest(msg) => {
                tracing::warn!(errno, error = %msg, "Bad request");
                msg
            }
            ApiError::Internal(msg) => {
                tracing::error!(errno, error = %msg, "Internal server error");
                msg
            }
            ApiError::BadGateway(msg) => {
                tracing::error!(errno, error = %msg, "Upstream failure");
                msg
            }
            ApiError::ServiceUnavailable(msg) => {
                tracing::error!(errno, error = %msg, "Speech service unavailable");
                msg
            }
        };

        // 业务错误统一返回 200，错误码放在 errno 中
        (StatusCode::OK, Json(ErrorResponse::new(errno, msg))).into_response()
    }
}

impl From<ApplicationError> for ApiError {
    fn from(e: ApplicationError) -> Self {
        match e {
            ApplicationError::NotFound { .. } => ApiError::NotFound(e.to_string()),
            ApplicationError::ValidationError(msg) => ApiError::BadRequest(msg),
            ApplicationError::Upstream(err) => ApiError::BadGateway(err.to_string()),
            ApplicationError::Consumer(err) => ApiError::ServiceUnavailable(err.to_string()),
            ApplicationError::InternalError(msg) => ApiError::Internal(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{LlmError, SpeechError};

    #[test]
    fn test_application_error_mapping() {
        let err: ApiError = ApplicationError::not_found("Stream", "s1").into();
        assert!(matches!(&err, ApiError::NotFound(msg) if msg == "Stream not found: s1"));

        let err: ApiError = ApplicationError::Upstream(LlmError::Timeout).into();
        assert_eq!(err.errno(), errno::BAD_GATEWAY);

        let err: ApiError = ApplicationError::Consumer(SpeechError::QueueClosed).into();
        assert_eq!(err.errno(), errno::SERVICE_UNAVAILABLE);

        let err: ApiError = ApplicationError::validation("empty").into();
        assert_eq!(err.errno(), errno::BAD_REQUEST);
    }
}
