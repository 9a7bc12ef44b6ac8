//! 릴레이 에러 처리.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// 릴레이 API 에러
#[derive(Debug, Error)]
pub enum ApiError {
    /// 필수 필드 누락 등 잘못된 요청
    #[error("잘못된 요청: {0}")]
    BadRequest(String),

    /// 업스트림 비정상 응답 (상태 코드 그대로 전달)
    #[error("API 요청 실패: {}", status.as_u16())]
    Upstream {
        /// 업스트림 상태 코드
        status: StatusCode,
    },

    /// 내부 서버 오류 (업스트림 연결 실패 포함)
    #[error("내부 서버 오류: {0}")]
    Internal(String),
}

/// 에러 응답 본문
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// 에러 메시지
    pub error: String,
    /// HTTP 상태 코드
    pub status: u16,
}

impl ApiError {
    /// 응답 상태 코드
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream { status } => *status,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: self.to_string(),
            status: status.as_u16(),
        };

        (status, Json(body)).into_response()
    }
}
