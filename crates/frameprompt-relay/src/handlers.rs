//! 릴레이 핸들러.
//!
//! 요청 본문의 `apiKey`를 꺼내 `Authorization: Bearer` 헤더로 옮기고,
//! 나머지 필드를 업스트림에 그대로 전달한다.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use crate::error::ApiError;
use crate::RelayState;

/// 헬스 체크 메시지
pub const HEALTH_MESSAGE: &str = "릴레이 서버 정상 동작 중";

/// 비어 있지 않은 문자열 필드 추출
fn required_str<'a>(body: &'a Map<String, Value>, field: &str) -> Result<&'a str, ApiError> {
    body.get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::BadRequest(format!("필수 파라미터 누락: {field}")))
}

fn as_object(body: Value) -> Result<Map<String, Value>, ApiError> {
    match body {
        Value::Object(map) => Ok(map),
        _ => Err(ApiError::BadRequest("요청 본문은 JSON 객체여야 합니다".to_string())),
    }
}

/// 업스트림 POST 후 JSON 응답 반환
async fn forward(
    state: &RelayState,
    path: &str,
    api_key: &str,
    payload: &Value,
) -> Result<Value, ApiError> {
    let url = format!("{}{}", state.upstream_base_url, path);
    let response = state
        .http
        .post(&url)
        .bearer_auth(api_key)
        .json(payload)
        .send()
        .await
        .map_err(|e| {
            error!(url = %url, "업스트림 연결 실패: {e}");
            ApiError::Internal("업스트림 연결 실패".to_string())
        })?;

    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        warn!(
            status = status.as_u16(),
            body = %text.chars().take(200).collect::<String>(),
            "업스트림 오류 응답"
        );
        let status =
            StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return Err(ApiError::Upstream { status });
    }

    response.json::<Value>().await.map_err(|e| {
        error!("업스트림 응답 파싱 실패: {e}");
        ApiError::Internal("업스트림 응답 파싱 실패".to_string())
    })
}

/// POST /api/chat/completions: 채팅 완성 중계
pub async fn chat_completions(
    State(state): State<RelayState>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let body = as_object(body)?;
    let messages = body
        .get("messages")
        .filter(|m| !m.is_null())
        .ok_or_else(|| ApiError::BadRequest("필수 파라미터 누락: messages".to_string()))?;
    let model = required_str(&body, "model")?;
    let api_key = required_str(&body, "apiKey")?;

    info!(
        model,
        messages = messages.as_array().map(Vec::len).unwrap_or(0),
        "채팅 요청 수신"
    );

    let payload = serde_json::json!({
        "model": model,
        "messages": messages,
    });
    let data = forward(&state, "/chat/completions", api_key, &payload).await?;
    debug!("채팅 응답 전달");
    Ok(Json(data))
}

/// POST /api/images/generations: 이미지 생성 중계
pub async fn image_generations(
    State(state): State<RelayState>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let mut body = as_object(body)?;
    required_str(&body, "prompt")?;
    required_str(&body, "model")?;
    let api_key = required_str(&body, "apiKey")?.to_string();
    body.remove("apiKey");

    info!(
        model = body.get("model").and_then(serde_json::Value::as_str).unwrap_or_default(),
        prompt_chars = body
            .get("prompt")
            .and_then(serde_json::Value::as_str)
            .map(|p| p.chars().count())
            .unwrap_or(0),
        with_image = body.contains_key("image"),
        "이미지 생성 요청 수신"
    );

    let payload = Value::Object(body);
    let data = forward(&state, "/images/generations", &api_key, &payload).await?;
    debug!("이미지 생성 응답 전달");
    Ok(Json(data))
}

/// GET /health
pub async fn health() -> Json<Value> {
    Json(serde_json::json!({
        "status": "ok",
        "message": HEALTH_MESSAGE,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_str_rejects_empty() {
        let body = serde_json::json!({"model": "", "prompt": "x"});
        let map = body.as_object().unwrap();
        assert!(required_str(map, "prompt").is_ok());
        assert!(matches!(
            required_str(map, "model"),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            required_str(map, "apiKey"),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn non_object_body_rejected() {
        assert!(matches!(
            as_object(serde_json::json!([1, 2])),
            Err(ApiError::BadRequest(_))
        ));
    }
}
