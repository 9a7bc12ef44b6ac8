//! 릴레이 HTTP 클라이언트.
//!
//! 모든 AI 호출은 릴레이(`/api/chat/completions`, `/api/images/generations`)를 거친다.
//! 릴레이가 자격증명을 업스트림 헤더로 옮겨 붙이므로 요청 본문에 `apiKey`를 싣는다.
//! 클라이언트 측 타임아웃은 두지 않는다.

use frameprompt_core::config::ApiCredentials;
use frameprompt_core::error::CoreError;
use serde_json::Value;
use tracing::{debug, warn};

/// 채팅 완성 경로
pub const CHAT_COMPLETIONS_PATH: &str = "/api/chat/completions";
/// 이미지 생성 경로
pub const IMAGE_GENERATIONS_PATH: &str = "/api/images/generations";

/// 릴레이 클라이언트 (복제 비용 낮음, 내부 커넥션 풀 공유)
#[derive(Debug, Clone)]
pub struct RelayClient {
    http: reqwest::Client,
    base_url: String,
}

impl RelayClient {
    /// 새 릴레이 클라이언트 생성
    pub fn new(base_url: &str) -> Result<Self, CoreError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| CoreError::Network(format!("HTTP 클라이언트 빌드 실패: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// 릴레이 기본 URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// JSON POST 후 JSON 응답 반환
    ///
    /// - 전송 실패, 비정상 상태 → `Network`
    /// - JSON이 아닌 본문 → `Parse`
    pub async fn post_json(&self, path: &str, body: &Value) -> Result<Value, CoreError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "릴레이 요청");

        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| CoreError::Network(format!("릴레이 요청 실패: {e}")))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| CoreError::Network(format!("응답 읽기 실패: {e}")))?;

        if !status.is_success() {
            warn!(status = %status, path, "릴레이 오류 응답");
            return Err(CoreError::Network(format!(
                "API 요청 실패: {} {}",
                status.as_u16(),
                text.chars().take(200).collect::<String>()
            )));
        }

        serde_json::from_str(&text).map_err(|e| {
            CoreError::Parse(format!(
                "JSON 파싱 실패: {e} (raw: {})",
                text.chars().take(200).collect::<String>()
            ))
        })
    }

    /// 채팅 완성 호출 후 `choices[0].message.content` 반환
    pub async fn chat_completion(
        &self,
        credentials: &ApiCredentials,
        content: Value,
    ) -> Result<String, CoreError> {
        let body = chat_request_body(credentials, content);
        let response = self.post_json(CHAT_COMPLETIONS_PATH, &body).await?;
        extract_chat_content(&response)
    }
}

/// 채팅 완성 요청 본문: `{model, apiKey, messages:[{role:"user", content}]}`
pub fn chat_request_body(credentials: &ApiCredentials, content: Value) -> Value {
    serde_json::json!({
        "model": credentials.model_id,
        "apiKey": credentials.api_key,
        "messages": [{
            "role": "user",
            "content": content
        }]
    })
}

/// 채팅 응답에서 `choices[0].message.content` 추출
pub fn extract_chat_content(response: &Value) -> Result<String, CoreError> {
    response
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|arr| arr.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|msg| msg.get("content"))
        .and_then(|t| t.as_str())
        .map(str::to_string)
        .ok_or_else(|| CoreError::Parse("응답에 choices[0].message.content 없음".to_string()))
}
