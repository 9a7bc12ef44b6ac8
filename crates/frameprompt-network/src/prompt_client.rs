//! 프레임 설명 클라이언트.
//!
//! 이미지 하나를 데이터 URI로 바꿔 프롬프트 템플릿과 함께 채팅 완성 API에 보낸다.
//! 자격증명이 없으면 네트워크 호출 없이 설정 누락 플레이스홀더를,
//! 호출이 실패하면 사유를 담은 오류 플레이스홀더를 반환한다.

use async_trait::async_trait;
use frameprompt_core::config::{ApiConfig, ApiCredentials};
use frameprompt_core::models::description::{error_placeholder, NOT_CONFIGURED_PLACEHOLDER};
use frameprompt_core::models::image::ImageHandle;
use frameprompt_core::ports::describer::FrameDescriber;
use serde_json::Value;
use tracing::{debug, warn};

use crate::relay_client::{
    chat_request_body, extract_chat_content, RelayClient, CHAT_COMPLETIONS_PATH,
};

/// 설명 요청 `content` 배열: 이미지 먼저, 템플릿 텍스트 다음
pub fn describe_content(image_data_uri: &str, prompt_template: &str) -> Value {
    serde_json::json!([
        {
            "type": "image_url",
            "image_url": { "url": image_data_uri }
        },
        {
            "type": "text",
            "text": prompt_template
        }
    ])
}

/// 설명 요청 전체 본문
pub fn build_request_body(
    credentials: &ApiCredentials,
    image_data_uri: &str,
    prompt_template: &str,
) -> Value {
    chat_request_body(
        credentials,
        describe_content(image_data_uri, prompt_template),
    )
}

/// 릴레이 경유 설명 클라이언트: `FrameDescriber` 구현
#[derive(Debug, Clone)]
pub struct PromptClient {
    relay: RelayClient,
}

impl PromptClient {
    /// 새 클라이언트 생성
    pub fn new(relay: RelayClient) -> Self {
        Self { relay }
    }
}

#[async_trait]
impl FrameDescriber for PromptClient {
    async fn describe(&self, image: &ImageHandle, config: &ApiConfig) -> String {
        let Some(credentials) = config.description_credentials() else {
            debug!("설명 API 자격증명 없음, 설정 누락 플레이스홀더 반환");
            return NOT_CONFIGURED_PLACEHOLDER.to_string();
        };

        debug!(
            endpoint = %credentials.endpoint,
            model = %credentials.model_id,
            image_bytes = image.len(),
            "설명 API 호출"
        );

        let body = build_request_body(
            &credentials,
            &image.to_data_uri(),
            &config.prompt_template,
        );
        let result = self
            .relay
            .post_json(CHAT_COMPLETIONS_PATH, &body)
            .await
            .and_then(|response| extract_chat_content(&response));
        match result {
            Ok(text) => {
                debug!(chars = text.chars().count(), "설명 수신");
                text
            }
            Err(e) => {
                warn!("설명 API 호출 실패: {e}");
                error_placeholder(e)
            }
        }
    }
}
