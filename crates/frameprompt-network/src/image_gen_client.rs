//! 이미지 생성 클라이언트.
//!
//! 프롬프트(와 선택적 참조 이미지)를 이미지 생성 API에 보낸다.
//! 참조 이미지는 요청 동안만 유효한 `ReferenceLease`로 실어 보내고,
//! 요청 future가 끝나면 성공/실패와 관계없이 한 번 해제된다.
//!
//! 결과 정책:
//! - 사용할 자격증명 쌍 없음 → `None`
//! - 원격 URL 수신 → `Remote`
//! - 그 외 모든 실패 → 로컬 대체 이미지 (`Fallback`)

use async_trait::async_trait;
use frameprompt_core::config::{ApiConfig, ApiCredentials};
use frameprompt_core::error::CoreError;
use frameprompt_core::models::image::ImageHandle;
use frameprompt_core::models::item::GeneratedImage;
use frameprompt_core::ports::image_generator::ImageGenerator;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::fallback_image::fallback_image;
use crate::relay_client::{RelayClient, IMAGE_GENERATIONS_PATH};

/// 생성 이미지 크기 프리셋
pub const IMAGE_SIZE: &str = "2K";

/// 이미지 생성 요청 본문
///
/// `reference_uri`가 있을 때만 `image` 필드가 들어간다.
pub fn build_request_body(
    credentials: &ApiCredentials,
    prompt: &str,
    reference_uri: Option<&str>,
) -> Value {
    let mut body = serde_json::json!({
        "model": credentials.model_id,
        "prompt": prompt,
        "sequential_image_generation": "disabled",
        "response_format": "url",
        "size": IMAGE_SIZE,
        "stream": false,
        "watermark": true,
        "apiKey": credentials.api_key,
    });
    if let (Some(uri), Some(obj)) = (reference_uri, body.as_object_mut()) {
        obj.insert("image".to_string(), Value::String(uri.to_string()));
    }
    body
}

/// 응답에서 `data[0].url` 추출
pub fn extract_image_url(response: &Value) -> Result<String, CoreError> {
    let data = response
        .get("data")
        .and_then(|d| d.as_array())
        .filter(|arr| !arr.is_empty())
        .ok_or_else(|| CoreError::Parse("응답 data가 비어 있음".to_string()))?;

    data[0]
        .get("url")
        .and_then(|u| u.as_str())
        .filter(|u| !u.is_empty())
        .map(str::to_string)
        .ok_or_else(|| CoreError::Parse("응답 data[0].url 없음".to_string()))
}

/// 릴레이 경유 이미지 생성 클라이언트: `ImageGenerator` 구현
#[derive(Debug, Clone)]
pub struct ImageGenClient {
    relay: RelayClient,
}

impl ImageGenClient {
    /// 새 클라이언트 생성
    pub fn new(relay: RelayClient) -> Self {
        Self { relay }
    }

    async fn request(
        &self,
        credentials: &ApiCredentials,
        prompt: &str,
        reference: Option<&ImageHandle>,
    ) -> Result<String, CoreError> {
        let lease = reference.map(ImageHandle::lease);
        let body = build_request_body(credentials, prompt, lease.as_ref().map(|l| l.uri()));
        let response = self.relay.post_json(IMAGE_GENERATIONS_PATH, &body).await?;
        extract_image_url(&response)
    }
}

#[async_trait]
impl ImageGenerator for ImageGenClient {
    async fn generate(
        &self,
        prompt: &str,
        reference: Option<&ImageHandle>,
        config: &ApiConfig,
    ) -> Option<GeneratedImage> {
        let Some(credentials) = config.image_credentials() else {
            warn!("이미지 생성 API 자격증명 없음, 생성 건너뜀");
            return None;
        };

        debug!(
            endpoint = %credentials.endpoint,
            model = %credentials.model_id,
            prompt_chars = prompt.chars().count(),
            with_reference = reference.is_some(),
            reference_bytes = reference.map(ImageHandle::len).unwrap_or(0),
            dedicated_key = config.uses_dedicated_image_key(),
            "이미지 생성 API 호출"
        );

        match self.request(&credentials, prompt, reference).await {
            Ok(url) => {
                info!(url = %url, "이미지 생성 완료");
                Some(GeneratedImage::Remote { url })
            }
            Err(e) => {
                warn!("이미지 생성 실패, 대체 이미지 사용: {e}");
                Some(fallback_image(prompt, reference.is_some()))
            }
        }
    }
}
