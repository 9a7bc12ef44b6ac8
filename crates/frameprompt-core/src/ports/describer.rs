//! 이미지 설명 포트.
//!
//! 구현: `frameprompt-network::prompt_client::PromptClient`

use async_trait::async_trait;

use crate::config::ApiConfig;
use crate::models::image::ImageHandle;

/// 이미지 하나를 설명 텍스트로 바꾸는 제공자
///
/// 실패하지 않는다: 설정 누락/전송 실패/파싱 실패는 예약 문구가 들어간
/// 플레이스홀더 문자열로 반환된다 (`models::description` 참조).
#[async_trait]
pub trait FrameDescriber: Send + Sync {
    /// 이미지 설명 생성
    async fn describe(&self, image: &ImageHandle, config: &ApiConfig) -> String;
}
