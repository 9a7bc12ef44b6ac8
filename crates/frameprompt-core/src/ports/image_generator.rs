//! 이미지 생성 포트.
//!
//! 구현: `frameprompt-network::image_gen_client::ImageGenClient`

use async_trait::async_trait;

use crate::config::ApiConfig;
use crate::models::image::ImageHandle;
use crate::models::item::GeneratedImage;

/// 프롬프트(+선택적 참조 이미지)로 이미지를 생성하는 제공자
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// 이미지 생성.
    ///
    /// - 사용할 수 있는 자격증명 쌍이 전혀 없으면 `None`
    /// - 그 외에는 항상 원격 URL 또는 로컬 대체 이미지를 반환
    async fn generate(
        &self,
        prompt: &str,
        reference: Option<&ImageHandle>,
        config: &ApiConfig,
    ) -> Option<GeneratedImage>;
}
