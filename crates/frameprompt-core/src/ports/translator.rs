//! 번역 포트.
//!
//! 구현: `frameprompt-network::translation::TranslationAssist`

use async_trait::async_trait;

use crate::config::ApiConfig;

/// 설명 텍스트 번역기: 실패 시 키워드 치환으로 대체하므로 에러를 반환하지 않는다
#[async_trait]
pub trait PromptTranslator: Send + Sync {
    /// 텍스트 번역
    async fn translate(&self, text: &str, config: &ApiConfig) -> String;
}
