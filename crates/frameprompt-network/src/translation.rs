//! 설명 번역 보조.
//!
//! 자격증명이 있으면 채팅 완성 API로 번역을 요청하고,
//! 없거나 호출이 실패하면 고정 키워드 치환표로 대체한다.

use async_trait::async_trait;
use frameprompt_core::config::ApiConfig;
use frameprompt_core::ports::translator::PromptTranslator;
use tracing::{debug, warn};

use crate::relay_client::RelayClient;

/// 키워드 치환표 (표 순서대로 전역 치환)
pub const KEYWORD_TABLE: &[(&str, &str)] = &[
    ("专业美食摄影", "Professional food photography"),
    ("高清细节", "high detail"),
    ("色彩鲜艳", "vibrant colors"),
    ("明亮柔和的光线", "bright soft lighting"),
    ("浅灰色背景", "light gray background"),
    ("巧克力", "chocolate"),
    ("甜点", "dessert"),
    ("布朗尼", "brownie"),
    ("雪花酥", "nougat"),
    ("牛轧糖", "nougat candy"),
    ("葡萄干", "raisins"),
    ("饼干", "biscuits"),
    ("糖粉", "powdered sugar"),
    ("抹茶粉", "matcha powder"),
    ("奶酪", "cheese"),
    ("白巧克力", "white chocolate"),
    ("拉丝效果", "stringy texture"),
    ("粘稠", "sticky"),
    ("表面", "surface"),
    ("内部", "inside"),
    ("周围", "around"),
    ("散落", "scattered"),
    ("标志", "logo"),
    ("AI生成", "AI generated"),
];

/// 번역 요청 문구 (원문이 뒤에 붙는다)
const TRANSLATE_INSTRUCTION: &str = "请将以下中文提示词翻译成英文，保持专业美食摄影的描述风格：";

/// 키워드 치환 번역 (순수 함수)
pub fn keyword_translate(text: &str) -> String {
    KEYWORD_TABLE
        .iter()
        .fold(text.to_string(), |acc, (from, to)| acc.replace(from, to))
}

/// 번역 요청 텍스트
pub fn translation_request_text(text: &str) -> String {
    format!("{TRANSLATE_INSTRUCTION}\n\n{text}")
}

/// 릴레이 경유 번역기: `PromptTranslator` 구현
#[derive(Debug, Clone)]
pub struct TranslationAssist {
    relay: RelayClient,
}

impl TranslationAssist {
    /// 새 번역기 생성
    pub fn new(relay: RelayClient) -> Self {
        Self { relay }
    }
}

#[async_trait]
impl PromptTranslator for TranslationAssist {
    async fn translate(&self, text: &str, config: &ApiConfig) -> String {
        if text.trim().is_empty() {
            return String::new();
        }

        let Some(credentials) = config.description_credentials() else {
            debug!("번역 API 자격증명 없음, 키워드 치환 사용");
            return keyword_translate(text);
        };

        let content = serde_json::json!([{
            "type": "text",
            "text": translation_request_text(text)
        }]);

        match self.relay.chat_completion(&credentials, content).await {
            Ok(translated) => translated,
            Err(e) => {
                warn!("번역 API 실패, 키워드 치환 사용: {e}");
                keyword_translate(text)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn configured() -> ApiConfig {
        ApiConfig {
            description_api_key: "k".to_string(),
            description_model_id: "m".to_string(),
            ..ApiConfig::default()
        }
    }

    #[test]
    fn keyword_table_applies_in_order() {
        // "白巧克力"보다 "巧克力"가 먼저 치환된다
        assert_eq!(keyword_translate("白巧克力"), "白chocolate");
        assert_eq!(
            keyword_translate("专业美食摄影，布朗尼表面散落糖粉"),
            "Professional food photography，brownie surface scattered powdered sugar"
        );
    }

    #[test]
    fn keyword_translate_replaces_every_occurrence() {
        let out = keyword_translate("甜点和甜点");
        assert_eq!(out, "dessert和dessert");
        for (from, _) in KEYWORD_TABLE {
            if *from == "白巧克力" {
                continue;
            }
            assert!(!keyword_translate(from).contains(from));
        }
    }

    #[test]
    fn request_text_embeds_original() {
        let text = translation_request_text("饼干");
        assert!(text.starts_with(TRANSLATE_INSTRUCTION));
        assert!(text.ends_with("\n\n饼干"));
    }

    #[test]
    fn empty_input_returns_empty() {
        let client = TranslationAssist::new(RelayClient::new("http://127.0.0.1:1").unwrap());
        let out = tokio_test::block_on(client.translate("   ", &configured()));
        assert_eq!(out, "");
    }

    #[tokio::test]
    async fn no_credentials_uses_table_without_call() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/chat/completions")
            .expect(0)
            .create_async()
            .await;

        let client = TranslationAssist::new(RelayClient::new(&server.url()).unwrap());
        let out = client.translate("饼干", &ApiConfig::default()).await;

        assert_eq!(out, "biscuits");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn api_success_returns_api_text() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/chat/completions")
            .match_body(Matcher::Regex("饼干".to_string()))
            .with_status(200)
            .with_body(r#"{"choices":[{"message":{"content":"Crispy biscuits"}}]}"#)
            .create_async()
            .await;

        let client = TranslationAssist::new(RelayClient::new(&server.url()).unwrap());
        let out = client.translate("饼干", &configured()).await;

        assert_eq!(out, "Crispy biscuits");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn api_failure_falls_back_to_table() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/chat/completions")
            .with_status(503)
            .create_async()
            .await;

        let client = TranslationAssist::new(RelayClient::new(&server.url()).unwrap());
        let out = client.translate("奶酪饼干", &configured()).await;

        assert_eq!(out, "cheesebiscuits");
        mock.assert_async().await;
    }
}
