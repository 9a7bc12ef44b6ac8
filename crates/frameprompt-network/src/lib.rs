//! # frameprompt-network
//!
//! 릴레이 서버를 경유하는 AI API 어댑터.
//! 프레임 설명(`FrameDescriber`), 이미지 생성(`ImageGenerator`),
//! 번역(`PromptTranslator`) 포트를 구현한다.
//!
//! 클라이언트는 네트워크/파싱 실패를 에러로 올리지 않고
//! 플레이스홀더 문자열이나 대체 이미지로 흡수한다.
//!
//! ## 사용 예시
//!
//! ```rust,ignore
//! use frameprompt_network::prompt_client::PromptClient;
//! use frameprompt_network::relay_client::RelayClient;
//!
//! let relay = RelayClient::new("http://localhost:3001")?;
//! let describer = PromptClient::new(relay.clone());
//! ```

pub mod fallback_image;
pub mod image_gen_client;
pub mod prompt_client;
pub mod relay_client;
pub mod translation;
