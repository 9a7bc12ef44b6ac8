//! 애플리케이션 설정 구조체.
//!
//! 설명/이미지 생성 API 자격증명, 릴레이 서버, 프레임 샘플링 설정을 정의한다.
//! `ConfigManager`가 JSON 파일로 저장/로드하며, 코어 로직에는 읽기 전용으로 전달된다.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 기본 프롬프트 템플릿 (설명 API에 이미지와 함께 전달)
pub const DEFAULT_PROMPT_TEMPLATE: &str = "请详细描述这张图像的内容，包括场景、主体、动作、风格、色彩、光照等要素。用简洁的语言生成一个可用于AI绘图的提示词。";

/// 최상위 애플리케이션 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// 설명/이미지 생성 API 설정
    #[serde(default)]
    pub api: ApiConfig,
    /// 릴레이 서버 설정
    #[serde(default)]
    pub relay: RelayConfig,
    /// 프레임 샘플링 설정
    #[serde(default)]
    pub sampling: SamplingConfig,
}

impl AppConfig {
    /// 기본 설정 생성
    pub fn default_config() -> Self {
        Self::default()
    }
}

// ============================================================
// API 설정
// ============================================================

/// API 자격증명 쌍 (키 + 모델): 둘 다 비어있지 않을 때만 생성된다
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiCredentials {
    /// 참고용 엔드포인트 (실제 호출은 릴레이를 거친다)
    pub endpoint: String,
    /// API 키
    pub api_key: String,
    /// 모델 ID
    pub model_id: String,
}

/// 설명/이미지 생성 API 설정
///
/// 이미지 생성 필드가 비어 있으면 필드별로 설명 API 값을 사용한다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// 설명 API 엔드포인트
    #[serde(default)]
    pub description_endpoint: String,
    /// 설명 API 키
    #[serde(default)]
    pub description_api_key: String,
    /// 설명 모델 ID
    #[serde(default)]
    pub description_model_id: String,
    /// 설명 요청 시 이미지와 함께 보내는 프롬프트
    #[serde(default = "default_prompt_template")]
    pub prompt_template: String,
    /// 이미지 생성 API 엔드포인트
    #[serde(default)]
    pub image_endpoint: String,
    /// 이미지 생성 API 키
    #[serde(default)]
    pub image_api_key: String,
    /// 이미지 생성 모델 ID
    #[serde(default)]
    pub image_model_id: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            description_endpoint: String::new(),
            description_api_key: String::new(),
            description_model_id: String::new(),
            prompt_template: default_prompt_template(),
            image_endpoint: String::new(),
            image_api_key: String::new(),
            image_model_id: String::new(),
        }
    }
}

impl ApiConfig {
    /// 설명 API 자격증명 (키 또는 모델이 비어 있으면 `None`)
    pub fn description_credentials(&self) -> Option<ApiCredentials> {
        if self.description_api_key.is_empty() || self.description_model_id.is_empty() {
            return None;
        }
        Some(ApiCredentials {
            endpoint: self.description_endpoint.clone(),
            api_key: self.description_api_key.clone(),
            model_id: self.description_model_id.clone(),
        })
    }

    /// 이미지 생성 API 자격증명
    ///
    /// 각 필드는 비어 있으면 설명 API 값으로 대체된다.
    pub fn image_credentials(&self) -> Option<ApiCredentials> {
        let api_key = or_fallback(&self.image_api_key, &self.description_api_key);
        let model_id = or_fallback(&self.image_model_id, &self.description_model_id);
        if api_key.is_empty() || model_id.is_empty() {
            return None;
        }
        Some(ApiCredentials {
            endpoint: or_fallback(&self.image_endpoint, &self.description_endpoint).to_string(),
            api_key: api_key.to_string(),
            model_id: model_id.to_string(),
        })
    }

    /// 이미지 전용 키가 설정되어 있는지 (로그용)
    pub fn uses_dedicated_image_key(&self) -> bool {
        !self.image_api_key.is_empty()
    }
}

fn or_fallback<'a>(primary: &'a str, fallback: &'a str) -> &'a str {
    if primary.is_empty() {
        fallback
    } else {
        primary
    }
}

fn default_prompt_template() -> String {
    DEFAULT_PROMPT_TEMPLATE.to_string()
}

// ============================================================
// 릴레이 설정
// ============================================================

/// 릴레이 서버 설정: 클라이언트 접속 URL과 서버 측 업스트림
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// 클라이언트가 호출하는 릴레이 기본 URL
    #[serde(default = "default_relay_url")]
    pub url: String,
    /// 릴레이 서버 포트
    #[serde(default = "default_relay_port")]
    pub port: u16,
    /// 업스트림 제공자 기본 URL (`/chat/completions`, `/images/generations`가 붙는다)
    #[serde(default = "default_upstream_base_url")]
    pub upstream_base_url: String,
    /// 외부 접근 허용 (0.0.0.0 바인드)
    #[serde(default)]
    pub allow_external: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            url: default_relay_url(),
            port: default_relay_port(),
            upstream_base_url: default_upstream_base_url(),
            allow_external: false,
        }
    }
}

fn default_relay_url() -> String {
    "http://localhost:3001".to_string()
}

fn default_relay_port() -> u16 {
    3001
}

fn default_upstream_base_url() -> String {
    "https://ark.cn-beijing.volces.com/api/v3".to_string()
}

// ============================================================
// 샘플링 설정
// ============================================================

/// 프레임 샘플링 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingConfig {
    /// 샘플링 간격 (초)
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// 전체 추출 타임아웃 (초)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// JPEG 품질 (1-100)
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            timeout_secs: default_timeout_secs(),
            jpeg_quality: default_jpeg_quality(),
        }
    }
}

impl SamplingConfig {
    /// 샘플링 간격 (밀리초)
    pub fn interval_ms(&self) -> u64 {
        self.interval_secs.saturating_mul(1000)
    }

    /// 추출 타임아웃
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_interval_secs() -> u64 {
    3
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_jpeg_quality() -> u8 {
    80
}
