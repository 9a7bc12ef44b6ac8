//! 배치 항목 모델.
//!
//! 샘플링된 프레임(또는 업로드된 이미지) 하나와 그로부터 파생된
//! 설명/생성 이미지/번역 상태를 담는다.

use serde::{Deserialize, Serialize};

use super::description::is_usable_description;
use super::image::ImageHandle;

/// 설명 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DescriptionState {
    /// 아직 설명 요청 전이거나 진행 중
    Pending,
    /// 실제 설명 수신
    Ready,
    /// 플레이스홀더 수신 (설정 누락/오류)
    Failed,
}

/// 이미지 생성 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationState {
    /// 생성 요청 전
    NotStarted,
    /// 생성 요청 진행 중
    Pending,
    /// 원격 생성 이미지 수신
    Ready,
    /// 생성 실패 (대체 이미지 또는 결과 없음)
    Failed,
}

/// 생성된 이미지 참조
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GeneratedImage {
    /// 업스트림이 반환한 이미지 URL
    Remote {
        /// 이미지 URL
        url: String,
    },
    /// 로컬에서 합성한 대체 이미지
    Fallback {
        /// `data:image/svg+xml;base64,...`
        data_uri: String,
    },
}

impl GeneratedImage {
    /// 표시/다운로드용 URI
    pub fn uri(&self) -> &str {
        match self {
            GeneratedImage::Remote { url } => url,
            GeneratedImage::Fallback { data_uri } => data_uri,
        }
    }

    /// 대체 이미지 여부
    pub fn is_fallback(&self) -> bool {
        matches!(self, GeneratedImage::Fallback { .. })
    }
}

/// 항목 단위 재실행 단계
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// 설명 재요청
    Describe,
    /// 이미지 재생성
    Generate,
}

/// 배치 항목
///
/// `id`는 배치 내 위치이며 생성 후 바뀌지 않는다.
#[derive(Debug, Clone)]
pub struct Item {
    /// 배치 내 위치 (0부터)
    pub id: usize,
    /// 원본 이미지
    pub source_image: ImageHandle,
    /// 설명 텍스트 (플레이스홀더 포함)
    pub description: Option<String>,
    /// 설명 상태
    pub description_state: DescriptionState,
    /// 생성된 이미지
    pub generated_image: Option<GeneratedImage>,
    /// 생성 상태
    pub generation_state: GenerationState,
    /// 번역된 설명
    pub translation: Option<String>,
}

impl Item {
    /// 새 항목 생성 (설명 대기 상태)
    pub fn new(id: usize, source_image: ImageHandle) -> Self {
        Self {
            id,
            source_image,
            description: None,
            description_state: DescriptionState::Pending,
            generated_image: None,
            generation_state: GenerationState::NotStarted,
            translation: None,
        }
    }

    /// 설명 결과 반영: 플레이스홀더면 `Failed`
    pub fn apply_description(&mut self, text: String) {
        self.description_state = if is_usable_description(&text) {
            DescriptionState::Ready
        } else {
            DescriptionState::Failed
        };
        self.description = Some(text);
    }

    /// 생성 결과 반영: 원격 이미지만 `Ready`
    pub fn apply_generation(&mut self, result: Option<GeneratedImage>) {
        self.generation_state = match &result {
            Some(GeneratedImage::Remote { .. }) => GenerationState::Ready,
            Some(GeneratedImage::Fallback { .. }) | None => GenerationState::Failed,
        };
        if result.is_some() {
            self.generated_image = result;
        }
    }

    /// 이미지 생성에 쓸 수 있는 실제 설명
    pub fn usable_description(&self) -> Option<&str> {
        self.description
            .as_deref()
            .filter(|text| is_usable_description(text))
    }
}
