//! 이미지 세트 로드.
//!
//! 사용자가 직접 고른 이미지 파일들을 순서대로 읽어 핸들로 만든다.
//! 원본 바이트를 그대로 보관하고, 형식은 매직 바이트로 판별한다.

use std::path::{Path, PathBuf};

use frameprompt_core::error::CoreError;
use frameprompt_core::models::image::ImageHandle;
use tracing::{debug, info};

/// 바이트가 이미지인지 판별하고 MIME 타입 반환
pub fn detect_mime(bytes: &[u8]) -> Option<&'static str> {
    image::guess_format(bytes)
        .ok()
        .map(|format| format.to_mime_type())
}

/// 이미지 파일 하나 로드
pub async fn load_image(path: &Path) -> Result<ImageHandle, CoreError> {
    let bytes = tokio::fs::read(path).await?;
    let mime = detect_mime(&bytes).ok_or_else(|| CoreError::Validation {
        field: "images".to_string(),
        message: format!("이미지 파일이 아닙니다: {}", path.display()),
    })?;
    debug!(path = %path.display(), mime, bytes = bytes.len(), "이미지 로드");
    Ok(ImageHandle::new(bytes, mime))
}

/// 이미지 파일 목록 로드 (입력 순서 유지)
///
/// 하나라도 이미지가 아니면 전체를 거부한다.
pub async fn load_image_set(paths: &[PathBuf]) -> Result<Vec<ImageHandle>, CoreError> {
    if paths.is_empty() {
        return Err(CoreError::Validation {
            field: "images".to_string(),
            message: "이미지를 하나 이상 선택하세요".to_string(),
        });
    }

    let mut images = Vec::with_capacity(paths.len());
    for path in paths {
        images.push(load_image(path).await?);
    }
    info!(count = images.len(), "이미지 세트 로드 완료");
    Ok(images)
}
