//! JPEG 인코더.
//!
//! 캡처된 RGB 프레임을 JPEG로 압축해 `ImageHandle`로 감싼다.

use frameprompt_core::error::CoreError;
use frameprompt_core::models::frame::RawFrame;
use frameprompt_core::models::image::ImageHandle;
use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder};
use tracing::debug;

/// 샘플링 프레임 기본 JPEG 품질
pub const DEFAULT_JPEG_QUALITY: u8 = 80;

/// RGB 프레임 → JPEG 바이트
pub fn encode_jpeg(frame: &RawFrame, quality: u8) -> Result<Vec<u8>, CoreError> {
    if !frame.is_well_formed() {
        return Err(CoreError::VideoLoad(format!(
            "프레임 크기 불일치: {}x{}, {} bytes",
            frame.width,
            frame.height,
            frame.rgb.len()
        )));
    }

    let quality = quality.clamp(1, 100);
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality)
        .write_image(&frame.rgb, frame.width, frame.height, ExtendedColorType::Rgb8)
        .map_err(|e| CoreError::VideoLoad(format!("JPEG 인코딩 실패: {e}")))?;

    debug!(
        "JPEG 인코딩: {}x{} → {} bytes (품질 {})",
        frame.width,
        frame.height,
        buf.len(),
        quality
    );

    Ok(buf)
}

/// RGB 프레임 → JPEG 이미지 핸들
pub fn encode_frame(frame: &RawFrame, quality: u8) -> Result<ImageHandle, CoreError> {
    encode_jpeg(frame, quality).map(ImageHandle::jpeg)
}
