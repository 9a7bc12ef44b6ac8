//! 비디오 소스에서 캡처한 원시 프레임.

use std::time::Duration;

/// 렌더링된 프레임 (RGB8, 행 우선)
#[derive(Debug, Clone)]
pub struct RawFrame {
    /// 너비 (픽셀)
    pub width: u32,
    /// 높이 (픽셀)
    pub height: u32,
    /// RGB8 픽셀 데이터 (`width * height * 3` 바이트)
    pub rgb: Vec<u8>,
    /// 캡처 시점 (비디오 타임라인 기준)
    pub timestamp: Duration,
}

impl RawFrame {
    /// 단색 프레임 생성 (테스트/플레이스홀더용)
    pub fn solid(width: u32, height: u32, color: [u8; 3], timestamp: Duration) -> Self {
        let rgb = color
            .iter()
            .copied()
            .cycle()
            .take((width * height * 3) as usize)
            .collect();
        Self {
            width,
            height,
            rgb,
            timestamp,
        }
    }

    /// 픽셀 데이터 길이가 크기와 일치하는지
    pub fn is_well_formed(&self) -> bool {
        self.rgb.len() == (self.width as usize) * (self.height as usize) * 3
    }
}
