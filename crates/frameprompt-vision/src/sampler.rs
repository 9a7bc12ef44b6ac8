//! 프레임 샘플러.
//!
//! 비디오 소스를 0초부터 고정 간격으로 seek → 캡처 → JPEG 인코딩한다.
//! 추출 전체가 하나의 타임아웃 안에서 실행되며, 타임아웃이나 소스 에러가 나면
//! 그때까지 모은 프레임은 버린다.

use std::time::Duration;

use frameprompt_core::config::SamplingConfig;
use frameprompt_core::error::CoreError;
use frameprompt_core::models::image::ImageHandle;
use frameprompt_core::ports::video::VideoSource;
use tracing::{debug, info, warn};

use crate::encoder::{encode_frame, DEFAULT_JPEG_QUALITY};

/// 허용되는 최소 샘플링 간격 (밀리초)
pub const MIN_INTERVAL_MS: u64 = 1000;

/// 추출 전체 기본 타임아웃
pub const DEFAULT_SAMPLING_TIMEOUT: Duration = Duration::from_secs(60);

/// 간격 `interval_ms`로 `duration_ms` 길이를 샘플링할 때의 타임스탬프 목록
///
/// `0, i, 2i, ...` 중 길이를 넘지 않는 값 (`floor(D/i) + 1`개).
pub fn sample_timestamps(duration_ms: u64, interval_ms: u64) -> Vec<u64> {
    if interval_ms == 0 {
        return vec![0];
    }
    (0..=duration_ms / interval_ms)
        .map(|i| i * interval_ms)
        .collect()
}

/// 시간 간격 기반 프레임 샘플러
#[derive(Debug, Clone)]
pub struct FrameSampler {
    timeout: Duration,
    jpeg_quality: u8,
}

impl Default for FrameSampler {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLING_TIMEOUT, DEFAULT_JPEG_QUALITY)
    }
}

impl FrameSampler {
    /// 새 샘플러 생성
    pub fn new(timeout: Duration, jpeg_quality: u8) -> Self {
        Self {
            timeout,
            jpeg_quality,
        }
    }

    /// 설정에서 생성
    pub fn from_config(config: &SamplingConfig) -> Self {
        Self::new(config.timeout(), config.jpeg_quality)
    }

    /// 타임아웃
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// 샘플링 간격 검증 (1초 미만 거부)
    pub fn validate_interval(interval_ms: u64) -> Result<(), CoreError> {
        if interval_ms < MIN_INTERVAL_MS {
            return Err(CoreError::InvalidInterval { interval_ms });
        }
        Ok(())
    }

    /// 비디오 소스에서 프레임 샘플링
    ///
    /// # Errors
    /// - `InvalidInterval`: 간격 1초 미만 (소스에 접근하기 전)
    /// - `Timeout`: 추출 전체가 타임아웃 초과
    /// - `VideoLoad`: seek/캡처/인코딩 실패
    pub async fn sample(
        &self,
        source: &mut dyn VideoSource,
        interval_ms: u64,
    ) -> Result<Vec<ImageHandle>, CoreError> {
        Self::validate_interval(interval_ms)?;

        let duration_ms = source.duration().as_millis() as u64;
        let timestamps = sample_timestamps(duration_ms, interval_ms);
        info!(
            duration_ms,
            interval_ms,
            frames = timestamps.len(),
            "프레임 샘플링 시작"
        );

        match tokio::time::timeout(self.timeout, self.extract(source, &timestamps)).await {
            Ok(Ok(frames)) => {
                info!(frames = frames.len(), "프레임 샘플링 완료");
                Ok(frames)
            }
            Ok(Err(e)) => {
                warn!("프레임 샘플링 실패: {e}");
                Err(e)
            }
            Err(_) => {
                let timeout_ms = self.timeout.as_millis() as u64;
                warn!(timeout_ms, "프레임 샘플링 타임아웃");
                Err(CoreError::Timeout { timeout_ms })
            }
        }
    }

    async fn extract(
        &self,
        source: &mut dyn VideoSource,
        timestamps: &[u64],
    ) -> Result<Vec<ImageHandle>, CoreError> {
        let mut frames = Vec::with_capacity(timestamps.len());
        for &t in timestamps {
            source
                .seek(Duration::from_millis(t))
                .await
                .map_err(as_video_load)?;
            let frame = source.capture().map_err(as_video_load)?;
            let handle = encode_frame(&frame, self.jpeg_quality)?;
            debug!(timestamp_ms = t, bytes = handle.len(), "프레임 캡처");
            frames.push(handle);
        }
        Ok(frames)
    }
}

fn as_video_load(e: CoreError) -> CoreError {
    match e {
        CoreError::VideoLoad(_) => e,
        other => CoreError::VideoLoad(other.to_string()),
    }
}
