//! 비디오 소스 포트.
//!
//! 구현: `frameprompt-vision` crate (`FfmpegVideoSource`)

use async_trait::async_trait;
use std::time::Duration;

use crate::error::CoreError;
use crate::models::frame::RawFrame;

/// 재생 위치를 옮기고 현재 프레임을 캡처할 수 있는 비디오 소스
///
/// 호출자는 로드가 끝나 길이가 알려진 소스만 넘긴다.
#[async_trait]
pub trait VideoSource: Send {
    /// 비디오 전체 길이
    fn duration(&self) -> Duration;

    /// 지정 위치로 이동하고 이동이 끝날 때까지 대기.
    ///
    /// 디코딩/로드 실패는 `CoreError::VideoLoad`로 반환한다.
    async fn seek(&mut self, position: Duration) -> Result<(), CoreError>;

    /// 현재 위치에 렌더링된 프레임 캡처
    fn capture(&mut self) -> Result<RawFrame, CoreError>;
}
