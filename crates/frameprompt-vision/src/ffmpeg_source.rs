//! ffmpeg 기반 비디오 소스.
//!
//! `ffprobe`로 길이를 읽고, seek마다 `ffmpeg`로 해당 위치의 프레임 하나를
//! PNG로 디코딩해 보관한다. 외부 프로세스는 `tokio::process`로 실행하며,
//! 대기 중인 future가 drop되면(샘플링 타임아웃 등) 프로세스도 함께 종료된다.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use frameprompt_core::error::CoreError;
use frameprompt_core::models::frame::RawFrame;
use frameprompt_core::ports::video::VideoSource;
use image::ImageFormat;
use tokio::process::Command;
use tracing::{debug, info};

/// ffprobe `format=duration` 출력 파싱 (초 단위 소수)
pub fn parse_duration(stdout: &str) -> Result<Duration, CoreError> {
    let line = stdout
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .ok_or_else(|| CoreError::VideoLoad("비디오 길이를 읽을 수 없음".to_string()))?;

    let secs: f64 = line
        .parse()
        .map_err(|_| CoreError::VideoLoad(format!("비디오 길이 형식 오류: {line}")))?;

    if !secs.is_finite() || secs < 0.0 {
        return Err(CoreError::VideoLoad(format!("비디오 길이 값 오류: {line}")));
    }
    Ok(Duration::from_secs_f64(secs))
}

/// 디코딩된 PNG 바이트 → RGB 프레임
pub fn decode_png_frame(bytes: &[u8], timestamp: Duration) -> Result<RawFrame, CoreError> {
    let rgb = image::load_from_memory_with_format(bytes, ImageFormat::Png)
        .map_err(|e| CoreError::VideoLoad(format!("프레임 디코딩 실패: {e}")))?
        .to_rgb8();
    let (width, height) = rgb.dimensions();
    Ok(RawFrame {
        width,
        height,
        rgb: rgb.into_raw(),
        timestamp,
    })
}

/// 로컬 비디오 파일을 ffmpeg로 읽는 소스
#[derive(Debug)]
pub struct FfmpegVideoSource {
    path: PathBuf,
    duration: Duration,
    ffmpeg_bin: String,
    current: Option<RawFrame>,
}

impl FfmpegVideoSource {
    /// 비디오 파일 열기 (기본 `ffmpeg`/`ffprobe` 실행 파일 사용)
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        Self::open_with(path, "ffmpeg", "ffprobe").await
    }

    /// 실행 파일 경로를 지정해 비디오 파일 열기
    pub async fn open_with(
        path: impl AsRef<Path>,
        ffmpeg_bin: &str,
        ffprobe_bin: &str,
    ) -> Result<Self, CoreError> {
        let path = path.as_ref().to_path_buf();
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(CoreError::VideoLoad(format!(
                "파일을 찾을 수 없음: {}",
                path.display()
            )));
        }

        let output = Command::new(ffprobe_bin)
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
            ])
            .arg(&path)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| CoreError::VideoLoad(format!("{ffprobe_bin} 실행 실패: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CoreError::VideoLoad(format!(
                "{ffprobe_bin} 실패: {}",
                stderr.trim()
            )));
        }

        let duration = parse_duration(&String::from_utf8_lossy(&output.stdout))?;
        info!(path = %path.display(), duration_ms = duration.as_millis() as u64, "비디오 로드");

        Ok(Self {
            path,
            duration,
            ffmpeg_bin: ffmpeg_bin.to_string(),
            current: None,
        })
    }

    /// 비디오 파일 경로
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl VideoSource for FfmpegVideoSource {
    fn duration(&self) -> Duration {
        self.duration
    }

    async fn seek(&mut self, position: Duration) -> Result<(), CoreError> {
        let ss = format!("{:.3}", position.as_secs_f64());
        let output = Command::new(&self.ffmpeg_bin)
            .args(["-v", "error", "-ss", &ss, "-i"])
            .arg(&self.path)
            .args(["-frames:v", "1", "-f", "image2pipe", "-vcodec", "png", "-"])
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| CoreError::VideoLoad(format!("{} 실행 실패: {e}", self.ffmpeg_bin)))?;

        if !output.status.success() || output.stdout.is_empty() {
            self.current = None;
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CoreError::VideoLoad(format!(
                "{}s 위치 프레임 디코딩 실패: {}",
                ss,
                stderr.trim()
            )));
        }

        let frame = decode_png_frame(&output.stdout, position)?;
        debug!(
            position_ms = position.as_millis() as u64,
            width = frame.width,
            height = frame.height,
            "seek 완료"
        );
        self.current = Some(frame);
        Ok(())
    }

    fn capture(&mut self) -> Result<RawFrame, CoreError> {
        self.current
            .clone()
            .ok_or_else(|| CoreError::VideoLoad("seek 전에 캡처를 요청함".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_reads_first_line() {
        let d = parse_duration("9.042000\n").unwrap();
        assert_eq!(d.as_millis(), 9042);
    }

    #[test]
    fn parse_duration_rejects_garbage() {
        assert!(matches!(parse_duration("N/A"), Err(CoreError::VideoLoad(_))));
        assert!(matches!(parse_duration(""), Err(CoreError::VideoLoad(_))));
        assert!(matches!(parse_duration("-1.0"), Err(CoreError::VideoLoad(_))));
    }

    #[test]
    fn decode_png_frame_roundtrip() {
        let img = image::RgbImage::from_pixel(4, 3, image::Rgb([1, 2, 3]));
        let mut png = std::io::Cursor::new(Vec::new());
        img.write_to(&mut png, ImageFormat::Png).unwrap();

        let frame = decode_png_frame(png.get_ref(), Duration::from_secs(6)).unwrap();
        assert_eq!((frame.width, frame.height), (4, 3));
        assert!(frame.is_well_formed());
        assert_eq!(frame.timestamp, Duration::from_secs(6));
    }

    #[test]
    fn decode_rejects_non_png() {
        let err = decode_png_frame(b"not a png", Duration::ZERO).unwrap_err();
        assert!(matches!(err, CoreError::VideoLoad(_)));
    }

    #[tokio::test]
    async fn open_missing_file_is_video_load() {
        let dir = tempfile::tempdir().unwrap();
        let err = FfmpegVideoSource::open(dir.path().join("missing.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::VideoLoad(_)));
    }

    #[tokio::test]
    async fn missing_ffprobe_is_video_load() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("clip.mp4");
        std::fs::write(&video, b"\x00\x00\x00\x18ftypmp42").unwrap();

        let err = FfmpegVideoSource::open_with(&video, "ffmpeg", "frameprompt-no-such-ffprobe")
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::VideoLoad(_)));
    }

    // ============================================================
    // 타임아웃 시 자식 프로세스 정리
    // ============================================================

    #[cfg(target_os = "linux")]
    fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    /// `/proc/<pid>/stat`이 없거나 좀비 상태면 종료된 것으로 본다
    #[cfg(target_os = "linux")]
    fn process_running(pid: u32) -> bool {
        let Ok(stat) = std::fs::read_to_string(format!("/proc/{pid}/stat")) else {
            return false;
        };
        let state = stat
            .rsplit_once(')')
            .and_then(|(_, rest)| rest.trim_start().chars().next());
        !matches!(state, Some('Z') | Some('X') | None)
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn sampling_timeout_kills_stalled_ffmpeg() {
        use crate::sampler::FrameSampler;

        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("clip.mp4");
        std::fs::write(&video, b"\x00\x00\x00\x18ftypmp42").unwrap();
        let pid_file = dir.path().join("ffmpeg.pid");

        let ffprobe = write_script(dir.path(), "fake-ffprobe", "echo 5.0");
        let ffmpeg = write_script(
            dir.path(),
            "fake-ffmpeg",
            &format!("echo $$ > '{}'\nexec sleep 30", pid_file.display()),
        );

        let mut source = FfmpegVideoSource::open_with(
            &video,
            ffmpeg.to_str().unwrap(),
            ffprobe.to_str().unwrap(),
        )
        .await
        .unwrap();
        assert_eq!(source.duration(), Duration::from_secs(5));

        let err = FrameSampler::new(Duration::from_millis(500), 80)
            .sample(&mut source, 1000)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Timeout { timeout_ms: 500 }));
        drop(source);

        let pid: u32 = std::fs::read_to_string(&pid_file)
            .unwrap()
            .trim()
            .parse()
            .unwrap();

        let mut running = process_running(pid);
        for _ in 0..40 {
            if !running {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
            running = process_running(pid);
        }
        assert!(!running, "ffmpeg 프로세스 {pid}가 타임아웃 후에도 실행 중");
    }
}
