//! # frameprompt-vision
//!
//! 프레임 샘플링 크레이트.
//! 비디오 소스를 일정 간격으로 seek/캡처해 JPEG 이미지 핸들 목록을 만들고,
//! 이미 준비된 이미지 파일 묶음을 같은 형태로 읽어들인다.

pub mod encoder;
pub mod ffmpeg_source;
pub mod image_set;
pub mod sampler;
