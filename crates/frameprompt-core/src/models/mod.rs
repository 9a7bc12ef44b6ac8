//! 도메인 모델.
//!
//! 배치/항목/실행 상태와 이미지 핸들, 설명 플레이스홀더 규칙을 정의한다.

pub mod batch;
pub mod description;
pub mod frame;
pub mod image;
pub mod item;
pub mod run;
