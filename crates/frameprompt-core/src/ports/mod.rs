//! 포트 인터페이스 (trait).
//!
//! 각 어댑터 crate가 이 trait들을 구현하며,
//! 파이프라인과 바이너리에서 `Arc<dyn T>`로 와이어링한다.
//!
//! 모든 async trait은 `async_trait` 매크로를 사용하여 object safety를 보장한다.

pub mod describer;
pub mod image_generator;
pub mod translator;
pub mod video;
