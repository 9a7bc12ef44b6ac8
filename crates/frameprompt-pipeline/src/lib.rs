//! # frameprompt-pipeline
//!
//! 배치 단위 파이프라인.
//! 비디오 샘플링(또는 이미지 세트) → 항목별 설명 → 항목별 이미지 생성 순서로
//! 한 번에 한 요청씩 처리하며, 진행률과 항목 상태를 세션에 기록한다.

pub mod runner;
pub mod session;
