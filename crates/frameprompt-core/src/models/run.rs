//! 파이프라인 실행 상태 모델.
//!
//! 진행률 규칙:
//! - 샘플링 시작 10%, 샘플링 완료 30%
//! - 설명 단계: 항목 i(0부터) 완료 후 `30 + (i+1)/N*70`
//! - 이미지 생성 단계: 시작 10%, 항목 i 처리 후 `10 + (i+1)/N*90`
//!
//! 모든 값은 [0, 100]으로 클램프 후 반올림(half-up)하며, 한 실행 안에서 감소하지 않는다.

use serde::{Deserialize, Serialize};

/// 샘플링 시작 시 진행률
pub const SAMPLING_START_PERCENT: u8 = 10;
/// 설명 단계 시작 진행률 (샘플링 몫 30%)
pub const DESCRIBE_BASE_PERCENT: f64 = 30.0;
/// 설명 단계가 차지하는 비율
pub const DESCRIBE_SPAN_PERCENT: f64 = 70.0;
/// 이미지 생성 단계 시작 진행률
pub const GENERATE_BASE_PERCENT: f64 = 10.0;
/// 이미지 생성 단계가 차지하는 비율
pub const GENERATE_SPAN_PERCENT: f64 = 90.0;

/// 실행 단계
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    /// 대기
    Idle,
    /// 프레임 샘플링 중
    Sampling,
    /// 설명 생성 중
    Describing,
    /// 이미지 생성 중
    GeneratingImages,
}

/// 배치 단위 실행 상태
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineRun {
    /// 전체 항목 수
    pub total_items: usize,
    /// 처리 완료 항목 수
    pub completed_count: usize,
    /// 현재 단계
    pub phase: RunPhase,
    /// 진행률 (0-100)
    pub progress_percent: u8,
}

impl Default for PipelineRun {
    fn default() -> Self {
        Self::idle()
    }
}

impl PipelineRun {
    /// 대기 상태 (0%)
    pub fn idle() -> Self {
        Self {
            total_items: 0,
            completed_count: 0,
            phase: RunPhase::Idle,
            progress_percent: 0,
        }
    }

    /// 새 단계 시작: 완료 수는 0으로, 진행률은 시작값으로 초기화
    pub fn start(&mut self, phase: RunPhase, total_items: usize, start_percent: u8) {
        self.phase = phase;
        self.total_items = total_items;
        self.completed_count = 0;
        self.progress_percent = start_percent.min(100);
    }

    /// 같은 실행 안에서 진행률 갱신 (감소하지 않음)
    pub fn advance(&mut self, percent: u8) {
        self.progress_percent = self.progress_percent.max(percent.min(100));
    }

    /// 항목 하나 완료 기록 후 진행률 갱신
    pub fn complete_item(&mut self, base: f64, span: f64) {
        self.completed_count = (self.completed_count + 1).min(self.total_items);
        let percent = phase_progress(base, span, self.completed_count, self.total_items);
        self.advance(percent);
    }

    /// 단계 종료: 100%로 채우고 대기 상태로
    pub fn finish(&mut self) {
        self.progress_percent = 100;
        self.phase = RunPhase::Idle;
    }

    /// 대기/0%로 초기화
    pub fn reset(&mut self) {
        *self = Self::idle();
    }
}

/// 단계 진행률 계산: `base + done/total*span`, [0,100] 클램프 후 반올림
pub fn phase_progress(base: f64, span: f64, done: usize, total: usize) -> u8 {
    let raw = if total == 0 {
        base + span
    } else {
        base + (done as f64 / total as f64) * span
    };
    raw.clamp(0.0, 100.0).round() as u8
}
