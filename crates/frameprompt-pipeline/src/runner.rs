//! 파이프라인 실행기.
//!
//! 상태 전이: `Idle → Sampling → Describing → (Idle | GeneratingImages) → Idle`.
//!
//! - 항목은 인덱스 순서로 한 번에 하나씩 처리한다 (업스트림 동시 요청 1개)
//! - 항목 단위 실패는 항목 상태에만 기록하고 다음 항목으로 넘어간다
//! - 배치를 중단시키는 실패는 항목 처리 전에만 발생한다 (설정 누락, 간격 오류, 샘플링 실패)
//! - 결과를 기록하기 직전에 배치 id를 확인하고, 배치가 비워지거나 교체되었으면 결과를 버린다
//! - 진행률 스냅샷은 `watch` 채널로 발행한다

use std::sync::Arc;

use frameprompt_core::config::ApiConfig;
use frameprompt_core::error::CoreError;
use frameprompt_core::models::batch::{Batch, BatchSource};
use frameprompt_core::models::description::is_usable_description;
use frameprompt_core::models::image::ImageHandle;
use frameprompt_core::models::item::{DescriptionState, GeneratedImage, GenerationState, Phase};
use frameprompt_core::models::run::{
    PipelineRun, RunPhase, DESCRIBE_BASE_PERCENT, DESCRIBE_SPAN_PERCENT, GENERATE_BASE_PERCENT,
    GENERATE_SPAN_PERCENT, SAMPLING_START_PERCENT,
};
use frameprompt_core::ports::describer::FrameDescriber;
use frameprompt_core::ports::image_generator::ImageGenerator;
use frameprompt_core::ports::translator::PromptTranslator;
use frameprompt_core::ports::video::VideoSource;
use frameprompt_vision::sampler::FrameSampler;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::session::SharedSession;

/// 설명 단계 결과 요약
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DescribeSummary {
    /// 배치 항목 수
    pub total: usize,
    /// 실제 설명을 받은 항목 수
    pub ready: usize,
    /// 플레이스홀더를 받은 항목 수
    pub failed: usize,
    /// 실행 중 배치가 비워지거나 교체됨
    pub superseded: bool,
}

/// 이미지 생성 단계 결과 요약
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GenerateSummary {
    /// 배치 항목 수 (건너뛴 항목 포함)
    pub total: usize,
    /// 이미지가 만들어진 항목 수 (대체 이미지 포함)
    pub produced: usize,
    /// 그중 대체 이미지 수
    pub fallbacks: usize,
    /// 유효한 설명이 없어 건너뛴 항목 수
    pub skipped: usize,
    /// 실행 중 배치가 비워지거나 교체됨
    pub superseded: bool,
}

/// 단일 항목 재실행 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemOutcome {
    /// 새 결과 반영
    Updated,
    /// 플레이스홀더/대체 이미지/결과 없음
    Failed,
    /// 배치가 바뀌어 결과를 버림
    Superseded,
}

/// 파이프라인 실행기
pub struct PipelineRunner {
    session: SharedSession,
    sampler: FrameSampler,
    describer: Arc<dyn FrameDescriber>,
    generator: Arc<dyn ImageGenerator>,
    translator: Arc<dyn PromptTranslator>,
    progress_tx: watch::Sender<PipelineRun>,
}

impl PipelineRunner {
    /// 새 실행기 생성 (기본 샘플러)
    pub fn new(
        session: SharedSession,
        describer: Arc<dyn FrameDescriber>,
        generator: Arc<dyn ImageGenerator>,
        translator: Arc<dyn PromptTranslator>,
    ) -> Self {
        let initial = session.lock().run.clone();
        let (progress_tx, _) = watch::channel(initial);
        Self {
            session,
            sampler: FrameSampler::default(),
            describer,
            generator,
            translator,
            progress_tx,
        }
    }

    /// 샘플러 교체
    pub fn with_sampler(mut self, sampler: FrameSampler) -> Self {
        self.sampler = sampler;
        self
    }

    /// 공유 세션
    pub fn session(&self) -> SharedSession {
        self.session.clone()
    }

    /// 진행률 구독
    pub fn subscribe(&self) -> watch::Receiver<PipelineRun> {
        self.progress_tx.subscribe()
    }

    /// 현재 실행 상태
    pub fn progress(&self) -> PipelineRun {
        self.session.lock().run.clone()
    }

    /// 현재 API 설정
    pub fn config(&self) -> ApiConfig {
        self.session.lock().config.clone()
    }

    /// API 설정 교체 (다음 작업부터 적용)
    pub fn set_config(&self, config: ApiConfig) {
        self.session.lock().config = config;
    }

    // ============================================================
    // 배치 진입점
    // ============================================================

    /// 비디오 분석: 샘플링 후 전체 설명
    ///
    /// # Errors
    /// - `NotConfigured`: 설명 API 자격증명 없음 (이전 배치 유지)
    /// - `InvalidInterval`: 간격 1초 미만 (이전 배치 유지)
    /// - `Timeout` / `VideoLoad`: 샘플링 실패 (이전 배치는 이미 버려짐)
    pub async fn analyze_video(
        &self,
        source: &mut dyn VideoSource,
        interval_ms: u64,
    ) -> Result<DescribeSummary, CoreError> {
        let config = self.config();
        require_description_credentials(&config)?;
        FrameSampler::validate_interval(interval_ms)?;

        self.begin_sampling();
        let frames = match self.sampler.sample(source, interval_ms).await {
            Ok(frames) => frames,
            Err(e) => {
                warn!("비디오 분석 중단: {e}");
                self.update_run(PipelineRun::reset);
                return Err(e);
            }
        };

        self.install_batch(BatchSource::Video, frames);
        self.run_describe().await
    }

    /// 이미지 세트 분석: 전체 설명
    pub async fn analyze_images(
        &self,
        images: Vec<ImageHandle>,
    ) -> Result<DescribeSummary, CoreError> {
        let config = self.config();
        require_description_credentials(&config)?;
        if images.is_empty() {
            return Err(CoreError::Validation {
                field: "images".to_string(),
                message: "분석할 이미지가 없습니다".to_string(),
            });
        }

        self.begin_sampling();
        self.install_batch(BatchSource::Images, images);
        self.run_describe().await
    }

    fn begin_sampling(&self) {
        let (old, snapshot) = {
            let mut s = self.session.lock();
            let old = s.batch.take();
            s.run
                .start(RunPhase::Sampling, 0, SAMPLING_START_PERCENT);
            (old, s.run.clone())
        };
        drop(old);
        self.publish(snapshot);
    }

    fn install_batch(&self, source: BatchSource, images: Vec<ImageHandle>) {
        let batch = Batch::from_images(source, images);
        info!(batch_id = %batch.id, items = batch.len(), ?source, "새 배치");
        let (old, snapshot) = {
            let mut s = self.session.lock();
            let old = s.batch.replace(batch);
            s.run.advance(DESCRIBE_BASE_PERCENT as u8);
            (old, s.run.clone())
        };
        drop(old);
        self.publish(snapshot);
    }

    // ============================================================
    // 단계 실행
    // ============================================================

    /// 활성 배치 전체 설명 (인덱스 순서)
    pub async fn run_describe(&self) -> Result<DescribeSummary, CoreError> {
        let (batch_id, total, config, snapshot) = {
            let mut s = self.session.lock();
            let batch = s.batch()?;
            let (batch_id, total) = (batch.id, batch.len());
            let config = s.config.clone();
            s.run
                .start(RunPhase::Describing, total, DESCRIBE_BASE_PERCENT as u8);
            (batch_id, total, config, s.run.clone())
        };
        self.publish(snapshot);

        let mut summary = DescribeSummary {
            total,
            ..DescribeSummary::default()
        };

        for item_id in 0..total {
            let Some(image) = self.current_image(batch_id, item_id) else {
                summary.superseded = true;
                break;
            };

            let text = self.describer.describe(&image, &config).await;
            drop(image);

            let committed = {
                let mut s = self.session.lock();
                match s.current_item_mut(batch_id, item_id) {
                    Some(item) => {
                        item.apply_description(text);
                        let ready = item.description_state == DescriptionState::Ready;
                        s.run
                            .complete_item(DESCRIBE_BASE_PERCENT, DESCRIBE_SPAN_PERCENT);
                        Some((ready, s.run.clone()))
                    }
                    None => None,
                }
            };

            match committed {
                Some((ready, snapshot)) => {
                    if ready {
                        summary.ready += 1;
                    } else {
                        summary.failed += 1;
                    }
                    debug!(
                        item_id,
                        progress = snapshot.progress_percent,
                        "항목 설명 완료 ({}/{})",
                        item_id + 1,
                        total
                    );
                    self.publish(snapshot);
                }
                None => {
                    summary.superseded = true;
                    break;
                }
            }
        }

        self.finish_run(batch_id, summary.superseded);
        info!(
            total = summary.total,
            ready = summary.ready,
            failed = summary.failed,
            superseded = summary.superseded,
            "설명 단계 종료"
        );
        Ok(summary)
    }

    /// 유효한 설명이 있는 모든 항목에 대해 이미지 생성
    ///
    /// 각 항목의 원본 이미지를 참조 이미지로 함께 보낸다.
    pub async fn run_generate_all(&self) -> Result<GenerateSummary, CoreError> {
        let (batch_id, total, config, snapshot) = {
            let mut s = self.session.lock();
            let batch = s.batch()?;
            let (batch_id, total) = (batch.id, batch.len());
            let config = s.config.clone();
            require_image_credentials(&config)?;
            s.run
                .start(RunPhase::GeneratingImages, total, GENERATE_BASE_PERCENT as u8);
            (batch_id, total, config, s.run.clone())
        };
        self.publish(snapshot);

        let mut summary = GenerateSummary {
            total,
            ..GenerateSummary::default()
        };

        for item_id in 0..total {
            let target = {
                let mut s = self.session.lock();
                match s.current_item_mut(batch_id, item_id) {
                    Some(item) => {
                        let prompt = item.usable_description().map(str::to_string);
                        if prompt.is_some() {
                            item.generation_state = GenerationState::Pending;
                        }
                        Some((item.source_image.clone(), prompt))
                    }
                    None => None,
                }
            };

            let Some((image, prompt)) = target else {
                summary.superseded = true;
                break;
            };

            let Some(prompt) = prompt else {
                debug!(item_id, "유효한 설명 없음, 생성 건너뜀");
                summary.skipped += 1;
                drop(image);
                if !self.complete_generate_item(batch_id) {
                    summary.superseded = true;
                    break;
                }
                continue;
            };

            let result = self.generator.generate(&prompt, Some(&image), &config).await;
            drop(image);

            let committed = {
                let mut s = self.session.lock();
                match s.current_item_mut(batch_id, item_id) {
                    Some(item) => {
                        let counted = result.as_ref().map(GeneratedImage::is_fallback);
                        item.apply_generation(result);
                        s.run
                            .complete_item(GENERATE_BASE_PERCENT, GENERATE_SPAN_PERCENT);
                        Some((counted, s.run.clone()))
                    }
                    None => None,
                }
            };

            match committed {
                Some((counted, snapshot)) => {
                    if let Some(is_fallback) = counted {
                        summary.produced += 1;
                        if is_fallback {
                            summary.fallbacks += 1;
                        }
                    }
                    debug!(
                        item_id,
                        progress = snapshot.progress_percent,
                        "항목 이미지 생성 완료 ({}/{})",
                        item_id + 1,
                        total
                    );
                    self.publish(snapshot);
                }
                None => {
                    debug!(item_id, "배치가 교체되어 생성 결과를 버림");
                    summary.superseded = true;
                    break;
                }
            }
        }

        self.finish_run(batch_id, summary.superseded);
        info!(
            total = summary.total,
            produced = summary.produced,
            fallbacks = summary.fallbacks,
            skipped = summary.skipped,
            superseded = summary.superseded,
            "이미지 생성 단계 종료"
        );
        Ok(summary)
    }

    /// 항목 하나의 한 단계만 다시 실행 (실행 상태는 건드리지 않음)
    pub async fn rerun_one(&self, item_id: usize, phase: Phase) -> Result<ItemOutcome, CoreError> {
        match phase {
            Phase::Describe => self.rerun_describe(item_id).await,
            Phase::Generate => self.rerun_generate(item_id).await,
        }
    }

    async fn rerun_describe(&self, item_id: usize) -> Result<ItemOutcome, CoreError> {
        let (batch_id, image, config) = {
            let s = self.session.lock();
            require_description_credentials(&s.config)?;
            let batch_id = s.batch()?.id;
            let image = s.item(item_id)?.source_image.clone();
            (batch_id, image, s.config.clone())
        };

        let text = self.describer.describe(&image, &config).await;
        drop(image);

        let mut s = self.session.lock();
        let Some(item) = s.current_item_mut(batch_id, item_id) else {
            return Ok(ItemOutcome::Superseded);
        };

        if is_usable_description(&text) {
            item.apply_description(text);
            info!(item_id, "항목 설명 재생성 완료");
            Ok(ItemOutcome::Updated)
        } else if item.usable_description().is_some() {
            warn!(item_id, "설명 재생성 실패, 기존 설명 유지: {text}");
            Ok(ItemOutcome::Failed)
        } else {
            item.apply_description(text);
            warn!(item_id, "설명 재생성 실패");
            Ok(ItemOutcome::Failed)
        }
    }

    async fn rerun_generate(&self, item_id: usize) -> Result<ItemOutcome, CoreError> {
        let (batch_id, image, prompt, config) = {
            let mut s = self.session.lock();
            require_image_credentials(&s.config)?;
            let config = s.config.clone();
            let batch_id = s.batch()?.id;
            let item = s
                .current_item_mut(batch_id, item_id)
                .ok_or(CoreError::ItemNotFound(item_id))?;
            let prompt = item
                .usable_description()
                .map(str::to_string)
                .ok_or_else(|| CoreError::Validation {
                    field: "description".to_string(),
                    message: format!("항목 {item_id}에 유효한 설명이 없습니다"),
                })?;
            item.generation_state = GenerationState::Pending;
            (batch_id, item.source_image.clone(), prompt, config)
        };

        let result = self.generator.generate(&prompt, Some(&image), &config).await;
        drop(image);

        let mut s = self.session.lock();
        let Some(item) = s.current_item_mut(batch_id, item_id) else {
            return Ok(ItemOutcome::Superseded);
        };
        item.apply_generation(result);
        if item.generation_state == GenerationState::Ready {
            info!(item_id, "항목 이미지 재생성 완료");
            Ok(ItemOutcome::Updated)
        } else {
            warn!(item_id, "항목 이미지 재생성 실패");
            Ok(ItemOutcome::Failed)
        }
    }

    /// 항목 설명 번역 후 항목에 저장
    pub async fn translate_one(&self, item_id: usize) -> Result<String, CoreError> {
        let (batch_id, text, config) = {
            let s = self.session.lock();
            let batch_id = s.batch()?.id;
            let text = s.item(item_id)?.description.clone().unwrap_or_default();
            (batch_id, text, s.config.clone())
        };

        let translated = self.translator.translate(&text, &config).await;

        let mut s = self.session.lock();
        match s.current_item_mut(batch_id, item_id) {
            Some(item) => item.translation = Some(translated.clone()),
            None => debug!(item_id, "배치가 교체되어 번역 결과를 저장하지 않음"),
        }
        Ok(translated)
    }

    /// 배치 비우기: 이미지 핸들 해제, 실행 상태 초기화
    pub fn clear(&self) {
        let (old, snapshot) = {
            let mut s = self.session.lock();
            let old = s.batch.take();
            s.run.reset();
            (old, s.run.clone())
        };
        if let Some(batch) = &old {
            info!(batch_id = %batch.id, items = batch.len(), "배치 비움");
        }
        drop(old);
        self.publish(snapshot);
    }

    // ============================================================
    // 내부 헬퍼
    // ============================================================

    fn publish(&self, run: PipelineRun) {
        self.progress_tx.send_replace(run);
    }

    fn update_run(&self, f: impl FnOnce(&mut PipelineRun)) {
        let snapshot = {
            let mut s = self.session.lock();
            f(&mut s.run);
            s.run.clone()
        };
        self.publish(snapshot);
    }

    fn current_image(&self, batch_id: Uuid, item_id: usize) -> Option<ImageHandle> {
        let mut s = self.session.lock();
        s.current_item_mut(batch_id, item_id)
            .map(|item| item.source_image.clone())
    }

    /// 건너뛴 생성 항목의 진행률 반영. 배치가 바뀌었으면 `false`
    fn complete_generate_item(&self, batch_id: Uuid) -> bool {
        let snapshot = {
            let mut s = self.session.lock();
            if !s.is_current(batch_id) {
                return false;
            }
            s.run
                .complete_item(GENERATE_BASE_PERCENT, GENERATE_SPAN_PERCENT);
            s.run.clone()
        };
        self.publish(snapshot);
        true
    }

    fn finish_run(&self, batch_id: Uuid, superseded: bool) {
        if superseded {
            return;
        }
        let snapshot = {
            let mut s = self.session.lock();
            if !s.is_current(batch_id) {
                return;
            }
            s.run.finish();
            s.run.clone()
        };
        self.publish(snapshot);
    }
}

fn require_description_credentials(config: &ApiConfig) -> Result<(), CoreError> {
    config
        .description_credentials()
        .map(|_| ())
        .ok_or_else(|| CoreError::NotConfigured("설명 API 키/모델 ID".to_string()))
}

fn require_image_credentials(config: &ApiConfig) -> Result<(), CoreError> {
    config
        .image_credentials()
        .map(|_| ())
        .ok_or_else(|| CoreError::NotConfigured("이미지 생성 API 키/모델 ID".to_string()))
}
