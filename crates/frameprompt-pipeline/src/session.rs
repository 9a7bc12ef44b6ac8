//! 파이프라인 세션.
//!
//! 활성 배치, 실행 상태, API 설정을 한곳에 묶는다.
//! `Arc<parking_lot::Mutex<Session>>`로 공유하며 잠금은 await 지점을 넘기지 않는다.

use std::sync::Arc;

use frameprompt_core::config::ApiConfig;
use frameprompt_core::error::CoreError;
use frameprompt_core::models::batch::Batch;
use frameprompt_core::models::item::Item;
use frameprompt_core::models::run::PipelineRun;
use parking_lot::Mutex;
use uuid::Uuid;

/// 공유 세션 핸들
pub type SharedSession = Arc<Mutex<Session>>;

/// 세션 상태
#[derive(Debug, Default)]
pub struct Session {
    /// API 설정
    pub config: ApiConfig,
    /// 활성 배치 (최대 하나)
    pub batch: Option<Batch>,
    /// 실행 상태
    pub run: PipelineRun,
}

impl Session {
    /// 설정으로 새 세션 생성
    pub fn new(config: ApiConfig) -> Self {
        Self {
            config,
            batch: None,
            run: PipelineRun::idle(),
        }
    }

    /// 공유 세션으로 감싸기
    pub fn shared(config: ApiConfig) -> SharedSession {
        Arc::new(Mutex::new(Self::new(config)))
    }

    /// 활성 배치 id
    pub fn batch_id(&self) -> Option<Uuid> {
        self.batch.as_ref().map(|b| b.id)
    }

    /// 배치가 여전히 `id`인지
    pub fn is_current(&self, id: Uuid) -> bool {
        self.batch_id() == Some(id)
    }

    /// 활성 배치 (없으면 `NoBatch`)
    pub fn batch(&self) -> Result<&Batch, CoreError> {
        self.batch.as_ref().ok_or(CoreError::NoBatch)
    }

    /// 항목 조회
    pub fn item(&self, item_id: usize) -> Result<&Item, CoreError> {
        self.batch()?
            .item(item_id)
            .ok_or(CoreError::ItemNotFound(item_id))
    }

    /// 항목 가변 조회 (배치 id가 일치할 때만)
    pub fn current_item_mut(&mut self, batch_id: Uuid, item_id: usize) -> Option<&mut Item> {
        self.batch
            .as_mut()
            .filter(|b| b.id == batch_id)
            .and_then(|b| b.item_mut(item_id))
    }
}
