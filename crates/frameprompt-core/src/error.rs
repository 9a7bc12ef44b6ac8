//! frameprompt 핵심 에러 타입.
//!
//! 모든 어댑터 crate는 이 타입을 그대로 반환하거나 자체 에러 타입에서 래핑한다.
//! 항목 단위 실패(네트워크/파싱)는 클라이언트 레이어에서 플레이스홀더로 흡수되고,
//! 배치 단위 실패(샘플링, 설정 누락)만 파이프라인을 중단시킨다.

use thiserror::Error;

/// 코어 레이어 에러.
#[derive(Debug, Error)]
pub enum CoreError {
    /// API 자격증명 미설정: 설정이 바뀌기 전까지 재시도 불가
    #[error("API 설정 누락: {0}. 설정에서 API 키와 모델 ID를 입력하세요.")]
    NotConfigured(String),

    /// 네트워크 에러 (연결 실패, 비정상 HTTP 상태)
    #[error("네트워크 에러: {0}")]
    Network(String),

    /// 예상과 다른 응답 형식
    #[error("응답 파싱 실패: {0}")]
    Parse(String),

    /// 프레임 추출 타임아웃 (seek 이벤트 정지 등)
    #[error("비디오 프레임 추출 타임아웃 ({timeout_ms}ms 초과). 비디오 길이를 줄이거나 샘플링 간격을 늘려보세요.")]
    Timeout {
        /// 초과된 타임아웃 시간 (밀리초)
        timeout_ms: u64,
    },

    /// 비디오 로드/디코딩 실패
    #[error("비디오 로드 실패: {0}. 파일 형식을 확인하세요.")]
    VideoLoad(String),

    /// 샘플링 간격이 1초 미만
    #[error("샘플링 간격이 너무 짧습니다 ({interval_ms}ms). 최소 1초 이상으로 설정하세요.")]
    InvalidInterval {
        /// 요청된 간격 (밀리초)
        interval_ms: u64,
    },

    /// 필드 유효성 검증 실패
    #[error("유효성 검증 실패: {field}: {message}")]
    Validation {
        /// 검증 실패한 필드명
        field: String,
        /// 실패 사유
        message: String,
    },

    /// 활성 배치 없음
    #[error("분석된 배치가 없습니다. 먼저 비디오나 이미지를 분석하세요.")]
    NoBatch,

    /// 배치에 해당 항목 없음
    #[error("항목 미발견: {0}")]
    ItemNotFound(usize),

    /// 설정값 오류 (파일 로드/저장 등)
    #[error("설정 에러: {0}")]
    Config(String),

    /// JSON 직렬화/역직렬화 실패
    #[error("직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O 에러
    #[error("I/O 에러: {0}")]
    Io(#[from] std::io::Error),

    /// 내부 에러 (예상치 못한 상황)
    #[error("내부 에러: {0}")]
    Internal(String),
}

impl CoreError {
    /// 배치 전체를 중단시키는 에러인지 여부
    ///
    /// 샘플링 단계 실패와 설정 누락만 배치를 중단시킨다.
    pub fn is_batch_fatal(&self) -> bool {
        matches!(
            self,
            CoreError::NotConfigured(_)
                | CoreError::Timeout { .. }
                | CoreError::VideoLoad(_)
                | CoreError::InvalidInterval { .. }
        )
    }
}
