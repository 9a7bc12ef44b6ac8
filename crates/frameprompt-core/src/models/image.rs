//! 이미지 핸들 모델.
//!
//! 샘플링된 프레임이나 업로드된 이미지의 바이너리를 감싸는 불투명 핸들.
//! 배치가 소유하며, 배치가 비워지거나 교체되면 drop으로 해제된다.
//! 이미지 생성 요청에 참조 이미지로 보낼 때는 `ReferenceLease`를 발급받아
//! 요청 수명 동안만 데이터 URI를 유지한다.

use base64::{engine::general_purpose::STANDARD as B64, Engine};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tracing::debug;

/// JPEG MIME 타입
pub const MIME_JPEG: &str = "image/jpeg";

#[derive(Debug)]
struct ImageBlob {
    bytes: Vec<u8>,
    mime_type: String,
    active_leases: AtomicUsize,
}

/// 불투명 바이너리 이미지 핸들 (복제 비용 낮음)
#[derive(Debug, Clone)]
pub struct ImageHandle {
    inner: Arc<ImageBlob>,
}

impl ImageHandle {
    /// 바이트와 MIME 타입으로 핸들 생성
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(ImageBlob {
                bytes,
                mime_type: mime_type.into(),
                active_leases: AtomicUsize::new(0),
            }),
        }
    }

    /// JPEG 바이트로 핸들 생성
    pub fn jpeg(bytes: Vec<u8>) -> Self {
        Self::new(bytes, MIME_JPEG)
    }

    /// 원본 바이트
    pub fn bytes(&self) -> &[u8] {
        &self.inner.bytes
    }

    /// MIME 타입
    pub fn mime_type(&self) -> &str {
        &self.inner.mime_type
    }

    /// 바이트 크기
    pub fn len(&self) -> usize {
        self.inner.bytes.len()
    }

    /// 빈 이미지 여부
    pub fn is_empty(&self) -> bool {
        self.inner.bytes.is_empty()
    }

    /// `data:<mime>;base64,...` 형식의 데이터 URI
    pub fn to_data_uri(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.inner.mime_type,
            B64.encode(&self.inner.bytes)
        )
    }

    /// 참조 이미지 임대 발급: drop 시 정확히 한 번 해제된다
    pub fn lease(&self) -> ReferenceLease {
        self.inner.active_leases.fetch_add(1, Ordering::AcqRel);
        let uri = self.to_data_uri();
        debug!(
            mime = %self.inner.mime_type,
            size = self.inner.bytes.len(),
            "참조 이미지 임대 발급"
        );
        ReferenceLease {
            handle: self.clone(),
            uri,
            issued_at: Instant::now(),
        }
    }

    /// 현재 해제되지 않은 임대 수
    pub fn active_leases(&self) -> usize {
        self.inner.active_leases.load(Ordering::Acquire)
    }

    /// 약한 참조: 핸들이 해제되었는지 확인하는 용도
    pub fn downgrade(&self) -> WeakImageHandle {
        WeakImageHandle(Arc::downgrade(&self.inner))
    }
}

/// 이미지 핸들의 약한 참조
#[derive(Debug, Clone)]
pub struct WeakImageHandle(Weak<ImageBlob>);

impl WeakImageHandle {
    /// 모든 소유자가 핸들을 놓았는지
    pub fn is_released(&self) -> bool {
        self.0.strong_count() == 0
    }
}

/// 요청 수명 동안 유지되는 참조 이미지 URI
///
/// 요청 future가 끝나면(성공/실패 무관) drop되어 해제된다.
#[derive(Debug)]
pub struct ReferenceLease {
    handle: ImageHandle,
    uri: String,
    issued_at: Instant,
}

impl ReferenceLease {
    /// 요청 본문에 넣을 URI
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// 발급 후 경과 시간
    pub fn age(&self) -> Duration {
        self.issued_at.elapsed()
    }
}

impl Drop for ReferenceLease {
    fn drop(&mut self) {
        self.handle
            .inner
            .active_leases
            .fetch_sub(1, Ordering::AcqRel);
        debug!(held_ms = self.age().as_millis() as u64, "참조 이미지 임대 해제");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_uri_format() {
        let handle = ImageHandle::jpeg(vec![0xFF, 0xD8, 0xFF]);
        assert_eq!(handle.to_data_uri(), "data:image/jpeg;base64,/9j/");
        assert_eq!(handle.len(), 3);
        assert_eq!(handle.mime_type(), MIME_JPEG);
    }

    #[test]
    fn lease_released_exactly_once() {
        let handle = ImageHandle::new(vec![1, 2, 3], "image/png");
        {
            let lease = handle.lease();
            assert!(lease.uri().starts_with("data:image/png;base64,"));
            assert_eq!(handle.active_leases(), 1);
        }
        assert_eq!(handle.active_leases(), 0);
    }

    #[test]
    fn nested_leases_are_counted() {
        let handle = ImageHandle::jpeg(vec![9]);
        let first = handle.lease();
        let second = handle.lease();
        assert_eq!(handle.active_leases(), 2);
        drop(first);
        assert_eq!(handle.active_leases(), 1);
        drop(second);
        assert_eq!(handle.active_leases(), 0);
    }

    #[test]
    fn weak_handle_tracks_release() {
        let handle = ImageHandle::jpeg(vec![1]);
        let clone = handle.clone();
        let weak = handle.downgrade();
        assert_eq!(clone.bytes(), handle.bytes());

        drop(handle);
        assert!(!weak.is_released());
        drop(clone);
        assert!(weak.is_released());
    }
}
