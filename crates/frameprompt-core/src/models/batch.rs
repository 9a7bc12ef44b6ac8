//! 배치 모델.
//!
//! 한 번의 샘플링/업로드 작업에서 나온 항목들의 순서 있는 묶음.
//! 활성 배치는 최대 하나이며, 새 작업이 시작되면 이전 배치는 통째로 버려진다.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::image::ImageHandle;
use super::item::Item;

/// 배치 출처
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchSource {
    /// 비디오 프레임 샘플링
    Video,
    /// 이미지 업로드
    Images,
}

/// 항목 배치
#[derive(Debug, Clone)]
pub struct Batch {
    /// 배치 식별자: 진행 중 결과가 교체된 배치에 기록되지 않도록 비교에 사용
    pub id: Uuid,
    /// 배치 출처
    pub source: BatchSource,
    /// 순서 있는 항목 목록
    pub items: Vec<Item>,
}

impl Batch {
    /// 이미지 목록으로 배치 생성: 이미지 하나당 항목 하나, id는 위치
    pub fn from_images(source: BatchSource, images: Vec<ImageHandle>) -> Self {
        let items = images
            .into_iter()
            .enumerate()
            .map(|(id, image)| Item::new(id, image))
            .collect();
        Self {
            id: Uuid::new_v4(),
            source,
            items,
        }
    }

    /// 항목 수
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// 빈 배치 여부
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 항목 조회
    pub fn item(&self, id: usize) -> Option<&Item> {
        self.items.get(id)
    }

    /// 항목 가변 조회
    pub fn item_mut(&mut self, id: usize) -> Option<&mut Item> {
        self.items.get_mut(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_follow_positions() {
        let images = (0..4).map(|i| ImageHandle::jpeg(vec![i])).collect();
        let batch = Batch::from_images(BatchSource::Video, images);

        assert_eq!(batch.len(), 4);
        for (position, item) in batch.items.iter().enumerate() {
            assert_eq!(item.id, position);
            assert_eq!(item.source_image.bytes(), &[position as u8]);
        }
        assert!(batch.item(4).is_none());
    }

    #[test]
    fn each_batch_gets_distinct_id() {
        let a = Batch::from_images(BatchSource::Images, vec![]);
        let b = Batch::from_images(BatchSource::Images, vec![]);
        assert_ne!(a.id, b.id);
        assert!(a.is_empty());
    }
}
