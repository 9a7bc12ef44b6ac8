//! 결과 내보내기.
//!
//! 배치 스냅샷을 출력 디렉토리에 파일로 쓴다.
//! - 원본 프레임: `frame-{n}.{ext}`
//! - 생성 이미지: `ai-generated-image-{n}.{ext}` (원격 URL은 다운로드, 대체 이미지는 데이터 URI 디코딩)
//! - 항목별 상태: `report.json`
//!
//! `n`은 1부터 시작한다. 생성 이미지 하나를 받지 못해도 나머지 내보내기는 계속한다.

use std::path::{Path, PathBuf};

use base64::Engine;
use chrono::{DateTime, Utc};
use frameprompt_core::error::CoreError;
use frameprompt_core::models::batch::{Batch, BatchSource};
use frameprompt_core::models::item::{DescriptionState, GeneratedImage, GenerationState, Item};
use frameprompt_pipeline::session::SharedSession;
use serde::Serialize;
use tracing::{debug, info, warn};

/// 리포트 파일 이름
pub const REPORT_FILE_NAME: &str = "report.json";

/// 내보내기 리포트
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// 생성 시각
    pub created_at: DateTime<Utc>,
    /// 배치 출처
    pub source: BatchSource,
    /// 항목 수
    pub item_count: usize,
    /// 항목별 결과
    pub items: Vec<ReportItem>,
}

/// 항목 하나의 내보내기 결과
#[derive(Debug, Clone, Serialize)]
pub struct ReportItem {
    /// 배치 내 위치 (0부터)
    pub id: usize,
    /// 저장된 원본 프레임 파일 이름
    pub frame_file: String,
    /// 설명 텍스트 (플레이스홀더 포함)
    pub description: Option<String>,
    /// 설명 단계 상태
    pub description_state: DescriptionState,
    /// 영어 번역
    pub translation: Option<String>,
    /// 생성 단계 상태
    pub generation_state: GenerationState,
    /// 저장된 생성 이미지 파일 (다운로드 실패 시 `None`)
    pub generated_file: Option<String>,
    /// 원격 이미지 URL
    pub generated_url: Option<String>,
    /// 생성 실패로 대체 이미지를 썼는지
    pub fallback: bool,
}

/// MIME 타입에 맞는 파일 확장자
pub fn extension_for_mime(mime: &str) -> &'static str {
    let mime = mime.split(';').next().unwrap_or_default().trim();
    match mime {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        "image/gif" => "gif",
        "image/bmp" => "bmp",
        "image/svg+xml" => "svg",
        _ => "png",
    }
}

/// `data:<mime>;base64,<payload>` 분해
pub fn parse_data_uri(uri: &str) -> Option<(String, Vec<u8>)> {
    let rest = uri.strip_prefix("data:")?;
    let (meta, payload) = rest.split_once(',')?;
    let mime = meta.strip_suffix(";base64")?;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .ok()?;
    Some((mime.to_string(), bytes))
}

/// 결과 내보내기
///
/// 세션 잠금은 배치를 복제하는 동안만 잡는다.
pub async fn export(
    session: &SharedSession,
    http: &reqwest::Client,
    out_dir: &Path,
) -> Result<Report, CoreError> {
    let batch: Batch = session.lock().batch()?.clone();

    tokio::fs::create_dir_all(out_dir).await?;

    let mut items = Vec::with_capacity(batch.len());
    for item in &batch.items {
        items.push(export_item(item, http, out_dir).await?);
    }

    let report = Report {
        created_at: Utc::now(),
        source: batch.source,
        item_count: batch.len(),
        items,
    };

    let json = serde_json::to_string_pretty(&report)?;
    tokio::fs::write(out_dir.join(REPORT_FILE_NAME), json).await?;

    info!(
        dir = %out_dir.display(),
        items = report.item_count,
        "결과 내보내기 완료"
    );
    Ok(report)
}

async fn export_item(
    item: &Item,
    http: &reqwest::Client,
    out_dir: &Path,
) -> Result<ReportItem, CoreError> {
    let n = item.id + 1;

    let frame_file = format!(
        "frame-{n}.{}",
        extension_for_mime(item.source_image.mime_type())
    );
    tokio::fs::write(out_dir.join(&frame_file), item.source_image.bytes()).await?;

    let generated_file = match &item.generated_image {
        Some(image) => save_generated(image, n, http, out_dir).await,
        None => None,
    };

    let (generated_url, fallback) = match &item.generated_image {
        Some(GeneratedImage::Remote { url }) => (Some(url.clone()), false),
        Some(GeneratedImage::Fallback { .. }) => (None, true),
        None => (None, false),
    };

    Ok(ReportItem {
        id: item.id,
        frame_file,
        description: item.description.clone(),
        description_state: item.description_state,
        translation: item.translation.clone(),
        generation_state: item.generation_state,
        generated_file,
        generated_url,
        fallback,
    })
}

async fn save_generated(
    image: &GeneratedImage,
    n: usize,
    http: &reqwest::Client,
    out_dir: &Path,
) -> Option<String> {
    let fetched = match image {
        GeneratedImage::Remote { url } => download(http, url).await,
        GeneratedImage::Fallback { data_uri } => parse_data_uri(data_uri)
            .ok_or_else(|| CoreError::Parse("대체 이미지 데이터 URI 형식 오류".to_string())),
    };

    let (mime, bytes) = match fetched {
        Ok(pair) => pair,
        Err(e) => {
            warn!(item = n, "생성 이미지 저장 건너뜀: {e}");
            return None;
        }
    };

    let file_name = format!("ai-generated-image-{n}.{}", extension_for_mime(&mime));
    let path: PathBuf = out_dir.join(&file_name);
    match tokio::fs::write(&path, bytes).await {
        Ok(()) => {
            debug!(path = %path.display(), "생성 이미지 저장");
            Some(file_name)
        }
        Err(e) => {
            warn!(path = %path.display(), "생성 이미지 쓰기 실패: {e}");
            None
        }
    }
}

async fn download(http: &reqwest::Client, url: &str) -> Result<(String, Vec<u8>), CoreError> {
    let response = http
        .get(url)
        .send()
        .await
        .map_err(|e| CoreError::Network(format!("이미지 다운로드 실패: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(CoreError::Network(format!(
            "이미지 다운로드 실패: {}",
            status.as_u16()
        )));
    }

    let mime = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("image/png")
        .to_string();
    let bytes = response
        .bytes()
        .await
        .map_err(|e| CoreError::Network(format!("이미지 본문 수신 실패: {e}")))?;

    Ok((mime, bytes.to_vec()))
}
