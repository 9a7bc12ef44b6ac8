//! 로컬 대체 이미지.
//!
//! 이미지 생성 API가 실패했을 때 보여줄 512x512 SVG를 만든다.
//! 같은 입력이면 항상 같은 데이터 URI가 나온다.

use base64::{engine::general_purpose::STANDARD as B64, Engine};
use frameprompt_core::models::item::GeneratedImage;

/// 대체 이미지 한 변 길이 (px)
pub const FALLBACK_SIZE: u32 = 512;
/// 그라디언트 시작 색
pub const GRADIENT_START: &str = "#4361ee";
/// 그라디언트 끝 색
pub const GRADIENT_END: &str = "#4cc9f0";
/// 프롬프트 요약 최대 글자 수
pub const PROMPT_SUMMARY_CHARS: usize = 50;

const TITLE: &str = "AI 생성 이미지";
const SUBTITLE: &str = "프롬프트 기반 생성";
const CONFIG_NOTE: &str = "(실제 사용 시 올바른 이미지 생성 API를 설정하세요)";
const REFERENCE_NOTE: &str = "(참조 이미지+텍스트 모드)";

/// 프롬프트 앞 50자 요약 (더 길면 `...`)
pub fn summarize_prompt(prompt: &str) -> String {
    if prompt.chars().count() > PROMPT_SUMMARY_CHARS {
        let head: String = prompt.chars().take(PROMPT_SUMMARY_CHARS).collect();
        format!("{head}...")
    } else {
        prompt.to_string()
    }
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// 대체 이미지 SVG 문서
pub fn render_svg(prompt: &str, with_reference: bool) -> String {
    let size = FALLBACK_SIZE;
    let center = size / 2;
    let summary = escape_xml(&summarize_prompt(prompt));

    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{size}" height="{size}" viewBox="0 0 {size} {size}">"#
    );
    svg.push_str(&format!(
        r#"<defs><linearGradient id="bg" x1="0" y1="0" x2="1" y2="1"><stop offset="0" stop-color="{GRADIENT_START}"/><stop offset="1" stop-color="{GRADIENT_END}"/></linearGradient></defs>"#
    ));
    svg.push_str(&format!(
        r#"<rect width="{size}" height="{size}" fill="url(#bg)"/>"#
    ));
    svg.push_str(r#"<g fill="white" font-family="Arial, sans-serif" text-anchor="middle">"#);
    svg.push_str(&format!(
        r#"<text x="{center}" y="200" font-size="24" font-weight="bold">{TITLE}</text>"#
    ));
    svg.push_str(&format!(
        r#"<text x="{center}" y="230" font-size="16">{SUBTITLE}</text>"#
    ));
    svg.push_str(&format!(
        r#"<text x="{center}" y="280" font-size="14">{summary}</text>"#
    ));
    svg.push_str(&format!(
        r#"<text x="{center}" y="320" font-size="12">{CONFIG_NOTE}</text>"#
    ));
    if with_reference {
        svg.push_str(&format!(
            r#"<text x="{center}" y="350" font-size="12">{REFERENCE_NOTE}</text>"#
        ));
    }
    svg.push_str("</g></svg>");
    svg
}

/// 대체 이미지 생성 (`data:image/svg+xml;base64,...`)
pub fn fallback_image(prompt: &str, with_reference: bool) -> GeneratedImage {
    let svg = render_svg(prompt, with_reference);
    GeneratedImage::Fallback {
        data_uri: format!("data:image/svg+xml;base64,{}", B64.encode(svg.as_bytes())),
    }
}
