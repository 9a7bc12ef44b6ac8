//! 설명 플레이스홀더 규칙.
//!
//! 설명 클라이언트는 실패해도 에러 대신 예약 문구가 들어간 문자열을 반환한다.
//! 파이프라인은 두 예약 문구로 실제 설명과 플레이스홀더를 구분한다.

/// 설정 누락 플레이스홀더의 예약 문구
pub const NOT_CONFIGURED_MARKER: &str = "API 키와 모델 ID를 먼저 설정";

/// 오류 플레이스홀더의 예약 문구
pub const ERROR_MARKER: &str = "프롬프트 생성 중 오류";

/// 설정 누락 시 반환하는 고정 문자열
pub const NOT_CONFIGURED_PLACEHOLDER: &str =
    "API 키와 모델 ID를 먼저 설정해야 실제 분석 결과를 받을 수 있습니다.";

/// 실패 사유를 담은 오류 플레이스홀더
pub fn error_placeholder(reason: impl std::fmt::Display) -> String {
    format!("{ERROR_MARKER}: {reason}")
}

/// 예약 문구가 들어간 플레이스홀더인지
pub fn is_placeholder_description(text: &str) -> bool {
    text.contains(NOT_CONFIGURED_MARKER) || text.contains(ERROR_MARKER)
}

/// 이미지 생성에 쓸 수 있는 실제 설명인지 (비어 있지 않고 플레이스홀더 아님)
pub fn is_usable_description(text: &str) -> bool {
    !text.trim().is_empty() && !is_placeholder_description(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_carry_markers() {
        assert!(is_placeholder_description(NOT_CONFIGURED_PLACEHOLDER));
        let err = error_placeholder("API 요청 실패: 500");
        assert!(err.contains(ERROR_MARKER));
        assert!(err.contains("500"));
        assert!(is_placeholder_description(&err));
    }

    #[test]
    fn real_description_is_usable() {
        let text = "专业美食摄影，巧克力布朗尼，浅灰色背景";
        assert!(!is_placeholder_description(text));
        assert!(is_usable_description(text));
        assert!(!is_usable_description("   "));
        assert!(!is_usable_description(NOT_CONFIGURED_PLACEHOLDER));
    }
}
