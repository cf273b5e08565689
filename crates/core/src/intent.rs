use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{Intent, IntentResult};

static ISO_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());

pub fn normalize_text(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn is_iso_date_input(input: &str) -> bool {
    ISO_DATE.is_match(input.trim())
}

/// Keyword classifier. Used directly in offline mode and as the fallback when
/// the language model is unreachable or returns garbage; always yields a
/// valid intent.
pub fn classify_rules(input: &str) -> IntentResult {
    let text = normalize_text(input);
    let lowered = text.to_lowercase();

    if is_iso_date_input(&text) {
        let mut result = IntentResult::bare(Intent::InfoCollection, 0.9);
        result.extracted_info.departure_date = Some(text.trim().to_string());
        return result;
    }

    if contains_any(&lowered, &["캘린더", "calendar", "일정", "등록"]) {
        let mut result = IntentResult::bare(Intent::CalendarAction, 0.8);
        result.agent_params.action = Some("add".to_string());
        return result;
    }

    if contains_any(&lowered, &["공유", "share", "카카오", "텍스트"]) {
        return IntentResult::bare(Intent::ShareAction, 0.8);
    }

    if contains_any(&lowered, &["검색", "찾아", "추천", "어디"]) {
        return IntentResult::bare(Intent::SearchRequest, 0.7);
    }

    if contains_any(&lowered, &["계획", "일정", "plan", "만들어"]) {
        return IntentResult::bare(Intent::PlanningRequest, 0.7);
    }

    IntentResult::bare(Intent::InfoCollection, 0.6)
}

fn contains_any(text: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| text.contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iso_date_input_extracts_departure_date() {
        let result = classify_rules("  2026-09-12  ");
        assert_eq!(result.intent, Intent::InfoCollection);
        assert!(result.confidence >= 0.9);
        assert_eq!(
            result.extracted_info.departure_date.as_deref(),
            Some("2026-09-12")
        );
    }

    #[test]
    fn calendar_keywords_win_over_planning_keywords() {
        // "일정" sits in both keyword groups; the calendar check runs first.
        let result = classify_rules("일정 만들어줘");
        assert_eq!(result.intent, Intent::CalendarAction);
        assert_eq!(result.agent_params.action.as_deref(), Some("add"));
    }

    #[test]
    fn keyword_groups_route_in_priority_order() {
        assert_eq!(classify_rules("카카오로 보내줘").intent, Intent::ShareAction);
        assert_eq!(classify_rules("맛집 찾아줘").intent, Intent::SearchRequest);
        assert_eq!(
            classify_rules("여행 계획 만들어줘").intent,
            Intent::PlanningRequest
        );
    }

    #[test]
    fn anything_else_defaults_to_info_collection() {
        let result = classify_rules("안녕하세요");
        assert_eq!(result.intent, Intent::InfoCollection);
        assert!((result.confidence - 0.6).abs() < f32::EPSILON);
    }

    #[test]
    fn normalize_text_collapses_whitespace() {
        assert_eq!(
            normalize_text("  제주도   여행  \n 가고싶어 "),
            "제주도 여행 가고싶어"
        );
    }
}
