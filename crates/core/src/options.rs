use chrono::{Datelike, Duration, NaiveDate, Weekday};

use crate::format::truncate_graphemes;
use crate::models::{BudgetTier, CompanionType, Destination, Place, ResponseOption, TravelStyle};

pub fn style_options() -> Vec<ResponseOption> {
    TravelStyle::ALL
        .iter()
        .map(|style| {
            ResponseOption::with_description(
                &format!("{} {}", style.icon(), style.label()),
                style.as_str(),
                style.blurb(),
            )
        })
        .collect()
}

pub fn duration_options() -> Vec<ResponseOption> {
    vec![
        ResponseOption::new("당일치기", "day_trip"),
        ResponseOption::new("1박 2일", "1n2d"),
        ResponseOption::new("2박 3일", "2n3d"),
        ResponseOption::new("3박 4일", "3n4d"),
        ResponseOption::new("4박 5일", "4n5d"),
        ResponseOption::new("일주일 이상", "week_plus"),
    ]
}

pub fn budget_options() -> Vec<ResponseOption> {
    BudgetTier::ALL
        .iter()
        .map(|tier| {
            ResponseOption::new(
                &format!("{} {} ({})", tier.icon(), tier.label(), tier.range_label()),
                tier.as_str(),
            )
        })
        .collect()
}

pub fn companion_options() -> Vec<ResponseOption> {
    CompanionType::ALL
        .iter()
        .map(|companion| {
            ResponseOption::new(
                &format!("{} {}", companion.icon(), companion.label()),
                companion.as_str(),
            )
        })
        .collect()
}

/// Quick departure-date picks: this week's remaining days (capped at 4) as
/// concrete ISO values, then the relative tokens.
pub fn date_options(today: NaiveDate) -> Vec<ResponseOption> {
    let mut options = Vec::new();

    let days_until_sunday = 6 - today.weekday().num_days_from_monday() as i64;
    let quick_picks = (days_until_sunday + 1).min(4);
    for i in 0..quick_picks {
        let target = today + Duration::days(i);
        let day_name = match i {
            0 => "오늘".to_string(),
            1 => "내일".to_string(),
            _ => korean_weekday(target.weekday()).to_string(),
        };
        options.push(ResponseOption::new(
            &format!("{} ({})", day_name, target.format("%m/%d")),
            &target.format("%Y-%m-%d").to_string(),
        ));
    }

    let next_weekend = if today.weekday().num_days_from_monday() >= 5 {
        today + Duration::days(12 - today.weekday().num_days_from_monday() as i64)
    } else {
        today + Duration::days(5 - today.weekday().num_days_from_monday() as i64 + 7)
    };
    options.push(ResponseOption::new(
        &format!("다음 주말 ({})", next_weekend.format("%m/%d")),
        "next_weekend",
    ));

    let next_month = today + Duration::days(30);
    options.push(ResponseOption::new(
        &format!("다음 달 ({})", next_month.format("%m/%d")),
        "next_month",
    ));

    options.push(ResponseOption::new("직접 날짜 선택", "custom_date"));
    options
}

pub fn korean_weekday(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "월요일",
        Weekday::Tue => "화요일",
        Weekday::Wed => "수요일",
        Weekday::Thu => "목요일",
        Weekday::Fri => "금요일",
        Weekday::Sat => "토요일",
        Weekday::Sun => "일요일",
    }
}

pub fn destination_options(destinations: &[Destination]) -> Vec<ResponseOption> {
    let mut options: Vec<ResponseOption> = destinations
        .iter()
        .take(5)
        .enumerate()
        .map(|(i, dest)| {
            ResponseOption::with_description(
                &format!("{}. {} ({})", i + 1, dest.name, dest.region),
                &format!("dest_{}", i + 1),
                &format!("{}...", truncate_graphemes(&dest.description, 50)),
            )
        })
        .collect();
    options.push(ResponseOption::with_description(
        "✏️ 직접 입력하기",
        "custom_destination",
        "원하는 여행지를 직접 말씀해주세요",
    ));
    options
}

pub fn place_options(places: &[Place]) -> Vec<ResponseOption> {
    places
        .iter()
        .take(8)
        .enumerate()
        .map(|(i, place)| {
            let text = format!("{}. {}", i + 1, place.name);
            let value = format!("place_{}", i + 1);
            if place.description.is_empty() {
                ResponseOption::new(&text, &value)
            } else {
                ResponseOption::with_description(
                    &text,
                    &value,
                    &format!("{}...", truncate_graphemes(&place.description, 50)),
                )
            }
        })
        .collect()
}

pub fn action_options() -> Vec<ResponseOption> {
    vec![
        ResponseOption::with_description(
            "📅 캘린더에 등록하기",
            "add_to_calendar",
            "구글 캘린더에 여행 일정 등록",
        ),
        ResponseOption::with_description(
            "💬 카카오톡으로 공유하기",
            "share_kakao",
            "친구들과 여행 계획 공유",
        ),
        ResponseOption::with_description(
            "📋 텍스트로 복사하기",
            "copy_text",
            "텍스트 형태로 계획서 복사",
        ),
        ResponseOption::with_description("✏️ 계획 수정하기", "modify_plan", "여행 계획 일부 수정"),
        ResponseOption::with_description(
            "🔄 새로운 계획 시작",
            "new_plan",
            "처음부터 새로운 여행 계획",
        ),
    ]
}

pub fn share_options() -> Vec<ResponseOption> {
    vec![
        ResponseOption::new("💬 카카오톡", "share_kakao"),
        ResponseOption::new("📋 텍스트 복사", "copy_text"),
        ResponseOption::new("📧 이메일", "share_email"),
        ResponseOption::new("🔙 뒤로 가기", "back_to_actions"),
    ]
}

pub fn calendar_menu_options() -> Vec<ResponseOption> {
    vec![
        ResponseOption::new("📅 일정 등록", "add_calendar"),
        ResponseOption::new("🔍 일정 조회", "view_calendar"),
        ResponseOption::new("✏️ 일정 수정", "edit_calendar"),
        ResponseOption::new("🔙 뒤로 가기", "back_to_actions"),
    ]
}

pub fn modification_options() -> Vec<ResponseOption> {
    vec![
        ResponseOption::new("🗺️ 여행지 변경", "change_destination"),
        ResponseOption::new("🎨 여행 스타일 변경", "change_style"),
        ResponseOption::new("⏰ 기간 변경", "change_duration"),
        ResponseOption::new("💰 예산 변경", "change_budget"),
        ResponseOption::new("➕ 장소 추가", "add_place"),
        ResponseOption::new("➖ 장소 제거", "remove_place"),
        ResponseOption::new("🔄 전체 다시 시작", "restart_all"),
    ]
}

pub fn calendar_retry_options() -> Vec<ResponseOption> {
    vec![
        ResponseOption::new("🔄 다시 시도", "retry_calendar"),
        ResponseOption::new("🏠 메인으로 돌아가기", "back_to_main"),
    ]
}

pub fn share_retry_options() -> Vec<ResponseOption> {
    vec![
        ResponseOption::new("🔄 다시 인증하기", "retry_kakao_auth"),
        ResponseOption::new("📋 텍스트로 복사", "copy_text"),
        ResponseOption::new("🔙 뒤로 가기", "back_to_actions"),
    ]
}

pub fn auth_retry_options() -> Vec<ResponseOption> {
    vec![
        ResponseOption::new("🔄 다시 인증", "share_kakao"),
        ResponseOption::new("🔙 뒤로 가기", "back_to_actions"),
    ]
}

pub fn auth_pending_options() -> Vec<ResponseOption> {
    vec![
        ResponseOption::new("🔙 다른 공유 방법", "share_menu"),
        ResponseOption::new("🏠 뒤로 가기", "back_to_actions"),
    ]
}

pub fn resend_options() -> Vec<ResponseOption> {
    vec![
        ResponseOption::new("🔄 다시 전송", "share_kakao"),
        ResponseOption::new("🔙 뒤로 가기", "back_to_actions"),
    ]
}

pub fn retry_planning_options() -> Vec<ResponseOption> {
    vec![ResponseOption::new("🔄 다시 시도", "retry_planning")]
}

pub fn back_to_actions_options() -> Vec<ResponseOption> {
    vec![ResponseOption::new("🔙 뒤로 가기", "back_to_actions")]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn style_menu_covers_all_six_styles() {
        let options = style_options();
        assert_eq!(options.len(), 6);
        assert_eq!(options[0].value, "culture");
        assert_eq!(options[0].text, "🏛️ 문화/역사 탐방");
        assert_eq!(options[5].value, "photo");
    }

    #[test]
    fn date_options_end_with_custom_pick() {
        // 2026-08-19 is a Wednesday: 오늘, 내일, 금요일, 토요일 then the relative picks.
        let today = NaiveDate::from_ymd_opt(2026, 8, 19).unwrap();
        let options = date_options(today);
        assert_eq!(options.len(), 7);
        assert_eq!(options[0].text, "오늘 (08/19)");
        assert_eq!(options[0].value, "2026-08-19");
        assert_eq!(options[2].text, "금요일 (08/21)");
        assert_eq!(options[4].value, "next_weekend");
        assert_eq!(options[4].text, "다음 주말 (08/29)");
        assert_eq!(options.last().unwrap().value, "custom_date");
    }

    #[test]
    fn date_options_on_sunday_offer_only_today() {
        let sunday = NaiveDate::from_ymd_opt(2026, 8, 23).unwrap();
        let options = date_options(sunday);
        assert_eq!(options[0].text, "오늘 (08/23)");
        // on Sunday the current-week block collapses to a single pick
        assert_eq!(options[1].value, "next_weekend");
        assert_eq!(options[1].text, "다음 주말 (08/29)");
    }

    #[test]
    fn destination_options_index_from_one() {
        let dests = vec![Destination {
            name: "제주도".to_string(),
            region: "제주특별자치도".to_string(),
            kind: "island".to_string(),
            description: "한라산과 아름다운 해변".to_string(),
            popularity_score: 9.5,
            source_url: None,
        }];
        let options = destination_options(&dests);
        assert_eq!(options.len(), 2);
        assert_eq!(options[0].value, "dest_1");
        assert_eq!(options[0].text, "1. 제주도 (제주특별자치도)");
        assert_eq!(options[1].value, "custom_destination");
    }
}
