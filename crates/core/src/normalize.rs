use chrono::{Datelike, Duration, NaiveDate, Weekday};

use crate::catalog;
use crate::intent::is_iso_date_input;
use crate::models::{
    BudgetTier, CompanionType, SlotUpdate, TravelSession, TravelStyle, TripDuration,
};

/// Menu and navigation tokens that bypass intent classification entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlToken {
    ShareKakao,
    ShareMenu,
    CopyText,
    ShareEmail,
    BackToActions,
    AddToCalendar,
    ViewCalendar,
    EditCalendar,
    ModifyPlan,
    NewPlan,
    RetryPlanning,
    ChangeDestination,
    ChangeStyle,
    ChangeDuration,
    ChangeBudget,
    AddPlace,
    RemovePlace,
    CustomDestination,
}

impl ControlToken {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "share_kakao" | "retry_kakao_auth" => Some(Self::ShareKakao),
            "share_menu" => Some(Self::ShareMenu),
            "copy_text" => Some(Self::CopyText),
            "share_email" => Some(Self::ShareEmail),
            "back_to_actions" | "back_to_main" | "back" => Some(Self::BackToActions),
            "add_to_calendar" | "add_calendar" | "retry_calendar" => Some(Self::AddToCalendar),
            "view_calendar" => Some(Self::ViewCalendar),
            "edit_calendar" => Some(Self::EditCalendar),
            "modify_plan" => Some(Self::ModifyPlan),
            "new_plan" | "restart_all" => Some(Self::NewPlan),
            "retry_planning" => Some(Self::RetryPlanning),
            "change_destination" => Some(Self::ChangeDestination),
            "change_style" => Some(Self::ChangeStyle),
            "change_duration" => Some(Self::ChangeDuration),
            "change_budget" => Some(Self::ChangeBudget),
            "add_place" => Some(Self::AddPlace),
            "remove_place" => Some(Self::RemovePlace),
            "custom_destination" => Some(Self::CustomDestination),
            _ => None,
        }
    }
}

/// What the normalizer decided about one raw utterance.
///
/// `Slot` carries both the typed write and the canonical user-voice sentence
/// that replaces the raw input for classification and history. `Warning` and
/// `Prompt` short-circuit the turn without touching state.
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizeOutcome {
    Slot { update: SlotUpdate, ack: String },
    AuthCode { code: String, ack: String },
    Control(ControlToken),
    Warning(String),
    Prompt(String),
    PassThrough,
}

const STYLE_KEYWORDS: [(&str, TravelStyle); 25] = [
    ("문화", TravelStyle::Culture),
    ("역사", TravelStyle::Culture),
    ("박물관", TravelStyle::Culture),
    ("전통", TravelStyle::Culture),
    ("자연", TravelStyle::Nature),
    ("힐링", TravelStyle::Nature),
    ("바다", TravelStyle::Nature),
    ("산", TravelStyle::Nature),
    ("공원", TravelStyle::Nature),
    ("맛집", TravelStyle::Food),
    ("음식", TravelStyle::Food),
    ("식도락", TravelStyle::Food),
    ("미식", TravelStyle::Food),
    ("쇼핑", TravelStyle::Shopping),
    ("구경", TravelStyle::Shopping),
    ("시장", TravelStyle::Shopping),
    ("체험", TravelStyle::Activity),
    ("액티비티", TravelStyle::Activity),
    ("모험", TravelStyle::Activity),
    ("놀이", TravelStyle::Activity),
    ("사진", TravelStyle::Photo),
    ("감성", TravelStyle::Photo),
    ("인스타", TravelStyle::Photo),
    ("예쁜", TravelStyle::Photo),
    ("카페", TravelStyle::Photo),
];

const DURATION_KEYWORDS: [(&str, &str, u32, u32); 7] = [
    ("당일", "당일치기", 1, 0),
    ("당일치기", "당일치기", 1, 0),
    ("1박", "1박 2일", 2, 1),
    ("2박", "2박 3일", 3, 2),
    ("3박", "3박 4일", 4, 3),
    ("4박", "4박 5일", 5, 4),
    ("일주일", "일주일 이상", 7, 6),
];

const BUDGET_KEYWORDS: [(&str, BudgetTier); 13] = [
    ("가성비", BudgetTier::Budget),
    ("저렴", BudgetTier::Budget),
    ("알뜰", BudgetTier::Budget),
    ("적당", BudgetTier::Moderate),
    ("보통", BudgetTier::Moderate),
    ("중간", BudgetTier::Moderate),
    ("여유", BudgetTier::Comfortable),
    ("넉넉", BudgetTier::Comfortable),
    ("럭셔리", BudgetTier::Luxury),
    ("고급", BudgetTier::Luxury),
    ("비싸", BudgetTier::Luxury),
    ("무관", BudgetTier::Unlimited),
    ("상관없", BudgetTier::Unlimited),
];

const COMPANION_KEYWORDS: [(&str, CompanionType); 19] = [
    ("혼자", CompanionType::Solo),
    ("혼행", CompanionType::Solo),
    ("솔로", CompanionType::Solo),
    ("연인", CompanionType::Couple),
    ("커플", CompanionType::Couple),
    ("애인", CompanionType::Couple),
    ("남친", CompanionType::Couple),
    ("여친", CompanionType::Couple),
    ("가족", CompanionType::Family),
    ("부모", CompanionType::Family),
    ("아이", CompanionType::Family),
    ("아기", CompanionType::Family),
    ("친구", CompanionType::Friends),
    ("동료", CompanionType::Friends),
    ("친구들", CompanionType::Friends),
    ("단체", CompanionType::Group),
    ("회사", CompanionType::Group),
    ("동호회", CompanionType::Group),
    ("모임", CompanionType::Group),
];

/// Resolves one raw utterance against the session: auth codes, control
/// tokens, dates, free-text slot mentions, then indexed and exact option
/// tokens, in that priority order. Anything unrecognized passes through to
/// the classifier untouched.
pub fn normalize(raw: &str, session: &TravelSession, today: NaiveDate) -> NormalizeOutcome {
    let input = raw.trim();

    if let Some(code) = input
        .strip_prefix("인증코드:")
        .or_else(|| strip_prefix_ignore_case(input, "authcode:"))
    {
        let code = code.trim().to_string();
        let ack = format!("카카오톡 인증 완료를 진행합니다: {code}");
        return NormalizeOutcome::AuthCode { code, ack };
    }

    if let Some(token) = ControlToken::parse(input) {
        return NormalizeOutcome::Control(token);
    }

    if is_iso_date_input(input) {
        return normalize_iso_date(input, today);
    }

    match input {
        "this_weekend" => {
            let weekend = upcoming_saturday(today);
            return date_slot(
                weekend,
                format!(
                    "이번 주말({})에 출발하는 여행으로 계획하겠습니다!",
                    weekend.format("%m월 %d일")
                ),
            );
        }
        "next_weekend" => {
            let weekend = saturday_after_next(today);
            return date_slot(
                weekend,
                format!(
                    "다음 주말({})에 출발하는 여행으로 계획하겠습니다!",
                    weekend.format("%m월 %d일")
                ),
            );
        }
        "next_month" => {
            let date = today + Duration::days(30);
            return date_slot(
                date,
                format!(
                    "다음 달({})에 출발하는 여행으로 계획하겠습니다!",
                    date.format("%m월 %d일")
                ),
            );
        }
        "custom_date" => {
            return NormalizeOutcome::Prompt("날짜를 직접 입력해주세요 (YYYY-MM-DD 형태)".to_string());
        }
        _ => {}
    }

    if let Some(name) = catalog::match_destination(input) {
        return NormalizeOutcome::Slot {
            update: SlotUpdate::Destination {
                name: name.to_string(),
            },
            ack: format!("{name} 여행을 계획하고 싶어요"),
        };
    }

    let has_style_context = input.contains("스타일") || input.contains("여행");
    if has_style_context {
        for (keyword, style) in STYLE_KEYWORDS {
            if input.contains(keyword) {
                return NormalizeOutcome::Slot {
                    update: SlotUpdate::TravelStyle { style },
                    ack: format!("{} 스타일로 여행하고 싶어요", style.label()),
                };
            }
        }
    }

    for (keyword, name, days, nights) in DURATION_KEYWORDS {
        if input.contains(keyword) {
            return NormalizeOutcome::Slot {
                update: SlotUpdate::Duration {
                    duration: TripDuration::new(name, days, nights),
                },
                ack: format!("{name} 여행을 계획하고 싶어요"),
            };
        }
    }

    let has_budget_context =
        input.contains("예산") || input.contains("비용") || input.contains("돈");
    if has_budget_context {
        for (keyword, tier) in BUDGET_KEYWORDS {
            if input.contains(keyword) {
                return NormalizeOutcome::Slot {
                    update: SlotUpdate::Budget { tier },
                    ack: format!("{} 예산으로 여행하고 싶어요", tier.spoken_label()),
                };
            }
        }
    }

    // "랑" also covers the "이랑" form
    let has_companion_context = input.contains("함께")
        || input.contains("와")
        || input.contains("과")
        || input.contains("랑");
    if has_companion_context {
        for (keyword, companion) in COMPANION_KEYWORDS {
            if input.contains(keyword) {
                return NormalizeOutcome::Slot {
                    update: SlotUpdate::CompanionType { companion },
                    ack: format!("{} 여행하고 싶어요", companion.spoken_label()),
                };
            }
        }
    }

    if let Some(index) = parse_indexed_token(input, "dest_") {
        if let Some(dest) = session.available_destinations.get(index) {
            return NormalizeOutcome::Slot {
                update: SlotUpdate::Destination {
                    name: dest.name.clone(),
                },
                ack: format!("{} 여행을 계획하고 싶어요", dest.name),
            };
        }
    }

    if let Some(index) = parse_indexed_token(input, "place_") {
        if let Some(details) = &session.destination_details {
            if let Some(place) = details.places.get(index) {
                return NormalizeOutcome::Slot {
                    update: SlotUpdate::SelectedPlace {
                        place: place.clone(),
                    },
                    ack: format!("{}을(를) 여행 일정에 포함하고 싶어요", place.name),
                };
            }
        }
    }

    if let Some(style) = TravelStyle::parse(input) {
        return NormalizeOutcome::Slot {
            update: SlotUpdate::TravelStyle { style },
            ack: format!("{} 스타일로 여행하고 싶어요", style.label()),
        };
    }

    if let Some(duration) = TripDuration::from_token(input) {
        let ack = format!("{} 여행을 계획하고 싶어요", duration.name);
        return NormalizeOutcome::Slot {
            update: SlotUpdate::Duration { duration },
            ack,
        };
    }

    if let Some(tier) = BudgetTier::parse(input) {
        return NormalizeOutcome::Slot {
            update: SlotUpdate::Budget { tier },
            ack: format!("{} 예산으로 여행하고 싶어요", tier.spoken_label()),
        };
    }

    if let Some(companion) = CompanionType::parse(input) {
        return NormalizeOutcome::Slot {
            update: SlotUpdate::CompanionType { companion },
            ack: format!("{} 여행하고 싶어요", companion.spoken_label()),
        };
    }

    NormalizeOutcome::PassThrough
}

fn normalize_iso_date(input: &str, today: NaiveDate) -> NormalizeOutcome {
    let parsed = match NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        Ok(date) => date,
        Err(_) => {
            return NormalizeOutcome::Warning(format!(
                "❌ '{input}'는 올바른 날짜 형식이 아닙니다. YYYY-MM-DD 형태로 입력해주세요. (예: 2025-06-10)"
            ));
        }
    };

    if parsed < today {
        return NormalizeOutcome::Warning(format!(
            "⚠️ {input}는 과거 날짜입니다. 오늘 이후의 날짜를 입력해주세요."
        ));
    }

    let one_year_later = today
        .with_year(today.year() + 1)
        .unwrap_or(today + Duration::days(365));
    if parsed > one_year_later {
        return NormalizeOutcome::Warning(format!(
            "⚠️ {input}는 너무 먼 미래입니다. 1년 이내의 날짜를 입력해주세요."
        ));
    }

    NormalizeOutcome::Slot {
        update: SlotUpdate::DepartureDate {
            date: input.to_string(),
        },
        ack: format!(
            "✅ {} ({})에 출발하는 여행으로 계획하겠습니다!",
            parsed.format("%Y년 %m월 %d일"),
            short_korean_weekday(parsed.weekday())
        ),
    }
}

fn date_slot(date: NaiveDate, ack: String) -> NormalizeOutcome {
    NormalizeOutcome::Slot {
        update: SlotUpdate::DepartureDate {
            date: date.format("%Y-%m-%d").to_string(),
        },
        ack,
    }
}

/// Saturday of the current week; today when already Saturday, next week's
/// when today is Sunday.
pub fn upcoming_saturday(today: NaiveDate) -> NaiveDate {
    match today.weekday() {
        Weekday::Sun => today + Duration::days(6),
        Weekday::Sat => today,
        _ => today + Duration::days(5 - today.weekday().num_days_from_monday() as i64),
    }
}

pub fn saturday_after_next(today: NaiveDate) -> NaiveDate {
    match today.weekday() {
        Weekday::Sun => today + Duration::days(13),
        Weekday::Sat => today + Duration::days(7),
        _ => today + Duration::days(5 - today.weekday().num_days_from_monday() as i64 + 7),
    }
}

fn short_korean_weekday(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "월",
        Weekday::Tue => "화",
        Weekday::Wed => "수",
        Weekday::Thu => "목",
        Weekday::Fri => "금",
        Weekday::Sat => "토",
        Weekday::Sun => "일",
    }
}

fn parse_indexed_token(input: &str, prefix: &str) -> Option<usize> {
    let rest = input.strip_prefix(prefix)?;
    let index: usize = rest.parse().ok()?;
    index.checked_sub(1)
}

fn strip_prefix_ignore_case<'a>(input: &'a str, prefix: &str) -> Option<&'a str> {
    if input
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
    {
        Some(&input[prefix.len()..])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Destination, DestinationDetails, Place};

    fn session() -> TravelSession {
        TravelSession::new("test")
    }

    fn today() -> NaiveDate {
        // a Wednesday
        NaiveDate::from_ymd_opt(2026, 8, 19).unwrap()
    }

    #[test]
    fn gazetteer_hit_normalizes_alias_and_acks() {
        let outcome = normalize("제주 가고 싶어", &session(), today());
        match outcome {
            NormalizeOutcome::Slot { update, ack } => {
                assert_eq!(
                    update,
                    SlotUpdate::Destination {
                        name: "제주도".to_string()
                    }
                );
                assert_eq!(ack, "제주도 여행을 계획하고 싶어요");
            }
            other => panic!("expected slot write, got {other:?}"),
        }
    }

    #[test]
    fn past_date_warns_without_writing() {
        let outcome = normalize("2020-01-01", &session(), today());
        match outcome {
            NormalizeOutcome::Warning(message) => assert!(message.contains("과거 날짜")),
            other => panic!("expected warning, got {other:?}"),
        }
    }

    #[test]
    fn far_future_date_warns() {
        let outcome = normalize("2028-01-01", &session(), today());
        match outcome {
            NormalizeOutcome::Warning(message) => assert!(message.contains("너무 먼 미래")),
            other => panic!("expected warning, got {other:?}"),
        }
    }

    #[test]
    fn malformed_date_warns_about_format() {
        let outcome = normalize("2026-13-40", &session(), today());
        match outcome {
            NormalizeOutcome::Warning(message) => assert!(message.contains("올바른 날짜 형식")),
            other => panic!("expected warning, got {other:?}"),
        }
    }

    #[test]
    fn valid_date_writes_slot_with_weekday_ack() {
        let outcome = normalize("2026-09-12", &session(), today());
        match outcome {
            NormalizeOutcome::Slot { update, ack } => {
                assert_eq!(
                    update,
                    SlotUpdate::DepartureDate {
                        date: "2026-09-12".to_string()
                    }
                );
                // 2026-09-12 is a Saturday
                assert_eq!(ack, "✅ 2026년 09월 12일 (토)에 출발하는 여행으로 계획하겠습니다!");
            }
            other => panic!("expected slot write, got {other:?}"),
        }
    }

    #[test]
    fn weekend_tokens_resolve_to_saturdays() {
        assert_eq!(
            upcoming_saturday(today()),
            NaiveDate::from_ymd_opt(2026, 8, 22).unwrap()
        );
        assert_eq!(
            saturday_after_next(today()),
            NaiveDate::from_ymd_opt(2026, 8, 29).unwrap()
        );
        // Sunday rolls this_weekend over to the following Saturday
        let sunday = NaiveDate::from_ymd_opt(2026, 8, 23).unwrap();
        assert_eq!(
            upcoming_saturday(sunday),
            NaiveDate::from_ymd_opt(2026, 8, 29).unwrap()
        );
    }

    #[test]
    fn style_keyword_needs_context_word() {
        match normalize("박물관 여행 좋아요", &session(), today()) {
            NormalizeOutcome::Slot { update, .. } => assert_eq!(
                update,
                SlotUpdate::TravelStyle {
                    style: TravelStyle::Culture
                }
            ),
            other => panic!("expected slot write, got {other:?}"),
        }
        assert_eq!(
            normalize("박물관", &session(), today()),
            NormalizeOutcome::PassThrough
        );
    }

    #[test]
    fn budget_keyword_needs_money_word() {
        match normalize("가성비 예산이면 좋겠어", &session(), today()) {
            NormalizeOutcome::Slot { update, ack } => {
                assert_eq!(
                    update,
                    SlotUpdate::Budget {
                        tier: BudgetTier::Budget
                    }
                );
                assert_eq!(ack, "가성비 예산으로 여행하고 싶어요");
            }
            other => panic!("expected slot write, got {other:?}"),
        }
        assert_eq!(
            normalize("가성비", &session(), today()),
            NormalizeOutcome::PassThrough
        );
    }

    #[test]
    fn companion_rang_suffix_counts_as_context() {
        match normalize("친구랑 여행 가고 싶어", &session(), today()) {
            NormalizeOutcome::Slot { update, ack } => {
                assert_eq!(
                    update,
                    SlotUpdate::CompanionType {
                        companion: CompanionType::Friends
                    }
                );
                assert_eq!(ack, "친구들과 여행하고 싶어요");
            }
            other => panic!("expected slot write, got {other:?}"),
        }
        match normalize("부모님이랑 같이 갈 거예요", &session(), today()) {
            NormalizeOutcome::Slot { update, .. } => assert_eq!(
                update,
                SlotUpdate::CompanionType {
                    companion: CompanionType::Family
                }
            ),
            other => panic!("expected slot write, got {other:?}"),
        }
    }

    #[test]
    fn dest_index_resolves_against_offered_candidates() {
        let mut s = session();
        s.available_destinations = vec![
            Destination {
                name: "부산".to_string(),
                region: "부산광역시".to_string(),
                kind: "coastal".to_string(),
                description: String::new(),
                popularity_score: 9.0,
                source_url: None,
            },
            Destination {
                name: "경주".to_string(),
                region: "경상북도".to_string(),
                kind: "historical".to_string(),
                description: String::new(),
                popularity_score: 8.5,
                source_url: None,
            },
        ];

        match normalize("dest_2", &s, today()) {
            NormalizeOutcome::Slot { update, .. } => assert_eq!(
                update,
                SlotUpdate::Destination {
                    name: "경주".to_string()
                }
            ),
            other => panic!("expected slot write, got {other:?}"),
        }
        // out of range falls through untouched
        assert_eq!(normalize("dest_9", &s, today()), NormalizeOutcome::PassThrough);
    }

    #[test]
    fn place_index_selects_from_search_details() {
        let mut s = session();
        s.destination_details = Some(DestinationDetails {
            destination: "제주도".to_string(),
            travel_style: "nature".to_string(),
            places: vec![Place::new("한라산", "자연/관광", "한국 최고봉")],
            restaurants: Vec::new(),
            accommodations: Vec::new(),
            activities: Vec::new(),
        });

        match normalize("place_1", &s, today()) {
            NormalizeOutcome::Slot { update, ack } => {
                assert!(matches!(update, SlotUpdate::SelectedPlace { ref place } if place.name == "한라산"));
                assert_eq!(ack, "한라산을(를) 여행 일정에 포함하고 싶어요");
            }
            other => panic!("expected slot write, got {other:?}"),
        }
    }

    #[test]
    fn control_tokens_bypass_slot_matching() {
        assert_eq!(
            normalize("share_kakao", &session(), today()),
            NormalizeOutcome::Control(ControlToken::ShareKakao)
        );
        assert_eq!(
            normalize("back_to_main", &session(), today()),
            NormalizeOutcome::Control(ControlToken::BackToActions)
        );
    }

    #[test]
    fn auth_code_prefix_is_captured() {
        match normalize("인증코드: abc123", &session(), today()) {
            NormalizeOutcome::AuthCode { code, ack } => {
                assert_eq!(code, "abc123");
                assert_eq!(ack, "카카오톡 인증 완료를 진행합니다: abc123");
            }
            other => panic!("expected auth code, got {other:?}"),
        }
    }

    #[test]
    fn exact_duration_token_writes_slot() {
        match normalize("2n3d", &session(), today()) {
            NormalizeOutcome::Slot { update, .. } => match update {
                SlotUpdate::Duration { duration } => {
                    assert_eq!((duration.days, duration.nights), (3, 2))
                }
                other => panic!("expected duration, got {other:?}"),
            },
            other => panic!("expected slot write, got {other:?}"),
        }
    }
}
