use crate::models::{BudgetTier, TravelStyle};

/// Daily spending profile for one budget tier, in KRW.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetCosts {
    pub daily_total: u32,
    pub meal: u32,
    pub activity: u32,
}

pub fn budget_costs(tier: BudgetTier) -> BudgetCosts {
    match tier {
        BudgetTier::Budget => BudgetCosts {
            daily_total: 50_000,
            meal: 15_000,
            activity: 20_000,
        },
        BudgetTier::Moderate => BudgetCosts {
            daily_total: 100_000,
            meal: 25_000,
            activity: 40_000,
        },
        BudgetTier::Comfortable => BudgetCosts {
            daily_total: 150_000,
            meal: 40_000,
            activity: 60_000,
        },
        BudgetTier::Luxury => BudgetCosts {
            daily_total: 250_000,
            meal: 60_000,
            activity: 100_000,
        },
        BudgetTier::Unlimited => BudgetCosts {
            daily_total: 300_000,
            meal: 80_000,
            activity: 120_000,
        },
    }
}

pub fn category_duration_minutes(category: &str) -> u32 {
    match category {
        "문화/역사" => 120,
        "자연/관광" => 180,
        "액티비티" => 240,
        "쇼핑" => 120,
        "카페/감성" => 90,
        "맛집" => 90,
        "관광지" => 150,
        _ => 120,
    }
}

pub fn category_cost_multiplier(category: &str) -> f64 {
    match category {
        "문화/역사" => 0.5,
        "자연/관광" => 0.3,
        "액티비티" => 1.5,
        "쇼핑" => 1.2,
        "카페/감성" => 0.4,
        "맛집" => 0.6,
        _ => 0.6,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeSlot {
    Morning,
    Afternoon,
    Evening,
}

pub fn time_slot_categories(slot: TimeSlot) -> &'static [&'static str] {
    match slot {
        TimeSlot::Morning => &["문화/역사", "자연/관광", "관광지"],
        TimeSlot::Afternoon => &["자연/관광", "액티비티", "쇼핑", "관광지"],
        TimeSlot::Evening => &["카페/감성", "쇼핑", "관광지"],
    }
}

pub fn style_categories(style: TravelStyle) -> &'static [&'static str] {
    match style {
        TravelStyle::Culture => &["문화/역사", "관광지"],
        TravelStyle::Nature => &["자연/관광", "관광지"],
        TravelStyle::Food => &["맛집", "관광지"],
        TravelStyle::Shopping => &["쇼핑", "관광지"],
        TravelStyle::Activity => &["액티비티", "관광지"],
        TravelStyle::Photo => &["카페/감성", "자연/관광", "관광지"],
    }
}

pub fn default_activity_name(style: Option<TravelStyle>, destination: &str) -> String {
    match style {
        Some(TravelStyle::Culture) => format!("{destination} 문화유적 탐방"),
        Some(TravelStyle::Nature) => format!("{destination} 자연경관 감상"),
        Some(TravelStyle::Food) => format!("{destination} 현지 맛집 탐방"),
        Some(TravelStyle::Shopping) => format!("{destination} 쇼핑 및 시장 구경"),
        Some(TravelStyle::Activity) => format!("{destination} 체험 활동"),
        Some(TravelStyle::Photo) => format!("{destination} 포토스팟 투어"),
        None => format!("{destination} 관광"),
    }
}

/// Event categories that keep their slot during route optimization and are
/// skipped when summarizing a day's highlights.
pub const FIXED_EVENT_CATEGORIES: [&str; 3] = ["식사", "이동", "숙박"];

pub fn is_fixed_category(category: &str) -> bool {
    FIXED_EVENT_CATEGORIES.contains(&category)
}

/// Domestic destinations recognized in free text, scanned in order so that
/// longer names win over their aliases (제주도 before 제주).
pub const KOREA_DESTINATIONS: [&str; 20] = [
    "제주도", "제주", "부산", "경주", "강릉", "여수", "전주", "안동", "춘천", "통영",
    "담양", "서울", "인천", "대구", "광주", "대전", "속초", "포항", "목포", "순천",
];

pub fn match_destination(text: &str) -> Option<&'static str> {
    for name in KOREA_DESTINATIONS {
        if text.contains(name) {
            return Some(if name == "제주" { "제주도" } else { name });
        }
    }
    None
}

/// Neighborhood keywords used to cluster flexible events by rough proximity.
pub const REGION_KEYWORDS: [&str; 10] = [
    "해운대", "광안리", "중구", "서구", "동구", "남구", "북구", "중심가", "구시가지", "신도시",
];

pub fn extract_location_key(location: &str) -> String {
    for keyword in REGION_KEYWORDS {
        if location.contains(keyword) {
            return keyword.to_string();
        }
    }
    location
        .split_whitespace()
        .next()
        .unwrap_or(location)
        .to_string()
}
