use base64::engine::general_purpose::URL_SAFE;
use base64::Engine as _;
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use unicode_segmentation::UnicodeSegmentation;

use crate::catalog::is_fixed_category;
use crate::models::{PlanStatistics, TravelPlan};

pub const SHARE_BASE_URL: &str = "https://voyage.app";

/// Fixed text renderings of a finished plan, selectable by wire token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlanTemplate {
    Simple,
    #[default]
    Detailed,
    Timeline,
}

impl PlanTemplate {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "simple" => Some(Self::Simple),
            "detailed" => Some(Self::Detailed),
            "timeline" => Some(Self::Timeline),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Detailed => "detailed",
            Self::Timeline => "timeline",
        }
    }
}

/// First `max` grapheme clusters of `input`. Byte truncation would split
/// Hangul syllables and emoji, so counting is done on clusters.
pub fn truncate_graphemes(input: &str, max: usize) -> String {
    input.graphemes(true).take(max).collect()
}

/// KRW amount with thousands separators, e.g. `150000` -> `"150,000"`.
pub fn krw(amount: u32) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Short Korean summary shown right after plan generation.
pub fn plan_summary(plan: &TravelPlan) -> String {
    let mut summary = format!("📍 **{}** ", plan.destination);
    if let Some(duration) = &plan.user_preferences.duration {
        summary.push_str(&duration.name);
        summary.push('\n');
    }
    if let Some(date) = &plan.user_preferences.departure_date {
        summary.push_str(&format!("📅 **출발일**: {date}\n"));
    }
    if plan.total_budget > 0 {
        summary.push_str(&format!("💰 **예상 비용**: {}원\n", krw(plan.total_budget)));
    }
    if !plan.schedule.is_empty() {
        summary.push_str(&format!("\n**주요 일정** ({}일):\n", plan.schedule.len()));
        for (i, day) in plan.schedule.iter().take(3).enumerate() {
            summary.push_str(&format!("• {}일차: {}개 활동 예정\n", i + 1, day.events.len()));
        }
    }
    summary.trim_end().to_string()
}

pub fn format_as_text(plan: &TravelPlan, template: PlanTemplate) -> String {
    match template {
        PlanTemplate::Simple => simple_template(plan),
        PlanTemplate::Detailed => detailed_template(plan),
        PlanTemplate::Timeline => timeline_template(plan),
    }
}

fn simple_template(plan: &TravelPlan) -> String {
    let mut lines = vec![
        format!("🧳 {}", plan.title),
        format!("📍 {}", plan.destination),
        format!(
            "📅 {}",
            plan.user_preferences
                .departure_date
                .as_deref()
                .unwrap_or("날짜 미정")
        ),
        format!("⏰ {}일 여행", plan.schedule.len()),
        String::new(),
    ];

    if plan.total_budget > 0 {
        lines.push(format!("💰 예상 비용: {}원", krw(plan.total_budget)));
        lines.push(String::new());
    }

    lines.push("📋 주요 일정:".to_string());
    for (i, day) in plan.schedule.iter().enumerate() {
        let highlights: Vec<&str> = day
            .events
            .iter()
            .filter(|e| !is_fixed_category(&e.category))
            .take(2)
            .map(|e| e.activity.as_str())
            .collect();
        if !highlights.is_empty() {
            lines.push(format!("• {}일차: {}", i + 1, highlights.join(", ")));
        }
    }

    lines.push(String::new());
    lines.push("✨ AI 여행 플래너로 생성된 계획입니다!".to_string());
    lines.join("\n")
}

fn detailed_template(plan: &TravelPlan) -> String {
    let rule = "=".repeat(40);
    let mut lines = vec![
        rule.clone(),
        format!("🧳 {}", plan.title),
        rule.clone(),
        String::new(),
        format!("📍 목적지: {}", plan.destination),
        format!(
            "📅 출발일: {}",
            plan.user_preferences
                .departure_date
                .as_deref()
                .unwrap_or("날짜 미정")
        ),
        format!("⏰ 기간: {}일", plan.schedule.len()),
        format!(
            "🎨 스타일: {}",
            plan.user_preferences
                .travel_style
                .map(|s| s.label())
                .unwrap_or("일반 관광")
        ),
        format!(
            "👥 동행: {}",
            plan.user_preferences
                .companion_type
                .map(|c| c.label())
                .unwrap_or("미정")
        ),
        String::new(),
    ];

    if plan.total_budget > 0 {
        lines.push(format!("💰 총 예산: {}원", krw(plan.total_budget)));
        let days = plan.schedule.len().max(1) as u32;
        lines.push(format!("💰 일평균: {}원", krw(plan.total_budget / days)));
        lines.push(String::new());
    }

    lines.push("📅 상세 일정:".to_string());
    lines.push("-".repeat(40));

    for day in &plan.schedule {
        lines.push(String::new());
        lines.push(format!("📆 {}일차 ({})", day.day_number, day.date));
        lines.push("-".repeat(20));

        for event in &day.events {
            let cost_text = if event.estimated_cost > 0 {
                format!(" (₩{})", krw(event.estimated_cost))
            } else {
                String::new()
            };
            lines.push(format!("{} | {}{}", event.time, event.activity, cost_text));
            lines.push(format!("     📍 {}", event.location));
            if let Some(notes) = &event.notes {
                lines.push(format!("     📝 {notes}"));
            }
            lines.push(String::new());
        }

        if day.total_cost > 0 {
            lines.push(format!("💰 일일 총 비용: {}원", krw(day.total_cost)));
            lines.push(String::new());
        }
    }

    lines.push(rule.clone());
    lines.push("✨ AI 여행 플래너로 생성된 계획".to_string());
    lines.push(format!(
        "🕐 생성 시간: {}",
        plan.created_at.format("%Y-%m-%d %H:%M")
    ));
    lines.push(rule);
    lines.join("\n")
}

fn timeline_template(plan: &TravelPlan) -> String {
    let mut lines = vec![
        format!("🧳 {} - 타임라인", plan.title),
        "=".repeat(50),
        String::new(),
    ];

    for day in &plan.schedule {
        lines.push(String::new());
        lines.push(format!("📅 {}일차 - {}", day.day_number, day.date));
        lines.push("─".repeat(30));
        lines.push(String::new());

        for event in &day.events {
            let emoji = category_emoji(&event.category);
            lines.push(format!("{} {} {}", event.time, emoji, event.activity));
            lines.push(format!("      📍 {}", event.location));
            if event.estimated_cost > 0 {
                lines.push(format!("      💰 {}원", krw(event.estimated_cost)));
            }
            lines.push(String::new());
        }
    }

    lines.join("\n")
}

pub fn category_emoji(category: &str) -> &'static str {
    match category {
        "이동" => "🚗",
        "숙박" => "🏨",
        "식사" => "🍽️",
        "관광" => "🎯",
        "문화/역사" => "🏛️",
        "자연/관광" => "🌿",
        "액티비티" => "🎡",
        "쇼핑" => "🛍️",
        "카페/감성" => "☕",
        _ => "📍",
    }
}

/// RFC 5545 calendar export. Event times are local KST and are emitted as UTC
/// by shifting back nine hours; an all-day event spanning the whole trip leads
/// the stream. Output is byte-for-byte deterministic for a given plan.
pub fn export_ics(plan: &TravelPlan) -> String {
    let mut lines = vec![
        "BEGIN:VCALENDAR".to_string(),
        "VERSION:2.0".to_string(),
        "PRODID:-//Voyage//Travel Schedule//KO".to_string(),
        "CALSCALE:GREGORIAN".to_string(),
        "METHOD:PUBLISH".to_string(),
    ];

    if let (Some(first), Some(last)) = (plan.schedule.first(), plan.schedule.last()) {
        if let (Ok(start), Ok(end)) = (
            NaiveDate::parse_from_str(&first.date, "%Y-%m-%d"),
            NaiveDate::parse_from_str(&last.date, "%Y-%m-%d"),
        ) {
            lines.extend([
                "BEGIN:VEVENT".to_string(),
                format!("UID:{}-summary@voyage.app", plan.id),
                format!("DTSTART;VALUE=DATE:{}", start.format("%Y%m%d")),
                format!(
                    "DTEND;VALUE=DATE:{}",
                    (end + Duration::days(1)).format("%Y%m%d")
                ),
                format!("SUMMARY:🧳 {}", plan.title),
                format!("DESCRIPTION:{} 여행 ({}일)", plan.destination, plan.schedule.len()),
                "TRANSP:TRANSPARENT".to_string(),
                "END:VEVENT".to_string(),
            ]);
        }
    }

    for day in &plan.schedule {
        for event in &day.events {
            let start = match combine_date_time(&day.date, &event.time) {
                Some(dt) => dt,
                None => continue,
            };
            let end = start + Duration::minutes(event.duration_minutes as i64);
            // KST to UTC
            let start_utc = start - Duration::hours(9);
            let end_utc = end - Duration::hours(9);

            lines.extend([
                "BEGIN:VEVENT".to_string(),
                format!(
                    "UID:{}-{}-{}@voyage.app",
                    plan.id,
                    day.day_number,
                    event.time.replace(':', "")
                ),
                format!("DTSTART:{}", start_utc.format("%Y%m%dT%H%M%SZ")),
                format!("DTEND:{}", end_utc.format("%Y%m%dT%H%M%SZ")),
                format!("SUMMARY:{}", event.activity),
                format!("LOCATION:{}", event.location),
                format!("DESCRIPTION:{}", event.notes.as_deref().unwrap_or("")),
                format!("CATEGORIES:{}", event.category),
                "STATUS:CONFIRMED".to_string(),
                "TRANSP:OPAQUE".to_string(),
                "END:VEVENT".to_string(),
            ]);
        }
    }

    lines.push("END:VCALENDAR".to_string());
    let mut out = lines.join("\r\n");
    out.push_str("\r\n");
    out
}

fn combine_date_time(date: &str, time: &str) -> Option<NaiveDateTime> {
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    let time = NaiveTime::parse_from_str(time, "%H:%M").ok()?;
    Some(NaiveDateTime::new(date, time))
}

/// Opaque share URL; the plan id travels URL-safe base64 encoded.
pub fn share_link(plan: &TravelPlan) -> String {
    let share_id = URL_SAFE.encode(plan.id.as_bytes());
    format!("{SHARE_BASE_URL}/shared/{share_id}")
}

pub fn plan_statistics(plan: &TravelPlan) -> PlanStatistics {
    let mut events_by_category: Vec<(String, u32)> = Vec::new();
    for day in &plan.schedule {
        for event in &day.events {
            match events_by_category
                .iter_mut()
                .find(|(category, _)| *category == event.category)
            {
                Some((_, count)) => *count += 1,
                None => events_by_category.push((event.category.clone(), 1)),
            }
        }
    }

    let total_days = plan.schedule.len() as u32;
    PlanStatistics {
        total_days,
        total_events: plan.schedule.iter().map(|d| d.events.len() as u32).sum(),
        total_budget: plan.total_budget,
        average_daily_budget: plan.total_budget / total_days.max(1),
        events_by_category,
        daily_budgets: plan.schedule.iter().map(|d| d.total_cost).collect(),
    }
}
