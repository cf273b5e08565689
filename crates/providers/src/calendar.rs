use std::collections::HashMap;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use voyage_core::catalog::is_fixed_category;
use voyage_core::models::TravelPlan;

use crate::error::{ProviderError, Result};

const SUMMARY_COLOR_ID: &str = "9";
const DEFAULT_COLOR_ID: &str = "1";

/// One calendar entry derived from a plan. Timed events carry start and end
/// datetimes; the leading overview entry is all-day and spans the whole trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    pub plan_id: String,
    pub summary: String,
    pub description: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub all_day: bool,
    pub color_id: String,
    /// Popup reminder offsets in minutes before the event.
    pub reminder_minutes: Vec<u32>,
}

fn category_color_id(category: &str) -> &'static str {
    match category {
        "이동" => "8",
        "숙박" => "5",
        "식사" => "6",
        "관광" => "1",
        "문화/역사" => "3",
        "자연/관광" => "2",
        "액티비티" => "4",
        "쇼핑" => "7",
        "카페/감성" => "10",
        _ => DEFAULT_COLOR_ID,
    }
}

fn parse_day_date(date: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|err| ProviderError::InvalidResponse(format!("bad schedule date {date:?}: {err}")))
}

fn parse_event_time(time: &str) -> NaiveTime {
    NaiveTime::parse_from_str(time, "%H:%M").unwrap_or_else(|_| {
        NaiveTime::from_hms_opt(9, 0, 0).expect("valid literal time")
    })
}

/// Expands a plan into calendar entries: one all-day trip overview followed
/// by one timed entry per scheduled activity.
pub fn plan_to_events(plan: &TravelPlan) -> Result<Vec<CalendarEvent>> {
    let mut events = Vec::new();

    if let (Some(first), Some(last)) = (plan.schedule.first(), plan.schedule.last()) {
        let start_date = parse_day_date(&first.date)?;
        let end_date = parse_day_date(&last.date)?;

        let mut description = format!("{} 여행 전체 일정\n\n", plan.destination);
        for day in &plan.schedule {
            let highlights: Vec<&str> = day
                .events
                .iter()
                .filter(|e| !is_fixed_category(&e.category))
                .take(2)
                .map(|e| e.activity.as_str())
                .collect();
            if !highlights.is_empty() {
                description.push_str(&format!(
                    "{}일차: {}\n",
                    day.day_number,
                    highlights.join(", ")
                ));
            }
        }

        events.push(CalendarEvent {
            id: format!("{}-summary", plan.id),
            plan_id: plan.id.clone(),
            summary: format!("🧳 {}", plan.title),
            description: description.trim_end().to_string(),
            start: start_date.and_time(NaiveTime::MIN),
            end: (end_date + Duration::days(1)).and_time(NaiveTime::MIN),
            all_day: true,
            color_id: SUMMARY_COLOR_ID.to_string(),
            reminder_minutes: Vec::new(),
        });
    }

    for day in &plan.schedule {
        let date = parse_day_date(&day.date)?;
        for item in &day.events {
            let start = date.and_time(parse_event_time(&item.time));
            let end = start + Duration::minutes(i64::from(item.duration_minutes));

            let mut description = format!(
                "📍 위치: {}\n⏰ 소요시간: {}분\n🎯 카테고리: {}\n💰 예상비용: {}원\n",
                item.location, item.duration_minutes, item.category, item.estimated_cost
            );
            if let Some(notes) = &item.notes {
                description.push_str(&format!("📝 메모: {notes}\n"));
            }
            description.push_str(&format!(
                "\nAI 여행 플래너로 생성된 일정입니다. (계획 ID: {})",
                plan.id
            ));

            events.push(CalendarEvent {
                id: format!("{}-{}-{}", plan.id, day.day_number, item.time.replace(':', "")),
                plan_id: plan.id.clone(),
                summary: format!("🧳 {}", item.activity),
                description,
                start,
                end,
                all_day: false,
                color_id: category_color_id(&item.category).to_string(),
                reminder_minutes: vec![30, 10],
            });
        }
    }

    Ok(events)
}

pub trait CalendarProvider: Send + Sync {
    async fn add_plan(&self, plan: &TravelPlan) -> Result<usize>;
    async fn list_events_for_plan(&self, plan_id: &str) -> Result<Vec<CalendarEvent>>;
    async fn delete_plan(&self, plan_id: &str) -> Result<usize>;
}

/// In-process calendar keyed by plan id.
#[derive(Default)]
pub struct MemoryCalendar {
    events: RwLock<HashMap<String, Vec<CalendarEvent>>>,
}

impl MemoryCalendar {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CalendarProvider for MemoryCalendar {
    async fn add_plan(&self, plan: &TravelPlan) -> Result<usize> {
        let events = plan_to_events(plan)?;
        let count = events.len();
        self.events.write().insert(plan.id.clone(), events);
        Ok(count)
    }

    async fn list_events_for_plan(&self, plan_id: &str) -> Result<Vec<CalendarEvent>> {
        Ok(self
            .events
            .read()
            .get(plan_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn delete_plan(&self, plan_id: &str) -> Result<usize> {
        Ok(self
            .events
            .write()
            .remove(plan_id)
            .map(|evs| evs.len())
            .unwrap_or(0))
    }
}

/// Replaces any previously synced entries for the plan, so repeating the
/// action after an edit never duplicates events.
#[instrument(skip(calendar, plan), fields(plan_id = %plan.id))]
pub async fn sync_plan<C: CalendarProvider>(calendar: &C, plan: &TravelPlan) -> Result<usize> {
    let existing = calendar.list_events_for_plan(&plan.id).await?;
    if !existing.is_empty() {
        calendar.delete_plan(&plan.id).await?;
    }
    calendar.add_plan(plan).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use voyage_core::models::{TripDuration, UserPreferences};
    use voyage_core::synthesize;

    fn sample_plan() -> TravelPlan {
        let preferences = UserPreferences {
            destination: Some("부산".to_string()),
            travel_style: Some(voyage_core::models::TravelStyle::Nature),
            duration: Some(TripDuration::from_token("1n2d").unwrap()),
            departure_date: Some("2026-09-12".to_string()),
            budget: None,
            companion_type: Some(voyage_core::models::CompanionType::Friends),
        };
        let mut rng = StdRng::seed_from_u64(7);
        synthesize(
            &preferences,
            &[],
            &[],
            chrono::NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
            &mut rng,
        )
    }

    #[test]
    fn overview_event_spans_whole_trip() {
        let plan = sample_plan();
        let events = plan_to_events(&plan).unwrap();

        let overview = &events[0];
        assert!(overview.all_day);
        assert_eq!(overview.color_id, "9");
        assert_eq!(overview.summary, format!("🧳 {}", plan.title));
        assert_eq!(
            (overview.end - overview.start).num_days(),
            plan.schedule.len() as i64
        );
        assert!(overview.reminder_minutes.is_empty());
    }

    #[test]
    fn timed_events_carry_reminders_and_category_colors() {
        let plan = sample_plan();
        let events = plan_to_events(&plan).unwrap();

        let timed: Vec<&CalendarEvent> = events.iter().filter(|e| !e.all_day).collect();
        let total: usize = plan.schedule.iter().map(|d| d.events.len()).sum();
        assert_eq!(timed.len(), total);

        for event in &timed {
            assert_eq!(event.reminder_minutes, vec![30, 10]);
            assert!(event.summary.starts_with("🧳 "));
            assert!(event.description.contains(&plan.id));
        }

        let arrival = timed
            .iter()
            .find(|e| e.summary.contains("도착"))
            .expect("arrival event");
        assert_eq!(arrival.color_id, "8");
    }

    #[test]
    fn event_ids_are_stable_per_slot() {
        let plan = sample_plan();
        let first = plan_to_events(&plan).unwrap();
        let second = plan_to_events(&plan).unwrap();
        assert_eq!(first, second);
        assert!(first.iter().any(|e| e.id.ends_with("-1-0900")));
    }

    #[tokio::test]
    async fn repeated_sync_is_idempotent() {
        let calendar = MemoryCalendar::new();
        let plan = sample_plan();

        let added = sync_plan(&calendar, &plan).await.unwrap();
        let again = sync_plan(&calendar, &plan).await.unwrap();
        assert_eq!(added, again);

        let events = calendar.list_events_for_plan(&plan.id).await.unwrap();
        assert_eq!(events.len(), added);
    }

    #[tokio::test]
    async fn delete_reports_removed_count() {
        let calendar = MemoryCalendar::new();
        let plan = sample_plan();
        let added = calendar.add_plan(&plan).await.unwrap();
        assert_eq!(calendar.delete_plan(&plan.id).await.unwrap(), added);
        assert_eq!(calendar.delete_plan(&plan.id).await.unwrap(), 0);
        assert!(calendar
            .list_events_for_plan(&plan.id)
            .await
            .unwrap()
            .is_empty());
    }
}
