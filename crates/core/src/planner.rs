use chrono::{Duration, NaiveDate, Utc};
use rand::prelude::IndexedRandom;
use rand::Rng;
use uuid::Uuid;

use crate::catalog::{
    budget_costs, category_cost_multiplier, category_duration_minutes, default_activity_name,
    extract_location_key, is_fixed_category, style_categories, time_slot_categories, BudgetCosts,
    TimeSlot,
};
use crate::models::{
    BudgetTier, DaySchedule, Place, ScheduleItem, TravelPlan, TravelStyle, UserPreferences,
};

/// Payload for one plan edit. Missing fields make the edit a no-op rather
/// than an error; the caller re-prompts.
#[derive(Debug, Clone, PartialEq)]
pub enum Modification {
    ChangeDestination { destination: String },
    ChangeBudget { tier: BudgetTier },
    AddPlace { place: Place },
    RemovePlace { place_name: String },
}

/// Builds a full itinerary from collected preferences and the places the
/// search surfaced. Place picks within a time slot go through `rng`, so a
/// seeded generator reproduces the same plan.
pub fn synthesize<R: Rng + ?Sized>(
    preferences: &UserPreferences,
    selected_places: &[Place],
    context_places: &[Place],
    today: NaiveDate,
    rng: &mut R,
) -> TravelPlan {
    let destination = preferences.destination.clone().unwrap_or_default();
    let duration_name = preferences
        .duration
        .as_ref()
        .map(|d| d.name.as_str())
        .unwrap_or("여행");
    let title = format!("{destination} {duration_name} 계획");

    let costs = budget_costs(preferences.budget.unwrap_or(BudgetTier::Moderate));
    let days = preferences.duration.as_ref().map(|d| d.days).unwrap_or(2);
    let departure = parse_departure_date(preferences.departure_date.as_deref(), today);

    let available = dedup_places(selected_places, context_places);

    let mut schedule = Vec::with_capacity(days as usize);
    for day_number in 1..=days {
        let date = departure + Duration::days(day_number as i64 - 1);
        let events = daily_events(day_number, days, preferences, &destination, &available, costs, rng);
        let mut day = DaySchedule {
            date: date.format("%Y-%m-%d").to_string(),
            day_number,
            events,
            total_cost: 0,
            travel_time_minutes: 0,
        };
        day.recompute();
        schedule.push(day);
    }

    let mut recommended_places: Vec<Place> = Vec::new();
    for place in selected_places.iter().chain(context_places.iter().take(5)) {
        if !recommended_places.iter().any(|p| p.name == place.name) {
            recommended_places.push(place.clone());
        }
    }

    let now = Utc::now();
    let mut plan = TravelPlan {
        id: Uuid::new_v4().to_string(),
        title,
        destination,
        user_preferences: preferences.clone(),
        schedule,
        recommended_places,
        total_budget: 0,
        created_at: now,
        updated_at: now,
    };
    plan.recompute_totals();
    plan
}

fn daily_events<R: Rng + ?Sized>(
    day_number: u32,
    total_days: u32,
    preferences: &UserPreferences,
    destination: &str,
    available: &[Place],
    costs: BudgetCosts,
    rng: &mut R,
) -> Vec<ScheduleItem> {
    let mut events = Vec::new();

    if day_number == 1 {
        events.push(ScheduleItem {
            time: "09:00".to_string(),
            activity: format!("{destination} 도착"),
            location: format!("{destination} 터미널/역"),
            duration_minutes: 60,
            category: "이동".to_string(),
            estimated_cost: 0,
            notes: Some("여행 시작! 짐을 맡기고 가벼운 마음으로 출발".to_string()),
        });
        events.push(ScheduleItem {
            time: "10:30".to_string(),
            activity: "숙소 체크인 또는 짐 보관".to_string(),
            location: "숙소".to_string(),
            duration_minutes: 30,
            category: "숙박".to_string(),
            estimated_cost: 0,
            notes: Some("체크인 시간이 아니라면 짐만 맡기고 관광 시작".to_string()),
        });
    }

    events.push(activity_event(
        TimeSlot::Morning,
        preferences,
        destination,
        available,
        costs,
        rng,
    ));
    events.push(meal_event("12:00", "점심", destination, available, costs, rng));
    events.push(activity_event(
        TimeSlot::Afternoon,
        preferences,
        destination,
        available,
        costs,
        rng,
    ));

    if day_number < total_days {
        events.push(meal_event("18:00", "저녁", destination, available, costs, rng));
        if matches!(
            preferences.travel_style,
            Some(TravelStyle::Photo) | Some(TravelStyle::Activity)
        ) {
            events.push(activity_event(
                TimeSlot::Evening,
                preferences,
                destination,
                available,
                costs,
                rng,
            ));
        }
    }

    if day_number == total_days {
        events.push(ScheduleItem {
            time: "11:00".to_string(),
            activity: "체크아웃 및 짐 정리".to_string(),
            location: "숙소".to_string(),
            duration_minutes: 60,
            category: "숙박".to_string(),
            estimated_cost: 0,
            notes: Some("마지막 정리를 하고 아쉬운 마음으로 체크아웃".to_string()),
        });
        events.push(ScheduleItem {
            time: "13:00".to_string(),
            activity: "기념품 쇼핑 또는 마지막 관광".to_string(),
            location: format!("{destination} 중심가"),
            duration_minutes: 120,
            category: "쇼핑".to_string(),
            estimated_cost: 30_000,
            notes: Some("여행의 추억을 담은 기념품을 구입하세요".to_string()),
        });
        events.push(ScheduleItem {
            time: "16:00".to_string(),
            activity: format!("{destination} 출발"),
            location: format!("{destination} 터미널/역"),
            duration_minutes: 60,
            category: "이동".to_string(),
            estimated_cost: 0,
            notes: Some("즐거웠던 여행을 마무리하며 집으로".to_string()),
        });
    }

    events
}

fn slot_time(slot: TimeSlot) -> &'static str {
    match slot {
        TimeSlot::Morning => "10:00",
        TimeSlot::Afternoon => "14:00",
        TimeSlot::Evening => "19:00",
    }
}

fn activity_event<R: Rng + ?Sized>(
    slot: TimeSlot,
    preferences: &UserPreferences,
    destination: &str,
    available: &[Place],
    costs: BudgetCosts,
    rng: &mut R,
) -> ScheduleItem {
    if available.is_empty() {
        return default_activity(slot, preferences.travel_style, destination, costs);
    }

    let filtered = filter_by_style_and_time(available, preferences.travel_style, slot);
    let pool = if filtered.is_empty() { available } else { &filtered[..] };
    // pool is never empty here
    let place = pool.choose(rng).expect("non-empty place pool");

    let multiplier = category_cost_multiplier(&place.category);
    ScheduleItem {
        time: slot_time(slot).to_string(),
        activity: format!("{} 관광", place.name),
        location: place.name.clone(),
        duration_minutes: category_duration_minutes(&place.category),
        category: place.category.clone(),
        estimated_cost: (costs.activity as f64 * multiplier) as u32,
        notes: (!place.description.is_empty()).then(|| place.description.clone()),
    }
}

fn default_activity(
    slot: TimeSlot,
    style: Option<TravelStyle>,
    destination: &str,
    costs: BudgetCosts,
) -> ScheduleItem {
    ScheduleItem {
        time: slot_time(slot).to_string(),
        activity: default_activity_name(style, destination),
        location: format!("{destination} 중심가"),
        duration_minutes: 180,
        category: "관광".to_string(),
        estimated_cost: costs.activity,
        notes: Some(format!("{destination}의 매력을 느껴보세요")),
    }
}

fn meal_event<R: Rng + ?Sized>(
    time: &str,
    meal_name: &str,
    destination: &str,
    available: &[Place],
    costs: BudgetCosts,
    rng: &mut R,
) -> ScheduleItem {
    let restaurants: Vec<&Place> = available.iter().filter(|p| p.category == "맛집").collect();

    let (location, notes) = match restaurants.choose(rng) {
        Some(restaurant) => (
            restaurant.name.clone(),
            format!("{} - {destination} 현지 맛집", restaurant.description),
        ),
        None => (
            format!("{destination} 현지 음식점"),
            format!("{destination}의 특색 있는 음식을 맛보세요"),
        ),
    };

    ScheduleItem {
        time: time.to_string(),
        activity: format!("{meal_name} 식사"),
        location,
        duration_minutes: 90,
        category: "식사".to_string(),
        estimated_cost: costs.meal,
        notes: Some(notes),
    }
}

fn filter_by_style_and_time(
    places: &[Place],
    style: Option<TravelStyle>,
    slot: TimeSlot,
) -> Vec<Place> {
    let style_cats = match style {
        Some(style) => style_categories(style),
        None => return places.to_vec(),
    };
    let slot_cats = time_slot_categories(slot);

    let suitable: Vec<&&str> = slot_cats.iter().filter(|c| style_cats.contains(c)).collect();
    if suitable.is_empty() {
        return places.to_vec();
    }

    places
        .iter()
        .filter(|p| suitable.iter().any(|c| **c == p.category))
        .cloned()
        .collect()
}

fn dedup_places(selected: &[Place], context: &[Place]) -> Vec<Place> {
    let mut unique: Vec<Place> = Vec::new();
    for place in selected.iter().chain(context.iter()) {
        if !place.name.is_empty() && !unique.iter().any(|p| p.name == place.name) {
            unique.push(place.clone());
        }
    }
    unique
}

/// Accepts `YYYY-MM-DD`, then `MM/DD` in the current year, else defaults to
/// one week out.
pub fn parse_departure_date(departure_date: Option<&str>, today: NaiveDate) -> NaiveDate {
    let Some(raw) = departure_date else {
        return today + Duration::days(7);
    };
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date;
    }
    if let Ok(date) = NaiveDate::parse_from_str(&format!("{}-{raw}", today.format("%Y")), "%Y-%m/%d")
    {
        return date;
    }
    today + Duration::days(7)
}

/// Regroups each day's flexible events by location keyword, re-sorts by time,
/// then retimes everything sequentially from 09:00 with a 15 minute gap.
/// A keyword heuristic, not a distance minimizer.
pub fn optimize(mut plan: TravelPlan) -> TravelPlan {
    for day in &mut plan.schedule {
        let reordered = regroup_by_proximity(std::mem::take(&mut day.events));
        day.events = retime_events(reordered);
    }
    plan.recompute_totals();
    plan
}

fn regroup_by_proximity(events: Vec<ScheduleItem>) -> Vec<ScheduleItem> {
    let (fixed, flexible): (Vec<_>, Vec<_>) = events
        .into_iter()
        .partition(|e| is_fixed_category(&e.category));

    // cluster flexible events by shared location keyword, groups in
    // encounter order
    let mut groups: Vec<(String, Vec<ScheduleItem>)> = Vec::new();
    for event in flexible {
        let key = extract_location_key(&event.location);
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, group)) => group.push(event),
            None => groups.push((key, vec![event])),
        }
    }

    let mut all: Vec<ScheduleItem> = fixed;
    all.extend(groups.into_iter().flat_map(|(_, group)| group));
    all.sort_by(|a, b| a.time.cmp(&b.time));
    all
}

fn retime_events(events: Vec<ScheduleItem>) -> Vec<ScheduleItem> {
    let mut clock = 9 * 60u32;
    events
        .into_iter()
        .map(|mut event| {
            event.time = format!("{:02}:{:02}", clock / 60, clock % 60);
            clock += event.duration_minutes + 15;
            event
        })
        .collect()
}

pub fn modify(mut plan: TravelPlan, modification: Modification) -> TravelPlan {
    match modification {
        Modification::ChangeDestination { destination } => {
            plan.destination = destination.clone();
            plan.user_preferences.destination = Some(destination.clone());
            let duration_name = plan
                .user_preferences
                .duration
                .as_ref()
                .map(|d| d.name.as_str())
                .unwrap_or("여행");
            plan.title = format!("{destination} {duration_name} 계획");
        }
        Modification::ChangeBudget { tier } => {
            plan.user_preferences.budget = Some(tier);
            let costs = budget_costs(tier);
            for day in &mut plan.schedule {
                for event in &mut day.events {
                    if event.category == "식사" {
                        event.estimated_cost = costs.meal;
                    } else if matches!(
                        event.category.as_str(),
                        "관광" | "액티비티" | "문화/역사"
                    ) {
                        event.estimated_cost = (costs.activity as f64 * 0.6) as u32;
                    }
                }
            }
        }
        Modification::AddPlace { place } => {
            if let Some(first_day) = plan.schedule.first_mut() {
                first_day.events.push(ScheduleItem {
                    time: "15:30".to_string(),
                    activity: format!("{} 방문", place.name),
                    location: place.name.clone(),
                    duration_minutes: 120,
                    category: place.category.clone(),
                    estimated_cost: 20_000,
                    notes: (!place.description.is_empty()).then(|| place.description.clone()),
                });
            }
        }
        Modification::RemovePlace { place_name } => {
            for day in &mut plan.schedule {
                day.events
                    .retain(|e| !e.location.contains(&place_name) && !e.activity.contains(&place_name));
            }
        }
    }
    plan.recompute_totals();
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CompanionType, TripDuration};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn preferences() -> UserPreferences {
        UserPreferences {
            destination: Some("제주도".to_string()),
            travel_style: Some(TravelStyle::Nature),
            duration: Some(TripDuration::from_token("2n3d").unwrap()),
            departure_date: Some("2026-09-12".to_string()),
            budget: Some(BudgetTier::Moderate),
            companion_type: Some(CompanionType::Couple),
        }
    }

    fn places() -> Vec<Place> {
        vec![
            Place::new("한라산", "자연/관광", "한국 최고봉 한라산과 아름다운 자연경관"),
            Place::new("성산일출봉", "자연/관광", "유네스코 세계자연유산"),
            Place::new("흑돼지거리", "맛집", "제주 흑돼지 전문점들이 모인 거리"),
            Place::new("카멜리아힐", "카페/감성", "동양에서 가장 큰 동백 수목원"),
        ]
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 19).unwrap()
    }

    #[test]
    fn plan_spans_duration_days_and_sums_costs() {
        let mut rng = StdRng::seed_from_u64(7);
        let plan = synthesize(&preferences(), &places(), &[], today(), &mut rng);

        assert_eq!(plan.schedule.len(), 3);
        assert_eq!(plan.title, "제주도 2박 3일 계획");
        assert_eq!(plan.schedule[0].date, "2026-09-12");
        assert_eq!(plan.schedule[2].date, "2026-09-14");

        for day in &plan.schedule {
            let expected: u32 = day.events.iter().map(|e| e.estimated_cost).sum();
            assert_eq!(day.total_cost, expected);
            assert_eq!(
                day.travel_time_minutes,
                20 * (day.events.len() as u32 - 1)
            );
        }
        let expected_total: u32 = plan.schedule.iter().map(|d| d.total_cost).sum();
        assert_eq!(plan.total_budget, expected_total);
    }

    #[test]
    fn first_day_arrives_last_day_departs() {
        let mut rng = StdRng::seed_from_u64(7);
        let plan = synthesize(&preferences(), &places(), &[], today(), &mut rng);

        let first = &plan.schedule[0].events;
        assert_eq!(first[0].activity, "제주도 도착");
        assert_eq!(first[0].time, "09:00");
        assert_eq!(first[1].activity, "숙소 체크인 또는 짐 보관");

        let last = &plan.schedule[2].events;
        let departure = last.last().unwrap();
        assert_eq!(departure.activity, "제주도 출발");
        assert_eq!(departure.time, "16:00");
        assert!(last.iter().any(|e| e.category == "쇼핑" && e.estimated_cost == 30_000));
    }

    #[test]
    fn meals_use_tier_meal_cost_and_restaurant_pool() {
        let mut rng = StdRng::seed_from_u64(3);
        let plan = synthesize(&preferences(), &places(), &[], today(), &mut rng);

        for day in &plan.schedule {
            for meal in day.events.iter().filter(|e| e.category == "식사") {
                assert_eq!(meal.estimated_cost, 25_000);
                assert_eq!(meal.location, "흑돼지거리");
            }
        }
    }

    #[test]
    fn empty_candidate_set_synthesizes_default_activity() {
        let mut rng = StdRng::seed_from_u64(1);
        let plan = synthesize(&preferences(), &[], &[], today(), &mut rng);

        let morning = &plan.schedule[1].events[0];
        assert_eq!(morning.activity, "제주도 자연경관 감상");
        assert_eq!(morning.location, "제주도 중심가");
        assert_eq!(morning.category, "관광");
        assert_eq!(morning.estimated_cost, 40_000);
    }

    #[test]
    fn seeded_rng_reproduces_the_same_plan() {
        let plan_a = synthesize(
            &preferences(),
            &places(),
            &[],
            today(),
            &mut StdRng::seed_from_u64(42),
        );
        let plan_b = synthesize(
            &preferences(),
            &places(),
            &[],
            today(),
            &mut StdRng::seed_from_u64(42),
        );
        assert_eq!(plan_a.schedule, plan_b.schedule);
    }

    #[test]
    fn departure_date_accepts_both_formats_and_falls_back() {
        assert_eq!(
            parse_departure_date(Some("2026-10-01"), today()),
            NaiveDate::from_ymd_opt(2026, 10, 1).unwrap()
        );
        assert_eq!(
            parse_departure_date(Some("10/01"), today()),
            NaiveDate::from_ymd_opt(2026, 10, 1).unwrap()
        );
        assert_eq!(parse_departure_date(Some("내일"), today()), today() + Duration::days(7));
        assert_eq!(parse_departure_date(None, today()), today() + Duration::days(7));
    }

    #[test]
    fn optimize_retimes_from_nine_with_gaps() {
        let mut rng = StdRng::seed_from_u64(11);
        let plan = synthesize(&preferences(), &places(), &[], today(), &mut rng);
        let budget_before = plan.total_budget;

        let optimized = optimize(plan);
        assert_eq!(optimized.total_budget, budget_before);

        for day in &optimized.schedule {
            assert_eq!(day.events[0].time, "09:00");
            let mut clock = 9 * 60u32;
            for event in &day.events {
                assert_eq!(event.time, format!("{:02}:{:02}", clock / 60, clock % 60));
                clock += event.duration_minutes + 15;
            }
            // non-decreasing by construction
            let times: Vec<&str> = day.events.iter().map(|e| e.time.as_str()).collect();
            let mut sorted = times.clone();
            sorted.sort();
            assert_eq!(times, sorted);
        }
    }

    #[test]
    fn change_budget_reprices_meals_and_activities() {
        let mut rng = StdRng::seed_from_u64(5);
        let plan = synthesize(&preferences(), &[], &[], today(), &mut rng);

        let plan = modify(plan, Modification::ChangeBudget { tier: BudgetTier::Luxury });
        assert_eq!(plan.user_preferences.budget, Some(BudgetTier::Luxury));
        for day in &plan.schedule {
            for event in &day.events {
                match event.category.as_str() {
                    "식사" => assert_eq!(event.estimated_cost, 60_000),
                    "관광" => assert_eq!(event.estimated_cost, 60_000),
                    _ => {}
                }
            }
        }
        let expected: u32 = plan.schedule.iter().map(|d| d.total_cost).sum();
        assert_eq!(plan.total_budget, expected);
    }

    #[test]
    fn change_destination_rewrites_title_but_not_schedule() {
        let mut rng = StdRng::seed_from_u64(5);
        let plan = synthesize(&preferences(), &places(), &[], today(), &mut rng);
        let events_before = plan.schedule[0].events.clone();

        let plan = modify(
            plan,
            Modification::ChangeDestination {
                destination: "부산".to_string(),
            },
        );
        assert_eq!(plan.destination, "부산");
        assert_eq!(plan.user_preferences.destination.as_deref(), Some("부산"));
        assert_eq!(plan.title, "부산 2박 3일 계획");
        assert_eq!(plan.schedule[0].events, events_before);
    }

    #[test]
    fn add_place_lands_on_first_day_at_fixed_slot() {
        let mut rng = StdRng::seed_from_u64(5);
        let plan = synthesize(&preferences(), &[], &[], today(), &mut rng);
        let budget_before = plan.total_budget;

        let plan = modify(
            plan,
            Modification::AddPlace {
                place: Place::new("우도", "자연/관광", "소가 누운 모양의 섬"),
            },
        );
        let added = plan.schedule[0].events.last().unwrap();
        assert_eq!(added.time, "15:30");
        assert_eq!(added.activity, "우도 방문");
        assert_eq!(added.estimated_cost, 20_000);
        assert_eq!(added.duration_minutes, 120);
        assert_eq!(plan.total_budget, budget_before + 20_000);
    }

    #[test]
    fn remove_place_matches_location_or_activity_substring() {
        let mut rng = StdRng::seed_from_u64(3);
        let plan = synthesize(&preferences(), &places(), &[], today(), &mut rng);
        assert!(plan
            .schedule
            .iter()
            .any(|d| d.events.iter().any(|e| e.location.contains("흑돼지거리"))));

        let plan = modify(
            plan,
            Modification::RemovePlace {
                place_name: "흑돼지거리".to_string(),
            },
        );
        for day in &plan.schedule {
            for event in &day.events {
                assert!(!event.location.contains("흑돼지거리"));
                assert!(!event.activity.contains("흑돼지거리"));
            }
            let expected: u32 = day.events.iter().map(|e| e.estimated_cost).sum();
            assert_eq!(day.total_cost, expected);
        }
    }

    #[test]
    fn evening_slot_only_for_photo_and_activity_styles() {
        let mut prefs = preferences();
        prefs.travel_style = Some(TravelStyle::Photo);
        let plan = synthesize(&prefs, &places(), &[], today(), &mut StdRng::seed_from_u64(2));
        // non-final day gets a 19:00 slot
        assert!(plan.schedule[0].events.iter().any(|e| e.time == "19:00"));

        prefs.travel_style = Some(TravelStyle::Nature);
        let plan = synthesize(&prefs, &places(), &[], today(), &mut StdRng::seed_from_u64(2));
        assert!(!plan.schedule[0].events.iter().any(|e| e.time == "19:00"));
    }
}
