use std::sync::Arc;

use voyage_agents::Supervisor;
use voyage_core::{format_as_text, PlanTemplate, TravelPhase, TravelSession};
use voyage_observability::AppMetrics;
use voyage_providers::{Classifier, MemoryCalendar, ProviderSet, Search, Share};

type OfflineSupervisor = Supervisor<Classifier, Search, MemoryCalendar, Share>;

fn supervisor() -> OfflineSupervisor {
    let providers = ProviderSet::offline();
    Supervisor::with_seed(
        Arc::new(providers.classifier),
        Arc::new(providers.search),
        Arc::new(providers.calendar),
        Arc::new(providers.share),
        AppMetrics::shared(),
        7,
    )
}

async fn drive(
    supervisor: &OfflineSupervisor,
    session: &mut TravelSession,
    turns: &[&str],
) -> voyage_core::TurnResponse {
    let mut last = supervisor.welcome();
    for turn in turns {
        last = supervisor.process_turn(turn, session).await;
    }
    last
}

#[tokio::test]
async fn slot_filling_conversation_ends_with_a_plan() {
    let supervisor = supervisor();
    let mut session = TravelSession::new("flow-1");

    let response = drive(
        &supervisor,
        &mut session,
        &["제주도 여행", "nature", "2n3d", "2027-03-05", "couple"],
    )
    .await;

    let plan = response.plan.expect("final turn should carry the plan");
    assert_eq!(plan.destination, "제주도");
    assert_eq!(plan.schedule.len(), 3);
    assert!(plan.total_budget > 0);
    assert_eq!(session.current_phase, TravelPhase::ActionSelection);

    // five required slots answered, each turn one user + one assistant message
    assert_eq!(session.conversation_history.len(), 10);
}

#[tokio::test]
async fn plan_survives_text_rendering_in_all_templates() {
    let supervisor = supervisor();
    let mut session = TravelSession::new("flow-2");
    drive(
        &supervisor,
        &mut session,
        &["부산 여행", "food", "1n2d", "2027-03-05", "friends"],
    )
    .await;

    let plan = session.travel_plan.as_ref().expect("plan stored in session");
    for template in [
        PlanTemplate::Simple,
        PlanTemplate::Detailed,
        PlanTemplate::Timeline,
    ] {
        let text = format_as_text(plan, template);
        assert!(text.contains("부산"), "{template:?} must name the destination");
        assert!(!text.is_empty());
    }

    let detailed = format_as_text(plan, PlanTemplate::Detailed);
    assert!(detailed.contains("⏰ 기간: 2일"));
    assert!(detailed.contains("📅 출발일: 2027-03-05"));
}

#[tokio::test]
async fn calendar_then_share_flow_completes_offline() {
    let supervisor = supervisor();
    let mut session = TravelSession::new("flow-3");
    drive(
        &supervisor,
        &mut session,
        &["경주 여행", "culture", "2n3d", "2027-04-10", "family"],
    )
    .await;

    let calendar = supervisor.process_turn("add_to_calendar", &mut session).await;
    assert!(calendar.message.contains("등록했어요"));
    assert_eq!(session.current_phase, TravelPhase::CalendarManagement);

    let listed = supervisor.process_turn("view_calendar", &mut session).await;
    assert!(listed.message.contains("경주"));

    let shared = supervisor.process_turn("share_kakao", &mut session).await;
    assert!(shared.message.contains("보냈어요"));
    assert_eq!(session.current_phase, TravelPhase::Sharing);
}

#[tokio::test]
async fn destination_change_restarts_selection_and_replans() {
    let supervisor = supervisor();
    let mut session = TravelSession::new("flow-4");
    drive(
        &supervisor,
        &mut session,
        &["강릉 여행", "photo", "1n2d", "2027-05-01", "solo"],
    )
    .await;
    let first_destination = session.travel_plan.as_ref().unwrap().destination.clone();
    assert_eq!(first_destination, "강릉");

    let response = supervisor.process_turn("change_destination", &mut session).await;
    assert_eq!(session.current_phase, TravelPhase::DestinationSelection);
    assert!(!response.options.is_empty());

    supervisor.process_turn("여수 여행", &mut session).await;
    let plan = session.travel_plan.as_ref().expect("rewritten plan");
    assert_eq!(plan.destination, "여수");
}

#[tokio::test]
async fn error_free_even_for_nonsense_input() {
    let supervisor = supervisor();
    let mut session = TravelSession::new("flow-5");

    for junk in ["ㅁㄴㅇㄹ", "12345abc", "???", "   !!"] {
        let response = supervisor.process_turn(junk, &mut session).await;
        assert!(!response.message.is_empty());
    }
    // history stays balanced regardless of input quality
    assert_eq!(session.conversation_history.len(), 8);
}
