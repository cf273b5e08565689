//! Dialogue router: one `Supervisor` turns raw user utterances into typed
//! state mutations and Korean responses, driving the phase machine from
//! greeting through plan generation to calendar/share actions.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use futures::stream;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, instrument, warn};

use voyage_core::options::{
    action_options, auth_pending_options, auth_retry_options, back_to_actions_options,
    budget_options, calendar_menu_options, calendar_retry_options, companion_options,
    date_options, destination_options, duration_options, modification_options, place_options,
    resend_options, retry_planning_options, share_options, share_retry_options, style_options,
};
use voyage_core::{
    classify_rules, format_as_text, modify, normalize, plan_summary, synthesize,
    ControlToken, Intent, IntentResult, MessageRole, Modification, ModificationTarget,
    NormalizeOutcome, Place, PlanTemplate, RequiredSlot, ResponseOption, SlotUpdate,
    TravelPhase, TravelSession, TripDuration, TurnResponse,
};
use voyage_observability::AppMetrics;
use voyage_providers::{
    sync_plan, CalendarProvider, IntentClassifier, SearchProvider, ShareProvider,
};

const WELCOME: &str =
    "안녕하세요! AI 여행 플래너입니다 ✈️\n함께 멋진 여행을 계획해봐요. 어디로 떠나고 싶으신가요?";
const GENERIC_ERROR: &str = "죄송해요, 처리 중 오류가 발생했어요. 다시 시도해주세요.";
const NO_PLAN_YET: &str = "아직 여행 계획이 없어요. 먼저 여행 계획을 만들어볼까요?";

/// One finished turn plus its streaming rendition. State is already committed
/// when this is returned; the chunks only replay `response.message`.
pub struct StreamedTurn {
    pub response: TurnResponse,
    pub chunks: stream::Iter<std::vec::IntoIter<String>>,
}

pub struct Supervisor<C, S, K, H> {
    classifier: Arc<C>,
    search: Arc<S>,
    calendar: Arc<K>,
    share: Arc<H>,
    metrics: Arc<AppMetrics>,
    rng: Mutex<StdRng>,
}

impl<C, S, K, H> Supervisor<C, S, K, H>
where
    C: IntentClassifier,
    S: SearchProvider,
    K: CalendarProvider,
    H: ShareProvider,
{
    pub fn new(
        classifier: Arc<C>,
        search: Arc<S>,
        calendar: Arc<K>,
        share: Arc<H>,
        metrics: Arc<AppMetrics>,
    ) -> Self {
        Self {
            classifier,
            search,
            calendar,
            share,
            metrics,
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Same wiring with a fixed synthesis seed, for reproducible plans.
    pub fn with_seed(
        classifier: Arc<C>,
        search: Arc<S>,
        calendar: Arc<K>,
        share: Arc<H>,
        metrics: Arc<AppMetrics>,
        seed: u64,
    ) -> Self {
        Self {
            classifier,
            search,
            calendar,
            share,
            metrics,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn welcome(&self) -> TurnResponse {
        TurnResponse::text(WELCOME)
    }

    /// Routes one turn. Never fails: any handler error collapses into a
    /// generic apology, and the history always gains exactly one user and one
    /// assistant message.
    #[instrument(skip(self, raw, session), fields(session_id = %session.session_id))]
    pub async fn process_turn(&self, raw: &str, session: &mut TravelSession) -> TurnResponse {
        let started = Instant::now();
        self.metrics.inc_turn();
        let today = Utc::now().date_naive();

        let (canonical, response) = match self.route(raw, session, today).await {
            Ok(routed) => routed,
            Err(err) => {
                warn!(error = %err, "turn handling failed");
                let mut response = TurnResponse::text(GENERIC_ERROR);
                response.options = retry_planning_options();
                (raw.trim().to_string(), response)
            }
        };

        session.add_message(MessageRole::User, &canonical);
        session.add_message(MessageRole::Assistant, &response.message);
        if let Some(phase) = response.next_phase {
            session.update_phase(phase);
        }

        self.metrics.observe_latency(started.elapsed());
        info!(
            phase = session.current_phase.as_str(),
            options = response.options.len(),
            has_plan = session.travel_plan.is_some(),
            "turn handled"
        );
        response
    }

    /// Streaming variant: commits state exactly like [`process_turn`], then
    /// yields the message line by line.
    pub async fn process_turn_streaming(
        &self,
        raw: &str,
        session: &mut TravelSession,
    ) -> StreamedTurn {
        let response = self.process_turn(raw, session).await;
        let chunks: Vec<String> = response
            .message
            .split_inclusive('\n')
            .map(str::to_string)
            .collect();
        StreamedTurn {
            response,
            chunks: stream::iter(chunks),
        }
    }

    async fn route(
        &self,
        raw: &str,
        session: &mut TravelSession,
        today: NaiveDate,
    ) -> Result<(String, TurnResponse)> {
        match normalize(raw, session, today) {
            NormalizeOutcome::AuthCode { code, ack } => {
                session.pending_auth_code = Some(code);
                let response = self.resolve_pending_auth(session).await;
                Ok((ack, response))
            }
            NormalizeOutcome::Control(token) => {
                let response = self.handle_control(token, session, today).await?;
                Ok((raw.trim().to_string(), response))
            }
            NormalizeOutcome::Warning(message) | NormalizeOutcome::Prompt(message) => {
                Ok((raw.trim().to_string(), TurnResponse::text(message)))
            }
            NormalizeOutcome::Slot { update, ack } => {
                let response = self.apply_slot(update, session, today).await?;
                Ok((ack, response))
            }
            NormalizeOutcome::PassThrough => {
                if let Some(target) = session.pending_modification.take() {
                    let response = self.apply_named_modification(target, raw.trim(), session);
                    return Ok((raw.trim().to_string(), response));
                }

                let result = self.classify(raw, session).await;
                self.merge_extracted(&result, session);
                let response = self.dispatch(result.intent, raw, session, today).await?;
                Ok((raw.trim().to_string(), response))
            }
        }
    }

    /// Model classification with a silent downgrade to the keyword rules.
    async fn classify(&self, raw: &str, session: &TravelSession) -> IntentResult {
        match self.classifier.classify(raw, session).await {
            Ok(result) => result,
            Err(err) => {
                warn!(error = %err, "classifier unavailable, using keyword rules");
                self.metrics.inc_classifier_fallback();
                classify_rules(raw)
            }
        }
    }

    /// Merges classifier-extracted slot values. Only non-empty values land,
    /// and duration arrives pre-validated as a structured value.
    fn merge_extracted(&self, result: &IntentResult, session: &mut TravelSession) {
        let info = &result.extracted_info;
        if let Some(destination) = info.destination.as_deref().filter(|d| !d.trim().is_empty()) {
            session.apply_update(SlotUpdate::Destination {
                name: destination.trim().to_string(),
            });
        }
        if let Some(style) = info
            .travel_style
            .as_deref()
            .and_then(voyage_core::TravelStyle::parse)
        {
            session.apply_update(SlotUpdate::TravelStyle { style });
        }
        if let Some(duration) = info.duration.clone() {
            session.apply_update(SlotUpdate::Duration { duration });
        }
        if let Some(date) = info
            .departure_date
            .as_deref()
            .filter(|d| !d.trim().is_empty())
        {
            session.apply_update(SlotUpdate::DepartureDate {
                date: date.trim().to_string(),
            });
        }
        if let Some(tier) = info.budget.as_deref().and_then(voyage_core::BudgetTier::parse) {
            session.apply_update(SlotUpdate::Budget { tier });
        }
        if let Some(companion) = info
            .companion_type
            .as_deref()
            .and_then(voyage_core::CompanionType::parse)
        {
            session.apply_update(SlotUpdate::CompanionType { companion });
        }
    }

    async fn dispatch(
        &self,
        intent: Intent,
        raw: &str,
        session: &mut TravelSession,
        today: NaiveDate,
    ) -> Result<TurnResponse> {
        match intent {
            Intent::InfoCollection => self.collect_info(session, today).await,
            Intent::SearchRequest => self.handle_search(session).await,
            Intent::PlanningRequest => self.handle_planning(session, today).await,
            Intent::CalendarAction => self.handle_calendar_menu(session),
            Intent::ShareAction => self.handle_share_menu(session),
            Intent::ModificationRequest => self.handle_modification_menu(session),
            Intent::GeneralConversation => Ok(self.handle_general(raw, session)),
        }
    }

    async fn apply_slot(
        &self,
        update: SlotUpdate,
        session: &mut TravelSession,
        today: NaiveDate,
    ) -> Result<TurnResponse> {
        // Edits against an existing plan reprice/rewrite it in place instead
        // of restarting the collection flow.
        if session.travel_plan.is_some() {
            match &update {
                SlotUpdate::Budget { tier } => {
                    session.preferences.budget = Some(*tier);
                    return Ok(self.apply_modification(
                        Modification::ChangeBudget { tier: *tier },
                        "💰 예산을 변경하고 일정 비용을 다시 계산했어요!",
                        session,
                    ));
                }
                SlotUpdate::Destination { name } => {
                    session.preferences.destination = Some(name.clone());
                    return Ok(self.apply_modification(
                        Modification::ChangeDestination {
                            destination: name.clone(),
                        },
                        "🗺️ 여행지를 변경했어요!",
                        session,
                    ));
                }
                _ => {}
            }
        }

        session.apply_update(update);
        self.collect_info(session, today).await
    }

    /// Prompts for the first missing required slot, or synthesizes the plan
    /// when nothing is missing.
    async fn collect_info(
        &self,
        session: &mut TravelSession,
        today: NaiveDate,
    ) -> Result<TurnResponse> {
        let missing = session.preferences.missing_required();
        let Some(first) = missing.first().copied() else {
            return self.generate_plan(session, today).await;
        };
        self.prompt_for_slot(first, session, today).await
    }

    async fn prompt_for_slot(
        &self,
        slot: RequiredSlot,
        session: &mut TravelSession,
        today: NaiveDate,
    ) -> Result<TurnResponse> {
        let response = match slot {
            RequiredSlot::Destination => {
                let destinations = self.search.popular_destinations("국내").await?;
                session.available_destinations = destinations;
                TurnResponse {
                    message: "어디로 여행을 떠나고 싶으신가요? 🗺️\n요즘 인기 있는 여행지를 추천해드릴게요!"
                        .to_string(),
                    options: destination_options(&session.available_destinations),
                    plan: None,
                    next_phase: Some(TravelPhase::DestinationSelection),
                }
            }
            RequiredSlot::TravelStyle => menu_prompt(
                "어떤 스타일의 여행을 원하시나요? 🎨",
                style_options(),
            ),
            RequiredSlot::Duration => menu_prompt(
                "여행 기간은 어떻게 되시나요? ⏰",
                duration_options(),
            ),
            RequiredSlot::DepartureDate => menu_prompt(
                "언제 출발하시나요? 📅\n날짜를 선택하거나 직접 입력해주세요 (YYYY-MM-DD)",
                date_options(today),
            ),
            RequiredSlot::CompanionType => menu_prompt(
                "누구와 함께 여행하시나요? 👥",
                companion_options(),
            ),
        };
        Ok(response)
    }

    async fn handle_search(&self, session: &mut TravelSession) -> Result<TurnResponse> {
        match session.preferences.destination.clone() {
            None => {
                let destinations = self.search.popular_destinations("국내").await?;
                session.available_destinations = destinations;
                Ok(TurnResponse {
                    message: "요즘 인기 있는 국내 여행지를 찾아봤어요! 🔍\n마음에 드는 곳을 골라주세요."
                        .to_string(),
                    options: destination_options(&session.available_destinations),
                    plan: None,
                    next_phase: Some(TravelPhase::DestinationSelection),
                })
            }
            Some(destination) => {
                let style = session
                    .preferences
                    .travel_style
                    .map(|s| s.as_str())
                    .unwrap_or("general");
                let details = self.search.destination_details(&destination, style).await?;
                let options = place_options(&details.places);
                session.destination_details = Some(details);
                Ok(TurnResponse {
                    message: format!(
                        "{destination}에서 가볼 만한 곳들을 찾아봤어요! 🔍\n일정에 넣고 싶은 장소를 골라주세요."
                    ),
                    options,
                    plan: None,
                    next_phase: Some(TravelPhase::DetailedPlanning),
                })
            }
        }
    }

    async fn handle_planning(
        &self,
        session: &mut TravelSession,
        today: NaiveDate,
    ) -> Result<TurnResponse> {
        if !session.is_ready_for_planning() {
            let missing = session.preferences.missing_required();
            // missing is non-empty when not ready
            let Some(first) = missing.first().copied() else {
                return self.generate_plan(session, today).await;
            };
            return self.prompt_for_slot(first, session, today).await;
        }
        self.generate_plan(session, today).await
    }

    async fn generate_plan(
        &self,
        session: &mut TravelSession,
        today: NaiveDate,
    ) -> Result<TurnResponse> {
        let context_places: Vec<Place> = session
            .destination_details
            .as_ref()
            .map(|d| d.places.clone())
            .unwrap_or_default();

        let plan = {
            let mut rng = self.rng.lock();
            synthesize(
                &session.preferences,
                &session.selected_places,
                &context_places,
                today,
                &mut *rng,
            )
        };
        self.metrics.inc_plan_generated();

        let summary = plan_summary(&plan);
        session.travel_plan = Some(plan.clone());
        info!(plan_id = %plan.id, days = plan.schedule.len(), "plan generated");

        Ok(TurnResponse {
            message: format!("🎉 여행 계획이 완성되었습니다!\n\n{summary}\n\n다음으로 무엇을 할까요?"),
            options: action_options(),
            plan: Some(plan),
            next_phase: Some(TravelPhase::ActionSelection),
        })
    }

    fn handle_calendar_menu(&self, session: &TravelSession) -> Result<TurnResponse> {
        if session.travel_plan.is_none() {
            return Ok(TurnResponse::text(NO_PLAN_YET));
        }
        Ok(menu_prompt(
            "캘린더로 무엇을 할까요? 📅",
            calendar_menu_options(),
        ))
    }

    fn handle_share_menu(&self, session: &TravelSession) -> Result<TurnResponse> {
        if session.travel_plan.is_none() {
            return Ok(TurnResponse::text(NO_PLAN_YET));
        }
        let mut response = menu_prompt("어떤 방법으로 공유할까요? 💬", share_options());
        response.next_phase = Some(TravelPhase::Sharing);
        Ok(response)
    }

    fn handle_modification_menu(&self, session: &TravelSession) -> Result<TurnResponse> {
        if session.travel_plan.is_none() {
            return Ok(TurnResponse::text(NO_PLAN_YET));
        }
        Ok(menu_prompt(
            "무엇을 바꿔볼까요? ✏️",
            modification_options(),
        ))
    }

    fn handle_general(&self, raw: &str, session: &TravelSession) -> TurnResponse {
        if session.travel_plan.is_some() {
            let mut response = TurnResponse::text(
                "네, 말씀해주세요! 완성된 여행 계획으로 할 수 있는 일들이에요 😊",
            );
            response.options = action_options();
            return response;
        }
        if raw.contains("안녕") || session.conversation_history.is_empty() {
            return TurnResponse::text(WELCOME);
        }
        TurnResponse::text(
            "여행 이야기라면 무엇이든 도와드릴게요! 😊\n가고 싶은 곳이나 여행 스타일을 말씀해주세요.",
        )
    }

    async fn handle_control(
        &self,
        token: ControlToken,
        session: &mut TravelSession,
        today: NaiveDate,
    ) -> Result<TurnResponse> {
        match token {
            ControlToken::NewPlan => {
                session.reset();
                let mut response = TurnResponse::text(format!("새로운 여행을 시작해볼까요? 🔄\n\n{WELCOME}"));
                response.next_phase = Some(TravelPhase::Greeting);
                Ok(response)
            }
            ControlToken::BackToActions => {
                if session.travel_plan.is_none() {
                    return Ok(TurnResponse::text(NO_PLAN_YET));
                }
                let mut response =
                    menu_prompt("다음으로 무엇을 할까요? 😊", action_options());
                response.next_phase = Some(TravelPhase::ActionSelection);
                Ok(response)
            }
            ControlToken::RetryPlanning => self.handle_planning(session, today).await,
            ControlToken::ModifyPlan => self.handle_modification_menu(session),
            ControlToken::ShareMenu => self.handle_share_menu(session),
            ControlToken::ShareKakao => Ok(self.share_via_kakao(session).await),
            ControlToken::CopyText => Ok(self.render_copy_text(session)),
            ControlToken::ShareEmail => Ok(menu_prompt(
                "이메일 공유는 아직 준비 중이에요 📧\n다른 방법을 골라주세요.",
                share_options(),
            )),
            ControlToken::AddToCalendar | ControlToken::EditCalendar => {
                Ok(self.sync_calendar(session).await)
            }
            ControlToken::ViewCalendar => Ok(self.view_calendar(session).await),
            ControlToken::ChangeDestination => {
                session.preferences.destination = None;
                let destinations = self.search.popular_destinations("국내").await?;
                session.available_destinations = destinations;
                Ok(TurnResponse {
                    message: "새로운 여행지를 골라볼까요? 🗺️".to_string(),
                    options: destination_options(&session.available_destinations),
                    plan: None,
                    next_phase: Some(TravelPhase::DestinationSelection),
                })
            }
            ControlToken::ChangeStyle => {
                session.preferences.travel_style = None;
                Ok(menu_prompt(
                    "어떤 스타일로 바꿔볼까요? 🎨",
                    style_options(),
                ))
            }
            ControlToken::ChangeDuration => {
                session.preferences.duration = None;
                Ok(menu_prompt("기간을 어떻게 바꿀까요? ⏰", duration_options()))
            }
            ControlToken::ChangeBudget => Ok(menu_prompt(
                "예산을 어떻게 바꿀까요? 💰",
                budget_options(),
            )),
            ControlToken::AddPlace => {
                session.pending_modification = Some(ModificationTarget::AddPlace);
                Ok(TurnResponse::text("추가하고 싶은 장소 이름을 알려주세요 ➕"))
            }
            ControlToken::RemovePlace => {
                session.pending_modification = Some(ModificationTarget::RemovePlace);
                Ok(TurnResponse::text("일정에서 뺄 장소 이름을 알려주세요 ➖"))
            }
            ControlToken::CustomDestination => Ok(TurnResponse::text(
                "원하는 여행지 이름을 직접 입력해주세요 ✏️",
            )),
        }
    }

    /// Free-form follow-up after an add/remove place prompt.
    fn apply_named_modification(
        &self,
        target: ModificationTarget,
        place_name: &str,
        session: &mut TravelSession,
    ) -> TurnResponse {
        if place_name.is_empty() {
            session.pending_modification = Some(target);
            return TurnResponse::text("장소 이름을 알려주셔야 해요!");
        }
        match target {
            ModificationTarget::AddPlace => {
                let place = Place::new(place_name, "관광지", "");
                self.apply_modification(
                    Modification::AddPlace { place },
                    &format!("➕ {place_name}을(를) 첫째 날 일정에 추가했어요!"),
                    session,
                )
            }
            ModificationTarget::RemovePlace => self.apply_modification(
                Modification::RemovePlace {
                    place_name: place_name.to_string(),
                },
                &format!("➖ {place_name} 관련 일정을 뺐어요!"),
                session,
            ),
        }
    }

    fn apply_modification(
        &self,
        modification: Modification,
        headline: &str,
        session: &mut TravelSession,
    ) -> TurnResponse {
        let Some(plan) = session.travel_plan.take() else {
            return TurnResponse::text(NO_PLAN_YET);
        };
        let updated = modify(plan, modification);
        let summary = plan_summary(&updated);
        session.travel_plan = Some(updated.clone());

        TurnResponse {
            message: format!("{headline}\n\n{summary}"),
            options: action_options(),
            plan: Some(updated),
            next_phase: Some(TravelPhase::ActionSelection),
        }
    }

    async fn sync_calendar(&self, session: &mut TravelSession) -> TurnResponse {
        let Some(plan) = session.travel_plan.clone() else {
            return TurnResponse::text(NO_PLAN_YET);
        };
        match sync_plan(self.calendar.as_ref(), &plan).await {
            Ok(count) => {
                let mut response = TurnResponse::text(format!(
                    "📅 캘린더에 일정 {count}개를 등록했어요!\n여행 전 30분, 10분 알림도 함께 설정했습니다."
                ));
                response.options = back_to_actions_options();
                response.next_phase = Some(TravelPhase::CalendarManagement);
                response
            }
            Err(err) => {
                warn!(error = %err, "calendar sync failed");
                let mut response =
                    TurnResponse::text("캘린더 등록에 실패했어요 😢 다시 시도해볼까요?");
                response.options = calendar_retry_options();
                response
            }
        }
    }

    async fn view_calendar(&self, session: &mut TravelSession) -> TurnResponse {
        let Some(plan) = session.travel_plan.as_ref() else {
            return TurnResponse::text(NO_PLAN_YET);
        };
        match self.calendar.list_events_for_plan(&plan.id).await {
            Ok(events) if events.is_empty() => {
                let mut response = TurnResponse::text(
                    "등록된 캘린더 일정이 없어요. 먼저 일정을 등록해볼까요? 📅",
                );
                response.options = calendar_menu_options();
                response
            }
            Ok(events) => {
                let mut lines = vec![format!("📅 등록된 일정 {}개:", events.len())];
                for event in events.iter().filter(|e| !e.all_day).take(10) {
                    lines.push(format!(
                        "• {} {}",
                        event.start.format("%m/%d %H:%M"),
                        event.summary
                    ));
                }
                let mut response = TurnResponse::text(lines.join("\n"));
                response.options = calendar_menu_options();
                response
            }
            Err(err) => {
                warn!(error = %err, "calendar lookup failed");
                let mut response = TurnResponse::text("캘린더 조회에 실패했어요 😢");
                response.options = calendar_retry_options();
                response
            }
        }
    }

    async fn share_via_kakao(&self, session: &mut TravelSession) -> TurnResponse {
        let Some(plan) = session.travel_plan.clone() else {
            return TurnResponse::text(NO_PLAN_YET);
        };

        if !self.share.is_authenticated() {
            return match self.share.begin_auth() {
                Ok(challenge) => {
                    let mut lines =
                        vec!["카카오톡 공유를 위해 인증이 필요해요 🔐".to_string()];
                    lines.push(String::new());
                    lines.push(format!("🔗 {}", challenge.auth_url));
                    lines.push(String::new());
                    for (i, step) in challenge.instructions.iter().enumerate() {
                        lines.push(format!("{}. {step}", i + 1));
                    }
                    lines.push(String::new());
                    lines.push("인증 후 \"인증코드: <코드>\" 형태로 입력해주세요.".to_string());
                    let mut response = TurnResponse::text(lines.join("\n"));
                    response.options = auth_pending_options();
                    response.next_phase = Some(TravelPhase::Sharing);
                    response
                }
                Err(err) => {
                    warn!(error = %err, "share auth unavailable");
                    let mut response =
                        TurnResponse::text("카카오톡 공유를 사용할 수 없어요 😢");
                    response.options = share_retry_options();
                    response
                }
            };
        }

        match self.share.send_plan(&plan).await {
            Ok(()) => {
                let mut response = TurnResponse::text(
                    "💬 카카오톡으로 여행 계획을 보냈어요!\n나에게 보내기 메시지를 확인해주세요.",
                );
                response.options = resend_options();
                response.next_phase = Some(TravelPhase::Sharing);
                response
            }
            Err(err) => {
                warn!(error = %err, "kakao share failed");
                let mut response =
                    TurnResponse::text("카카오톡 전송에 실패했어요 😢 다시 인증해볼까요?");
                response.options = share_retry_options();
                response
            }
        }
    }

    /// Completes the OAuth handshake with the stored code, then shares
    /// immediately when a plan exists.
    async fn resolve_pending_auth(&self, session: &mut TravelSession) -> TurnResponse {
        let Some(code) = session.pending_auth_code.take() else {
            return TurnResponse::text("처리할 인증 코드가 없어요.");
        };
        match self.share.complete_auth(&code).await {
            Ok(()) => {
                if session.travel_plan.is_some() {
                    let mut response = self.share_via_kakao(session).await;
                    response.message =
                        format!("✅ 카카오톡 인증이 완료되었어요!\n\n{}", response.message);
                    response
                } else {
                    TurnResponse::text("✅ 카카오톡 인증이 완료되었어요!")
                }
            }
            Err(err) => {
                warn!(error = %err, "auth completion failed");
                let mut response =
                    TurnResponse::text("인증에 실패했어요 😢 코드를 다시 확인해주세요.");
                response.options = auth_retry_options();
                response
            }
        }
    }

    fn render_copy_text(&self, session: &TravelSession) -> TurnResponse {
        let Some(plan) = session.travel_plan.as_ref() else {
            return TurnResponse::text(NO_PLAN_YET);
        };
        let text = format_as_text(plan, PlanTemplate::Detailed);
        let mut response = TurnResponse::text(format!(
            "📋 아래 내용을 복사해서 사용하세요!\n\n{text}"
        ));
        response.options = back_to_actions_options();
        response
    }
}

fn menu_prompt(message: &str, options: Vec<ResponseOption>) -> TurnResponse {
    TurnResponse {
        message: message.to_string(),
        options,
        plan: None,
        next_phase: None,
    }
}

/// Fills a session with the five required slots, for tests and demos.
pub fn preset_session(session_id: &str, destination: &str) -> TravelSession {
    let mut session = TravelSession::new(session_id);
    session.apply_update(SlotUpdate::Destination {
        name: destination.to_string(),
    });
    session.apply_update(SlotUpdate::TravelStyle {
        style: voyage_core::TravelStyle::Nature,
    });
    session.apply_update(SlotUpdate::Duration {
        duration: TripDuration::new("2박 3일", 3, 2),
    });
    session.apply_update(SlotUpdate::DepartureDate {
        date: (Utc::now().date_naive() + chrono::Duration::days(14))
            .format("%Y-%m-%d")
            .to_string(),
    });
    session.apply_update(SlotUpdate::CompanionType {
        companion: voyage_core::CompanionType::Friends,
    });
    session
}
