use std::collections::HashMap;
use std::env;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use voyage_agents::Supervisor;
use voyage_core::{export_ics, format_as_text, PlanTemplate, TravelSession, TurnResponse};
use voyage_observability::{AppMetrics, MetricsSnapshot};
use voyage_providers::{Classifier, MemoryCalendar, ProviderSet, Search, Share};

pub type AppSupervisor = Supervisor<Classifier, Search, MemoryCalendar, Share>;

#[derive(Clone)]
pub struct ApiState {
    pub supervisor: Arc<AppSupervisor>,
    /// Process-local session registry keyed by session id. A turn checks its
    /// session out, routes it, and checks it back in, so no turn runs under
    /// the registry lock.
    pub sessions: Arc<RwLock<HashMap<String, TravelSession>>>,
    pub metrics: Arc<AppMetrics>,
}

pub fn build_app(offline: bool) -> Router {
    let metrics = AppMetrics::shared();
    let providers = ProviderSet::from_env(offline, metrics.clone());
    let supervisor = Arc::new(Supervisor::new(
        Arc::new(providers.classifier),
        Arc::new(providers.search),
        Arc::new(providers.calendar),
        Arc::new(providers.share),
        metrics.clone(),
    ));

    build_router(ApiState {
        supervisor,
        sessions: Arc::new(RwLock::new(HashMap::new())),
        metrics,
    })
}

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/turn", post(turn))
        .route("/v1/sessions/:id/plan", get(session_plan))
        .route("/v1/sessions/:id/plan/export", get(session_plan_export))
        .route("/v1/sessions/:id/plan/export.ics", get(session_plan_ics))
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(64 * 1024))
        .with_state(state)
}

pub fn bind_addr() -> String {
    env::var("VOYAGE_BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8900".to_string())
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp_utc: String,
    metrics: MetricsSnapshot,
}

async fn health(State(state): State<ApiState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        timestamp_utc: chrono::Utc::now().to_rfc3339(),
        metrics: state.metrics.snapshot(),
    })
}

#[derive(Debug, Deserialize)]
struct TurnRequest {
    session_id: Option<String>,
    text: String,
}

#[derive(Debug, Serialize)]
struct TurnReply {
    session_id: String,
    #[serde(flatten)]
    response: TurnResponse,
}

async fn turn(State(state): State<ApiState>, Json(input): Json<TurnRequest>) -> Response {
    if input.text.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "text must not be empty");
    }

    let session_id = input
        .session_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let mut session = state
        .sessions
        .write()
        .remove(&session_id)
        .unwrap_or_else(|| TravelSession::new(&session_id));

    let response = state
        .supervisor
        .process_turn(&input.text, &mut session)
        .await;
    state.sessions.write().insert(session_id.clone(), session);

    Json(TurnReply {
        session_id,
        response,
    })
    .into_response()
}

async fn session_plan(State(state): State<ApiState>, Path(id): Path<String>) -> Response {
    match plan_for_session(&state, &id) {
        Some(plan) => Json(plan).into_response(),
        None => error_response(StatusCode::NOT_FOUND, "no plan for session"),
    }
}

#[derive(Debug, Deserialize)]
struct ExportQuery {
    template: Option<String>,
}

async fn session_plan_export(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Query(query): Query<ExportQuery>,
) -> Response {
    let Some(plan) = plan_for_session(&state, &id) else {
        return error_response(StatusCode::NOT_FOUND, "no plan for session");
    };
    let template = match query.template.as_deref() {
        None => PlanTemplate::default(),
        Some(raw) => match PlanTemplate::parse(raw) {
            Some(template) => template,
            None => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    "template must be one of: simple, detailed, timeline",
                )
            }
        },
    };

    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        format_as_text(&plan, template),
    )
        .into_response()
}

async fn session_plan_ics(State(state): State<ApiState>, Path(id): Path<String>) -> Response {
    let Some(plan) = plan_for_session(&state, &id) else {
        return error_response(StatusCode::NOT_FOUND, "no plan for session");
    };
    (
        [
            (header::CONTENT_TYPE, "text/calendar; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"travel-plan.ics\"",
            ),
        ],
        export_ics(&plan),
    )
        .into_response()
}

fn plan_for_session(state: &ApiState, id: &str) -> Option<voyage_core::TravelPlan> {
    state
        .sessions
        .read()
        .get(id)
        .and_then(|session| session.travel_plan.clone())
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}
