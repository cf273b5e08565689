use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use voyage_api::build_app;

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

fn turn_request(session_id: Option<&str>, text: &str) -> Request<Body> {
    let mut payload = json!({ "text": text });
    if let Some(id) = session_id {
        payload["session_id"] = json!(id);
    }
    Request::builder()
        .method("POST")
        .uri("/v1/turn")
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap()
}

#[tokio::test]
async fn health_reports_ok_with_metrics() {
    let app = build_app(true);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let parsed = body_json(response).await;
    assert_eq!(parsed["status"], "ok");
    assert!(parsed["metrics"]["turns_total"].is_number());
}

#[tokio::test]
async fn turn_without_session_id_creates_one() {
    let app = build_app(true);

    let response = app
        .oneshot(turn_request(None, "제주도 여행"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let parsed = body_json(response).await;
    let session_id = parsed["session_id"].as_str().unwrap();
    assert!(!session_id.is_empty());
    assert!(parsed["message"].as_str().unwrap().contains("스타일"));
    assert_eq!(parsed["options"].as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn empty_text_is_rejected() {
    let app = build_app(true);

    let response = app.oneshot(turn_request(None, "   ")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let parsed = body_json(response).await;
    assert!(parsed["error"].is_string());
}

#[tokio::test]
async fn plan_is_missing_until_all_slots_collected() {
    let app = build_app(true);

    let response = app
        .clone()
        .oneshot(turn_request(Some("s-plan-404"), "제주도 여행"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/v1/sessions/s-plan-404/plan")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

async fn drive_to_plan(app: &axum::Router, session_id: &str) {
    for text in ["제주도 여행", "nature", "2n3d", "2027-03-05", "couple"] {
        let response = app
            .clone()
            .oneshot(turn_request(Some(session_id), text))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn completed_conversation_exposes_plan_and_exports() {
    let app = build_app(true);
    drive_to_plan(&app, "s-full").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/v1/sessions/s-full/plan")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let plan = body_json(response).await;
    assert_eq!(plan["destination"], "제주도");
    assert_eq!(plan["schedule"].as_array().unwrap().len(), 3);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/v1/sessions/s-full/plan/export?template=simple")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/plain"));
    let text = body_text(response).await;
    assert!(text.contains("📍 제주도"));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/v1/sessions/s-full/plan/export.ics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/calendar"));
    let ics = body_text(response).await;
    assert!(ics.starts_with("BEGIN:VCALENDAR\r\n"));
    assert!(ics.ends_with("END:VCALENDAR\r\n"));
    assert!(ics.contains("DTSTART;VALUE=DATE:20270305"));
}

#[tokio::test]
async fn unknown_export_template_is_rejected() {
    let app = build_app(true);
    drive_to_plan(&app, "s-bad-template").await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/v1/sessions/s-bad-template/plan/export?template=pdf")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let parsed = body_json(response).await;
    assert!(parsed["error"]
        .as_str()
        .unwrap()
        .contains("simple, detailed, timeline"));
}
