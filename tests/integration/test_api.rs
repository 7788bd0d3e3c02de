//! HTTP surface tests, driven through the router without a socket.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use calendar_server::api::{create_router, ApiState, RestApiConfig};
use calendar_server::calendar::CalendarService;
use calendar_server::storage::MemoryEventStore;

fn app() -> Router {
    let service = Arc::new(CalendarService::new(Arc::new(MemoryEventStore::new())));
    let state = Arc::new(ApiState::new(service).unwrap());
    create_router(state, &RestApiConfig::default())
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/json",
        "every calendar response is JSON"
    );
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn post_json(path: &str, body: Value) -> Request<Body> {
    Request::post(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_form(path: &str, body: &str) -> Request<Body> {
    Request::post(path)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_create_json_and_query_views() {
    let app = app();

    let (status, body) = send(
        &app,
        post_json(
            "/create_event",
            serde_json::json!({"user_id": "1", "date": "2025-10-08", "event": "Meet"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let event = &body["result"];
    assert_eq!(event["user_id"], 1);
    assert_eq!(event["date"], "2025-10-08T00:00:00Z");
    assert_eq!(event["event"], "Meet");
    assert!(event["id"].as_str().unwrap().contains(':'));

    for view in ["events_for_day", "events_for_week", "events_for_month"] {
        let (status, body) = send(&app, get(&format!("/{view}?user_id=1&date=2025-10-08"))).await;
        assert_eq!(status, StatusCode::OK, "{view}");
        let events = body["result"].as_array().unwrap();
        assert_eq!(events.len(), 1, "{view}");
        assert_eq!(events[0]["id"], event["id"]);
    }

    let (_, body) = send(&app, get("/events_for_day?user_id=2&date=2025-10-08")).await;
    assert_eq!(body["result"], serde_json::json!([]));
}

#[tokio::test]
async fn test_create_form_and_duplicate() {
    let app = app();

    let (status, body) = send(
        &app,
        post_form("/create_event", "user_id=42&date=2025-10-08&event=Standup"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["event"], "Standup");

    let (status, body) = send(
        &app,
        post_form("/create_event", "user_id=42&date=2025-10-08&event=Standup"),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "duplicate event (same user, date, and title)");
}

#[tokio::test]
async fn test_form_without_content_type_uses_query() {
    let app = app();
    let request = Request::post("/create_event?user_id=5&date=2025-03-01")
        .body(Body::from("event=Lunch"))
        .unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["user_id"], 5);
    assert_eq!(body["result"]["event"], "Lunch");
}

#[tokio::test]
async fn test_invalid_input_is_bad_request() {
    let app = app();

    let cases = [
        (
            post_json("/create_event", serde_json::json!({"user_id": "abc", "date": "2025-10-08", "event": "x"})),
            "invalid user_id",
        ),
        (
            post_form("/create_event", "user_id=1&date=08-10-2025&event=x"),
            "invalid date (YYYY-MM-DD)",
        ),
        (
            post_form("/create_event", "user_id=1&date=2025-10-08"),
            "event is required",
        ),
        (
            post_json("/update_event", serde_json::json!({"event": "x"})),
            "id is required",
        ),
        (
            Request::post("/delete_event")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
            "invalid body",
        ),
        (get("/events_for_week?date=2025-10-08"), "invalid user_id"),
        (get("/events_for_month?user_id=1"), "invalid date (YYYY-MM-DD)"),
    ];

    for (request, message) in cases {
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{message}");
        assert_eq!(body["error"], message);
    }
}

#[tokio::test]
async fn test_update_and_delete_flow() {
    let app = app();
    let (_, body) = send(
        &app,
        post_form("/create_event", "user_id=1&date=2025-10-08&event=Meet"),
    )
    .await;
    let id = body["result"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        post_json("/update_event", serde_json::json!({"id": &id, "date": "2025-10-10"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["date"], "2025-10-10T00:00:00Z");
    assert_eq!(body["result"]["event"], "Meet");
    assert_eq!(body["result"]["user_id"], 1);

    let (status, body) = send(
        &app,
        post_json("/update_event", serde_json::json!({"id": "missing", "event": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "event not found");

    let (status, body) = send(&app, post_form("/delete_event", &format!("id={id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], "deleted");

    let (status, _) = send(&app, post_form("/delete_event", &format!("id={id}"))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_unknown_path_and_wrong_method() {
    let app = app();

    let (status, body) = send(&app, get("/nope")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not found");

    let (status, body) = send(&app, get("/create_event")).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["error"], "method not allowed");

    let request = Request::builder()
        .method(Method::DELETE)
        .uri("/events_for_day?user_id=1&date=2025-10-08")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_health_and_metrics() {
    let app = app();
    send(
        &app,
        post_form("/create_event", "user_id=1&date=2025-10-08&event=Meet"),
    )
    .await;
    send(
        &app,
        post_form("/create_event", "user_id=1&date=2025-10-08&event=Meet"),
    )
    .await;

    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["status"], "healthy");
    assert_eq!(body["result"]["events"], 1);
    assert_eq!(body["result"]["version"], env!("CARGO_PKG_VERSION"));

    let response = app.clone().oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("calendar_events_created_total 1"));
    assert!(text.contains("calendar_duplicates_rejected_total 1"));
    assert!(text.contains("calendar_events_count 1"));
    assert!(text.contains("calendar_request_errors_total 1"));
}
