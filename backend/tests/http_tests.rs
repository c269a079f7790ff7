#![cfg(feature = "http-server")]

mod support;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use support::*;
use timetable_backend::http::{create_router, AppState};

fn app(fx: &Fixture) -> Router {
    create_router(AppState::new(fx.engine.clone()))
}

async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn slot_body(semester: u8, section: &str, teacher_id: i64, room: i64) -> Value {
    json!({
        "program": 1,
        "academic_year": 1,
        "semester": semester,
        "section": section,
        "day": 1,
        "slot": 2,
        "class_kind": "Lecture",
        "subject": 1,
        "teachers": [teacher_id],
        "room": room,
    })
}

#[tokio::test]
async fn test_health() {
    let fx = Fixture::new();
    let (status, body) = send(app(&fx), Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "connected");
}

#[tokio::test]
async fn test_assign_then_update() {
    let fx = Fixture::new();
    let (status, body) = send(
        app(&fx),
        Method::POST,
        "/v1/slots",
        Some(slot_body(5, "AB", 1, 1)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["created"], true);

    let (status, body) = send(
        app(&fx),
        Method::POST,
        "/v1/slots",
        Some(slot_body(5, "AB", 2, 1)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["record"]["teachers"], json!([2]));
}

#[tokio::test]
async fn test_conflict_is_409_with_report() {
    let fx = Fixture::new();
    send(
        app(&fx),
        Method::POST,
        "/v1/slots",
        Some(slot_body(5, "AB", 1, 1)),
    )
    .await;

    let (status, body) = send(
        app(&fx),
        Method::POST,
        "/v1/slots",
        Some(slot_body(7, "CD", 1, 2)),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");
    assert_eq!(body["details"]["conflicts"][0]["kind"], "teacher");
}

#[tokio::test]
async fn test_validation_is_400() {
    let fx = Fixture::new();
    let mut body = slot_body(5, "AB", 1, 1);
    body["day"] = json!(8);
    let (status, body) = send(app(&fx), Method::POST, "/v1/slots", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["details"]["errors"][0]["field"], "day");
}

#[tokio::test]
async fn test_unknown_room_is_404() {
    let fx = Fixture::new();
    let (status, body) = send(
        app(&fx),
        Method::POST,
        "/v1/slots",
        Some(slot_body(5, "AB", 1, 99)),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["details"]["entity"], "room");
}

#[tokio::test]
async fn test_clear_slot_and_routine() {
    let fx = Fixture::new();
    send(
        app(&fx),
        Method::POST,
        "/v1/slots",
        Some(slot_body(5, "AB", 1, 1)),
    )
    .await;

    let (status, body) = send(app(&fx), Method::GET, "/v1/routines/1/5/AB", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["entries"][0]["teacher_names"][0], "Anil Shrestha");

    let (status, body) = send(
        app(&fx),
        Method::DELETE,
        "/v1/slots?program=1&semester=5&section=AB&day=1&slot=2",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "cleared");

    let (_, body) = send(app(&fx), Method::GET, "/v1/routines/1/5/AB", None).await;
    assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn test_availability_endpoint() {
    let fx = Fixture::new();
    send(
        app(&fx),
        Method::POST,
        "/v1/slots",
        Some(slot_body(5, "AB", 1, 1)),
    )
    .await;

    let (status, body) = send(
        app(&fx),
        Method::GET,
        "/v1/availability/teachers/1?day=1&slot=2&semester=3",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_available"], false);

    let (_, body) = send(
        app(&fx),
        Method::GET,
        "/v1/availability/rooms/1?day=1&slot=2&semester=4",
        None,
    )
    .await;
    assert_eq!(body["is_available"], true);
}

#[tokio::test]
async fn test_bad_path_ids_are_400() {
    let fx = Fixture::new();
    let (status, _) = send(app(&fx), Method::DELETE, "/v1/spans/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(app(&fx), Method::GET, "/v1/routines/1/5/XY", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_elective_lifecycle() {
    let fx = Fixture::new();
    let request = json!({
        "program": 1,
        "academic_year": 1,
        "semester": 8,
        "day": 4,
        "slots": [1],
        "target_sections": ["AB", "CD"],
        "subject": 5,
        "teachers": [4],
        "room": 2,
        "elective_number": 2,
        "elective_type": "Management",
    });
    let (status, body) = send(app(&fx), Method::POST, "/v1/electives", Some(request)).await;
    assert_eq!(status, StatusCode::CREATED);
    let group_id = body["group_id"].as_str().unwrap().to_string();
    assert_eq!(body["records"].as_array().unwrap().len(), 2);

    let (status, body) = send(
        app(&fx),
        Method::DELETE,
        &format!("/v1/electives/{}", group_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted_count"], 2);
}
