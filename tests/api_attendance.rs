use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use clubroster::{api, db, AppState};

async fn app() -> Router {
    let pool = db::init_memory().await.unwrap();
    api::create_router(Arc::new(AppState::new(pool)))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    let request = match body {
        Some(body) => builder.body(Body::from(body.to_string())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

async fn add_student(app: &Router) -> String {
    let (status, created) = send(
        app,
        Method::POST,
        "/",
        Some(json!({
            "name": "A",
            "rollno": "AM.SC.U4CSE23029",
            "email": "am.sc.u4cse23029@am.students.amrita.edu",
            "phone": "9876543210",
            "sig": "WEB",
            "role": "CORE",
            "password": "secret1"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    created["insertedId"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn record_lifecycle() {
    let app = app().await;
    let student_id = add_student(&app).await;

    let (status, record) = send(
        &app,
        Method::POST,
        "/attendance",
        Some(json!({ "studentId": student_id, "date": "2026-10-16", "status": "present" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(record["studentId"], student_id.as_str());
    assert_eq!(record["date"], "2026-10-16");
    assert_eq!(record["status"], "present");
    let id = record["id"].as_str().unwrap().to_string();

    let (status, fetched) = send(&app, Method::GET, &format!("/attendance/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["student"]["name"], "A");

    let (status, updated) = send(
        &app,
        Method::PUT,
        &format!("/attendance/{}", id),
        Some(json!({ "status": "late" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "late");
    assert_eq!(updated["date"], "2026-10-16");

    let (status, body) = send(&app, Method::DELETE, &format!("/attendance/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Deleted");

    let (status, _) = send(&app, Method::GET, &format!("/attendance/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, Method::DELETE, &format!("/attendance/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn timestamps_and_snake_case_are_accepted() {
    let app = app().await;
    let student_id = add_student(&app).await;

    let (status, record) = send(
        &app,
        Method::POST,
        "/attendance",
        Some(json!({
            "student_id": student_id,
            "date": "2026-10-16T08:15:00.000Z",
            "status": "absent"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(record["date"], "2026-10-16");
}

#[tokio::test]
async fn invalid_records_are_rejected() {
    let app = app().await;

    let (status, body) = send(&app, Method::POST, "/attendance", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "validation_error");
    assert!(body["error"]["details"]["studentId"].is_string());
    assert!(body["error"]["details"]["date"].is_string());
    assert!(body["error"]["details"]["status"].is_string());

    let student_id = add_student(&app).await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/attendance",
        Some(json!({ "studentId": student_id, "date": "2026-10-16", "status": "excused" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["details"]["status"].is_string());

    let (_, list) = send(&app, Method::GET, "/attendance", None).await;
    assert!(list.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn same_day_resubmission_keeps_both_records() {
    let app = app().await;
    let student_id = add_student(&app).await;
    for status in ["present", "late"] {
        let (code, _) = send(
            &app,
            Method::POST,
            "/attendance",
            Some(json!({ "studentId": student_id, "date": "2026-10-16", "status": status })),
        )
        .await;
        assert_eq!(code, StatusCode::CREATED);
    }

    let (status, history) = send(
        &app,
        Method::GET,
        &format!("/attendance/student/{}", student_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn list_is_populated_and_survives_student_removal() {
    let app = app().await;
    let student_id = add_student(&app).await;
    for date in ["2026-10-15", "2026-10-16"] {
        send(
            &app,
            Method::POST,
            "/attendance",
            Some(json!({ "studentId": student_id, "date": date, "status": "present" })),
        )
        .await;
    }

    let (status, list) = send(&app, Method::GET, "/attendance", None).await;
    assert_eq!(status, StatusCode::OK);
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["date"], "2026-10-16");
    assert_eq!(list[0]["student"]["rollno"], "AM.SC.U4CSE23029");

    send(&app, Method::DELETE, &format!("/{}", student_id), None).await;
    let (_, list) = send(&app, Method::GET, "/attendance", None).await;
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert!(list[0]["student"].is_null());
}

#[tokio::test]
async fn mistyped_body_answers_400_envelope() {
    let app = app().await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/attendance",
        Some(json!({ "studentId": 42, "date": "2026-10-16", "status": "present" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");
}
