use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use chrono::FixedOffset;
use homework_backend::{
    access::CachedCourseAccess,
    api::{USER_ID_HEADER, router},
    db,
    lms::NoopLmsClient,
    models::Assignment,
    state::AppState,
};
use serde_json::{Value, json};
use tower::ServiceExt;

async fn setup_app() -> Router {
    let pool = db::connect_in_memory()
        .await
        .expect("Failed to create test db");

    router(AppState {
        db: pool.clone(),
        lms: Arc::new(NoopLmsClient),
        access: Arc::new(CachedCourseAccess::new(pool)),
        reference_offset: FixedOffset::east_opt(0).unwrap(),
    })
}

fn request(method: &str, uri: &str, user: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header(USER_ID_HEADER, user);
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = setup_app().await;
    let response = app.oneshot(request("GET", "/health", None, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_missing_identity_is_unauthorized() {
    let app = setup_app().await;
    let response = app
        .oneshot(request("GET", "/assignments", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_assignment_lifecycle_over_http() {
    let app = setup_app().await;

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/assignments",
            Some("U1"),
            Some(json!({"title": "Essay", "course_id": 7.0, "due_date": 1714521600000_i64})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let created: Assignment = serde_json::from_value(body_json(response).await).unwrap();
    assert_eq!(created.course_id.get(), 7);
    assert_eq!(created.due_date.timestamp_millis(), 1714521600000);

    let response = app
        .clone()
        .oneshot(request("GET", &format!("/assignments/{}", created.id), Some("U2"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let fetched = body_json(response).await;
    assert_eq!(fetched["course_id"], json!(7));
    assert_eq!(fetched["due_date"], json!(1714521600000_i64));

    let response = app
        .clone()
        .oneshot(request(
            "PATCH",
            &format!("/assignments/{}", created.id),
            Some("U2"),
            Some(json!({"title": "Hijacked"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // U2 has no cached course 7, so the toggle is refused
    let response = app
        .clone()
        .oneshot(request(
            "PUT",
            &format!("/assignments/{}/done", created.id),
            Some("U2"),
            Some(json!({"done": true})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .clone()
        .oneshot(request("DELETE", &format!("/assignments/{}", created.id), Some("U1"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(request("GET", &format!("/assignments/{}", created.id), Some("U1"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_fractional_course_id_is_rejected() {
    let app = setup_app().await;
    let response = app
        .oneshot(request(
            "POST",
            "/assignments",
            Some("U1"),
            Some(json!({"title": "Essay", "course_id": 7.5, "due_date": 0})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], json!("400 Bad Request"));
    assert_eq!(body["message"], json!("invalid course identifier: 7.5"));
}

#[tokio::test]
async fn test_course_assignments_require_course_access() {
    let app = setup_app().await;

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/assignments",
            Some("U1"),
            Some(json!({"title": "Essay", "course_id": 7, "due_date": 1714521600000_i64})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(request("GET", "/courses/7/assignments", Some("U1"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/courses/cache",
            Some("U1"),
            Some(json!({
                "lms_url": "https://moodle.example.org",
                "courses": [{"id": 7.0, "name": "Math", "teacher": "", "user": "U1"}]
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(request("GET", "/courses/7/assignments", Some("U1"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let listed = body_json(response).await;
    assert_eq!(listed.as_array().map(Vec::len), Some(1));
    assert_eq!(listed[0]["title"], json!("Essay"));
}

#[tokio::test]
async fn test_cache_refresh_search_and_toggle() {
    let app = setup_app().await;

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/courses/cache",
            Some("U2"),
            Some(json!({
                "lms_url": "https://moodle.example.org",
                "courses": [{"id": 7, "name": "Math", "teacher": "Ms. Weber", "from_moodle": true, "user": "U2"}]
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .clone()
        .oneshot(request("GET", "/courses/search/math", Some("U2"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let hits = body_json(response).await;
    assert_eq!(hits.as_array().map(Vec::len), Some(1));
    assert_eq!(hits[0]["id"], json!(7));

    let response = app
        .clone()
        .oneshot(request("GET", "/courses/search/math", Some("U1"), None))
        .await
        .unwrap();
    assert_eq!(body_json(response).await, json!([]));

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/assignments",
            Some("U1"),
            Some(json!({"title": "Essay", "course_id": 7, "due_date": 1714521600000_i64})),
        ))
        .await
        .unwrap();
    let created: Assignment = serde_json::from_value(body_json(response).await).unwrap();

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(request(
                "PUT",
                &format!("/assignments/{}/done", created.id),
                Some("U2"),
                Some(json!({"done": true})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["done_by"], json!(["U2"]));
    }

    let response = app
        .clone()
        .oneshot(request("DELETE", "/courses/cache", Some("U2"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(request("GET", "/courses/active", Some("U2"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!([]));
}
