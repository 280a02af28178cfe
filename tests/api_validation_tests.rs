// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API input validation tests.
//!
//! Each request is malformed in a way the handler rejects before touching
//! Firestore, so the offline app answers 400.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use tower::ServiceExt;

mod common;

async fn send(method: &str, uri: &str, body: Option<&str>) -> StatusCode {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt("athlete-1", &state.config.jwt_signing_key);

    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token));
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    app.oneshot(builder.body(body).unwrap())
        .await
        .unwrap()
        .status()
}

#[tokio::test]
async fn test_invalid_schedule_dates() {
    assert_eq!(
        send("GET", "/api/schedule?start=03/01/2025&end=2025-03-07", None).await,
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        send("GET", "/api/schedule?start=2025-03-07&end=2025-03-01", None).await,
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn test_schedule_end_before_start() {
    let body = r#"{"title":"Fran","startDate":"2025-03-10","endDate":"2025-03-01"}"#;
    assert_eq!(
        send("POST", "/api/schedule", Some(body)).await,
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn test_weekly_schedule_without_days() {
    let body = r#"{"title":"Fran","startDate":"2025-03-10",
                   "recurrence":{"type":"weekly","selectedDays":[]}}"#;
    assert_eq!(
        send("POST", "/api/schedule", Some(body)).await,
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn test_signup_date_must_parse() {
    assert_eq!(
        send("POST", "/api/schedule/w1/slots/s1/signup?date=tomorrow", None).await,
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn test_wod_log_missing_score() {
    let body = r#"{"wodTitle":"Fran","workoutDate":"2025-03-10T12:00:00Z","resultType":"time"}"#;
    assert_eq!(
        send("POST", "/api/logs/wods", Some(body)).await,
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn test_lift_reps_out_of_range() {
    let body = r#"{"liftTitle":"Back Squat","weight":225,"reps":0}"#;
    assert_eq!(
        send("POST", "/api/logs/lifts", Some(body)).await,
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn test_gym_offset_out_of_range() {
    let body = r#"{"name":"CrossFit North","utcOffsetMinutes":2000}"#;
    assert_eq!(
        send("POST", "/api/gyms", Some(body)).await,
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn test_username_too_short() {
    assert_eq!(
        send("PUT", "/api/me", Some(r#"{"username":"x"}"#)).await,
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn test_progress_window_not_offered() {
    assert_eq!(
        send("GET", "/api/progress?days=45", None).await,
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn test_similarity_threshold_out_of_range() {
    assert_eq!(
        send("GET", "/api/leaderboard/similar?name=fran&threshold=2", None).await,
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn test_scan_requires_image_data_url() {
    assert_eq!(
        send(
            "POST",
            "/api/ai/scan",
            Some(r#"{"image":"https://example.com/board.jpg"}"#)
        )
        .await,
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        send(
            "POST",
            "/api/ai/scan",
            Some(r#"{"image":"data:text/plain;base64,aGVsbG8="}"#)
        )
        .await,
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn test_gym_edit_rejects_bad_website() {
    let body = r#"{"contact":{"website":"not a url"}}"#;
    assert_eq!(
        send("PUT", "/api/gyms/g1", Some(body)).await,
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn test_group_edit_cutoff_out_of_range() {
    assert_eq!(
        send("PUT", "/api/groups/grp1", Some(r#"{"signupCutoffMinutes":5000}"#)).await,
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn test_workout_edit_blank_title() {
    assert_eq!(
        send("PUT", "/api/schedule/w1", Some(r#"{"title":""}"#)).await,
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn test_wod_edit_missing_score() {
    let body = r#"{"wodTitle":"Fran","workoutDate":"2025-03-10T12:00:00Z","resultType":"weight"}"#;
    assert_eq!(
        send("PUT", "/api/logs/wods/log1", Some(body)).await,
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn test_gym_application_blank_name() {
    assert_eq!(
        send("POST", "/api/gym-applications", Some(r#"{"gymName":"  "}"#)).await,
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn test_gym_application_rejection_needs_reason() {
    assert_eq!(
        send(
            "POST",
            "/api/admin/gym-applications/app1/reject",
            Some(r#"{"reason":"   "}"#)
        )
        .await,
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn test_cannot_change_own_role() {
    assert_eq!(
        send(
            "PUT",
            "/api/admin/users/athlete-1/role",
            Some(r#"{"role":"superAdmin"}"#)
        )
        .await,
        StatusCode::BAD_REQUEST
    );
}
