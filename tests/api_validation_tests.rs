// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Input validation tests.
//!
//! Invalid input must be rejected before any history is read, so these run
//! against the offline store: a 422 proves the store was never touched, and
//! a valid request reaching the store shows up as 503.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::{json, Value};
use tower::ServiceExt;

mod common;
use common::{create_test_app, create_test_jwt, json_body};

async fn send(method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
    let (app, state) = create_test_app();
    let token = create_test_jwt("ana@example.com", &state.config.jwt_signing_key);

    let response = app
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    (status, json_body(response).await)
}

#[tokio::test]
async fn test_review_rating_out_of_range() {
    // Values outside the u8 range must still be reported on the field
    for rating in [-1, 0, 6, 300] {
        let (status, body) = send(
            "POST",
            "/api/reviews",
            json!({ "restaurant_id": "r1", "rating": rating }),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "rating {}", rating);
        assert_eq!(body["error"], "validation_error");
        assert_eq!(body["field"], "rating");
    }
}

#[tokio::test]
async fn test_review_text_too_long() {
    let (status, body) = send(
        "POST",
        "/api/reviews",
        json!({ "restaurant_id": "r1", "rating": 4, "review_text": "a".repeat(1001) }),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["field"], "review_text");
}

#[tokio::test]
async fn test_valid_review_reaches_store() {
    let (status, body) = send(
        "POST",
        "/api/reviews",
        json!({ "restaurant_id": "r1", "rating": 5, "review_text": "a".repeat(1000) }),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "data_unavailable");
}

#[tokio::test]
async fn test_visit_requires_restaurant_id() {
    let (status, body) = send("POST", "/api/visits", json!({ "restaurant_id": "" })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["field"], "restaurant_id");
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let (status, body) = send("POST", "/api/visits", json!({ "restaurant": 7 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn test_review_update_rating_validated() {
    for rating in [-3, 9, 1000] {
        let (status, body) = send("PATCH", "/api/reviews/abc", json!({ "rating": rating })).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "rating {}", rating);
        assert_eq!(body["field"], "rating");
    }
}

#[tokio::test]
async fn test_profile_bio_too_long() {
    let (status, body) = send("PUT", "/api/me/profile", json!({ "bio": "b".repeat(501) })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["field"], "bio");
}
