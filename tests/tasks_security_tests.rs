// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Security tests for scheduler task handlers.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use tower::ServiceExt;

mod common;

async fn rollover(auth: Option<String>) -> StatusCode {
    let (app, _) = common::create_test_app();

    let mut request = Request::builder()
        .method("POST")
        .uri("/tasks/rollover-period");
    if let Some(auth) = auth {
        request = request.header(header::AUTHORIZATION, auth);
    }

    app.oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap()
        .status()
}

#[tokio::test]
async fn test_rollover_without_auth_unauthorized() {
    assert_eq!(rollover(None).await, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_rollover_wrong_secret_forbidden() {
    assert_eq!(
        rollover(Some("Bearer not-the-secret".to_string())).await,
        StatusCode::FORBIDDEN
    );
}

#[tokio::test]
async fn test_rollover_rejects_user_session() {
    let (_, state) = common::create_test_app();
    let token = common::create_test_jwt("ana@example.com", &state.config.jwt_signing_key);
    assert_eq!(
        rollover(Some(format!("Bearer {}", token))).await,
        StatusCode::FORBIDDEN
    );
}

#[tokio::test]
async fn test_rollover_with_secret_reaches_store() {
    let (_, state) = common::create_test_app();
    let status = rollover(Some(format!("Bearer {}", state.config.tasks_secret))).await;

    // Authorized; the offline store fails
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}
