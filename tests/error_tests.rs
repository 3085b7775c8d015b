// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use chrono::{Duration, TimeZone, Utc};
use menu_rewards::error::AppError;
use menu_rewards::services::rate_limit::{check_review_rate_limit, check_visit_rate_limit};

mod common;
use common::json_body;

#[tokio::test]
async fn test_visit_cooldown_maps_to_429_with_retry_after() {
    let now = Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap();
    let limit = check_visit_rate_limit(Some(now - Duration::hours(20)), now);
    assert!(!limit.allowed);

    let response = AppError::RateLimited(limit).into_response();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "14400");

    let body = json_body(response).await;
    assert_eq!(body["error"], "rate_limited");
    assert_eq!(body["rate_limit"]["allowed"], false);
    assert_eq!(body["rate_limit"]["retry_after"], 4);
    assert_eq!(body["rate_limit"]["can_retry"], true);
}

#[tokio::test]
async fn test_missing_visit_has_no_retry_after() {
    let now = Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap();
    let limit = check_review_rate_limit(None, 0, None, now);
    assert!(!limit.can_retry);

    let response = AppError::RateLimited(limit).into_response();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().get(header::RETRY_AFTER).is_none());

    let body = json_body(response).await;
    assert_eq!(body["rate_limit"]["can_retry"], false);
    assert!(body["rate_limit"].get("retry_after").is_none());
}

#[tokio::test]
async fn test_store_failure_is_data_unavailable() {
    let response = AppError::Database("deadline exceeded".to_string()).into_response();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = json_body(response).await;
    assert_eq!(body["error"], "data_unavailable");
    // Internal details stay in the logs
    assert!(body.get("details").is_none());
}

#[tokio::test]
async fn test_no_active_period_is_distinct_from_store_failure() {
    let response = AppError::NoActivePeriod.into_response();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json_body(response).await["error"], "no_active_period");
}

#[tokio::test]
async fn test_forbidden_and_not_found() {
    assert_eq!(
        AppError::Forbidden("not yours".to_string())
            .into_response()
            .status(),
        StatusCode::FORBIDDEN
    );
    assert_eq!(
        AppError::NotFound("review".to_string())
            .into_response()
            .status(),
        StatusCode::NOT_FOUND
    );
}
