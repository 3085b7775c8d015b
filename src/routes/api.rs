// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated diners.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::ReviewRecord;
use crate::services::engagement::{
    ProfileResponse, ProfileUpdateRequest, ReviewRequest, ReviewResponse, ReviewUpdateRequest,
    VisitRequest, VisitResponse,
};
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{delete, get, patch, post, put},
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me))
        .route("/api/me/profile", put(update_profile))
        .route("/api/visits", post(log_visit))
        .route("/api/reviews", post(submit_review))
        .route(
            "/api/reviews/{review_id}",
            patch(update_review).delete(delete_review),
        )
        .route("/api/account", delete(delete_account))
}

/// Unwrap a JSON body, reporting malformed input as 400.
fn json_body<T>(body: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    body.map(|Json(value)| value)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

// ─── Profile ─────────────────────────────────────────────────

/// Get the current diner's profile and completion status.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ProfileResponse>> {
    let profile = state
        .engagement
        .get_profile(&user.email, user.display_name.as_deref(), chrono::Utc::now())
        .await?;
    Ok(Json(profile))
}

async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    body: std::result::Result<Json<ProfileUpdateRequest>, JsonRejection>,
) -> Result<Json<ProfileResponse>> {
    let request = json_body(body)?;
    let profile = state
        .engagement
        .update_profile(&user.email, request, chrono::Utc::now())
        .await?;
    Ok(Json(profile))
}

// ─── Visits & Reviews ────────────────────────────────────────

async fn log_visit(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    body: std::result::Result<Json<VisitRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<VisitResponse>)> {
    let request = json_body(body)?;
    let response = state
        .engagement
        .log_visit(
            &user.email,
            user.display_name.as_deref(),
            request,
            chrono::Utc::now(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn submit_review(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    body: std::result::Result<Json<ReviewRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ReviewResponse>)> {
    let request = json_body(body)?;
    let response = state
        .engagement
        .submit_review(
            &user.email,
            user.display_name.as_deref(),
            request,
            chrono::Utc::now(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Edit a review. Points earned for it do not change.
async fn update_review(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(review_id): Path<String>,
    body: std::result::Result<Json<ReviewUpdateRequest>, JsonRejection>,
) -> Result<Json<ReviewRecord>> {
    let request = json_body(body)?;
    let review = state
        .engagement
        .update_review(&user.email, &review_id, request, chrono::Utc::now())
        .await?;
    Ok(Json(review))
}

async fn delete_review(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(review_id): Path<String>,
) -> Result<StatusCode> {
    state
        .engagement
        .delete_review(&user.email, &review_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ─── Account Deletion ────────────────────────────────────────

/// Response for account deletion.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DeleteAccountResponse {
    pub success: bool,
    pub deleted_documents: usize,
}

/// Delete the diner's account and all associated data.
async fn delete_account(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<DeleteAccountResponse>> {
    tracing::info!(diner = %user.email, "Diner-initiated account deletion");

    let deleted_documents = state.engagement.delete_account(&user.email).await?;

    Ok(Json(DeleteAccountResponse {
        success: true,
        deleted_documents,
    }))
}
