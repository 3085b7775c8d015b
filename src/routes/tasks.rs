// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Task handler routes for scheduler callbacks.
//!
//! These endpoints are called by Cloud Scheduler, not directly by users.
//! They are protected by the shared tasks secret (see `middleware::tasks_auth`).

use crate::error::Result;
use crate::models::CompetitionPeriod;
use crate::AppState;
use axum::{extract::State, routing::post, Json, Router};
use std::sync::Arc;

/// Task handler routes (called by the scheduler).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/tasks/rollover-period", post(rollover_period))
}

/// Close the expired competition period and open the current week's.
///
/// Safe to call repeatedly; returns the period active afterwards.
async fn rollover_period(State(state): State<Arc<AppState>>) -> Result<Json<CompetitionPeriod>> {
    let period = state.engagement.rollover_period(chrono::Utc::now()).await?;
    tracing::info!(period = %period.id, "Rollover task complete");
    Ok(Json(period))
}
