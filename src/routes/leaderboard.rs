// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Leaderboard route (authentication optional).

use crate::error::Result;
use crate::middleware::MaybeAuthUser;
use crate::services::leaderboard::LeaderboardResult;
use crate::AppState;
use axum::{extract::State, routing::get, Extension, Json, Router};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/leaderboard", get(get_leaderboard))
}

/// Standings for the active competition period.
async fn get_leaderboard(
    State(state): State<Arc<AppState>>,
    Extension(MaybeAuthUser(user)): Extension<MaybeAuthUser>,
) -> Result<Json<LeaderboardResult>> {
    let email = user.as_ref().map(|u| u.email.as_str());
    let result = state.engagement.leaderboard(email, chrono::Utc::now()).await?;
    Ok(Json(result))
}
