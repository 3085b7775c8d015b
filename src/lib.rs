// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Menu Rewards: points, streaks and weekly leaderboards for diners
//!
//! This crate provides the backend API that rewards diners for visiting
//! restaurants and reviewing dishes, while keeping the rewards hard to farm.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use services::EngagementService;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub engagement: EngagementService,
}

impl AppState {
    pub fn new(config: Config, db: FirestoreDb) -> Self {
        let engagement = EngagementService::new(
            db,
            config.day_boundary,
            chrono::Duration::seconds(config.leaderboard_cache_ttl_secs as i64),
        );
        Self { config, engagement }
    }
}
