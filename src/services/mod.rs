// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.
//!
//! The rule engines (`rate_limit`, `points`, `streak`, `leaderboard`) are
//! pure functions of their inputs and an explicit `now`. `engagement` wires
//! them to Firestore.

pub mod cache;
pub mod engagement;
pub mod leaderboard;
pub mod points;
pub mod rate_limit;
pub mod streak;

pub use cache::TtlCache;
pub use engagement::EngagementService;
