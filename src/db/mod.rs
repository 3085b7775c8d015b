// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer (Firestore).

pub mod firestore;

pub use firestore::{AwardCommit, Claim, CommitOutcome, FirestoreDb};

/// Collection names as constants.
pub mod collections {
    pub const DINERS: &str = "diners";
    pub const VISITS: &str = "visits";
    pub const REVIEWS: &str = "reviews";
    /// Last visit/review per diner and restaurant (rate-limit history)
    pub const RESTAURANT_ACTIVITY: &str = "diner_restaurant_activity";
    pub const PERIODS: &str = "competition_periods";
    pub const POINT_LEDGER: &str = "point_ledger";
    pub const RESTAURANTS: &str = "restaurants";
    /// One document per diner once the profile-completion bonus is paid
    pub const PROFILE_BONUSES: &str = "profile_bonuses";
}
