// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod diner;
pub mod ledger;
pub mod period;
pub mod restaurant;
pub mod review;
pub mod visit;

pub use diner::{diner_key, DinerProfile, DinerRestaurantActivity};
pub use ledger::{derive_event_id, EarnedFrom, PointLedgerEntry};
pub use period::{CompetitionPeriod, PeriodStatus};
pub use restaurant::Restaurant;
pub use review::ReviewRecord;
pub use visit::VisitRecord;
