// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Restaurant visit model.

use crate::time_utils::rfc3339_secs;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One confirmed diner visit, stored at `visits/{visit_id}`.
///
/// Written once and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisitRecord {
    pub visit_id: String,
    pub diner_email: String,
    pub restaurant_id: String,
    #[serde(with = "rfc3339_secs")]
    pub visit_date: DateTime<Utc>,
    /// Base visit points plus any streak bonus
    pub points_earned: u32,
}
