// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Restaurant review model.

use crate::time_utils::rfc3339_secs;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A diner's review of a restaurant, stored at `reviews/{review_id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub review_id: String,
    pub diner_email: String,
    pub restaurant_id: String,
    #[serde(default)]
    pub menu_item_id: Option<String>,
    /// 1 to 5 stars
    pub rating: u8,
    #[serde(default)]
    pub review_text: Option<String>,
    #[serde(default)]
    pub photo_urls: Vec<String>,
    #[serde(with = "rfc3339_secs")]
    pub created_at: DateTime<Utc>,
    #[serde(default, with = "rfc3339_secs::option")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Fixed at creation; edits never change it
    pub points_earned: u32,
}
