// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Diner profile model for storage and API.

use crate::time_utils::rfc3339_secs;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Stable document key for a diner, derived from the normalized email.
///
/// Emails are case-insensitive identities, so `Ana@Example.com` and
/// `ana@example.com` map to the same diner.
pub fn diner_key(email: &str) -> String {
    let normalized = email.trim().to_lowercase();
    hex::encode(Sha256::digest(normalized.as_bytes()))
}

/// Diner profile stored in Firestore (`diners/{diner_key}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DinerProfile {
    /// Normalized (lowercase) email, the diner's identity
    pub email: String,
    pub display_name: Option<String>,
    #[serde(default)]
    pub total_points: u32,
    #[serde(default)]
    pub current_streak: u32,
    #[serde(default)]
    pub longest_streak: u32,
    /// Local calendar date of the most recent visit to any restaurant
    #[serde(default)]
    pub last_visit_date: Option<NaiveDate>,

    // ─── Tracked profile fields ──────────────────────────────────
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub dietary_preferences: Vec<String>,
    #[serde(default)]
    pub location: Option<String>,
    /// Set once the profile-completion bonus has been paid
    #[serde(default)]
    pub profile_bonus_awarded: bool,

    #[serde(with = "rfc3339_secs")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "rfc3339_secs")]
    pub updated_at: DateTime<Utc>,
}

impl DinerProfile {
    /// Create an empty profile on the diner's first interaction.
    pub fn new(email: &str, display_name: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            email: email.trim().to_lowercase(),
            display_name,
            total_points: 0,
            current_streak: 0,
            longest_streak: 0,
            last_visit_date: None,
            photo_url: None,
            bio: None,
            dietary_preferences: Vec::new(),
            location: None,
            profile_bonus_awarded: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn key(&self) -> String {
        diner_key(&self.email)
    }
}

/// Fall back to the text before `@` when no usable display name exists.
pub fn display_name_or_local_part(display_name: Option<&str>, email: &str) -> String {
    match display_name.map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => email.split('@').next().unwrap_or(email).to_string(),
    }
}

/// Per diner/restaurant history used by the rate limiter.
///
/// Stored at `diner_restaurant_activity/{diner_key}_{restaurant_id}` and
/// rewritten inside the same transaction as every visit or review, which
/// makes it the conflict point for concurrent submissions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DinerRestaurantActivity {
    pub diner_email: String,
    pub restaurant_id: String,
    #[serde(default, with = "rfc3339_secs::option")]
    pub last_visit_date: Option<DateTime<Utc>>,
    /// Id of the visit that set `last_visit_date`
    #[serde(default)]
    pub last_visit_id: Option<String>,
    #[serde(default, with = "rfc3339_secs::option")]
    pub last_review_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_review_id: Option<String>,
}

impl DinerRestaurantActivity {
    pub fn empty(diner_email: &str, restaurant_id: &str) -> Self {
        Self {
            diner_email: diner_email.to_string(),
            restaurant_id: restaurant_id.to_string(),
            last_visit_date: None,
            last_visit_id: None,
            last_review_date: None,
            last_review_id: None,
        }
    }

    pub fn key(&self) -> String {
        Self::doc_id(&self.diner_email, &self.restaurant_id)
    }

    pub fn doc_id(diner_email: &str, restaurant_id: &str) -> String {
        format!(
            "{}_{}",
            diner_key(diner_email),
            urlencoding::encode(restaurant_id)
        )
    }
}
