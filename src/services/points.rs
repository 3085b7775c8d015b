// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Point awards for visits, reviews and profile completion.
//!
//! Streak and profile-completion bonuses are separate functions; callers
//! add them to the base calculation.

use crate::models::DinerProfile;
use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub const VISIT_POINTS: u32 = 10;
pub const REVIEW_BASE_POINTS: u32 = 25;
pub const REVIEW_DETAIL_BONUS: u32 = 10;
/// Trimmed review length (in characters) that earns the detail bonus.
pub const REVIEW_DETAIL_MIN_CHARS: usize = 20;
pub const REVIEW_PHOTO_POINTS: u32 = 5;
pub const REVIEW_PHOTO_BONUS_CAP: u32 = 15;
/// Hard cap on a single review's award.
pub const REVIEW_MAX_POINTS: u32 = 50;
pub const PROFILE_COMPLETION_BONUS: u32 = 25;
/// Minimum trimmed bio length for the bio to count as filled in.
pub const PROFILE_BIO_MIN_CHARS: usize = 10;

/// Breakdown of an award, shown to the diner after submitting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PointsCalculation {
    pub base_points: u32,
    /// Sum of all bonuses before the cap is applied
    pub bonus_points: u32,
    pub total_points: u32,
    /// Human-readable bonus reasons, in the order they were applied
    pub bonuses: Vec<String>,
}

impl PointsCalculation {
    /// Add a side-channel bonus (e.g. a streak) on top of this award.
    pub fn with_bonus(mut self, points: u32, reason: String) -> Self {
        if points > 0 {
            self.bonus_points += points;
            self.total_points += points;
            self.bonuses.push(reason);
        }
        self
    }
}

pub fn calculate_visit_points() -> PointsCalculation {
    PointsCalculation {
        base_points: VISIT_POINTS,
        bonus_points: 0,
        total_points: VISIT_POINTS,
        bonuses: Vec::new(),
    }
}

pub fn calculate_review_points(review_text: Option<&str>, photo_urls: &[String]) -> PointsCalculation {
    let mut bonus_points = 0;
    let mut bonuses = Vec::new();

    let detail_chars = review_text.map(|t| t.trim().chars().count()).unwrap_or(0);
    if detail_chars >= REVIEW_DETAIL_MIN_CHARS {
        bonus_points += REVIEW_DETAIL_BONUS;
        bonuses.push(format!("+{} for a detailed review", REVIEW_DETAIL_BONUS));
    }

    if !photo_urls.is_empty() {
        let count = photo_urls.len();
        let photo_bonus = (count as u32)
            .saturating_mul(REVIEW_PHOTO_POINTS)
            .min(REVIEW_PHOTO_BONUS_CAP);
        bonus_points += photo_bonus;
        let noun = if count == 1 { "photo" } else { "photos" };
        bonuses.push(format!("+{} for {} {}", photo_bonus, count, noun));
    }

    PointsCalculation {
        base_points: REVIEW_BASE_POINTS,
        bonus_points,
        total_points: (REVIEW_BASE_POINTS + bonus_points).min(REVIEW_MAX_POINTS),
        bonuses,
    }
}

/// Progress on the four tracked profile fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ProfileCompletion {
    /// 0, 25, 50, 75 or 100
    pub percentage: u32,
    pub missing_fields: Vec<String>,
    pub is_complete: bool,
}

fn is_filled(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

pub fn profile_completion(profile: &DinerProfile) -> ProfileCompletion {
    let checks = [
        ("photo", is_filled(profile.photo_url.as_deref())),
        (
            "bio",
            profile
                .bio
                .as_deref()
                .is_some_and(|b| b.trim().chars().count() >= PROFILE_BIO_MIN_CHARS),
        ),
        (
            "dietary_preferences",
            profile
                .dietary_preferences
                .iter()
                .any(|p| !p.trim().is_empty()),
        ),
        ("location", is_filled(profile.location.as_deref())),
    ];

    let missing_fields: Vec<String> = checks
        .iter()
        .filter(|(_, filled)| !filled)
        .map(|(name, _)| name.to_string())
        .collect();
    let filled = (checks.len() - missing_fields.len()) as u32;

    ProfileCompletion {
        percentage: filled * 100 / checks.len() as u32,
        is_complete: missing_fields.is_empty(),
        missing_fields,
    }
}

/// One-time award for a complete profile; zero once it has been paid.
pub fn profile_completion_bonus(completion: &ProfileCompletion, already_awarded: bool) -> u32 {
    if completion.is_complete && !already_awarded {
        PROFILE_COMPLETION_BONUS
    } else {
        0
    }
}
