// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Consecutive-day visit streaks.

use crate::models::DinerProfile;
use chrono::NaiveDate;
use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Streak length at which the daily bonus starts.
pub const STREAK_BONUS_THRESHOLD: u32 = 3;
pub const STREAK_BONUS_POINTS: u32 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct StreakUpdate {
    pub new_streak: u32,
    /// Added on top of the visit's base points
    pub bonus_points: u32,
    pub is_new_streak: bool,
}

/// Compute the streak after a visit on `today`.
///
/// A second visit on the same day leaves the streak untouched. A last visit
/// dated after `today` (clock skew between devices) is treated the same way.
pub fn update_streak(
    last_visit_date: Option<NaiveDate>,
    current_streak: u32,
    today: NaiveDate,
) -> StreakUpdate {
    let Some(last) = last_visit_date else {
        return StreakUpdate {
            new_streak: 1,
            bonus_points: 0,
            is_new_streak: true,
        };
    };

    match (today - last).num_days() {
        days if days <= 0 => StreakUpdate {
            new_streak: current_streak,
            bonus_points: 0,
            is_new_streak: false,
        },
        1 => {
            let new_streak = current_streak.saturating_add(1);
            StreakUpdate {
                new_streak,
                bonus_points: if new_streak >= STREAK_BONUS_THRESHOLD {
                    STREAK_BONUS_POINTS
                } else {
                    0
                },
                is_new_streak: false,
            }
        }
        _ => StreakUpdate {
            new_streak: 1,
            bonus_points: 0,
            is_new_streak: true,
        },
    }
}

/// Write a streak update onto the profile, keeping `longest_streak` in step.
pub fn apply_streak(profile: &mut DinerProfile, update: &StreakUpdate, today: NaiveDate) {
    profile.current_streak = update.new_streak;
    profile.longest_streak = profile.longest_streak.max(update.new_streak);
    let is_later = profile.last_visit_date.map_or(true, |last| today > last);
    if is_later {
        profile.last_visit_date = Some(today);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    #[test]
    fn test_streak_progression() {
        let first = update_streak(None, 0, today());
        assert_eq!(
            first,
            StreakUpdate {
                new_streak: 1,
                bonus_points: 0,
                is_new_streak: true
            }
        );

        let second = update_streak(Some(today() - Duration::days(1)), 1, today());
        assert_eq!((second.new_streak, second.bonus_points, second.is_new_streak), (2, 0, false));

        let third = update_streak(Some(today() - Duration::days(1)), 2, today());
        assert_eq!((third.new_streak, third.bonus_points, third.is_new_streak), (3, 15, false));

        let broken = update_streak(Some(today() - Duration::days(3)), 3, today());
        assert_eq!((broken.new_streak, broken.bonus_points, broken.is_new_streak), (1, 0, true));
    }

    #[test]
    fn test_bonus_continues_past_threshold() {
        let update = update_streak(Some(today() - Duration::days(1)), 9, today());
        assert_eq!(update.new_streak, 10);
        assert_eq!(update.bonus_points, 15);
    }

    #[test]
    fn test_same_day_visit_keeps_streak() {
        let update = update_streak(Some(today()), 4, today());
        assert_eq!(update.new_streak, 4);
        assert_eq!(update.bonus_points, 0);
        assert!(!update.is_new_streak);
    }

    #[test]
    fn test_two_day_gap_resets() {
        let update = update_streak(Some(today() - Duration::days(2)), 5, today());
        assert_eq!(update.new_streak, 1);
        assert!(update.is_new_streak);
    }

    #[test]
    fn test_future_last_visit_treated_as_same_day() {
        let update = update_streak(Some(today() + Duration::days(1)), 2, today());
        assert_eq!(update.new_streak, 2);
        assert_eq!(update.bonus_points, 0);
    }

    #[test]
    fn test_apply_streak_tracks_longest() {
        let mut profile = DinerProfile::new("ana@example.com", None, Utc::now());
        profile.longest_streak = 5;
        profile.current_streak = 5;

        let reset = update_streak(Some(today() - Duration::days(4)), 5, today());
        apply_streak(&mut profile, &reset, today());
        assert_eq!(profile.current_streak, 1);
        assert_eq!(profile.longest_streak, 5);
        assert_eq!(profile.last_visit_date, Some(today()));

        profile.current_streak = 5;
        let next = today() + Duration::days(1);
        let extended = update_streak(profile.last_visit_date, 5, next);
        apply_streak(&mut profile, &extended, next);
        assert_eq!(profile.current_streak, 6);
        assert_eq!(profile.longest_streak, 6);
        assert!(profile.current_streak <= profile.longest_streak);
    }
}
