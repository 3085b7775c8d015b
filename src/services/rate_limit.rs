// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Anti-spam rules for visit and review submissions.
//!
//! All checks are pure: callers pass the diner's history and the current
//! instant. Boundary values pass (exactly 24 hours, 7 days or 30 days
//! elapsed is allowed).

use chrono::{DateTime, Utc};
use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Minimum hours between two visits to the same restaurant.
pub const VISIT_COOLDOWN_HOURS: f64 = 24.0;
/// Minimum days between two reviews of the same restaurant.
pub const REVIEW_COOLDOWN_DAYS: f64 = 7.0;
/// Maximum reviews per diner per local day.
pub const MAX_REVIEWS_PER_DAY: u32 = 3;
/// A review needs a visit to the restaurant within this many days.
pub const REVIEW_VISIT_WINDOW_DAYS: f64 = 30.0;

const MS_PER_HOUR: f64 = 3_600_000.0;
const MS_PER_DAY: f64 = 86_400_000.0;

/// Decision returned to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RateLimitResult {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Hours until the action is permitted again, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u32>,
    /// False when waiting will not help (the diner must log a visit first)
    pub can_retry: bool,
}

impl RateLimitResult {
    pub fn allowed() -> Self {
        Self {
            allowed: true,
            reason: None,
            retry_after: None,
            can_retry: true,
        }
    }

    fn denied(reason: String, retry_after: Option<u32>, can_retry: bool) -> Self {
        Self {
            allowed: false,
            reason: Some(reason),
            retry_after,
            can_retry,
        }
    }
}

fn elapsed_ms(since: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    now.signed_duration_since(since).num_milliseconds() as f64
}

fn plural(count: u32, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{} {}", count, singular)
    } else {
        format!("{} {}", count, plural)
    }
}

/// Check whether a diner may log another visit to a restaurant.
///
/// `last_visit` is the diner's most recent visit to this specific restaurant.
pub fn check_visit_rate_limit(
    last_visit: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> RateLimitResult {
    let Some(last_visit) = last_visit else {
        return RateLimitResult::allowed();
    };

    let hours_elapsed = elapsed_ms(last_visit, now) / MS_PER_HOUR;
    if hours_elapsed < VISIT_COOLDOWN_HOURS {
        let hours_left = (VISIT_COOLDOWN_HOURS - hours_elapsed).ceil() as u32;
        return RateLimitResult::denied(
            format!(
                "You already logged a visit here recently. Try again in {}.",
                plural(hours_left, "hour", "hours")
            ),
            Some(hours_left),
            true,
        );
    }

    RateLimitResult::allowed()
}

/// Check whether a diner may review a restaurant.
///
/// Gates run in a fixed order and the first failure wins: per-restaurant
/// cooldown, daily cap, then the recent-visit requirement.
pub fn check_review_rate_limit(
    last_review: Option<DateTime<Utc>>,
    today_review_count: u32,
    last_visit: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> RateLimitResult {
    if let Some(last_review) = last_review {
        let days_elapsed = elapsed_ms(last_review, now) / MS_PER_DAY;
        if days_elapsed < REVIEW_COOLDOWN_DAYS {
            let days_left = (REVIEW_COOLDOWN_DAYS - days_elapsed).ceil() as u32;
            return RateLimitResult::denied(
                format!(
                    "You already reviewed this restaurant recently. You can review it again in {}.",
                    plural(days_left, "day", "days")
                ),
                Some(days_left * 24),
                true,
            );
        }
    }

    if today_review_count >= MAX_REVIEWS_PER_DAY {
        return RateLimitResult::denied(
            format!(
                "You've reached the daily limit of {} reviews. Try again tomorrow.",
                MAX_REVIEWS_PER_DAY
            ),
            None,
            true,
        );
    }

    match last_visit {
        None => RateLimitResult::denied(
            "Log a visit to this restaurant before reviewing it.".to_string(),
            None,
            false,
        ),
        Some(last_visit)
            if elapsed_ms(last_visit, now) / MS_PER_DAY > REVIEW_VISIT_WINDOW_DAYS =>
        {
            RateLimitResult::denied(
                format!(
                    "Your last visit was more than {} days ago. Log a new visit to review this restaurant.",
                    REVIEW_VISIT_WINDOW_DAYS as u32
                ),
                None,
                false,
            )
        }
        Some(_) => RateLimitResult::allowed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_first_visit_allowed() {
        assert!(check_visit_rate_limit(None, now()).allowed);
    }

    #[test]
    fn test_visit_exactly_24_hours_allowed() {
        let result = check_visit_rate_limit(Some(now() - Duration::hours(24)), now());
        assert!(result.allowed);
        assert!(result.reason.is_none());
    }

    #[test]
    fn test_visit_just_under_24_hours_denied() {
        let last = now() - (Duration::hours(23) + Duration::minutes(59));
        let result = check_visit_rate_limit(Some(last), now());

        assert!(!result.allowed);
        assert_eq!(result.retry_after, Some(1));
        assert!(result.can_retry);
        let reason = result.reason.unwrap();
        assert!(reason.contains("1 hour."), "unexpected reason: {}", reason);
    }

    #[test]
    fn test_visit_denial_uses_plural_hours() {
        let result = check_visit_rate_limit(Some(now() - Duration::hours(2)), now());
        assert_eq!(result.retry_after, Some(22));
        assert!(result.reason.unwrap().contains("22 hours"));
    }

    fn recent_visit() -> Option<DateTime<Utc>> {
        Some(now() - Duration::days(1))
    }

    #[test]
    fn test_review_cooldown_boundary() {
        let exactly_seven = check_review_rate_limit(
            Some(now() - Duration::days(7)),
            0,
            recent_visit(),
            now(),
        );
        assert!(exactly_seven.allowed);

        let six_days = check_review_rate_limit(
            Some(now() - Duration::days(6)),
            0,
            recent_visit(),
            now(),
        );
        assert!(!six_days.allowed);
        assert_eq!(six_days.retry_after, Some(24));
        assert!(six_days.can_retry);
        assert!(six_days.reason.unwrap().contains("1 day."));
    }

    #[test]
    fn test_review_daily_cap() {
        let capped = check_review_rate_limit(None, 3, recent_visit(), now());
        assert!(!capped.allowed);
        assert!(capped.can_retry);
        assert_eq!(capped.retry_after, None);

        let under_cap = check_review_rate_limit(None, 2, recent_visit(), now());
        assert!(under_cap.allowed);
    }

    #[test]
    fn test_review_cooldown_checked_before_cap() {
        let result = check_review_rate_limit(
            Some(now() - Duration::days(1)),
            3,
            recent_visit(),
            now(),
        );
        assert_eq!(result.retry_after, Some(6 * 24));
    }

    #[test]
    fn test_review_requires_visit() {
        let result = check_review_rate_limit(None, 0, None, now());
        assert!(!result.allowed);
        assert!(!result.can_retry);
    }

    #[test]
    fn test_review_visit_window_boundary() {
        let exactly_thirty =
            check_review_rate_limit(None, 0, Some(now() - Duration::days(30)), now());
        assert!(exactly_thirty.allowed);

        let stale = check_review_rate_limit(
            None,
            0,
            Some(now() - Duration::days(30) - Duration::seconds(1)),
            now(),
        );
        assert!(!stale.allowed);
        assert!(!stale.can_retry);
        assert_eq!(stale.retry_after, None);
    }

    #[test]
    fn test_serializes_without_empty_fields() {
        let json = serde_json::to_value(RateLimitResult::allowed()).unwrap();
        assert_eq!(json, serde_json::json!({ "allowed": true, "can_retry": true }));
    }
}
