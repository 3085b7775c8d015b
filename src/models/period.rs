// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Weekly competition periods.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum PeriodStatus {
    Active,
    Closed,
}

/// A Monday to Sunday window during which points count toward a leaderboard.
///
/// Stored at `competition_periods/{id}`. Exactly one period is active at a
/// time; [`rollover`] is the only code path that changes statuses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CompetitionPeriod {
    pub id: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub start_date: NaiveDate,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub end_date: NaiveDate,
    pub status: PeriodStatus,
}

/// Monday and Sunday of the ISO week containing `date`.
pub fn week_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let monday = date - Duration::days(date.weekday().num_days_from_monday() as i64);
    (monday, monday + Duration::days(6))
}

impl CompetitionPeriod {
    /// The active period covering the week that contains `date`.
    pub fn for_week(date: NaiveDate) -> Self {
        let (start_date, end_date) = week_bounds(date);
        Self {
            id: format!("week-{}", start_date.format("%Y-%m-%d")),
            start_date,
            end_date,
            status: PeriodStatus::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == PeriodStatus::Active
    }
}

/// Outcome of advancing the competition calendar to `today`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rollover {
    /// The previously active period, now closed (absent if nothing expired)
    pub closed: Option<CompetitionPeriod>,
    /// The period that should be active for `today`
    pub active: CompetitionPeriod,
    /// Whether `active` still has to be written
    pub opened: bool,
}

/// Close `current` if it has ended and open the week containing `today`.
///
/// Calling this again on the same day is a no-op (`closed == None`,
/// `opened == false`).
pub fn rollover(current: Option<&CompetitionPeriod>, today: NaiveDate) -> Rollover {
    match current {
        Some(period) if period.is_active() && period.end_date >= today => Rollover {
            closed: None,
            active: period.clone(),
            opened: false,
        },
        Some(period) => {
            let mut closed = period.clone();
            closed.status = PeriodStatus::Closed;
            Rollover {
                closed: Some(closed),
                active: CompetitionPeriod::for_week(today),
                opened: true,
            }
        }
        None => Rollover {
            closed: None,
            active: CompetitionPeriod::for_week(today),
            opened: true,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_week_bounds_monday_to_sunday() {
        // 2026-10-21 is a Wednesday
        assert_eq!(
            week_bounds(date("2026-10-21")),
            (date("2026-10-19"), date("2026-10-25"))
        );
        assert_eq!(
            week_bounds(date("2026-10-19")),
            (date("2026-10-19"), date("2026-10-25"))
        );
        assert_eq!(
            week_bounds(date("2026-10-25")),
            (date("2026-10-19"), date("2026-10-25"))
        );
    }

    #[test]
    fn test_for_week_id_and_bounds() {
        let period = CompetitionPeriod::for_week(date("2026-10-23"));
        assert_eq!(period.id, "week-2026-10-19");
        assert!(period.is_active());
        assert_eq!(period.start_date, date("2026-10-19"));
        assert_eq!(period.end_date, date("2026-10-25"));
    }

    #[test]
    fn test_rollover_keeps_current_week() {
        let current = CompetitionPeriod::for_week(date("2026-10-19"));
        let result = rollover(Some(&current), date("2026-10-25"));
        assert!(result.closed.is_none());
        assert!(!result.opened);
        assert_eq!(result.active, current);
    }

    #[test]
    fn test_rollover_closes_expired_week() {
        let current = CompetitionPeriod::for_week(date("2026-10-19"));
        let result = rollover(Some(&current), date("2026-10-27"));

        let closed = result.closed.expect("expired period should close");
        assert_eq!(closed.id, "week-2026-10-19");
        assert_eq!(closed.status, PeriodStatus::Closed);
        assert!(result.opened);
        assert_eq!(result.active.id, "week-2026-10-26");
    }

    #[test]
    fn test_rollover_opens_first_period() {
        let result = rollover(None, date("2026-10-21"));
        assert!(result.closed.is_none());
        assert!(result.opened);
        assert_eq!(result.active.id, "week-2026-10-19");
    }
}
