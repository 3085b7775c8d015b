// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting and local day boundaries.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Serde adapter storing timestamps as second-precision RFC3339 strings.
///
/// Firestore string comparisons on these fields are chronological because
/// every value has the same width and a `Z` suffix.
pub mod rfc3339_secs {
    use super::format_utc_rfc3339;
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format_utc_rfc3339(*date))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }

    /// Same as the parent module for optional fields.
    pub mod option {
        use super::format_utc_rfc3339;
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            date: &Option<DateTime<Utc>>,
            s: S,
        ) -> Result<S::Ok, S::Error> {
            match date {
                Some(date) => s.serialize_some(&format_utc_rfc3339(*date)),
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            d: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            Option::<String>::deserialize(d)?
                .map(|raw| {
                    DateTime::parse_from_rfc3339(&raw)
                        .map(|dt| dt.with_timezone(&Utc))
                        .map_err(serde::de::Error::custom)
                })
                .transpose()
        }
    }
}

/// Converts instants into calendar days for the daily review cap and streaks.
///
/// Both rules share one boundary so "today" never means two different
/// things within a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayBoundary {
    offset: FixedOffset,
}

impl Default for DayBoundary {
    fn default() -> Self {
        Self::utc()
    }
}

impl DayBoundary {
    pub fn utc() -> Self {
        Self { offset: Utc.fix() }
    }

    /// Build a boundary from a UTC offset in minutes (east positive).
    ///
    /// Returns `None` when the offset is outside ±14 hours.
    pub fn from_offset_minutes(minutes: i32) -> Option<Self> {
        if minutes.abs() > 14 * 60 {
            return None;
        }
        FixedOffset::east_opt(minutes * 60).map(|offset| Self { offset })
    }

    pub fn offset_minutes(&self) -> i32 {
        self.offset.local_minus_utc() / 60
    }

    /// Calendar date of `now` on the local clock.
    pub fn local_date(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.offset).date_naive()
    }

    /// UTC instants `[start, end)` covering the local calendar day `date`.
    pub fn day_range(&self, date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
        let local_midnight = date.and_time(NaiveTime::MIN).and_utc();
        let start = local_midnight - Duration::seconds(self.offset.local_minus_utc() as i64);
        (start, start + Duration::days(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_has_z_suffix_and_no_fraction() {
        let date = Utc.with_ymd_and_hms(2026, 3, 2, 9, 5, 7).unwrap()
            + Duration::milliseconds(450);
        assert_eq!(format_utc_rfc3339(date), "2026-03-02T09:05:07Z");
    }

    #[test]
    fn test_local_date_respects_offset() {
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 23, 30, 0).unwrap();
        let pacific = DayBoundary::from_offset_minutes(-8 * 60).unwrap();
        let tokyo = DayBoundary::from_offset_minutes(9 * 60).unwrap();

        assert_eq!(DayBoundary::utc().local_date(now), now.date_naive());
        assert_eq!(pacific.local_date(now).to_string(), "2026-03-02");
        assert_eq!(tokyo.local_date(now).to_string(), "2026-03-03");
    }

    #[test]
    fn test_day_range_for_offset() {
        let boundary = DayBoundary::from_offset_minutes(-8 * 60).unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let (start, end) = boundary.day_range(date);

        assert_eq!(format_utc_rfc3339(start), "2026-03-02T08:00:00Z");
        assert_eq!(format_utc_rfc3339(end), "2026-03-03T08:00:00Z");
    }

    #[test]
    fn test_rejects_out_of_range_offset() {
        assert!(DayBoundary::from_offset_minutes(15 * 60).is_none());
        assert!(DayBoundary::from_offset_minutes(-14 * 60).is_some());
    }
}
