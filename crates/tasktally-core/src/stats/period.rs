//! Date ranges and selectable statistics periods.
//!
//! A [`DateRange`] is a closed interval in UTC. Membership tests widen the
//! interval by one calendar day on each side so that time-of-day never
//! pushes a record out of the window it visibly belongs to.

use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ValidationError;

/// Closed interval `[start, end]` in UTC.
///
/// Construction validates the ordering; an inverted pair is rejected with
/// [`ValidationError::InvalidDateRange`] instead of producing a range that
/// silently matches nothing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl DateRange {
    /// Create a range, rejecting `start > end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, ValidationError> {
        if start > end {
            return Err(ValidationError::InvalidDateRange { start, end });
        }
        Ok(DateRange { start, end })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Membership once each side is widened by one day:
    /// `start - 1d < ts < end + 1d`.
    pub fn contains_padded(&self, ts: DateTime<Utc>) -> bool {
        ts > self.start - Duration::days(1) && ts < self.end + Duration::days(1)
    }
}

/// Selectable statistics period.
///
/// Trailing periods run from "same day N days/months/years ago" through
/// the end of today. A custom period keeps its start as given and
/// normalizes its end to 23:59:59 of that day.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StatsPeriod {
    LastWeek,
    LastMonth,
    LastThreeMonths,
    LastSixMonths,
    LastYear,
    Custom {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

impl StatsPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatsPeriod::LastWeek => "last_week",
            StatsPeriod::LastMonth => "last_month",
            StatsPeriod::LastThreeMonths => "last_three_months",
            StatsPeriod::LastSixMonths => "last_six_months",
            StatsPeriod::LastYear => "last_year",
            StatsPeriod::Custom { .. } => "custom",
        }
    }

    /// Resolve against the current clock.
    pub fn resolve(&self) -> Result<DateRange, ValidationError> {
        self.resolve_at(Utc::now())
    }

    /// Resolve against an explicit `now`.
    ///
    /// Month and year subtraction clamp the day of month the way chrono
    /// does ("May 31 minus 1 month" is April 30).
    pub fn resolve_at(&self, now: DateTime<Utc>) -> Result<DateRange, ValidationError> {
        let start = match self {
            StatsPeriod::LastWeek => now - Duration::days(7),
            StatsPeriod::LastMonth => back_months(now, 1)?,
            StatsPeriod::LastThreeMonths => back_months(now, 3)?,
            StatsPeriod::LastSixMonths => back_months(now, 6)?,
            StatsPeriod::LastYear => back_months(now, 12)?,
            StatsPeriod::Custom { start, end } => {
                return DateRange::new(*start, end_of_day(*end));
            }
        };
        DateRange::new(start, end_of_day(now))
    }
}

impl Default for StatsPeriod {
    fn default() -> Self {
        StatsPeriod::LastWeek
    }
}

impl FromStr for StatsPeriod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "last_week" => Ok(StatsPeriod::LastWeek),
            "last_month" => Ok(StatsPeriod::LastMonth),
            "last_three_months" => Ok(StatsPeriod::LastThreeMonths),
            "last_six_months" => Ok(StatsPeriod::LastSixMonths),
            "last_year" => Ok(StatsPeriod::LastYear),
            other => Err(ValidationError::InvalidValue {
                field: "period".to_string(),
                message: format!("unknown period '{other}'"),
            }),
        }
    }
}

fn back_months(now: DateTime<Utc>, months: u32) -> Result<DateTime<Utc>, ValidationError> {
    now.checked_sub_months(Months::new(months))
        .ok_or_else(|| ValidationError::InvalidValue {
            field: "period".to_string(),
            message: format!("cannot go back {months} months from {now}"),
        })
}

fn end_of_day(ts: DateTime<Utc>) -> DateTime<Utc> {
    match ts.date_naive().and_hms_opt(23, 59, 59) {
        Some(end) => end.and_utc(),
        None => ts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc_datetime(year: i32, month: u32, day: u32, hour: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, hour, min, 0).unwrap()
    }

    #[test]
    fn inverted_range_is_rejected() {
        let start = utc_datetime(2026, 3, 10, 0, 0);
        let end = utc_datetime(2026, 3, 1, 0, 0);
        let err = DateRange::new(start, end).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidDateRange { .. }));
    }

    #[test]
    fn padded_membership_widens_one_day_each_side() {
        let range = DateRange::new(
            utc_datetime(2026, 3, 10, 0, 0),
            utc_datetime(2026, 3, 12, 0, 0),
        )
        .unwrap();

        // Late the day before start is inside the padded window.
        assert!(range.contains_padded(utc_datetime(2026, 3, 9, 23, 0)));
        // Exactly one day before start sits on the open bound and is out.
        assert!(!range.contains_padded(utc_datetime(2026, 3, 9, 0, 0)));
        assert!(range.contains_padded(utc_datetime(2026, 3, 12, 8, 0)));
        assert!(!range.contains_padded(utc_datetime(2026, 3, 13, 0, 0)));
    }

    #[test]
    fn last_week_runs_to_end_of_today() {
        let now = utc_datetime(2026, 3, 10, 14, 30);
        let range = StatsPeriod::LastWeek.resolve_at(now).unwrap();
        assert_eq!(range.start(), utc_datetime(2026, 3, 3, 14, 30));
        assert_eq!(range.end(), Utc.with_ymd_and_hms(2026, 3, 10, 23, 59, 59).unwrap());
    }

    #[test]
    fn month_subtraction_clamps_day_of_month() {
        // May 31 minus 1 month clamps to April 30 (chrono arithmetic).
        let now = utc_datetime(2026, 5, 31, 10, 0);
        let range = StatsPeriod::LastMonth.resolve_at(now).unwrap();
        assert_eq!(range.start(), utc_datetime(2026, 4, 30, 10, 0));

        // Three months back from May 31 lands on Feb 28 in a non-leap year.
        let range = StatsPeriod::LastThreeMonths.resolve_at(now).unwrap();
        assert_eq!(range.start(), utc_datetime(2026, 2, 28, 10, 0));
    }

    #[test]
    fn last_year_goes_back_twelve_months() {
        let now = utc_datetime(2026, 3, 10, 9, 0);
        let range = StatsPeriod::LastYear.resolve_at(now).unwrap();
        assert_eq!(range.start(), utc_datetime(2025, 3, 10, 9, 0));
    }

    #[test]
    fn custom_end_is_normalized_to_end_of_day() {
        let period = StatsPeriod::Custom {
            start: utc_datetime(2026, 2, 1, 8, 0),
            end: utc_datetime(2026, 2, 10, 8, 0),
        };
        let range = period.resolve_at(utc_datetime(2026, 3, 1, 0, 0)).unwrap();
        assert_eq!(range.start(), utc_datetime(2026, 2, 1, 8, 0));
        assert_eq!(range.end(), Utc.with_ymd_and_hms(2026, 2, 10, 23, 59, 59).unwrap());
    }

    #[test]
    fn custom_inverted_range_is_rejected() {
        let period = StatsPeriod::Custom {
            start: utc_datetime(2026, 2, 10, 0, 0),
            end: utc_datetime(2026, 2, 1, 0, 0),
        };
        assert!(period.resolve_at(Utc::now()).is_err());
    }

    #[test]
    fn period_labels_parse_back() {
        for period in [
            StatsPeriod::LastWeek,
            StatsPeriod::LastMonth,
            StatsPeriod::LastThreeMonths,
            StatsPeriod::LastSixMonths,
            StatsPeriod::LastYear,
        ] {
            assert_eq!(period.as_str().parse::<StatsPeriod>().unwrap(), period);
        }
        assert!("custom".parse::<StatsPeriod>().is_err());
    }
}
