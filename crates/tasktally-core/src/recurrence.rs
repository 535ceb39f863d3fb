//! Recurrence rules and reminder time derivation.
//!
//! A [`RecurrenceRule`] turns a repetition pattern into the next concrete
//! due date-time. Times of day are stored as `HH:mm` strings and weekdays
//! as `0=Sun ... 6=Sat`, matching how rules are persisted. Delivery of
//! reminders is out of scope; this module only computes fire times.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Calendar-based repetition rule with a time of day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecurrenceRule {
    /// Every day at `at`
    Daily { at: String }, // HH:mm
    /// On the given weekdays at `at`
    Weekly { days: Vec<u8>, at: String }, // 0=Sun ... 6=Sat
    /// On a day of the month at `at`; overflow clamps to month end
    Monthly { day: u32, at: String },
    /// Once a year at `at`; Feb 29 clamps in non-leap years
    Yearly { month: u32, day: u32, at: String },
}

impl RecurrenceRule {
    /// Next occurrence strictly after `after`, or `None` if the rule is
    /// malformed (bad time string, empty weekday set, day out of range).
    pub fn next_occurrence(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let at = parse_hhmm(self.time_of_day())?;

        match self {
            RecurrenceRule::Daily { .. } => {
                let candidate = after.date_naive().and_time(at).and_utc();
                if candidate > after {
                    Some(candidate)
                } else {
                    Some((after.date_naive() + Duration::days(1)).and_time(at).and_utc())
                }
            }
            RecurrenceRule::Weekly { days, .. } => {
                if days.is_empty() || days.iter().any(|d| *d > 6) {
                    return None;
                }
                for offset in 0..=7 {
                    let date = after.date_naive() + Duration::days(offset);
                    let weekday = date.weekday().num_days_from_sunday() as u8;
                    let candidate = date.and_time(at).and_utc();
                    if days.contains(&weekday) && candidate > after {
                        return Some(candidate);
                    }
                }
                None
            }
            RecurrenceRule::Monthly { day, .. } => {
                if *day == 0 || *day > 31 {
                    return None;
                }
                let mut year = after.year();
                let mut month = after.month();
                for _ in 0..2 {
                    let clamped = (*day).min(days_in_month(year, month));
                    let candidate = NaiveDate::from_ymd_opt(year, month, clamped)?
                        .and_time(at)
                        .and_utc();
                    if candidate > after {
                        return Some(candidate);
                    }
                    if month == 12 {
                        year += 1;
                        month = 1;
                    } else {
                        month += 1;
                    }
                }
                None
            }
            RecurrenceRule::Yearly { month, day, .. } => {
                if *month == 0 || *month > 12 || *day == 0 || *day > 31 {
                    return None;
                }
                for year in [after.year(), after.year() + 1] {
                    let clamped = (*day).min(days_in_month(year, *month));
                    let candidate = NaiveDate::from_ymd_opt(year, *month, clamped)?
                        .and_time(at)
                        .and_utc();
                    if candidate > after {
                        return Some(candidate);
                    }
                }
                None
            }
        }
    }

    fn time_of_day(&self) -> &str {
        match self {
            RecurrenceRule::Daily { at }
            | RecurrenceRule::Weekly { at, .. }
            | RecurrenceRule::Monthly { at, .. }
            | RecurrenceRule::Yearly { at, .. } => at,
        }
    }
}

/// Reminder fire times for a due date-time.
///
/// Each offset is minutes before the due time. Fire times already in the
/// past at `now` are dropped; the result is sorted and de-duplicated.
pub fn reminder_times(
    due: DateTime<Utc>,
    offsets_min: &[i64],
    now: DateTime<Utc>,
) -> Vec<DateTime<Utc>> {
    let mut times: Vec<DateTime<Utc>> = offsets_min
        .iter()
        .map(|offset| due - Duration::minutes(*offset))
        .filter(|fire| *fire > now)
        .collect();
    times.sort();
    times.dedup();
    times
}

fn parse_hhmm(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M").ok()
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    first_of_next
        .and_then(|date| date.pred_opt())
        .map(|date| date.day())
        .unwrap_or(28)
}
