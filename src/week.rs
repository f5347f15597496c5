//! Sunday-aligned week bucketing for weekly tasks.
//!
//! Every weekly task belongs to the calendar week that starts on Sunday at
//! 00:00:00.000 UTC. [`WeekStart`] can only be built by normalizing a date, so
//! a value of that type is always on the boundary.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use serde::Serialize;

/// Sunday 00:00:00.000 UTC of the week containing `at`.
pub fn get_week_start(at: DateTime<Utc>) -> DateTime<Utc> {
    sunday_of(at.date_naive())
}

fn sunday_of(date: NaiveDate) -> DateTime<Utc> {
    let offset = i64::from(date.weekday().num_days_from_sunday());
    let sunday = date - Duration::days(offset);
    sunday.and_time(NaiveTime::MIN).and_utc()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct WeekStart(DateTime<Utc>);

impl WeekStart {
    /// The week containing the given instant.
    pub fn of(at: DateTime<Utc>) -> Self {
        Self(get_week_start(at))
    }

    /// The week containing the given calendar day.
    pub fn containing(date: NaiveDate) -> Self {
        Self(sunday_of(date))
    }

    pub fn current() -> Self {
        Self::of(Utc::now())
    }

    pub fn previous(self) -> Self {
        Self(self.0 - Duration::weeks(1))
    }

    pub fn next(self) -> Self {
        Self(self.0 + Duration::weeks(1))
    }

    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Parse a user-supplied day: `YYYY-MM-DD` or an RFC 3339 timestamp.
///
/// Timestamps are converted to UTC before the day is taken.
pub fn parse_day(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(day) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(day);
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc).date_naive())
}
