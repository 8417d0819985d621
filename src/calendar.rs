//! Study-calendar helpers.
//!
//! Seasons run on the calendar of a single reference time zone.  The
//! past-due cutoff used by the refund engine is computed here from a
//! fixed UTC offset, so the rest of the crate only ever deals in UTC
//! instants.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, Utc};

/// Offset of the study's reference zone (UTC+09:00).
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = 9;

/// Calendar anchored on a fixed UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StudyCalendar {
    offset: FixedOffset,
}

impl StudyCalendar {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Returns `None` when the offset is outside ±24 hours.
    pub fn from_utc_offset_hours(hours: i32) -> Option<Self> {
        hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .map(Self::new)
    }

    /// Local calendar date of `instant`.
    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.offset).date_naive()
    }

    /// Start of the local day containing `instant`.
    pub fn day_start(&self, instant: DateTime<Utc>) -> DateTime<Utc> {
        let local_midnight = self.local_date(instant).and_time(NaiveTime::MIN);
        local_midnight.and_utc() - Duration::seconds(i64::from(self.offset.local_minus_utc()))
    }

    /// Cutoff for the refund engine: problems assigned before this
    /// instant are past due.
    pub fn reference_day_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.day_start(now)
    }

    /// Formats the local date of `instant` as `YYYY-MM-DD`.
    pub fn format_date(&self, instant: DateTime<Utc>) -> String {
        self.local_date(instant).format("%Y-%m-%d").to_string()
    }
}

impl Default for StudyCalendar {
    fn default() -> Self {
        Self::from_utc_offset_hours(DEFAULT_UTC_OFFSET_HOURS)
            .unwrap_or_else(|| Self::new(Utc.fix()))
    }
}
