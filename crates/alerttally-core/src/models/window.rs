//! Query time windows

use chrono::{DateTime, Datelike, Days, Duration, NaiveTime, Utc};
use serde::Serialize;

use crate::error::{Error, Result};

/// Timestamp layout expected by the alert search filter
pub const API_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Layout of month keys in the report
pub const MONTH_FORMAT: &str = "%Y-%m";

/// A half-open `[from, to)` slice of time bounding one query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    /// Inclusive start
    pub from: DateTime<Utc>,
    /// Exclusive end
    pub to: DateTime<Utc>,
}

impl TimeWindow {
    /// Create a window starting at `from` with the given width, `None` when
    /// the end is not representable
    pub fn starting_at(from: DateTime<Utc>, width: Duration) -> Option<Self> {
        let to = from.checked_add_signed(width)?;
        Some(Self { from, to })
    }

    /// Contiguous windows of `width` from `start` until a window would start
    /// at or after `now`. The last window may extend past `now`. The series
    /// also ends where a window end would overflow.
    pub fn series(
        start: DateTime<Utc>,
        now: DateTime<Utc>,
        width: Duration,
    ) -> impl Iterator<Item = TimeWindow> {
        debug_assert!(width > Duration::zero());
        std::iter::successors(Self::starting_at(start, width), move |prev| {
            Self::starting_at(prev.to, width)
        })
        .take_while(move |window| window.from < now)
    }

    /// Report month this window belongs to, taken from its start
    pub fn month_key(&self) -> String {
        self.from.format(MONTH_FORMAT).to_string()
    }

    /// `dateFrom` value for the search filter
    pub fn date_from(&self) -> String {
        self.from.format(API_TIMESTAMP_FORMAT).to_string()
    }

    /// `dateTo` value for the search filter
    pub fn date_to(&self) -> String {
        self.to.format(API_TIMESTAMP_FORMAT).to_string()
    }
}

impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.date_from(), self.date_to())
    }
}

/// Midnight of the first day of `now`'s month, minus `lookback_days`
pub fn lookback_start(now: DateTime<Utc>, lookback_days: u32) -> Result<DateTime<Utc>> {
    now.date_naive()
        .checked_sub_days(Days::new(u64::from(now.day0())))
        .and_then(|first_of_month| {
            first_of_month.checked_sub_days(Days::new(u64::from(lookback_days)))
        })
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
        .ok_or_else(|| {
            Error::config(format!("lookback of {lookback_days} days is out of range"))
        })
}
