//! Closed, inclusive date intervals used as report windows.

use crate::domain::error::ValidationError;
use chrono::{Datelike, Days, Duration, NaiveDate};
use std::fmt;

/// A closed date interval `[start, end]`; both ends are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ValidationError> {
        if start > end {
            return Err(ValidationError::InvertedRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// A single-day range.
    pub fn day(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    /// `[date, date + days]`, the window used for upcoming-graduate lookups.
    pub fn starting_at(date: NaiveDate, days: u32) -> Result<Self, ValidationError> {
        let end = date
            .checked_add_days(Days::new(u64::from(days)))
            .ok_or(ValidationError::WindowOutOfRange { start: date, days })?;
        Ok(Self { start: date, end })
    }

    /// The range from the first day of `date`'s month spanning `days` days.
    pub fn from_month_start(date: NaiveDate, days: u32) -> Result<Self, ValidationError> {
        let first = date.with_day(1).unwrap_or(date);
        Self::starting_at(first, days)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of calendar days covered, always at least 1.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// True when the two closed intervals share at least one day.
    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// The shared days of two ranges, if any.
    pub fn intersection(&self, other: &DateRange) -> Option<DateRange> {
        if !self.overlaps(other) {
            return None;
        }
        Some(DateRange {
            start: self.start.max(other.start),
            end: self.end.min(other.end),
        })
    }

    /// Split into `[start, at - 1]` and `[at, end]`. `at` must lie strictly
    /// after `start` and no later than `end`.
    pub fn split_at(&self, at: NaiveDate) -> Option<(DateRange, DateRange)> {
        if at <= self.start || at > self.end {
            return None;
        }
        Some((
            DateRange {
                start: self.start,
                end: at - Duration::days(1),
            },
            DateRange { start: at, end: self.end },
        ))
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// The default academic-year reporting window: September 1 to August 31,
/// with the year starting in September of the previous calendar year until
/// the end of August.
pub fn academic_year(today: NaiveDate) -> DateRange {
    let start_year = if today.month() <= 8 {
        today.year() - 1
    } else {
        today.year()
    };
    let start = NaiveDate::from_ymd_opt(start_year, 9, 1).unwrap_or(today);
    let end = NaiveDate::from_ymd_opt(start_year + 1, 8, 31).unwrap_or(today);
    DateRange { start, end }
}
