//! Whether a student counts as "in program" for a report window.
//!
//! A student is in range when any one of six independent clauses holds. The
//! clauses overlap on purpose; each is kept separate so it can be checked
//! and tested on its own. Confirmed graduation dates are shifted forward by
//! a configurable number of days so students near graduation still appear.

use crate::domain::date_range::DateRange;
use crate::domain::student::{GraduateStudent, Status};
use chrono::{Duration, NaiveDate};
use std::collections::HashSet;
use std::fmt;

/// Default grace period, in days, added to confirmed graduation dates.
pub const DEFAULT_GRAD_DATE_ADJUSTMENT: i64 = 60;

/// Largest adjustment accepted from configuration or the command line.
pub const MAX_GRAD_DATE_ADJUSTMENT: i64 = 3660;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivityClause {
    /// Started inside the window.
    StartedInRange,
    /// Confirmed (adjusted) graduation inside the window.
    GraduatedInRange,
    /// Confirmed tenure overlaps the window.
    TenureOverlaps,
    /// Current student with no graduation date who started by the end of the window.
    OpenEnded,
    /// Current student with a tentative graduation date who started by the end of the window.
    TentativeGraduation,
    /// Confirmed tenure contains the whole window.
    TenureContains,
}

impl ActivityClause {
    pub const ALL: [ActivityClause; 6] = [
        ActivityClause::StartedInRange,
        ActivityClause::GraduatedInRange,
        ActivityClause::TenureOverlaps,
        ActivityClause::OpenEnded,
        ActivityClause::TentativeGraduation,
        ActivityClause::TenureContains,
    ];

    pub fn holds(&self, student: &GraduateStudent, window: &ActivityWindow) -> bool {
        let range = &window.range;
        let adjusted = window.adjusted_graduation(student);
        match self {
            ActivityClause::StartedInRange => range.contains(student.start_date),
            ActivityClause::GraduatedInRange => adjusted.is_some_and(|g| range.contains(g)),
            ActivityClause::TenureOverlaps => {
                student.start_date <= range.end() && adjusted.is_some_and(|g| g >= range.start())
            }
            ActivityClause::OpenEnded => {
                student.graduation_date.is_none()
                    && student.status == Status::Current
                    && student.start_date <= range.end()
            }
            ActivityClause::TentativeGraduation => {
                student.graduation_date.is_some()
                    && !student.graduation_date_confirmed
                    && student.status == Status::Current
                    && student.start_date <= range.end()
            }
            ActivityClause::TenureContains => {
                student.start_date <= range.start() && adjusted.is_some_and(|g| g >= range.end())
            }
        }
    }
}

impl fmt::Display for ActivityClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActivityClause::StartedInRange => "started in range",
            ActivityClause::GraduatedInRange => "graduated in range",
            ActivityClause::TenureOverlaps => "tenure overlaps range",
            ActivityClause::OpenEnded => "current, no graduation date",
            ActivityClause::TentativeGraduation => "current, tentative graduation date",
            ActivityClause::TenureContains => "tenure contains range",
        };
        f.write_str(name)
    }
}

/// A report window together with the graduation-date adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityWindow {
    pub range: DateRange,
    pub grad_date_adjustment: i64,
}

impl ActivityWindow {
    pub fn new(range: DateRange, grad_date_adjustment: i64) -> Self {
        Self {
            range,
            grad_date_adjustment,
        }
    }

    /// The confirmed graduation date shifted by the adjustment, or `None`
    /// when there is no confirmed date or the shift leaves the calendar.
    pub fn adjusted_graduation(&self, student: &GraduateStudent) -> Option<NaiveDate> {
        let shift = Duration::try_days(self.grad_date_adjustment)?;
        student
            .confirmed_graduation()
            .and_then(|g| g.checked_add_signed(shift))
    }

    /// True when any clause holds.
    pub fn includes(&self, student: &GraduateStudent) -> bool {
        ActivityClause::ALL.iter().any(|c| c.holds(student, self))
    }

    /// Every clause the student satisfies, in clause order.
    pub fn matching_clauses(&self, student: &GraduateStudent) -> Vec<ActivityClause> {
        ActivityClause::ALL
            .into_iter()
            .filter(|c| c.holds(student, self))
            .collect()
    }

    /// Students in program during the window, each at most once, in input order.
    pub fn filter<'a, I>(&self, students: I) -> Vec<&'a GraduateStudent>
    where
        I: IntoIterator<Item = &'a GraduateStudent>,
    {
        let mut seen = HashSet::new();
        students
            .into_iter()
            .filter(|s| self.includes(s))
            .filter(|s| seen.insert(s.id))
            .collect()
    }
}
