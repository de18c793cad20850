//! Upcoming graduates and departmental directory eligibility.

use crate::domain::date_range::DateRange;
use crate::domain::error::ValidationError;
use crate::domain::student::{GraduateStudent, ProgramGroup, StudentFilter, graduates};
use chrono::{Days, NaiveDate};

/// Default span, in days from the first of the month, for upcoming graduates.
pub const DEFAULT_UPCOMING_GRADS_DAYS: u32 = 61;

/// Longest upcoming-graduates span accepted from configuration or the command line.
pub const MAX_UPCOMING_GRADS_DAYS: u32 = 3660;

/// Students graduating between the first of `today`'s month and `days` later.
pub fn upcoming_graduates(
    students: &[GraduateStudent],
    today: NaiveDate,
    days: u32,
    confirmed_only: bool,
) -> Result<Vec<&GraduateStudent>, ValidationError> {
    let range = DateRange::from_month_start(today, days)?;
    tracing::debug!(range = %range, confirmed_only, "looking up upcoming graduates");
    Ok(graduates(students, &range, confirmed_only))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectorySettings {
    /// Days before a confirmed graduation date at which a student leaves the
    /// directory. `None` disables the cutoff.
    pub graduation_date_cutoff: Option<u32>,
    /// Days after the defense a student stays listed. `None` disables it.
    pub defense_date_grace: Option<u32>,
}

impl Default for DirectorySettings {
    fn default() -> Self {
        Self {
            graduation_date_cutoff: Some(35),
            defense_date_grace: Some(14),
        }
    }
}

/// Active current students of `program` who belong in the directory today:
/// already started, not defended more than the grace period ago, and not
/// within the cutoff of a confirmed graduation.
pub fn directory_listing<'a>(
    students: &'a [GraduateStudent],
    program: ProgramGroup,
    today: NaiveDate,
    settings: &DirectorySettings,
) -> Vec<&'a GraduateStudent> {
    let cutoff_days = Days::new(u64::from(settings.graduation_date_cutoff.unwrap_or(0)));
    let grace_days = Days::new(u64::from(settings.defense_date_grace.unwrap_or(0)));
    let cutoff = today.checked_add_days(cutoff_days).unwrap_or(NaiveDate::MAX);
    let grace = today.checked_sub_days(grace_days).unwrap_or(NaiveDate::MIN);

    StudentFilter::current()
        .with_program(program)
        .apply(students)
        .into_iter()
        .filter(|s| s.defense_date.is_none_or(|defended| defended > grace))
        .filter(|s| s.confirmed_graduation().is_none_or(|g| g > cutoff))
        .filter(|s| s.start_date <= today)
        .collect()
}
