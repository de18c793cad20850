//! Graduate student records: program, status and enrollment dates.

use crate::domain::date_range::DateRange;
use crate::domain::error::ValidationError;
use chrono::NaiveDate;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Program {
    PhD,
    MscThesis,
    MscPracticum,
    MscCourseBased,
    PreMasters,
    MscComprehensive,
}

impl Program {
    pub const ALL: [Program; 6] = [
        Program::PhD,
        Program::MscThesis,
        Program::MscPracticum,
        Program::MscCourseBased,
        Program::PreMasters,
        Program::MscComprehensive,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Program::PhD => "P",
            Program::MscThesis => "M",
            Program::MscPracticum => "N",
            Program::MscCourseBased => "D",
            Program::PreMasters => "Z",
            Program::MscComprehensive => "C",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Program::PhD => "Ph.D.",
            Program::MscThesis => "M.Sc. Thesis",
            Program::MscPracticum => "M.Sc. Practicum",
            Program::MscCourseBased => "M.Sc. Course Based",
            Program::PreMasters => "Pre-Masters",
            Program::MscComprehensive => "M.Sc. Comprehensive",
        }
    }

    pub fn is_phd(&self) -> bool {
        matches!(self, Program::PhD)
    }

    pub fn is_msc(&self) -> bool {
        !self.is_phd()
    }
}

impl FromStr for Program {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        Program::ALL
            .into_iter()
            .find(|p| p.code().eq_ignore_ascii_case(code))
            .ok_or_else(|| ValidationError::UnknownProgram(code.to_string()))
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Pending,
    Current,
    AuthorizedWithdrawal,
    CompulsoryWithdrawal,
    VoluntaryWithdrawal,
    Graduated,
    Completed,
}

impl Status {
    pub const ALL: [Status; 7] = [
        Status::Pending,
        Status::Current,
        Status::AuthorizedWithdrawal,
        Status::CompulsoryWithdrawal,
        Status::VoluntaryWithdrawal,
        Status::Graduated,
        Status::Completed,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Status::Pending => "P",
            Status::Current => "S",
            Status::AuthorizedWithdrawal => "AW",
            Status::CompulsoryWithdrawal => "CW",
            Status::VoluntaryWithdrawal => "VW",
            Status::Graduated => "G",
            Status::Completed => "C",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Status::Pending => "Pending Student (not yet accepted)",
            Status::Current => "Current Student",
            Status::AuthorizedWithdrawal => "Authorized Withdrawal",
            Status::CompulsoryWithdrawal => "Compulsory Withdrawal",
            Status::VoluntaryWithdrawal => "Voluntary Withdrawal",
            Status::Graduated => "Graduated",
            Status::Completed => "Completed (Pre-MSc)",
        }
    }
}

impl FromStr for Status {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        Status::ALL
            .into_iter()
            .find(|st| st.code().eq_ignore_ascii_case(code))
            .ok_or_else(|| ValidationError::UnknownStatus(code.to_string()))
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// One person's enrollment in one program. A second degree is a second record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraduateStudent {
    pub id: i64,
    pub name: String,
    pub program: Program,
    pub status: Status,
    pub start_date: NaiveDate,
    pub defense_date: Option<NaiveDate>,
    pub graduation_date: Option<NaiveDate>,
    /// Unconfirmed graduation dates are tentative and never end the
    /// student's active window.
    pub graduation_date_confirmed: bool,
    pub active: bool,
    pub thesis_title: String,
}

impl GraduateStudent {
    pub fn new(id: i64, name: impl Into<String>, program: Program, start_date: NaiveDate) -> Self {
        Self {
            id,
            name: name.into(),
            program,
            status: Status::Current,
            start_date,
            defense_date: None,
            graduation_date: None,
            graduation_date_confirmed: false,
            active: true,
            thesis_title: String::new(),
        }
    }

    pub fn is_phd(&self) -> bool {
        self.program.is_phd()
    }

    pub fn is_msc(&self) -> bool {
        self.program.is_msc()
    }

    /// The graduation date, only when it has been confirmed.
    pub fn confirmed_graduation(&self) -> Option<NaiveDate> {
        self.graduation_date
            .filter(|_| self.graduation_date_confirmed)
    }

    /// Listing order: program code descending, then status code descending,
    /// then name.
    pub fn listing_order(a: &GraduateStudent, b: &GraduateStudent) -> Ordering {
        b.program
            .code()
            .cmp(a.program.code())
            .then_with(|| b.status.code().cmp(a.status.code()))
            .then_with(|| a.name.cmp(&b.name))
    }
}

impl fmt::Display for GraduateStudent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Which students a filter keeps, before any date logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StudentFilter {
    /// `None` keeps every status.
    pub status: Option<Status>,
    pub program: ProgramGroup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProgramGroup {
    #[default]
    Any,
    PhD,
    Msc,
}

impl ProgramGroup {
    pub fn admits(&self, program: Program) -> bool {
        match self {
            ProgramGroup::Any => true,
            ProgramGroup::PhD => program.is_phd(),
            ProgramGroup::Msc => program.is_msc(),
        }
    }
}

impl StudentFilter {
    /// Active records of current students.
    pub fn current() -> Self {
        Self {
            status: Some(Status::Current),
            program: ProgramGroup::Any,
        }
    }

    pub fn with_program(mut self, program: ProgramGroup) -> Self {
        self.program = program;
        self
    }

    pub fn any_status(mut self) -> Self {
        self.status = None;
        self
    }

    pub fn matches(&self, student: &GraduateStudent) -> bool {
        student.active
            && self.status.is_none_or(|s| student.status == s)
            && self.program.admits(student.program)
    }

    /// Matching students in listing order.
    pub fn apply<'a, I>(&self, students: I) -> Vec<&'a GraduateStudent>
    where
        I: IntoIterator<Item = &'a GraduateStudent>,
    {
        let mut kept: Vec<&GraduateStudent> =
            students.into_iter().filter(|s| self.matches(s)).collect();
        kept.sort_by(|a, b| GraduateStudent::listing_order(a, b));
        kept
    }
}

/// Active current or graduated students whose graduation date falls in
/// `range`, confirmed dates only unless `confirmed_only` is false. Ordered
/// by graduation date.
pub fn graduates<'a, I>(
    students: I,
    range: &DateRange,
    confirmed_only: bool,
) -> Vec<&'a GraduateStudent>
where
    I: IntoIterator<Item = &'a GraduateStudent>,
{
    let mut kept: Vec<&GraduateStudent> = students
        .into_iter()
        .filter(|s| s.active && matches!(s.status, Status::Current | Status::Graduated))
        .filter(|s| s.graduation_date.is_some_and(|g| range.contains(g)))
        .filter(|s| !confirmed_only || s.graduation_date_confirmed)
        .collect();
    kept.sort_by(|a, b| {
        a.graduation_date
            .cmp(&b.graduation_date)
            .then_with(|| a.name.cmp(&b.name))
    });
    kept
}
