//! Report sheets built from funding tables.
//!
//! A [`Sheet`] is a list of rows of typed cells, ready for a spreadsheet
//! writer. Two reports are produced here:
//!
//! - the funding report: prorated funding per student and source over a
//!   window, grouped into PhD and MSc students with sub-totals and a grand
//!   total row;
//! - the current-totals report: total funding to date per current student.

use crate::domain::aggregate::{FundingTable, SkippedFunding};
use crate::domain::date_range::DateRange;
use crate::domain::enrollment::{ActivityWindow, DEFAULT_GRAD_DATE_ADJUSTMENT};
use crate::domain::error::ValidationError;
use crate::domain::funding::{
    active_sources, earliest_start_date, latest_end_date, sum_all, sum_for_range, zero_amount,
};
use crate::domain::records::RecordSet;
use crate::domain::student::{GraduateStudent, ProgramGroup, StudentFilter};
use chrono::{Duration, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Empty,
    Text(String),
    Date(NaiveDate),
    Amount(Decimal),
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Text(s) => f.write_str(s),
            Cell::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Cell::Amount(a) => write!(
                f,
                "{:.2}",
                a.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
            ),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<NaiveDate> for Cell {
    fn from(d: NaiveDate) -> Self {
        Cell::Date(d)
    }
}

impl From<Option<NaiveDate>> for Cell {
    fn from(d: Option<NaiveDate>) -> Self {
        d.map_or(Cell::Empty, Cell::Date)
    }
}

impl From<Decimal> for Cell {
    fn from(a: Decimal) -> Self {
        Cell::Amount(a)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sheet {
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    pub fn push(&mut self, row: Vec<Cell>) {
        self.rows.push(row);
    }

    pub fn push_blank(&mut self) {
        self.rows.push(Vec::new());
    }

    /// The first row whose first cell reads `label`.
    pub fn find_row(&self, label: &str) -> Option<&[Cell]> {
        self.rows
            .iter()
            .find(|r| matches!(r.first(), Some(Cell::Text(t)) if t == label))
            .map(|r| r.as_slice())
    }
}

/// Student attributes that can be added as columns to the funding report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtraField {
    Program,
    Status,
    StartDate,
    DefenseDate,
    GraduationDate,
    ThesisTitle,
}

impl ExtraField {
    pub fn title(&self) -> &'static str {
        match self {
            ExtraField::Program => "Program",
            ExtraField::Status => "Status",
            ExtraField::StartDate => "Start Date",
            ExtraField::DefenseDate => "Defense Date",
            ExtraField::GraduationDate => "Graduation Date",
            ExtraField::ThesisTitle => "Thesis Title",
        }
    }

    pub fn value(&self, student: &GraduateStudent) -> Cell {
        match self {
            ExtraField::Program => student.program.display_name().into(),
            ExtraField::Status => student.status.display_name().into(),
            ExtraField::StartDate => student.start_date.into(),
            ExtraField::DefenseDate => student.defense_date.into(),
            ExtraField::GraduationDate => student.graduation_date.into(),
            ExtraField::ThesisTitle => student.thesis_title.clone().into(),
        }
    }
}

impl FromStr for ExtraField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "program" => Ok(ExtraField::Program),
            "status" => Ok(ExtraField::Status),
            "start_date" => Ok(ExtraField::StartDate),
            "defense_date" => Ok(ExtraField::DefenseDate),
            "graduation_date" => Ok(ExtraField::GraduationDate),
            "thesis_title" => Ok(ExtraField::ThesisTitle),
            other => Err(format!("unknown student field {other:?}")),
        }
    }
}

/// Everything a report needs beyond the records themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSettings {
    pub today: NaiveDate,
    pub grad_date_adjustment: i64,
    pub extra_fields: Vec<ExtraField>,
}

impl ReportSettings {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today,
            grad_date_adjustment: DEFAULT_GRAD_DATE_ADJUSTMENT,
            extra_fields: vec![ExtraField::Program, ExtraField::StartDate],
        }
    }
}

pub const PHD_GROUP: &str = "PhD Students";
pub const MSC_GROUP: &str = "MSc Students";
pub const FINAL_LABEL: &str = "Total";
pub const SUBTOTAL_LABEL: &str = "Sub-total";
pub const STUDENT_TOTAL_LABEL: &str = "Student Total";

#[derive(Debug, Clone)]
pub struct FundingReport {
    pub sheet: Sheet,
    pub grand_total: Decimal,
    pub student_count: usize,
    pub skipped: Vec<SkippedFunding>,
}

/// Students covered by the funding report over `range`: those in program
/// during the window plus anyone active with funding in it, restricted to
/// active records.
pub fn report_students<'a>(
    records: &'a RecordSet,
    range: DateRange,
    grad_date_adjustment: i64,
) -> Vec<&'a GraduateStudent> {
    let window = ActivityWindow::new(range, grad_date_adjustment);
    let mut ids: HashSet<i64> = HashSet::new();

    for s in window.filter(&records.students) {
        tracing::debug!(
            student = %s.name,
            clauses = ?window.matching_clauses(s),
            "student in program during report window"
        );
        ids.insert(s.id);
    }

    let funded_sources: HashSet<i64> = records
        .sources
        .iter()
        .filter(|s| s.active)
        .map(|s| s.id)
        .collect();
    for f in &records.funding {
        let funded = f.active && funded_sources.contains(&f.source_id) && f.overlaps(&range);
        if funded && ids.insert(f.student_id) {
            tracing::debug!(
                student_id = f.student_id,
                funding_id = f.id,
                "student added by funding in range"
            );
        }
    }

    records
        .students
        .iter()
        .filter(|s| s.active && ids.contains(&s.id))
        .collect()
}

/// Build the funding report for `range`.
pub fn funding_report(
    records: &RecordSet,
    range: DateRange,
    settings: &ReportSettings,
) -> FundingReport {
    let students = report_students(records, range, settings.grad_date_adjustment);
    let sources = active_sources(&records.sources);
    let extras = &settings.extra_fields;

    let mut sheet = Sheet::default();
    sheet.push(vec!["Generated on:".into(), settings.today.into()]);
    sheet.push(vec!["Start Date:".into(), range.start().into()]);
    sheet.push(vec!["End Date:".into(), range.end().into()]);
    sheet.push_blank();

    let groups = [
        (PHD_GROUP, ProgramGroup::PhD),
        (MSC_GROUP, ProgramGroup::Msc),
    ];

    let mut grand_total = zero_amount();
    let mut grand_columns = vec![zero_amount(); sources.len()];
    let mut skipped = Vec::new();
    let mut student_count = 0;

    for (group_name, program) in groups {
        let members = StudentFilter::default()
            .any_status()
            .with_program(program)
            .apply(students.iter().copied());
        student_count += members.len();

        let table = FundingTable::build(range, members, sources.clone(), &records.funding);

        let mut header: Vec<Cell> = vec![group_name.into()];
        header.extend(extras.iter().map(|f| Cell::from(f.title())));
        header.push(STUDENT_TOTAL_LABEL.into());
        header.extend(sources.iter().map(|s| Cell::from(s.name.as_str())));
        sheet.push(header);

        let rows = table.students.iter().zip(&table.cells).zip(table.row_totals());
        for ((student, cells), total) in rows {
            let mut row: Vec<Cell> = vec![student.name.as_str().into()];
            row.extend(extras.iter().map(|f| f.value(student)));
            row.push(total.into());
            row.extend(cells.iter().map(|v| Cell::Amount(*v)));
            sheet.push(row);
        }

        let group_total = table.grand_total();
        let column_totals = table.column_totals();
        let mut subtotal: Vec<Cell> = vec![SUBTOTAL_LABEL.into()];
        subtotal.extend(extras.iter().map(|_| Cell::Empty));
        subtotal.push(group_total.into());
        subtotal.extend(column_totals.iter().map(|v| Cell::Amount(*v)));
        sheet.push(subtotal);
        sheet.push_blank();

        grand_total += group_total;
        for (acc, v) in grand_columns.iter_mut().zip(&column_totals) {
            *acc += *v;
        }
        skipped.extend(table.skipped);
    }

    let mut final_row: Vec<Cell> = vec![FINAL_LABEL.into()];
    final_row.extend(extras.iter().map(|_| Cell::Empty));
    final_row.push(grand_total.into());
    final_row.extend(grand_columns.into_iter().map(Cell::Amount));
    sheet.push(final_row);

    tracing::info!(
        students = student_count,
        sources = sources.len(),
        total = %grand_total,
        "funding report for {range}"
    );

    FundingReport {
        sheet,
        grand_total,
        student_count,
        skipped,
    }
}

/// Total funding to date for every current student in program today.
pub fn current_totals_report(
    records: &RecordSet,
    settings: &ReportSettings,
) -> Result<Sheet, ValidationError> {
    let today = settings.today;
    let window = ActivityWindow::new(
        DateRange::new(today - Duration::days(1), today)?,
        settings.grad_date_adjustment,
    );

    let mut sheet = Sheet::default();
    sheet.push(vec![
        "Graduate student".into(),
        "Program".into(),
        "Total funding".into(),
        format!("Total as of {today}").into(),
        "Earliest funding".into(),
        "Most recent funding".into(),
    ]);

    let current = StudentFilter::current().apply(&records.students);
    for student in window.filter(current) {
        let funding = records.funding_for(student.id);
        let earliest = earliest_start_date(funding.iter().copied());
        let to_date = match earliest {
            Some(first) if first <= today => {
                sum_for_range(funding.iter().copied(), &DateRange::new(first, today)?)
            }
            _ => zero_amount(),
        };
        sheet.push(vec![
            student.name.as_str().into(),
            student.program.display_name().into(),
            sum_all(funding.iter().copied()).into(),
            to_date.into(),
            earliest.into(),
            latest_end_date(funding.iter().copied()).into(),
        ]);
    }
    Ok(sheet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::funding::{FundingRecord, FundingSource};
    use crate::domain::student::{Program, Status};
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn records() -> RecordSet {
        let mut gone = GraduateStudent::new(3, "Old Grad", Program::PhD, d(2010, 9, 1));
        gone.status = Status::Graduated;
        gone.graduation_date = Some(d(2014, 5, 1));
        gone.graduation_date_confirmed = true;

        RecordSet {
            students: vec![
                GraduateStudent::new(1, "Ada", Program::PhD, d(2022, 9, 1)),
                GraduateStudent::new(2, "Bo", Program::MscThesis, d(2023, 9, 1)),
                gone,
            ],
            sources: vec![FundingSource::new(10, "TA"), FundingSource::new(20, "RA")],
            funding: vec![
                FundingRecord::ongoing(1, 1, 10, dec!(3100.00), d(2024, 1, 1), d(2024, 1, 31)),
                FundingRecord::one_time(2, 2, 20, dec!(250.00), d(2024, 1, 15)),
                FundingRecord::one_time(3, 3, 20, dec!(75.00), d(2024, 1, 20)),
            ],
        }
    }

    fn january() -> DateRange {
        DateRange::new(d(2024, 1, 1), d(2024, 1, 31)).unwrap()
    }

    #[test]
    fn cell_display() {
        assert_eq!(Cell::Amount(dec!(5)).to_string(), "5.00");
        assert_eq!(Cell::Amount(dec!(66.666)).to_string(), "66.67");
        assert_eq!(Cell::Date(d(2024, 1, 2)).to_string(), "2024-01-02");
        assert_eq!(Cell::Empty.to_string(), "");
    }

    #[test]
    fn extra_fields_parse() {
        assert_eq!("start_date".parse::<ExtraField>(), Ok(ExtraField::StartDate));
        assert_eq!(" Program ".parse::<ExtraField>(), Ok(ExtraField::Program));
        assert!("person".parse::<ExtraField>().is_err());
    }

    #[test]
    fn funded_graduate_is_pulled_into_report() {
        let records = records();
        let ids: Vec<i64> = report_students(&records, january(), 60).iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn funding_report_layout() {
        let records = records();
        let settings = ReportSettings::new(d(2024, 2, 1));
        let report = funding_report(&records, january(), &settings);
        let sheet = &report.sheet;

        assert_eq!(sheet.rows[0], vec![Cell::from("Generated on:"), Cell::Date(d(2024, 2, 1))]);
        assert_eq!(sheet.rows[1][1], Cell::Date(d(2024, 1, 1)));
        assert_eq!(sheet.rows[2][1], Cell::Date(d(2024, 1, 31)));
        assert!(sheet.rows[3].is_empty());

        assert_eq!(
            sheet.rows[4],
            vec![
                Cell::from(PHD_GROUP),
                Cell::from("Program"),
                Cell::from("Start Date"),
                Cell::from(STUDENT_TOTAL_LABEL),
                Cell::from("RA"),
                Cell::from("TA"),
            ]
        );
        // PhD group: Ada (current) before Old Grad (graduated).
        assert_eq!(sheet.rows[5][0], Cell::from("Ada"));
        assert_eq!(sheet.rows[5][3], Cell::Amount(dec!(3100.00)));
        assert_eq!(sheet.rows[6][0], Cell::from("Old Grad"));
        assert_eq!(sheet.rows[6][4], Cell::Amount(dec!(75.00)));
        assert_eq!(
            sheet.rows[7],
            vec![
                Cell::from(SUBTOTAL_LABEL),
                Cell::Empty,
                Cell::Empty,
                Cell::Amount(dec!(3175.00)),
                Cell::Amount(dec!(75.00)),
                Cell::Amount(dec!(3100.00)),
            ]
        );

        let total = sheet.find_row(FINAL_LABEL).unwrap();
        assert_eq!(total[3], Cell::Amount(dec!(3425.00)));
        assert_eq!(total[4], Cell::Amount(dec!(325.00)));
        assert_eq!(total[5], Cell::Amount(dec!(3100.00)));
        assert_eq!(report.grand_total, dec!(3425.00));
        assert_eq!(report.student_count, 3);
    }

    #[test]
    fn funding_report_without_extra_fields() {
        let records = records();
        let mut settings = ReportSettings::new(d(2024, 2, 1));
        settings.extra_fields.clear();
        let report = funding_report(&records, january(), &settings);
        let subtotal = report.sheet.find_row(SUBTOTAL_LABEL).unwrap();
        assert_eq!(subtotal.len(), 4);
    }

    #[test]
    fn current_totals_per_student() {
        let mut records = records();
        records.funding.push(FundingRecord::ongoing(
            4,
            1,
            10,
            dec!(3000.00),
            d(2024, 2, 1),
            d(2024, 3, 1),
        ));
        let settings = ReportSettings::new(d(2024, 2, 10));
        let sheet = current_totals_report(&records, &settings).unwrap();

        assert_eq!(sheet.rows[0][3], Cell::from("Total as of 2024-02-10"));
        assert_eq!(sheet.rows.len(), 3);
        let ada = sheet.find_row("Ada").unwrap();
        assert_eq!(ada[1], Cell::from("Ph.D."));
        assert_eq!(ada[2], Cell::Amount(dec!(6100.00)));
        // January in full plus 10 of 30 days of the second record.
        assert_eq!(ada[3], Cell::Amount(dec!(4100.00)));
        assert_eq!(ada[4], Cell::Date(d(2024, 1, 1)));
        assert_eq!(ada[5], Cell::Date(d(2024, 3, 1)));
    }

    #[test]
    fn current_totals_without_funding() {
        let mut records = records();
        records.funding.clear();
        let settings = ReportSettings::new(d(2024, 2, 10));
        let sheet = current_totals_report(&records, &settings).unwrap();
        let bo = sheet.find_row("Bo").unwrap();
        assert_eq!(bo[2], Cell::Amount(dec!(0.00)));
        assert_eq!(bo[4], Cell::Empty);
        assert_eq!(bo[5], Cell::Empty);
    }
}
