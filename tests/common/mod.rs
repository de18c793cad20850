#![allow(dead_code)]

use chrono::NaiveDate;
use gradfund::domain::error::GradError;
use gradfund::domain::funding::{FundingRecord, FundingSource};
use gradfund::domain::records::RecordSet;
use gradfund::domain::student::{GraduateStudent, Program, Status};
use gradfund::ports::records_port::RecordsPort;
use rust_decimal::Decimal;
use std::path::Path;
use std::process::ExitCode;

pub struct MockRecordsPort {
    pub students: Vec<GraduateStudent>,
    pub sources: Vec<FundingSource>,
    pub funding: Vec<FundingRecord>,
    pub error: Option<String>,
}

impl MockRecordsPort {
    pub fn new() -> Self {
        Self {
            students: Vec::new(),
            sources: Vec::new(),
            funding: Vec::new(),
            error: None,
        }
    }

    pub fn with_student(mut self, student: GraduateStudent) -> Self {
        self.students.push(student);
        self
    }

    pub fn with_source(mut self, source: FundingSource) -> Self {
        self.sources.push(source);
        self
    }

    pub fn with_funding(mut self, record: FundingRecord) -> Self {
        self.funding.push(record);
        self
    }

    pub fn with_error(mut self, reason: &str) -> Self {
        self.error = Some(reason.to_string());
        self
    }

    fn check(&self) -> Result<(), GradError> {
        match &self.error {
            Some(reason) => Err(GradError::Database {
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl RecordsPort for MockRecordsPort {
    fn load_students(&self) -> Result<Vec<GraduateStudent>, GradError> {
        self.check()?;
        Ok(self.students.clone())
    }

    fn load_sources(&self) -> Result<Vec<FundingSource>, GradError> {
        self.check()?;
        Ok(self.sources.clone())
    }

    fn load_funding(&self) -> Result<Vec<FundingRecord>, GradError> {
        self.check()?;
        Ok(self.funding.clone())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn amount(s: &str) -> Decimal {
    s.parse().unwrap()
}

pub fn phd(id: i64, name: &str, start: NaiveDate) -> GraduateStudent {
    GraduateStudent::new(id, name, Program::PhD, start)
}

pub fn msc(id: i64, name: &str, start: NaiveDate) -> GraduateStudent {
    GraduateStudent::new(id, name, Program::MscThesis, start)
}

pub fn graduated(mut student: GraduateStudent, on: NaiveDate) -> GraduateStudent {
    student.status = Status::Graduated;
    student.graduation_date = Some(on);
    student.graduation_date_confirmed = true;
    student
}

/// Two current students, one graduate and three sources, with a mix of
/// ongoing and one-time funding through the 2023-24 academic year.
pub fn sample_port() -> MockRecordsPort {
    let mut scholarship = FundingSource::new(30, "Scholarship");
    scholarship.ordering = 1;

    MockRecordsPort::new()
        .with_student(phd(1, "Ada Lovelace", date(2022, 9, 1)))
        .with_student(msc(2, "Bo Chen", date(2023, 9, 1)))
        .with_student(graduated(phd(3, "Cy Young", date(2019, 9, 1)), date(2024, 4, 30)))
        .with_source(FundingSource::new(10, "TA"))
        .with_source(FundingSource::new(20, "RA"))
        .with_source(scholarship)
        .with_funding(FundingRecord::ongoing(
            100,
            1,
            10,
            amount("1000.00"),
            date(2024, 1, 1),
            date(2024, 1, 10),
        ))
        .with_funding(FundingRecord::one_time(101, 2, 30, amount("100.00"), date(2024, 3, 1)))
        .with_funding(FundingRecord::ongoing(
            102,
            3,
            20,
            amount("2400.00"),
            date(2024, 1, 1),
            date(2024, 4, 30),
        ))
}

pub fn sample_records() -> RecordSet {
    RecordSet::load(&sample_port()).unwrap()
}

/// Write a CSV record directory equivalent to a small department.
pub fn write_record_dir(dir: &Path) {
    std::fs::write(
        dir.join("students.csv"),
        "id,name,program,status,start_date,defense_date,graduation_date,graduation_date_confirmed,active,thesis_title\n\
         1,Ada Lovelace,P,S,2022-09-01,,,,yes,Analytical Engines\n\
         2,Bo Chen,M,S,2023-09-01,,2024-06-15,no,yes,\n\
         3,Cy Young,P,G,2019-09-01,2024-03-20,2024-04-30,yes,yes,Pitching\n",
    )
    .unwrap();
    std::fs::write(
        dir.join("sources.csv"),
        "id,name,ordering,active\n10,TA,0,yes\n20,RA,0,yes\n30,Scholarship,1,yes\n",
    )
    .unwrap();
    std::fs::write(
        dir.join("funding.csv"),
        "id,student_id,source_id,amount,start_date,end_date,active,comments\n\
         100,1,10,1000.00,2024-01-01,2024-01-10,yes,\n\
         101,2,30,100.00,2024-03-01,,yes,entrance award\n\
         102,3,20,2400.00,2024-01-01,2024-04-30,yes,\n",
    )
    .unwrap();
}

/// `ExitCode` has no `PartialEq`; compare the debug rendering.
pub fn exit_code_is(code: ExitCode, expected: u8) -> bool {
    format!("{code:?}") == format!("{:?}", ExitCode::from(expected))
}
