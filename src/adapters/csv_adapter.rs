//! CSV directory records adapter.
//!
//! Reads `students.csv`, `sources.csv` and `funding.csv` from one directory.
//! Column names match the record field names; optional columns may be left
//! out entirely.

use crate::adapters::record_fields::{
    parse_amount, parse_bool, parse_date, parse_optional_date,
};
use crate::domain::error::GradError;
use crate::domain::funding::{FundingRecord, FundingSource};
use crate::domain::student::{GraduateStudent, Status};
use crate::ports::records_port::RecordsPort;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

pub const STUDENTS_FILE: &str = "students.csv";
pub const SOURCES_FILE: &str = "sources.csv";
pub const FUNDING_FILE: &str = "funding.csv";

#[derive(Debug, Deserialize)]
struct StudentRow {
    id: i64,
    name: String,
    program: String,
    #[serde(default)]
    status: Option<String>,
    start_date: String,
    #[serde(default)]
    defense_date: Option<String>,
    #[serde(default)]
    graduation_date: Option<String>,
    #[serde(default)]
    graduation_date_confirmed: Option<String>,
    #[serde(default)]
    active: Option<String>,
    #[serde(default)]
    thesis_title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SourceRow {
    id: i64,
    name: String,
    #[serde(default)]
    ordering: Option<u16>,
    #[serde(default)]
    active: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FundingRow {
    id: i64,
    student_id: i64,
    source_id: i64,
    amount: String,
    start_date: String,
    #[serde(default)]
    end_date: Option<String>,
    #[serde(default)]
    active: Option<String>,
    #[serde(default)]
    comments: Option<String>,
}

pub struct CsvRecordsAdapter {
    base_path: PathBuf,
}

impl CsvRecordsAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn read_rows<T: DeserializeOwned>(&self, file: &str) -> Result<Vec<T>, GradError> {
        let path = self.base_path.join(file);
        let content = fs::read_to_string(&path).map_err(|e| GradError::Data {
            source_name: file.to_string(),
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());
        let mut rows = Vec::new();
        for result in rdr.deserialize() {
            rows.push(result?);
        }
        tracing::debug!(file = %path.display(), rows = rows.len(), "read record file");
        Ok(rows)
    }
}

impl RecordsPort for CsvRecordsAdapter {
    fn load_students(&self) -> Result<Vec<GraduateStudent>, GradError> {
        let rows: Vec<StudentRow> = self.read_rows(STUDENTS_FILE)?;
        rows.into_iter()
            .map(|row| -> Result<GraduateStudent, GradError> {
                let src = STUDENTS_FILE;
                Ok(GraduateStudent {
                    id: row.id,
                    name: row.name,
                    program: row.program.parse()?,
                    status: match row.status.as_deref().map(str::trim) {
                        None | Some("") => Status::Current,
                        Some(code) => code.parse()?,
                    },
                    start_date: parse_date(src, "start_date", &row.start_date)?,
                    defense_date: parse_optional_date(
                        src,
                        "defense_date",
                        row.defense_date.as_deref(),
                    )?,
                    graduation_date: parse_optional_date(
                        src,
                        "graduation_date",
                        row.graduation_date.as_deref(),
                    )?,
                    graduation_date_confirmed: parse_bool(
                        src,
                        "graduation_date_confirmed",
                        row.graduation_date_confirmed.as_deref(),
                        false,
                    )?,
                    active: parse_bool(src, "active", row.active.as_deref(), true)?,
                    thesis_title: row.thesis_title.unwrap_or_default(),
                })
            })
            .collect()
    }

    fn load_sources(&self) -> Result<Vec<FundingSource>, GradError> {
        let rows: Vec<SourceRow> = self.read_rows(SOURCES_FILE)?;
        rows.into_iter()
            .map(|row| -> Result<FundingSource, GradError> {
                Ok(FundingSource {
                    id: row.id,
                    name: row.name,
                    ordering: row.ordering.unwrap_or(0),
                    active: parse_bool(SOURCES_FILE, "active", row.active.as_deref(), true)?,
                })
            })
            .collect()
    }

    fn load_funding(&self) -> Result<Vec<FundingRecord>, GradError> {
        let rows: Vec<FundingRow> = self.read_rows(FUNDING_FILE)?;
        rows.into_iter()
            .map(|row| -> Result<FundingRecord, GradError> {
                let src = FUNDING_FILE;
                Ok(FundingRecord {
                    id: row.id,
                    student_id: row.student_id,
                    source_id: row.source_id,
                    amount: parse_amount(src, &row.amount)?,
                    start_date: parse_date(src, "start_date", &row.start_date)?,
                    end_date: parse_optional_date(src, "end_date", row.end_date.as_deref())?,
                    active: parse_bool(src, "active", row.active.as_deref(), true)?,
                    comments: row.comments.unwrap_or_default(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::student::Program;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn setup_test_data() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();

        fs::write(
            path.join(STUDENTS_FILE),
            "id,name,program,status,start_date,defense_date,graduation_date,graduation_date_confirmed,active,thesis_title\n\
             1,Ada Lovelace,P,S,2022-09-01,,2026-06-01,no,yes,Engines\n\
             2,Bo Chen,M,G,2021-09-01,2023-04-10,2023-06-01,yes,yes,\n",
        )
        .unwrap();
        fs::write(
            path.join(SOURCES_FILE),
            "id,name,ordering,active\n10,TA,2,true\n20,Scholarship,1,false\n",
        )
        .unwrap();
        fs::write(
            path.join(FUNDING_FILE),
            "id,student_id,source_id,amount,start_date,end_date,active,comments\n\
             100,1,10,3100.00,2024-01-01,2024-01-31,1,winter term\n\
             101,2,20,500,2023-02-15,,0,\n",
        )
        .unwrap();

        (dir, path)
    }

    #[test]
    fn loads_students() {
        let (_dir, path) = setup_test_data();
        let students = CsvRecordsAdapter::new(path).load_students().unwrap();

        assert_eq!(students.len(), 2);
        assert_eq!(students[0].name, "Ada Lovelace");
        assert_eq!(students[0].program, Program::PhD);
        assert_eq!(students[0].status, Status::Current);
        assert_eq!(students[0].defense_date, None);
        assert!(!students[0].graduation_date_confirmed);
        assert_eq!(students[0].thesis_title, "Engines");
        assert_eq!(students[1].status, Status::Graduated);
        assert_eq!(students[1].confirmed_graduation(), Some(d(2023, 6, 1)));
        assert_eq!(students[1].thesis_title, "");
    }

    #[test]
    fn loads_sources_and_funding() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvRecordsAdapter::new(path);

        let sources = adapter.load_sources().unwrap();
        assert_eq!(sources[0].ordering, 2);
        assert!(!sources[1].active);

        let funding = adapter.load_funding().unwrap();
        assert_eq!(funding[0].amount, dec!(3100.00));
        assert_eq!(funding[0].end_date, Some(d(2024, 1, 31)));
        assert_eq!(funding[0].comments, "winter term");
        assert!(funding[1].is_one_time());
        assert!(!funding[1].active);
    }

    #[test]
    fn optional_columns_may_be_missing() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(STUDENTS_FILE),
            "id,name,program,start_date\n7,Cy,N,2024-09-01\n",
        )
        .unwrap();
        let students = CsvRecordsAdapter::new(dir.path().to_path_buf())
            .load_students()
            .unwrap();
        assert_eq!(students[0].program, Program::MscPracticum);
        assert_eq!(students[0].status, Status::Current);
        assert!(students[0].active);
    }

    #[test]
    fn unknown_program_code_is_rejected() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(STUDENTS_FILE),
            "id,name,program,start_date\n7,Cy,Q,2024-09-01\n",
        )
        .unwrap();
        let result = CsvRecordsAdapter::new(dir.path().to_path_buf()).load_students();
        assert!(matches!(result, Err(GradError::Validation(_))));
    }

    #[test]
    fn bad_date_names_the_file() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(FUNDING_FILE),
            "id,student_id,source_id,amount,start_date\n1,1,1,10.00,01/02/2024\n",
        )
        .unwrap();
        let result = CsvRecordsAdapter::new(dir.path().to_path_buf()).load_funding();
        assert!(matches!(
            result,
            Err(GradError::Data { source_name, .. }) if source_name == FUNDING_FILE
        ));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let result = CsvRecordsAdapter::new(dir.path().to_path_buf()).load_sources();
        assert!(result.is_err());
    }
}
