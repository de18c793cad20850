//! SQLite records adapter.
//!
//! Amounts are stored as TEXT so the fixed-point scale survives the round
//! trip; dates are `YYYY-MM-DD` TEXT.

use crate::adapters::record_fields::{format_date, parse_amount, parse_date, parse_optional_date};
use crate::domain::error::GradError;
use crate::domain::funding::{FundingRecord, FundingSource};
use crate::domain::records::RecordSet;
use crate::domain::student::GraduateStudent;
use crate::ports::records_port::RecordsPort;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS students (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        program TEXT NOT NULL,
        status TEXT NOT NULL,
        start_date TEXT NOT NULL,
        defense_date TEXT,
        graduation_date TEXT,
        graduation_date_confirmed INTEGER NOT NULL DEFAULT 0,
        active INTEGER NOT NULL DEFAULT 1,
        thesis_title TEXT NOT NULL DEFAULT ''
    );
    CREATE TABLE IF NOT EXISTS funding_sources (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        ordering INTEGER NOT NULL DEFAULT 0,
        active INTEGER NOT NULL DEFAULT 1
    );
    CREATE TABLE IF NOT EXISTS funding (
        id INTEGER PRIMARY KEY,
        student_id INTEGER NOT NULL REFERENCES students(id),
        source_id INTEGER NOT NULL REFERENCES funding_sources(id),
        amount TEXT NOT NULL,
        start_date TEXT NOT NULL,
        end_date TEXT,
        active INTEGER NOT NULL DEFAULT 1,
        comments TEXT NOT NULL DEFAULT ''
    );
    CREATE INDEX IF NOT EXISTS idx_funding_student ON funding(student_id);
    CREATE INDEX IF NOT EXISTS idx_funding_dates ON funding(start_date, end_date);";

fn query_err(e: rusqlite::Error) -> GradError {
    GradError::DatabaseQuery {
        reason: e.to_string(),
    }
}

pub struct SqliteRecordsAdapter {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteRecordsAdapter {
    pub fn open(path: &str, pool_size: u32) -> Result<Self, GradError> {
        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(|e: r2d2::Error| GradError::Database {
                reason: e.to_string(),
            })?;
        tracing::debug!(path, pool_size, "opened sqlite pool");
        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, GradError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e: r2d2::Error| GradError::Database {
                reason: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, GradError> {
        self.pool.get().map_err(|e: r2d2::Error| GradError::Database {
            reason: e.to_string(),
        })
    }

    pub fn initialize_schema(&self) -> Result<(), GradError> {
        self.conn()?.execute_batch(SCHEMA).map_err(query_err)
    }

    /// Insert or replace every record of `records` in one transaction.
    pub fn import(&self, records: &RecordSet) -> Result<(), GradError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_err)?;

        for s in &records.students {
            tx.execute(
                "INSERT OR REPLACE INTO students (id, name, program, status, start_date,
                     defense_date, graduation_date, graduation_date_confirmed, active, thesis_title)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    s.id,
                    s.name,
                    s.program.code(),
                    s.status.code(),
                    format_date(s.start_date),
                    s.defense_date.map(format_date),
                    s.graduation_date.map(format_date),
                    s.graduation_date_confirmed,
                    s.active,
                    s.thesis_title
                ],
            )
            .map_err(query_err)?;
        }

        for s in &records.sources {
            tx.execute(
                "INSERT OR REPLACE INTO funding_sources (id, name, ordering, active)
                 VALUES (?1, ?2, ?3, ?4)",
                params![s.id, s.name, s.ordering, s.active],
            )
            .map_err(query_err)?;
        }

        for f in &records.funding {
            tx.execute(
                "INSERT OR REPLACE INTO funding (id, student_id, source_id, amount, start_date,
                     end_date, active, comments)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    f.id,
                    f.student_id,
                    f.source_id,
                    f.amount.to_string(),
                    format_date(f.start_date),
                    f.end_date.map(format_date),
                    f.active,
                    f.comments
                ],
            )
            .map_err(query_err)?;
        }

        tx.commit().map_err(query_err)?;
        tracing::info!(
            students = records.students.len(),
            sources = records.sources.len(),
            funding = records.funding.len(),
            "imported records into sqlite"
        );
        Ok(())
    }
}

struct StudentRow {
    id: i64,
    name: String,
    program: String,
    status: String,
    start_date: String,
    defense_date: Option<String>,
    graduation_date: Option<String>,
    graduation_date_confirmed: bool,
    active: bool,
    thesis_title: String,
}

struct FundingRow {
    id: i64,
    student_id: i64,
    source_id: i64,
    amount: String,
    start_date: String,
    end_date: Option<String>,
    active: bool,
    comments: String,
}

impl RecordsPort for SqliteRecordsAdapter {
    fn load_students(&self) -> Result<Vec<GraduateStudent>, GradError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, name, program, status, start_date, defense_date, graduation_date,
                        graduation_date_confirmed, active, thesis_title
                 FROM students ORDER BY id",
            )
            .map_err(query_err)?;

        let rows = stmt
            .query_map([], |row| {
                Ok(StudentRow {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    program: row.get(2)?,
                    status: row.get(3)?,
                    start_date: row.get(4)?,
                    defense_date: row.get(5)?,
                    graduation_date: row.get(6)?,
                    graduation_date_confirmed: row.get(7)?,
                    active: row.get(8)?,
                    thesis_title: row.get(9)?,
                })
            })
            .map_err(query_err)?;

        let mut students = Vec::new();
        for row in rows {
            let row = row.map_err(query_err)?;
            students.push(GraduateStudent {
                id: row.id,
                name: row.name,
                program: row.program.parse()?,
                status: row.status.parse()?,
                start_date: parse_date("students", "start_date", &row.start_date)?,
                defense_date: parse_optional_date(
                    "students",
                    "defense_date",
                    row.defense_date.as_deref(),
                )?,
                graduation_date: parse_optional_date(
                    "students",
                    "graduation_date",
                    row.graduation_date.as_deref(),
                )?,
                graduation_date_confirmed: row.graduation_date_confirmed,
                active: row.active,
                thesis_title: row.thesis_title,
            });
        }
        Ok(students)
    }

    fn load_sources(&self) -> Result<Vec<FundingSource>, GradError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT id, name, ordering, active FROM funding_sources ORDER BY id")
            .map_err(query_err)?;

        let rows = stmt
            .query_map([], |row| {
                Ok(FundingSource {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    ordering: row.get(2)?,
                    active: row.get(3)?,
                })
            })
            .map_err(query_err)?;

        let mut sources = Vec::new();
        for row in rows {
            sources.push(row.map_err(query_err)?);
        }
        Ok(sources)
    }

    fn load_funding(&self) -> Result<Vec<FundingRecord>, GradError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, student_id, source_id, amount, start_date, end_date, active, comments
                 FROM funding ORDER BY id",
            )
            .map_err(query_err)?;

        let rows = stmt
            .query_map([], |row| {
                Ok(FundingRow {
                    id: row.get(0)?,
                    student_id: row.get(1)?,
                    source_id: row.get(2)?,
                    amount: row.get(3)?,
                    start_date: row.get(4)?,
                    end_date: row.get(5)?,
                    active: row.get(6)?,
                    comments: row.get(7)?,
                })
            })
            .map_err(query_err)?;

        let mut funding = Vec::new();
        for row in rows {
            let row = row.map_err(query_err)?;
            funding.push(FundingRecord {
                id: row.id,
                student_id: row.student_id,
                source_id: row.source_id,
                amount: parse_amount("funding", &row.amount)?,
                start_date: parse_date("funding", "start_date", &row.start_date)?,
                end_date: parse_optional_date("funding", "end_date", row.end_date.as_deref())?,
                active: row.active,
                comments: row.comments,
            });
        }
        Ok(funding)
    }
}
