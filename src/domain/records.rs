//! A validated snapshot of all student and funding records.

use crate::domain::error::GradError;
use crate::domain::funding::{FundingRecord, FundingSource};
use crate::domain::student::GraduateStudent;
use crate::ports::records_port::RecordsPort;
use std::collections::HashSet;

#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    pub students: Vec<GraduateStudent>,
    pub sources: Vec<FundingSource>,
    pub funding: Vec<FundingRecord>,
}

impl RecordSet {
    /// Load every record through `port` without cross-record checks.
    pub fn read(port: &dyn RecordsPort) -> Result<Self, GradError> {
        let records = Self {
            students: port.load_students()?,
            sources: port.load_sources()?,
            funding: port.load_funding()?,
        };
        tracing::debug!(
            students = records.students.len(),
            sources = records.sources.len(),
            funding = records.funding.len(),
            "loaded records"
        );
        Ok(records)
    }

    /// Load every record through `port` and validate the snapshot.
    pub fn load(port: &dyn RecordsPort) -> Result<Self, GradError> {
        let records = Self::read(port)?;
        records.validate()?;
        Ok(records)
    }

    /// Load every record through `port`, dropping funding records that fail
    /// validation. The dropped records' problems are returned alongside.
    pub fn load_lenient(port: &dyn RecordsPort) -> Result<(Self, Vec<GradError>), GradError> {
        let mut records = Self::read(port)?;
        let problems = records.drop_invalid_funding();
        Ok((records, problems))
    }

    /// Reject funding that breaks a data-entry invariant or points at a
    /// student or source that does not exist.
    pub fn validate(&self) -> Result<(), GradError> {
        match self.problems().into_iter().next() {
            Some(first) => Err(first),
            None => Ok(()),
        }
    }

    /// Every validation problem rather than the first one.
    pub fn problems(&self) -> Vec<GradError> {
        let checker = self.checker();
        self.funding.iter().flat_map(|f| checker.problems(f)).collect()
    }

    /// Remove funding records with any validation problem.
    pub fn drop_invalid_funding(&mut self) -> Vec<GradError> {
        let checker = self.checker();
        let mut problems = Vec::new();
        self.funding.retain(|f| {
            let found = checker.problems(f);
            let keep = found.is_empty();
            if !keep {
                tracing::warn!(
                    funding_id = f.id,
                    problems = found.len(),
                    "dropping invalid funding"
                );
            }
            problems.extend(found);
            keep
        });
        problems
    }

    fn checker(&self) -> FundingChecker {
        FundingChecker {
            student_ids: self.students.iter().map(|s| s.id).collect(),
            source_ids: self.sources.iter().map(|s| s.id).collect(),
        }
    }

    /// Active funding of one student.
    pub fn funding_for(&self, student_id: i64) -> Vec<&FundingRecord> {
        self.funding
            .iter()
            .filter(|f| f.active && f.student_id == student_id)
            .collect()
    }

    pub fn student(&self, id: i64) -> Option<&GraduateStudent> {
        self.students.iter().find(|s| s.id == id)
    }

    pub fn source(&self, id: i64) -> Option<&FundingSource> {
        self.sources.iter().find(|s| s.id == id)
    }
}

struct FundingChecker {
    student_ids: HashSet<i64>,
    source_ids: HashSet<i64>,
}

impl FundingChecker {
    fn problems(&self, f: &FundingRecord) -> Vec<GradError> {
        let mut problems = Vec::new();
        if let Err(e) = f.validate() {
            problems.push(e.into());
        }
        if !self.student_ids.contains(&f.student_id) {
            problems.push(GradError::UnknownReference {
                funding_id: f.id,
                kind: "student",
                id: f.student_id,
            });
        }
        if !self.source_ids.contains(&f.source_id) {
            problems.push(GradError::UnknownReference {
                funding_id: f.id,
                kind: "funding source",
                id: f.source_id,
            });
        }
        problems
    }
}
