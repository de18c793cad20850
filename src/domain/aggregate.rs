//! Student x funding-source table of prorated funding over a date range.

use crate::domain::date_range::DateRange;
use crate::domain::error::ProrationError;
use crate::domain::funding::{zero_amount, FundingRecord, FundingSource};
use crate::domain::student::GraduateStudent;
use rust_decimal::Decimal;
use std::collections::HashMap;

/// A funding record left out of a table because its proration faulted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFunding {
    pub funding_id: i64,
    pub student_id: i64,
    pub source_id: i64,
    pub error: ProrationError,
}

/// `cells[row][col]` is the prorated funding of `students[row]` from
/// `sources[col]` over `range`.
#[derive(Debug, Clone)]
pub struct FundingTable<'a> {
    pub range: DateRange,
    pub students: Vec<&'a GraduateStudent>,
    pub sources: Vec<&'a FundingSource>,
    pub cells: Vec<Vec<Decimal>>,
    pub skipped: Vec<SkippedFunding>,
}

impl<'a> FundingTable<'a> {
    /// Build the table. Only active funding records from active sources that
    /// overlap `range` contribute. A record that fails to prorate is skipped
    /// with a warning and listed in [`FundingTable::skipped`].
    pub fn build(
        range: DateRange,
        students: Vec<&'a GraduateStudent>,
        sources: Vec<&'a FundingSource>,
        funding: &[FundingRecord],
    ) -> Self {
        let row_of: HashMap<i64, usize> = students
            .iter()
            .enumerate()
            .map(|(i, s)| (s.id, i))
            .collect();
        let col_of: HashMap<i64, usize> = sources
            .iter()
            .enumerate()
            .filter(|(_, s)| s.active)
            .map(|(i, s)| (s.id, i))
            .collect();

        let mut cells = vec![vec![zero_amount(); sources.len()]; students.len()];
        let mut skipped = Vec::new();

        for f in funding.iter().filter(|f| f.active && f.overlaps(&range)) {
            let (Some(&row), Some(&col)) = (row_of.get(&f.student_id), col_of.get(&f.source_id))
            else {
                continue;
            };
            match f.for_range(&range) {
                Ok(amount) => cells[row][col] += amount,
                Err(error) => {
                    tracing::warn!(
                        funding_id = f.id,
                        student_id = f.student_id,
                        error = %error,
                        "skipping funding record in report"
                    );
                    skipped.push(SkippedFunding {
                        funding_id: f.id,
                        student_id: f.student_id,
                        source_id: f.source_id,
                        error,
                    });
                }
            }
        }

        tracing::debug!(
            rows = students.len(),
            columns = sources.len(),
            skipped = skipped.len(),
            range = %range,
            "built funding table"
        );

        Self {
            range,
            students,
            sources,
            cells,
            skipped,
        }
    }

    pub fn row_totals(&self) -> Vec<Decimal> {
        self.cells
            .iter()
            .map(|row| row.iter().fold(zero_amount(), |acc, v| acc + *v))
            .collect()
    }

    pub fn column_totals(&self) -> Vec<Decimal> {
        let mut totals = vec![zero_amount(); self.sources.len()];
        for row in &self.cells {
            for (total, v) in totals.iter_mut().zip(row) {
                *total += *v;
            }
        }
        totals
    }

    pub fn grand_total(&self) -> Decimal {
        self.cells
            .iter()
            .flatten()
            .fold(zero_amount(), |acc, v| acc + *v)
    }

    pub fn cell(&self, student_id: i64, source_id: i64) -> Option<Decimal> {
        let row = self.students.iter().position(|s| s.id == student_id)?;
        let col = self.sources.iter().position(|s| s.id == source_id)?;
        Some(self.cells[row][col])
    }
}
