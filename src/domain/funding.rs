//! Funding sources, funding records and prorated funding arithmetic.
//!
//! Money is held as [`Decimal`] throughout. A funding record with an end date
//! is spread evenly over every calendar day of `[start_date, end_date]`; one
//! without an end date is a single payment on `start_date`.

use crate::domain::date_range::DateRange;
use crate::domain::error::{ProrationError, ValidationError};
use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

/// Largest amount a single funding record may carry (8 digits, 2 places).
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(99_999_999, 0, 0, false, 2);

const AMOUNT_SCALE: u32 = 2;

/// `0.00`, keeping the cents scale so zero cells render like other amounts.
pub fn zero_amount() -> Decimal {
    Decimal::new(0, AMOUNT_SCALE)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FundingSource {
    pub id: i64,
    pub name: String,
    /// Sequence in listings and report columns.
    pub ordering: u16,
    pub active: bool,
}

impl FundingSource {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ordering: 0,
            active: true,
        }
    }
}

/// Active sources in display order: `(ordering, name)`.
pub fn active_sources(sources: &[FundingSource]) -> Vec<&FundingSource> {
    let mut active: Vec<&FundingSource> = sources.iter().filter(|s| s.active).collect();
    active.sort_by(|a, b| a.ordering.cmp(&b.ordering).then_with(|| a.name.cmp(&b.name)));
    active
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FundingRecord {
    pub id: i64,
    pub student_id: i64,
    pub source_id: i64,
    pub amount: Decimal,
    pub start_date: NaiveDate,
    /// `None` for a one-time payment on `start_date`.
    pub end_date: Option<NaiveDate>,
    pub active: bool,
    pub comments: String,
}

impl FundingRecord {
    pub fn one_time(
        id: i64,
        student_id: i64,
        source_id: i64,
        amount: Decimal,
        on: NaiveDate,
    ) -> Self {
        Self {
            id,
            student_id,
            source_id,
            amount,
            start_date: on,
            end_date: None,
            active: true,
            comments: String::new(),
        }
    }

    pub fn ongoing(
        id: i64,
        student_id: i64,
        source_id: i64,
        amount: Decimal,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        Self {
            end_date: Some(end_date),
            ..Self::one_time(id, student_id, source_id, amount, start_date)
        }
    }

    pub fn is_one_time(&self) -> bool {
        self.end_date.is_none()
    }

    /// Check the data-entry invariants: positive amount of at most two
    /// decimal places no larger than [`MAX_AMOUNT`], and an end date strictly
    /// after the start date.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.amount <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveAmount {
                id: self.id,
                amount: self.amount,
            });
        }
        if self.amount > MAX_AMOUNT {
            return Err(ValidationError::AmountTooLarge {
                id: self.id,
                amount: self.amount,
                max: MAX_AMOUNT,
            });
        }
        if self.amount.normalize().scale() > AMOUNT_SCALE {
            return Err(ValidationError::TooPrecise {
                id: self.id,
                amount: self.amount,
            });
        }
        if let Some(end) = self.end_date {
            if end <= self.start_date {
                return Err(ValidationError::EndNotAfterStart {
                    id: self.id,
                    start: self.start_date,
                    end,
                });
            }
        }
        Ok(())
    }

    /// Whether any day of this record falls inside `range`.
    pub fn overlaps(&self, range: &DateRange) -> bool {
        match self.end_date {
            None => range.contains(self.start_date),
            Some(end) => self.start_date <= range.end() && end >= range.start(),
        }
    }

    /// The share of `amount` attributable to the days of `range`.
    ///
    /// One-time payments count in full when they fall inside the range and
    /// not at all otherwise. Ongoing funding is spread evenly over every day
    /// of its span; the overlap's share is `amount * overlap_days / days`,
    /// rounded half-to-even to cents once, at the end. A range that misses the
    /// span entirely yields zero.
    pub fn for_range(&self, range: &DateRange) -> Result<Decimal, ProrationError> {
        let Some(end_date) = self.end_date else {
            return Ok(if range.contains(self.start_date) {
                self.amount
            } else {
                zero_amount()
            });
        };

        let days = (end_date - self.start_date).num_days() + 1;
        if days <= 0 {
            return Err(ProrationError::InvalidSpan {
                id: self.id,
                start: self.start_date,
                end: end_date,
                days,
            });
        }

        let overlap_start = range.start().max(self.start_date);
        let overlap_end = range.end().min(end_date);
        let overlap_days = (overlap_end - overlap_start).num_days() + 1;
        if overlap_days <= 0 {
            return Ok(zero_amount());
        }

        let share = self.amount * Decimal::from(overlap_days) / Decimal::from(days);
        Ok(share.round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::MidpointNearestEven))
    }
}

/// Active records with at least one day inside `range`.
pub fn in_range<'a, I>(records: I, range: &DateRange) -> Vec<&'a FundingRecord>
where
    I: IntoIterator<Item = &'a FundingRecord>,
{
    records
        .into_iter()
        .filter(|f| f.active && f.overlaps(range))
        .collect()
}

/// Plain total of `amount` over the given records, with no date restriction.
///
/// Not to be combined with [`sum_for_range`] over consecutive windows: a
/// record spanning several windows would be counted in full in each.
pub fn sum_all<'a, I>(records: I) -> Decimal
where
    I: IntoIterator<Item = &'a FundingRecord>,
{
    records
        .into_iter()
        .fold(zero_amount(), |acc, f| acc + f.amount)
}

/// Prorated total over `range` of the active records overlapping it.
///
/// A record whose proration faults is left out of the total and logged.
pub fn sum_for_range<'a, I>(records: I, range: &DateRange) -> Decimal
where
    I: IntoIterator<Item = &'a FundingRecord>,
{
    in_range(records, range)
        .into_iter()
        .fold(zero_amount(), |acc, f| match f.for_range(range) {
            Ok(amount) => acc + amount,
            Err(e) => {
                tracing::warn!(funding_id = f.id, error = %e, "skipping funding record");
                acc
            }
        })
}

pub fn earliest_start_date<'a, I>(records: I) -> Option<NaiveDate>
where
    I: IntoIterator<Item = &'a FundingRecord>,
{
    records.into_iter().map(|f| f.start_date).min()
}

/// The latest day any record pays out: its end date, or the start date of a
/// one-time payment.
pub fn latest_end_date<'a, I>(records: I) -> Option<NaiveDate>
where
    I: IntoIterator<Item = &'a FundingRecord>,
{
    records
        .into_iter()
        .map(|f| f.end_date.unwrap_or(f.start_date))
        .max()
}
