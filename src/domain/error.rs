//! Domain error types.

use chrono::NaiveDate;
use rust_decimal::Decimal;

/// A record or request that violates a data-entry invariant.
///
/// These are raised at the boundary (loading, CLI arguments) and are never
/// corrected silently.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("funding {id}: the end date ({end}) must be after the start date ({start})")]
    EndNotAfterStart {
        id: i64,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("funding {id}: amount must be positive, got {amount}")]
    NonPositiveAmount { id: i64, amount: Decimal },

    #[error("funding {id}: amount {amount} exceeds the maximum of {max}")]
    AmountTooLarge {
        id: i64,
        amount: Decimal,
        max: Decimal,
    },

    #[error("funding {id}: amount {amount} has more than 2 decimal places")]
    TooPrecise { id: i64, amount: Decimal },

    #[error("invalid date range: start {start} is after end {end}")]
    InvertedRange { start: NaiveDate, end: NaiveDate },

    #[error("a window of {days} days from {start} runs past the last representable date")]
    WindowOutOfRange { start: NaiveDate, days: u32 },

    #[error("unknown program code {0:?}")]
    UnknownProgram(String),

    #[error("unknown status code {0:?}")]
    UnknownStatus(String),
}

/// Impossible-state fault raised while prorating a single funding record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProrationError {
    #[error("funding {id} spans {days} days ({start} to {end})")]
    InvalidSpan {
        id: i64,
        start: NaiveDate,
        end: NaiveDate,
        days: i64,
    },
}

/// Top-level error type for gradfund.
#[derive(Debug, thiserror::Error)]
pub enum GradError {
    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("bad record in {source_name}: {reason}")]
    Data { source_name: String, reason: String },

    #[error("funding {funding_id} references unknown {kind} {id}")]
    UnknownReference {
        funding_id: i64,
        kind: &'static str,
        id: i64,
    },

    #[error("unsupported spreadsheet format {0:?} (expected csv or tsv)")]
    UnsupportedFormat(String),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&GradError> for std::process::ExitCode {
    fn from(err: &GradError) -> Self {
        let code: u8 = match err {
            GradError::Io(_) => 1,
            GradError::ConfigParse { .. }
            | GradError::ConfigMissing { .. }
            | GradError::ConfigInvalid { .. } => 2,
            GradError::Database { .. } | GradError::DatabaseQuery { .. } => 3,
            GradError::Validation(_)
            | GradError::Data { .. }
            | GradError::UnknownReference { .. }
            | GradError::Csv(_) => 4,
            GradError::UnsupportedFormat(_) => 5,
        };
        std::process::ExitCode::from(code)
    }
}
