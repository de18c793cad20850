//! Text encodings of record fields shared by the CSV and SQLite adapters.

use crate::domain::error::GradError;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

fn bad(source_name: &str, reason: String) -> GradError {
    GradError::Data {
        source_name: source_name.to_string(),
        reason,
    }
}

pub fn parse_date(source_name: &str, field: &str, value: &str) -> Result<NaiveDate, GradError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|e| bad(source_name, format!("invalid {field} {value:?}: {e}")))
}

/// Empty or absent means no date.
pub fn parse_optional_date(
    source_name: &str,
    field: &str,
    value: Option<&str>,
) -> Result<Option<NaiveDate>, GradError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => parse_date(source_name, field, v).map(Some),
    }
}

/// Empty or absent means `default`.
pub fn parse_bool(
    source_name: &str,
    field: &str,
    value: Option<&str>,
    default: bool,
) -> Result<bool, GradError> {
    match value.map(|v| v.trim().to_lowercase()).as_deref() {
        None | Some("") => Ok(default),
        Some("true" | "yes" | "1") => Ok(true),
        Some("false" | "no" | "0") => Ok(false),
        Some(other) => Err(bad(source_name, format!("invalid {field} {other:?}"))),
    }
}

pub fn parse_amount(source_name: &str, value: &str) -> Result<Decimal, GradError> {
    Decimal::from_str(value.trim())
        .map_err(|e| bad(source_name, format!("invalid amount {value:?}: {e}")))
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}
