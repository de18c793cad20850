//! Application settings read from configuration and validated up front.
//!
//! Everything the domain needs from configuration is turned into plain
//! values here and passed down explicitly.

use crate::domain::enrollment::{DEFAULT_GRAD_DATE_ADJUSTMENT, MAX_GRAD_DATE_ADJUSTMENT};
use crate::domain::error::GradError;
use crate::domain::graduates::{
    DirectorySettings, DEFAULT_UPCOMING_GRADS_DAYS, MAX_UPCOMING_GRADS_DAYS,
};
use crate::domain::report::ExtraField;
use crate::ports::config_port::ConfigPort;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Spreadsheet formats the report writer understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SheetFormat {
    #[default]
    Csv,
    Tsv,
}

impl SheetFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            SheetFormat::Csv => "csv",
            SheetFormat::Tsv => "tsv",
        }
    }

    pub fn delimiter(&self) -> u8 {
        match self {
            SheetFormat::Csv => b',',
            SheetFormat::Tsv => b'\t',
        }
    }

    /// Explicit format, else the output file's extension, else `fallback`.
    pub fn resolve(
        explicit: Option<&str>,
        output: Option<&Path>,
        fallback: SheetFormat,
    ) -> Result<Self, GradError> {
        if let Some(f) = explicit {
            return f.parse();
        }
        match output.and_then(|p| p.extension()).and_then(|e| e.to_str()) {
            Some(ext) => ext.parse(),
            None => Ok(fallback),
        }
    }
}

impl FromStr for SheetFormat {
    type Err = GradError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(SheetFormat::Csv),
            "tsv" | "txt" => Ok(SheetFormat::Tsv),
            other => Err(GradError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Where records are stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    Csv { dir: PathBuf },
    Sqlite { path: String, pool_size: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportConfig {
    pub grad_date_adjustment: i64,
    pub extra_fields: Vec<ExtraField>,
    pub format: SheetFormat,
    pub upcoming_grads_days: u32,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            grad_date_adjustment: DEFAULT_GRAD_DATE_ADJUSTMENT,
            extra_fields: vec![ExtraField::Program, ExtraField::StartDate],
            format: SheetFormat::Csv,
            upcoming_grads_days: DEFAULT_UPCOMING_GRADS_DAYS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppSettings {
    pub backend: Backend,
    pub report: ReportConfig,
    pub directory: DirectorySettings,
}

impl AppSettings {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, GradError> {
        Ok(Self {
            backend: backend(config)?,
            report: report_config(config)?,
            directory: directory_settings(config)?,
        })
    }
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> GradError {
    GradError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn backend(config: &dyn ConfigPort) -> Result<Backend, GradError> {
    let kind = config
        .get_string("data", "backend")
        .unwrap_or_else(|| "csv".to_string());

    match kind.trim().to_lowercase().as_str() {
        "csv" => {
            let dir = config
                .get_string("data", "dir")
                .ok_or_else(|| GradError::ConfigMissing {
                    section: "data".into(),
                    key: "dir".into(),
                })?;
            Ok(Backend::Csv {
                dir: PathBuf::from(dir),
            })
        }
        "sqlite" => {
            let path = config
                .get_string("sqlite", "path")
                .ok_or_else(|| GradError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;
            let pool_size = config.get_int("sqlite", "pool_size", 4);
            if !(1..=64).contains(&pool_size) {
                return Err(invalid("sqlite", "pool_size", "pool_size must be between 1 and 64"));
            }
            Ok(Backend::Sqlite {
                path,
                pool_size: pool_size as u32,
            })
        }
        other => Err(invalid(
            "data",
            "backend",
            format!("unknown backend {other:?} (expected csv or sqlite)"),
        )),
    }
}

fn report_config(config: &dyn ConfigPort) -> Result<ReportConfig, GradError> {
    let defaults = ReportConfig::default();

    let grad_date_adjustment =
        config.get_int("report", "grad_date_adjustment", defaults.grad_date_adjustment);
    if !(0..=MAX_GRAD_DATE_ADJUSTMENT).contains(&grad_date_adjustment) {
        return Err(invalid(
            "report",
            "grad_date_adjustment",
            format!("grad_date_adjustment must be between 0 and {MAX_GRAD_DATE_ADJUSTMENT} days"),
        ));
    }

    let extra_fields = match config.get_list("report", "extra_fields") {
        Some(names) => names
            .iter()
            .map(|n| n.parse::<ExtraField>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|reason| invalid("report", "extra_fields", reason))?,
        None => defaults.extra_fields,
    };

    let format = match config.get_string("report", "format") {
        Some(f) => f
            .parse::<SheetFormat>()
            .map_err(|e| invalid("report", "format", e.to_string()))?,
        None => defaults.format,
    };

    let upcoming = config.get_int(
        "report",
        "upcoming_grads_days",
        i64::from(defaults.upcoming_grads_days),
    );
    let upcoming_grads_days = u32::try_from(upcoming)
        .ok()
        .filter(|days| *days <= MAX_UPCOMING_GRADS_DAYS)
        .ok_or_else(|| {
            invalid(
                "report",
                "upcoming_grads_days",
                format!("must be between 0 and {MAX_UPCOMING_GRADS_DAYS} days"),
            )
        })?;

    Ok(ReportConfig {
        grad_date_adjustment,
        extra_fields,
        format,
        upcoming_grads_days,
    })
}

fn optional_days(
    config: &dyn ConfigPort,
    key: &str,
    default: u32,
) -> Result<Option<u32>, GradError> {
    match config.get_string("directory", key) {
        None => Ok(Some(default)),
        Some(raw) if raw.trim().eq_ignore_ascii_case("none") || raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<u32>()
            .map(Some)
            .map_err(|_| invalid("directory", key, "expected a number of days or none")),
    }
}

fn directory_settings(config: &dyn ConfigPort) -> Result<DirectorySettings, GradError> {
    let defaults = DirectorySettings::default();
    Ok(DirectorySettings {
        graduation_date_cutoff: optional_days(
            config,
            "graduation_date_cutoff",
            defaults.graduation_date_cutoff.unwrap_or(0),
        )?,
        defense_date_grace: optional_days(
            config,
            "defense_date_grace",
            defaults.defense_date_grace.unwrap_or(0),
        )?,
    })
}
