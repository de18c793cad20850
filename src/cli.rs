//! CLI definition and dispatch.

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvRecordsAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::sheet_adapter::SheetAdapter;
use crate::domain::date_range::{DateRange, academic_year};
use crate::domain::error::GradError;
use crate::domain::enrollment::MAX_GRAD_DATE_ADJUSTMENT;
use crate::domain::graduates::{MAX_UPCOMING_GRADS_DAYS, directory_listing, upcoming_graduates};
use crate::domain::records::RecordSet;
use crate::domain::report::{
    Cell, ExtraField, ReportSettings, Sheet, current_totals_report, funding_report,
};
use crate::domain::settings::{AppSettings, Backend, SheetFormat};
use crate::domain::student::{ProgramGroup, StudentFilter};
use crate::ports::records_port::RecordsPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "gradfund", about = "Graduate student funding reports")]
pub struct Cli {
    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file
    #[arg(short, long, global = true, default_value = "gradfund.ini")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Prorated funding per student and source over a date range
    Report {
        /// First day of the range (defaults to the current academic year)
        #[arg(value_parser = parse_date, requires = "end")]
        start: Option<NaiveDate>,
        /// Last day of the range
        #[arg(value_parser = parse_date)]
        end: Option<NaiveDate>,
        #[arg(short, long)]
        format: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Days added to a confirmed graduation date
        #[arg(long, value_parser = clap::value_parser!(i64).range(0..=MAX_GRAD_DATE_ADJUSTMENT))]
        adjustment: Option<i64>,
        #[arg(long, value_parser = parse_date)]
        today: Option<NaiveDate>,
    },
    /// Total funding to date per current student
    Totals {
        #[arg(long, value_parser = parse_date)]
        today: Option<NaiveDate>,
        #[arg(short, long)]
        format: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Students graduating soon
    Graduates {
        #[arg(long, value_parser = parse_date)]
        today: Option<NaiveDate>,
        #[arg(
            long,
            value_parser = clap::value_parser!(u32).range(0..=i64::from(MAX_UPCOMING_GRADS_DAYS))
        )]
        days: Option<u32>,
        /// Include unconfirmed graduation dates
        #[arg(long)]
        all: bool,
    },
    /// Students to list in the departmental directory
    Directory {
        #[arg(long, value_enum, default_value_t = DirectoryFilter::Active)]
        filter: DirectoryFilter,
        #[arg(long, value_parser = parse_date)]
        today: Option<NaiveDate>,
    },
    /// Tab-separated student listing
    List {
        /// Every active student, not only current ones
        #[arg(long)]
        all: bool,
        /// Comma-separated student fields
        #[arg(long)]
        fields: Option<String>,
    },
    /// Load every record and report validation problems
    Validate,
    /// Create a SQLite records database
    InitDb {
        path: PathBuf,
        /// Directory of CSV record files to import
        #[arg(long)]
        from: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DirectoryFilter {
    Active,
    Phd,
    Msc,
}

impl From<DirectoryFilter> for ProgramGroup {
    fn from(filter: DirectoryFilter) -> Self {
        match filter {
            DirectoryFilter::Active => ProgramGroup::Any,
            DirectoryFilter::Phd => ProgramGroup::PhD,
            DirectoryFilter::Msc => ProgramGroup::Msc,
        }
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Report {
            start,
            end,
            format,
            output,
            adjustment,
            today,
        } => run_report(
            &cli.config,
            start.zip(end),
            format.as_deref(),
            output.as_deref(),
            adjustment,
            today,
        ),
        Command::Totals {
            today,
            format,
            output,
        } => run_totals(&cli.config, today, format.as_deref(), output.as_deref()),
        Command::Graduates { today, days, all } => run_graduates(&cli.config, today, days, all),
        Command::Directory { filter, today } => run_directory(&cli.config, filter.into(), today),
        Command::List { all, fields } => run_list(&cli.config, all, fields.as_deref()),
        Command::Validate => run_validate(&cli.config),
        Command::InitDb { path, from } => run_init_db(&path, from.as_deref()),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_settings(path: &Path) -> Result<AppSettings, GradError> {
    let adapter = FileConfigAdapter::from_file(path)?;
    AppSettings::from_config(&adapter)
}

pub fn open_records(backend: &Backend) -> Result<Box<dyn RecordsPort>, GradError> {
    match backend {
        Backend::Csv { dir } => Ok(Box::new(CsvRecordsAdapter::new(dir.clone()))),
        #[cfg(feature = "sqlite")]
        Backend::Sqlite { path, pool_size } => {
            use crate::adapters::sqlite_adapter::SqliteRecordsAdapter;
            Ok(Box::new(SqliteRecordsAdapter::open(path, *pool_size)?))
        }
        #[cfg(not(feature = "sqlite"))]
        Backend::Sqlite { .. } => Err(GradError::Database {
            reason: "sqlite feature is required for the sqlite backend".into(),
        }),
    }
}

/// Records for the reporting commands. Invalid funding is left out with a
/// warning so one bad row does not stop a report.
fn load_records(settings: &AppSettings) -> Result<RecordSet, GradError> {
    let port = open_records(&settings.backend)?;
    let (records, problems) = RecordSet::load_lenient(port.as_ref())?;
    for p in &problems {
        eprintln!("warning: {p}");
    }
    Ok(records)
}

/// Student fields named on the command line.
pub fn parse_fields(list: &str) -> Result<Vec<ExtraField>, GradError> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<ExtraField>().map_err(|reason| GradError::ConfigInvalid {
                section: "cli".into(),
                key: "fields".into(),
                reason,
            })
        })
        .collect()
}

fn today_or_now(today: Option<NaiveDate>) -> NaiveDate {
    today.unwrap_or_else(|| Local::now().date_naive())
}

fn write_sheet(
    sheet: &Sheet,
    format: Option<&str>,
    output: Option<&Path>,
    fallback: SheetFormat,
) -> Result<(), GradError> {
    let format = SheetFormat::resolve(format, output, fallback)?;
    SheetAdapter::new(format).write(sheet, output)?;
    if let Some(path) = output {
        eprintln!("Wrote {}", path.display());
    }
    Ok(())
}

fn run_report(
    config_path: &Path,
    range: Option<(NaiveDate, NaiveDate)>,
    format: Option<&str>,
    output: Option<&Path>,
    adjustment: Option<i64>,
    today: Option<NaiveDate>,
) -> Result<ExitCode, GradError> {
    let settings = load_settings(config_path)?;
    let today = today_or_now(today);
    let range = match range {
        Some((start, end)) => DateRange::new(start, end)?,
        None => academic_year(today),
    };
    let records = load_records(&settings)?;

    let report_settings = ReportSettings {
        today,
        grad_date_adjustment: adjustment.unwrap_or(settings.report.grad_date_adjustment),
        extra_fields: settings.report.extra_fields.clone(),
    };
    let report = funding_report(&records, range, &report_settings);

    for s in &report.skipped {
        eprintln!(
            "warning: skipped funding {} for student {}: {}",
            s.funding_id, s.student_id, s.error
        );
    }
    eprintln!(
        "{} students, total {:.2} for {}",
        report.student_count, report.grand_total, range
    );

    write_sheet(&report.sheet, format, output, settings.report.format)?;
    Ok(ExitCode::SUCCESS)
}

fn run_totals(
    config_path: &Path,
    today: Option<NaiveDate>,
    format: Option<&str>,
    output: Option<&Path>,
) -> Result<ExitCode, GradError> {
    let settings = load_settings(config_path)?;
    let records = load_records(&settings)?;

    let report_settings = ReportSettings {
        today: today_or_now(today),
        grad_date_adjustment: settings.report.grad_date_adjustment,
        extra_fields: settings.report.extra_fields.clone(),
    };
    let sheet = current_totals_report(&records, &report_settings)?;
    write_sheet(&sheet, format, output, settings.report.format)?;
    Ok(ExitCode::SUCCESS)
}

fn run_graduates(
    config_path: &Path,
    today: Option<NaiveDate>,
    days: Option<u32>,
    all: bool,
) -> Result<ExitCode, GradError> {
    let settings = load_settings(config_path)?;
    let records = load_records(&settings)?;
    let today = today_or_now(today);
    let days = days.unwrap_or(settings.report.upcoming_grads_days);

    let mut sheet = Sheet::default();
    sheet.push(vec![
        "Graduation Date".into(),
        "Name".into(),
        "Program".into(),
        "Confirmed".into(),
    ]);
    let found = upcoming_graduates(&records.students, today, days, !all)?;
    for s in &found {
        sheet.push(vec![
            s.graduation_date.into(),
            s.name.as_str().into(),
            s.program.display_name().into(),
            Cell::from(if s.graduation_date_confirmed { "yes" } else { "no" }),
        ]);
    }
    eprintln!("{} upcoming graduates", found.len());

    SheetAdapter::new(SheetFormat::Tsv).write(&sheet, None)?;
    Ok(ExitCode::SUCCESS)
}

fn run_directory(
    config_path: &Path,
    program: ProgramGroup,
    today: Option<NaiveDate>,
) -> Result<ExitCode, GradError> {
    let settings = load_settings(config_path)?;
    let records = load_records(&settings)?;
    let listed = directory_listing(
        &records.students,
        program,
        today_or_now(today),
        &settings.directory,
    );

    let mut sheet = Sheet::default();
    for s in &listed {
        sheet.push(vec![
            s.name.as_str().into(),
            s.program.display_name().into(),
        ]);
    }
    SheetAdapter::new(SheetFormat::Tsv).write(&sheet, None)?;
    Ok(ExitCode::SUCCESS)
}

fn run_list(config_path: &Path, all: bool, fields: Option<&str>) -> Result<ExitCode, GradError> {
    let settings = load_settings(config_path)?;
    let fields = match fields {
        Some(list) => parse_fields(list)?,
        None => vec![ExtraField::Program, ExtraField::Status],
    };
    let records = load_records(&settings)?;

    let filter = if all {
        StudentFilter::default()
    } else {
        StudentFilter::current()
    };

    let mut sheet = Sheet::default();
    let mut header: Vec<Cell> = vec!["Name".into()];
    header.extend(fields.iter().map(|f| Cell::from(f.title())));
    sheet.push(header);
    for s in filter.apply(&records.students) {
        let mut row: Vec<Cell> = vec![s.name.as_str().into()];
        row.extend(fields.iter().map(|f| f.value(s)));
        sheet.push(row);
    }
    SheetAdapter::new(SheetFormat::Tsv).write(&sheet, None)?;
    Ok(ExitCode::SUCCESS)
}

fn run_validate(config_path: &Path) -> Result<ExitCode, GradError> {
    let settings = load_settings(config_path)?;
    let port = open_records(&settings.backend)?;
    let records = RecordSet::read(port.as_ref())?;

    let problems = records.problems();
    eprintln!(
        "Checked {} students, {} sources, {} funding records",
        records.students.len(),
        records.sources.len(),
        records.funding.len()
    );
    match problems.first() {
        None => {
            eprintln!("Records are valid.");
            Ok(ExitCode::SUCCESS)
        }
        Some(first) => {
            for p in &problems {
                eprintln!("invalid: {p}");
            }
            eprintln!("{} problems found", problems.len());
            Ok(first.into())
        }
    }
}

#[cfg(feature = "sqlite")]
fn run_init_db(path: &Path, from: Option<&Path>) -> Result<ExitCode, GradError> {
    use crate::adapters::sqlite_adapter::SqliteRecordsAdapter;

    let path_str = path.to_str().ok_or_else(|| GradError::Database {
        reason: format!("database path {} is not valid UTF-8", path.display()),
    })?;
    let adapter = SqliteRecordsAdapter::open(path_str, 1)?;
    adapter.initialize_schema()?;
    eprintln!("Initialized {}", path.display());

    if let Some(dir) = from {
        let records = RecordSet::load(&CsvRecordsAdapter::new(dir.to_path_buf()))?;
        adapter.import(&records)?;
        eprintln!(
            "Imported {} students, {} sources, {} funding records from {}",
            records.students.len(),
            records.sources.len(),
            records.funding.len(),
            dir.display()
        );
    }
    Ok(ExitCode::SUCCESS)
}

#[cfg(not(feature = "sqlite"))]
fn run_init_db(_path: &Path, _from: Option<&Path>) -> Result<ExitCode, GradError> {
    Err(GradError::Database {
        reason: "sqlite feature is required for init-db".into(),
    })
}
