//! Report output port trait.

use crate::domain::error::GradError;
use crate::domain::report::Sheet;
use std::io::Write;
use std::path::Path;

/// Port for writing report sheets.
pub trait ReportPort {
    fn write_to(&self, sheet: &Sheet, out: &mut dyn Write) -> Result<(), GradError>;

    /// Default implementation: write to `path`, or to stdout when `None`.
    fn write(&self, sheet: &Sheet, path: Option<&Path>) -> Result<(), GradError> {
        match path {
            Some(path) => {
                let mut file = std::fs::File::create(path)?;
                self.write_to(sheet, &mut file)
            }
            None => {
                let stdout = std::io::stdout();
                let mut lock = stdout.lock();
                self.write_to(sheet, &mut lock)
            }
        }
    }
}
