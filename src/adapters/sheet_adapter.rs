//! CSV/TSV spreadsheet writer for report sheets.

use crate::domain::error::GradError;
use crate::domain::report::Sheet;
use crate::domain::settings::SheetFormat;
use crate::ports::report_port::ReportPort;
use std::io::Write;

pub struct SheetAdapter {
    format: SheetFormat,
}

impl SheetAdapter {
    pub fn new(format: SheetFormat) -> Self {
        Self { format }
    }

    fn encode_row(&self, fields: Vec<String>) -> Result<Vec<u8>, GradError> {
        let mut buf = Vec::new();
        {
            let mut writer = csv::WriterBuilder::new()
                .delimiter(self.format.delimiter())
                .has_headers(false)
                .from_writer(&mut buf);
            writer.write_record(&fields)?;
            writer.flush()?;
        }
        Ok(buf)
    }
}

impl ReportPort for SheetAdapter {
    fn write_to(&self, sheet: &Sheet, out: &mut dyn Write) -> Result<(), GradError> {
        for row in &sheet.rows {
            // Blank separator rows are written as bare line breaks.
            if row.is_empty() {
                out.write_all(b"\n")?;
                continue;
            }
            let encoded = self.encode_row(row.iter().map(|c| c.to_string()).collect())?;
            out.write_all(&encoded)?;
        }
        out.flush()?;
        tracing::debug!(rows = sheet.rows.len(), format = self.format.extension(), "wrote sheet");
        Ok(())
    }
}
