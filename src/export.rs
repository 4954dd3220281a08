//! CSV export of package records.
//!
//! Minimal RFC-4180 style writer, std-only. One row per record, columns in
//! the fixed [`COLUMNS`] order, no index column. Rows are written through a
//! buffered writer as they arrive, so a partial file survives an aborted
//! run up to the last flushed record.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::model::PackageRecord;

/// Output column names, in order. Matches the field order of
/// [`PackageRecord`].
pub const COLUMNS: [&str; 15] = [
    "name",
    "version",
    "summary",
    "author",
    "author_email",
    "project_url",
    "requires_python",
    "license",
    "last_release_date",
    "release_count",
    "package_size",
    "has_wheel",
    "has_egg",
    "development_status",
    "intended_audience",
];

fn needs_quotes(field: &str) -> bool {
    field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r')
}

/// Writes a single CSV row to any writer.
pub fn write_row<W: Write>(mut w: W, row: &[String]) -> io::Result<()> {
    let mut first = true;
    for cell in row {
        if !first {
            write!(w, ",")?;
        } else {
            first = false;
        }
        if needs_quotes(cell) {
            let escaped = cell.replace('"', "\"\"");
            write!(w, "\"{}\"", escaped)?;
        } else {
            write!(w, "{}", cell)?;
        }
    }
    writeln!(w)
}

/// Flattens one record into its row of cells, in [`COLUMNS`] order.
pub fn record_row(record: &PackageRecord) -> Vec<String> {
    vec![
        record.name.clone(),
        record.version.clone(),
        record.summary.clone(),
        record.author.clone(),
        record.author_email.clone(),
        record.project_url.clone(),
        record.requires_python.clone(),
        record.license.clone(),
        record.last_release_date.clone(),
        record.release_count.to_string(),
        record.package_size.to_string(),
        record.has_wheel.to_string(),
        record.has_egg.to_string(),
        record.development_status.clone(),
        record.intended_audience.clone(),
    ]
}

/// Incremental CSV exporter. The header row is written on construction.
pub struct CsvExporter<W: Write> {
    writer: W,
    rows_written: usize,
}

impl CsvExporter<BufWriter<File>> {
    /// Creates (or truncates) `path` and writes the header row.
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        Self::from_writer(BufWriter::new(File::create(path)?))
    }
}

impl<W: Write> CsvExporter<W> {
    /// Wraps an existing writer and writes the header row.
    pub fn from_writer(mut writer: W) -> io::Result<Self> {
        let header: Vec<String> = COLUMNS.iter().map(|c| c.to_string()).collect();
        write_row(&mut writer, &header)?;
        Ok(Self {
            writer,
            rows_written: 0,
        })
    }

    /// Appends one record as a row.
    pub fn write_record(&mut self, record: &PackageRecord) -> io::Result<()> {
        write_row(&mut self.writer, &record_row(record))?;
        self.rows_written += 1;
        Ok(())
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Flushes and returns the inner writer.
    pub fn finish(mut self) -> io::Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> PackageRecord {
        PackageRecord {
            name: "fpga-toolkit".to_string(),
            version: "0.3.1".to_string(),
            summary: "Bitstream utilities, now with commas".to_string(),
            author: "Ada".to_string(),
            author_email: "ada@example.org".to_string(),
            project_url: "https://pypi.org/project/fpga-toolkit/".to_string(),
            requires_python: ">=3.8".to_string(),
            license: "MIT".to_string(),
            last_release_date: "2024-05-01T12:00:00".to_string(),
            release_count: 3,
            package_size: 350,
            has_wheel: true,
            has_egg: false,
            development_status: "Beta".to_string(),
            intended_audience: "Developers".to_string(),
        }
    }

    fn export_to_string(records: &[PackageRecord]) -> String {
        let mut exporter = CsvExporter::from_writer(Vec::new()).unwrap();
        for record in records {
            exporter.write_record(record).unwrap();
        }
        String::from_utf8(exporter.finish().unwrap()).unwrap()
    }

    #[test]
    fn test_header_matches_columns() {
        let out = export_to_string(&[]);
        let header = out.lines().next().unwrap();
        assert_eq!(header, COLUMNS.join(","));
    }

    #[test]
    fn test_record_row_quoting_and_order() {
        let out = export_to_string(&[sample_record()]);
        let mut lines = out.lines();
        lines.next(); // header
        let row = lines.next().unwrap();
        assert!(row.starts_with("fpga-toolkit,0.3.1,"));
        // The comma-carrying summary must be quoted.
        assert!(row.contains("\"Bitstream utilities, now with commas\""));
        assert!(row.ends_with(",3,350,true,false,Beta,Developers"));
        assert!(lines.next().is_none());
    }

    #[test]
    fn test_embedded_quote_is_doubled() {
        let mut record = sample_record();
        record.summary = "says \"hi\"".to_string();
        let out = export_to_string(&[record]);
        assert!(out.contains("\"says \"\"hi\"\"\""));
    }

    #[test]
    fn test_one_row_per_record() {
        let records = vec![sample_record(), sample_record(), sample_record()];
        let out = export_to_string(&records);
        assert_eq!(out.lines().count(), 4, "header plus three rows");
        assert_eq!(records.len(), 3);
    }
}
