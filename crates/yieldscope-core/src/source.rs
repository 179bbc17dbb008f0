// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of YieldScope.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

//! Raw tabular sources.
//!
//! A [`TableSource`] only turns a file into an untyped [`RawTable`]; typing and
//! cleaning happen in [`crate::loader`].

use std::path::{Path, PathBuf};

use calamine::{Data, Reader, Xlsx, open_workbook};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use tracing::{debug, info};

use crate::config::{SourceFormat, SourceSettings};
use crate::error::{ReportError, Result};

/// Largest spreadsheet serial date (9999-12-31)
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

/// One untyped cell as read from the source
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
    Error,
}

impl From<&str> for RawCell {
    fn from(value: &str) -> Self {
        if value.trim().is_empty() {
            Self::Empty
        } else {
            Self::Text(value.to_owned())
        }
    }
}

impl From<f64> for RawCell {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

/// Header row plus data rows, exactly as the source laid them out
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<RawCell>>,
}

impl RawTable {
    #[must_use]
    pub fn new(headers: Vec<String>, rows: Vec<Vec<RawCell>>) -> Self {
        Self { headers, rows }
    }

    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<RawCell>] {
        &self.rows
    }

    /// Position of a header, compared after trimming
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        let name = name.trim();
        self.headers.iter().position(|h| h.trim() == name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Anything that can produce the raw telemetry table.
/// Lets the loader run against workbooks, CSV exports or in-memory tables alike.
pub trait TableSource: Send + Sync {
    /// Human readable origin, used in log lines
    fn describe(&self) -> String;

    /// Read the whole table; fails with `SourceUnavailable` if it cannot be opened
    fn read_table(&self) -> Result<RawTable>;
}

impl TableSource for RawTable {
    fn describe(&self) -> String {
        "in-memory table".to_owned()
    }

    fn read_table(&self) -> Result<RawTable> {
        Ok(self.clone())
    }
}

/// Worksheet of an xlsx workbook; the first row is the header
#[derive(Debug, Clone)]
pub struct XlsxSource {
    path: PathBuf,
    sheet: String,
}

impl XlsxSource {
    pub fn new<P: AsRef<Path>>(path: P, sheet: impl Into<String>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            sheet: sheet.into(),
        }
    }
}

impl TableSource for XlsxSource {
    fn describe(&self) -> String {
        format!("{} [{}]", self.path.display(), self.sheet)
    }

    fn read_table(&self) -> Result<RawTable> {
        let mut workbook: Xlsx<_> = open_workbook(&self.path)
            .map_err(|e| ReportError::source_unavailable(&self.path, e))?;

        let range = workbook.worksheet_range(&self.sheet).map_err(|e| {
            ReportError::source_unavailable(
                &self.path,
                format!("Failed to read worksheet '{}': {e}", self.sheet),
            )
        })?;

        let mut rows = range.rows();
        let Some(header_row) = rows.next() else {
            info!("Worksheet '{}' is empty", self.sheet);
            return Ok(RawTable::default());
        };

        let headers = header_row.iter().map(header_text).collect();
        let data: Vec<Vec<RawCell>> = rows
            .filter(|row| !row.iter().all(|cell| matches!(cell, Data::Empty)))
            .map(|row| row.iter().map(cell_from_excel).collect())
            .collect();

        debug!("Read {} rows from {}", data.len(), self.describe());
        Ok(RawTable::new(headers, data))
    }
}

/// Comma separated export with a header line
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: PathBuf,
}

impl CsvSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl TableSource for CsvSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn read_table(&self) -> Result<RawTable> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(&self.path)
            .map_err(|e| ReportError::source_unavailable(&self.path, e))?;

        let headers = reader
            .byte_headers()
            .map_err(|e| ReportError::source_unavailable(&self.path, e))?
            .iter()
            .map(|h| String::from_utf8_lossy(h).trim().to_owned())
            .collect();

        let mut rows = Vec::new();
        let mut unreadable = 0usize;
        for result in reader.byte_records() {
            match result {
                // Fields are decoded one by one so a bad byte only spoils its own cell
                Ok(record) => rows.push(record.iter().map(cell_from_bytes).collect()),
                Err(e) => {
                    // Keep the slot so the row is counted as rejected by the loader
                    debug!("Unreadable CSV record: {e}");
                    unreadable += 1;
                    rows.push(Vec::new());
                }
            }
        }

        if unreadable > 0 {
            info!("{unreadable} unreadable records in {}", self.describe());
        }
        Ok(RawTable::new(headers, rows))
    }
}

/// Pick the reader for the configured source file
pub fn open_source(settings: &SourceSettings) -> Result<Box<dyn TableSource>> {
    let path = settings
        .path
        .as_deref()
        .ok_or_else(|| ReportError::Config("source.path is not set".to_owned()))?;

    let format = settings
        .format
        .unwrap_or_else(|| SourceFormat::from_path(path));
    let source: Box<dyn TableSource> = match format {
        SourceFormat::Xlsx => Box::new(XlsxSource::new(path, settings.sheet.clone())),
        SourceFormat::Csv => Box::new(CsvSource::new(path)),
    };
    Ok(source)
}

/// Convert a spreadsheet serial date (days since 1899-12-30) to a timestamp
#[must_use]
pub fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 || serial > MAX_EXCEL_SERIAL {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    #[expect(
        clippy::cast_possible_truncation,
        reason = "serial is bounded by MAX_EXCEL_SERIAL"
    )]
    let millis = (serial * 86_400_000.0).round() as i64;
    epoch.checked_add_signed(Duration::milliseconds(millis))
}

fn cell_from_bytes(field: &[u8]) -> RawCell {
    std::str::from_utf8(field).map_or(RawCell::Error, RawCell::from)
}

fn header_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_owned(),
        Data::Empty => String::new(),
        other => other.to_string().trim().to_owned(),
    }
}

#[expect(clippy::cast_precision_loss, reason = "cell integers are small")]
fn cell_from_excel(cell: &Data) -> RawCell {
    match cell {
        Data::Empty => RawCell::Empty,
        Data::String(s) => RawCell::from(s.as_str()),
        Data::Int(i) => RawCell::Number(*i as f64),
        Data::Float(f) => RawCell::Number(*f),
        Data::Bool(b) => RawCell::Bool(*b),
        Data::DateTime(dt) => {
            excel_serial_to_datetime(dt.as_f64()).map_or(RawCell::Error, RawCell::DateTime)
        }
        Data::DateTimeIso(s) | Data::DurationIso(s) => RawCell::Text(s.clone()),
        Data::Error(_) => RawCell::Error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_excel_serial_conversion() {
        let dt = excel_serial_to_datetime(45_614.5).unwrap();
        assert_eq!(dt.to_string(), "2024-11-18 12:00:00");
        assert!(excel_serial_to_datetime(f64::NAN).is_none());
        assert!(excel_serial_to_datetime(-1.0).is_none());
        assert!(excel_serial_to_datetime(3_000_000.0).is_none());
    }

    #[test]
    fn test_csv_source_reads_headers_and_rows() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Statistical time, Power plant name ,Average wind speed (m/s)").unwrap();
        writeln!(file, "2024-01-01 00:00:00,Plant A,5.5").unwrap();
        writeln!(file, "2024-01-02 00:00:00,Plant A,").unwrap();

        let table = CsvSource::new(file.path()).read_table().unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.column_index("Power plant name"), Some(1));
        assert_eq!(table.rows()[0][2], RawCell::Text("5.5".to_owned()));
        assert_eq!(table.rows()[1][2], RawCell::Empty);
    }

    #[test]
    fn test_csv_invalid_utf8_spoils_only_its_cell() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Statistical time,Power plant name,Average wind speed (m/s)").unwrap();
        file.write_all(b"2024-01-05 10:00:00,North Ridge,\xff\xfe\n").unwrap();

        let table = CsvSource::new(file.path()).read_table().unwrap();
        assert_eq!(table.len(), 1);
        let row = &table.rows()[0];
        assert_eq!(row[0], RawCell::Text("2024-01-05 10:00:00".to_owned()));
        assert_eq!(row[1], RawCell::Text("North Ridge".to_owned()));
        assert_eq!(row[2], RawCell::Error);
    }

    #[test]
    fn test_missing_file_is_source_unavailable() {
        let err = CsvSource::new("/nonexistent/telemetry.csv")
            .read_table()
            .unwrap_err();
        assert!(matches!(err, ReportError::SourceUnavailable { .. }));

        let err = XlsxSource::new("/nonexistent/telemetry.xlsx", "Production statistics")
            .read_table()
            .unwrap_err();
        assert!(matches!(err, ReportError::SourceUnavailable { .. }));
    }

    #[test]
    fn test_open_source_requires_path() {
        let err = open_source(&SourceSettings::default()).err().unwrap();
        assert!(matches!(err, ReportError::Config(_)));

        let settings = SourceSettings {
            path: Some(PathBuf::from("export.csv")),
            ..SourceSettings::default()
        };
        assert_eq!(open_source(&settings).unwrap().describe(), "export.csv");
    }
}
