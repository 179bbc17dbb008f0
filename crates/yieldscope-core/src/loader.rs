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

//! Raw table to typed records.
//!
//! Each metric cell is coerced on its own: a bad reading becomes "no data" for that
//! field only. A row is dropped only when its timestamp or plant is unusable.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::{ColumnMap, LoaderSettings};
use crate::error::{ReportError, Result};
use crate::metric::{Metric, MetricValues};
use crate::record::Record;
use crate::source::{RawCell, RawTable, excel_serial_to_datetime};

static EMPTY_CELL: RawCell = RawCell::Empty;

/// What happened while cleaning the raw table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub total_rows: usize,
    pub admitted_rows: usize,
    /// Rows dropped because the timestamp was missing or unparsable
    pub invalid_timestamp: usize,
    /// Rows dropped because the plant was missing (checked after the timestamp)
    pub missing_plant: usize,
    /// Non-empty metric cells that could not be read as numbers
    pub coerced_cells: usize,
    /// Optional columns absent from the header
    pub missing_columns: Vec<String>,
}

impl LoadReport {
    #[must_use]
    pub fn rejected_rows(&self) -> usize {
        self.invalid_timestamp + self.missing_plant
    }
}

/// Resolved header positions
#[derive(Debug)]
struct ColumnIndex {
    timestamp: usize,
    plant: usize,
    device: Option<usize>,
    metrics: [Option<usize>; Metric::COUNT],
}

impl ColumnIndex {
    fn resolve(table: &RawTable, columns: &ColumnMap, report: &mut LoadReport) -> Result<Self> {
        let required = |name: &str| {
            table
                .column_index(name)
                .ok_or_else(|| ReportError::MissingColumn(name.to_owned()))
        };
        let timestamp = required(&columns.timestamp)?;
        let plant = required(&columns.plant)?;

        let mut optional = |name: &str| {
            let idx = table.column_index(name);
            if idx.is_none() {
                warn!("Column '{name}' not found, treating it as no data");
                report.missing_columns.push(name.to_owned());
            }
            idx
        };
        let device = optional(&columns.device);
        let mut metrics = [None; Metric::COUNT];
        for metric in Metric::ALL {
            metrics[metric.index()] = optional(columns.metric_column(metric));
        }

        Ok(Self {
            timestamp,
            plant,
            device,
            metrics,
        })
    }
}

/// Clean a raw table into records, returning the admitted records and a report
pub fn clean_table(
    table: &RawTable,
    columns: &ColumnMap,
    settings: &LoaderSettings,
) -> Result<(Vec<Record>, LoadReport)> {
    let mut report = LoadReport::default();
    if table.headers().is_empty() && table.is_empty() {
        warn!("Source table is empty");
        return Ok((Vec::new(), report));
    }

    let index = ColumnIndex::resolve(table, columns, &mut report)?;
    let mut records = Vec::with_capacity(table.len());

    for row in table.rows() {
        report.total_rows += 1;
        let cell = |idx: usize| row.get(idx).unwrap_or(&EMPTY_CELL);

        let Some(timestamp) = parse_timestamp(cell(index.timestamp), &settings.timestamp_formats)
        else {
            report.invalid_timestamp += 1;
            continue;
        };
        let Some(plant_id) = cell_text(cell(index.plant)) else {
            report.missing_plant += 1;
            continue;
        };
        let device_id = index.device.and_then(|idx| cell_text(cell(idx)));

        let mut metrics = MetricValues::default();
        for metric in Metric::ALL {
            let Some(idx) = index.metrics[metric.index()] else {
                continue;
            };
            let raw = cell(idx);
            let value = coerce_number(raw);
            if value.is_none() && !matches!(raw, RawCell::Empty) {
                report.coerced_cells += 1;
            }
            metrics.set(metric, value);
        }

        records.push(Record::new(timestamp, plant_id, device_id, metrics));
    }

    report.admitted_rows = records.len();
    info!(
        "Cleaned {} rows: {} admitted, {} invalid timestamp, {} missing plant, \
         {} metric cells without data",
        report.total_rows,
        report.admitted_rows,
        report.invalid_timestamp,
        report.missing_plant,
        report.coerced_cells
    );
    Ok((records, report))
}

/// Read a timestamp cell; `None` marks the row invalid
#[must_use]
pub fn parse_timestamp(cell: &RawCell, formats: &[String]) -> Option<NaiveDateTime> {
    match cell {
        RawCell::DateTime(dt) => Some(*dt),
        RawCell::Number(serial) => excel_serial_to_datetime(*serial),
        RawCell::Text(s) => parse_timestamp_text(s.trim(), formats),
        RawCell::Empty | RawCell::Bool(_) | RawCell::Error => None,
    }
}

fn parse_timestamp_text(s: &str, formats: &[String]) -> Option<NaiveDateTime> {
    if s.is_empty() {
        return None;
    }
    // ISO-8601, with or without fractional seconds
    if let Ok(dt) = s.parse::<NaiveDateTime>() {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    for format in formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt);
        }
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Numeric reading of a metric cell; anything unreadable is no data
#[must_use]
pub fn coerce_number(cell: &RawCell) -> Option<f64> {
    let value = match cell {
        RawCell::Number(n) => *n,
        RawCell::Text(s) => s.trim().parse::<f64>().ok()?,
        RawCell::Empty | RawCell::Bool(_) | RawCell::DateTime(_) | RawCell::Error => return None,
    };
    value.is_finite().then_some(value)
}

/// Identifier text of a plant or device cell
fn cell_text(cell: &RawCell) -> Option<String> {
    let text = match cell {
        RawCell::Text(s) => s.trim().to_owned(),
        RawCell::Number(n) if n.fract() == 0.0 => format!("{n:.0}"),
        RawCell::Number(n) => n.to_string(),
        RawCell::Bool(b) => b.to_string(),
        RawCell::DateTime(dt) => dt.to_string(),
        RawCell::Empty | RawCell::Error => return None,
    };
    (!text.is_empty()).then_some(text)
}
