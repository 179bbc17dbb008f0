// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of YieldScope.

//! Output formatters for report results.

use comfy_table::{Attribute, Cell, CellAlignment, Table, presets::UTF8_FULL};
use yieldscope_core::{
    DetailTable, FilterOptions, Granularity, LoadReport, MonthlyComparison, Period,
    RegularizedSeries,
};

/// Formatter for pretty terminal tables
pub struct TableFormatter;

impl TableFormatter {
    /// One row per grid period, one column per metric
    pub fn format_series(series: &RegularizedSeries) -> String {
        let mut table = new_table();
        let mut header = vec![header_cell(granularity_title(series))];
        header.extend(series.metrics().iter().map(|m| header_cell(m.column_name())));
        table.set_header(header);

        for row in series.rows() {
            let mut cells = vec![Cell::new(row.period.label())];
            cells.extend(row.values.iter().map(|v| value_cell(*v)));
            table.add_row(cells);
        }

        format!(
            "{table}\n{} of {} periods with data\n",
            series.observed_periods(),
            series.len()
        )
    }

    /// Months down, years across
    pub fn format_comparison(comparison: &MonthlyComparison) -> String {
        let mut table = new_table();
        let mut header = vec![header_cell("Month")];
        header.extend(comparison.years.iter().map(|y| header_cell(y.year.to_string())));
        table.set_header(header);

        for month in 1..=12 {
            let period = Period::Month(month);
            let mut cells = vec![Cell::new(period.label())];
            cells.extend(comparison.years.iter().map(|y| {
                let value = y
                    .series
                    .metrics()
                    .first()
                    .and_then(|metric| y.series.value(period, *metric));
                value_cell(value)
            }));
            table.add_row(cells);
        }

        format!("{table}\nPlant: {}\n", comparison.plant)
    }

    pub fn format_detail(detail: &DetailTable) -> String {
        let mut table = new_table();
        table.set_header(detail.columns.iter().map(header_cell).collect::<Vec<_>>());

        for row in &detail.rows {
            let mut cells = vec![
                Cell::new(&row.device),
                Cell::new(row.day.format("%Y-%m-%d")),
            ];
            cells.extend(row.values.iter().map(|v| value_cell(*v)));
            table.add_row(cells);
        }

        format!("{table}\n{} rows\n", detail.len())
    }

    pub fn format_options(options: &FilterOptions, report: &LoadReport) -> String {
        let mut table = new_table();
        table.set_header(vec![header_cell("Selection"), header_cell("Values")]);
        table.add_row(vec![Cell::new("Plants"), Cell::new(options.plants.join("\n"))]);
        table.add_row(vec![
            Cell::new("Years"),
            Cell::new(
                options
                    .years
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
        ]);
        table.add_row(vec![
            Cell::new("Months"),
            Cell::new(
                options
                    .months
                    .iter()
                    .map(|m| m.label)
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
        ]);

        let mut output = format!("{table}\n");
        output.push_str(&format!(
            "Rows: {} read, {} admitted, {} rejected ({} invalid timestamp, {} missing plant)\n",
            report.total_rows,
            report.admitted_rows,
            report.rejected_rows(),
            report.invalid_timestamp,
            report.missing_plant
        ));
        if !report.missing_columns.is_empty() {
            output.push_str(&format!(
                "Missing columns: {}\n",
                report.missing_columns.join(", ")
            ));
        }
        output
    }
}

fn new_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table
}

fn header_cell(text: impl ToString) -> Cell {
    Cell::new(text).add_attribute(Attribute::Bold)
}

fn value_cell(value: Option<f64>) -> Cell {
    match value {
        Some(v) => Cell::new(format!("{v:.2}")).set_alignment(CellAlignment::Right),
        None => Cell::new("-").set_alignment(CellAlignment::Center),
    }
}

fn granularity_title(series: &RegularizedSeries) -> &'static str {
    match series.granularity() {
        Granularity::Month => "Month",
        Granularity::Week => "Week of",
        Granularity::Day => "Day",
        Granularity::Year => "Year",
    }
}
