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

//! End-to-end tests: CSV export on disk -> Dataset -> views

use std::io::Write;

use chrono::NaiveDate;
use tempfile::NamedTempFile;
use yieldscope_core::{
    CsvSource, Dataset, Metric, Period, ReportConfig, ReportError, annual_production,
    daily_combined, detail_table, monthly_combined, monthly_wind_comparison, open_source,
    weekly_wind,
};

const HEADER: &str = "Statistical time,Power plant name,Device Name,\
    Active Energy Exported(kWh),Average wind speed (m/s),Average ambient temperature (°C)";

fn write_export(rows: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::with_suffix(".csv").unwrap();
    writeln!(file, "{HEADER}").unwrap();
    for row in rows {
        writeln!(file, "{row}").unwrap();
    }
    file.flush().unwrap();
    file
}

fn load(file: &NamedTempFile) -> Dataset {
    Dataset::load(&CsvSource::new(file.path()), &ReportConfig::default()).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_load_and_query_export() {
    let file = write_export(&[
        "2024-01-05 10:00:00,North Ridge,WTG-01,120.5,6.0,3.5",
        "2024-01-05 11:00:00,North Ridge,WTG-02,80,n/a,3.7",
        "2024-01-20 10:00:00,North Ridge,WTG-01,50,4.0,",
        "2024-03-02 10:00:00,North Ridge,WTG-01,10,8.0,9.0",
        "2022-07-14 10:00:00,South Bay,WTG-11,33,2.5,21.0",
        "not a date,North Ridge,WTG-01,999,1.0,1.0",
        "2024-01-06 10:00:00,,WTG-01,999,1.0,1.0",
    ]);
    let ds = load(&file);

    let report = ds.load_report();
    assert_eq!(report.total_rows, 7);
    assert_eq!(report.admitted_rows, 5);
    assert_eq!(report.invalid_timestamp, 1);
    assert_eq!(report.missing_plant, 1);
    assert_eq!(report.coerced_cells, 1);
    assert_eq!(ds.plants(), &["North Ridge".to_owned(), "South Bay".to_owned()]);
    assert_eq!(ds.years(), &[2022, 2024]);

    let monthly = monthly_combined(&ds, "North Ridge", 2024).unwrap();
    assert_eq!(monthly.len(), 12);
    assert_eq!(
        monthly.value(Period::Month(1), Metric::EnergyExported),
        Some(250.5)
    );
    assert_eq!(monthly.value(Period::Month(1), Metric::WindSpeed), Some(5.0));
    assert_eq!(monthly.value(Period::Month(2), Metric::EnergyExported), Some(0.0));

    let daily = daily_combined(&ds, "North Ridge", 2024, 1).unwrap();
    assert_eq!(daily.len(), 31);
    assert_eq!(
        daily.value(Period::Day(date(2024, 1, 5)), Metric::EnergyExported),
        Some(200.5)
    );
    assert_eq!(daily.observed_periods(), 2);

    let annual = annual_production(&ds, "South Bay").unwrap();
    assert_eq!(annual.periods(), vec![Period::Year(2022)]);

    let weekly = weekly_wind(&ds, "South Bay").unwrap();
    // global span, not the plant's own
    assert_eq!(weekly.periods().first(), Some(&Period::Week(date(2022, 7, 11))));
    assert_eq!(weekly.periods().last(), Some(&Period::Week(date(2024, 2, 26))));
    assert_eq!(weekly.observed_periods(), 1);

    let comparison = monthly_wind_comparison(&ds, "North Ridge").unwrap();
    assert_eq!(comparison.years.len(), 2);
    assert!(comparison.years[0].series.is_empty_result());

    let detail = detail_table(&ds, "North Ridge", 2024, 1).unwrap();
    assert_eq!(detail.len(), 3);
    assert_eq!(detail.rows[0].device, "WTG-01");
    assert_eq!(detail.rows[0].day, date(2024, 1, 5));
    assert_eq!(detail.rows[2].device, "WTG-02");
    assert_eq!(detail.rows[2].values[Metric::WindSpeed.index()], None);
}

#[test]
fn test_views_serialize_gaps_as_null() {
    let file = write_export(&[
        "2024-01-01 00:00:00,North Ridge,WTG-01,1,5.0,1",
        "2024-01-15 00:00:00,North Ridge,WTG-01,1,7.0,1",
    ]);
    let ds = load(&file);

    let weekly = weekly_wind(&ds, "North Ridge").unwrap();
    let json = serde_json::to_value(&weekly).unwrap();
    let rows = json["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["period"], "2024-01-01");
    assert_eq!(rows[0]["values"][0], 5.0);
    assert!(rows[1]["values"][0].is_null());

    let monthly = monthly_combined(&ds, "North Ridge", 2024).unwrap();
    let json = serde_json::to_value(&monthly).unwrap();
    assert_eq!(json["rows"][1]["period"], "Feb");
    assert_eq!(json["rows"][1]["values"][0], 0.0);
}

#[test]
fn test_config_driven_source() {
    let file = write_export(&["2023-05-01 00:00:00,North Ridge,WTG-01,1,5.0,1"]);
    let config = ReportConfig::from_toml(&format!(
        "[source]\npath = {:?}\n",
        file.path().display().to_string()
    ))
    .unwrap();

    let source = open_source(&config.source).unwrap();
    let ds = Dataset::load(source.as_ref(), &config).unwrap();
    assert_eq!(ds.len(), 1);
}

#[test]
fn test_undecodable_cell_keeps_row() {
    let mut file = NamedTempFile::with_suffix(".csv").unwrap();
    writeln!(file, "{HEADER}").unwrap();
    file.write_all(b"2024-01-05 10:00:00,North Ridge,WTG-01,120.5,\xff\xfe,4.0\n")
        .unwrap();
    file.flush().unwrap();
    let ds = load(&file);

    let report = ds.load_report();
    assert_eq!(report.total_rows, 1);
    assert_eq!(report.admitted_rows, 1);
    assert_eq!(report.invalid_timestamp, 0);
    assert_eq!(report.coerced_cells, 1);

    let record = &ds.records()[0];
    assert_eq!(record.metric(Metric::EnergyExported), Some(120.5));
    assert_eq!(record.metric(Metric::WindSpeed), None);
    assert_eq!(record.metric(Metric::AmbientTemperature), Some(4.0));
}

#[test]
fn test_missing_required_column() {
    let mut file = NamedTempFile::with_suffix(".csv").unwrap();
    writeln!(file, "When,Device Name").unwrap();
    writeln!(file, "2024-01-01 00:00:00,WTG-01").unwrap();
    file.flush().unwrap();

    let err = Dataset::load(&CsvSource::new(file.path()), &ReportConfig::default()).unwrap_err();
    assert!(matches!(err, ReportError::MissingColumn(_)));
}
