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

//! YieldScope reporting core
//!
//! Turns a flat export of plant production telemetry into chart-ready series.
//!
//! ## Pipeline
//!
//! - **Loading**: read a workbook or CSV export, coerce types, drop unusable rows
//! - **Calendar keys**: year, month, ISO week, week start and day per record
//! - **Aggregation**: filter, group and reduce each metric by sum or mean
//! - **Regularization**: left join onto a complete month, week, day or year grid
//! - **Views**: the named report queries built from the steps above

pub mod aggregate;
pub mod calendar;
pub mod config;
pub mod dataset;
pub mod error;
pub mod loader;
pub mod metric;
pub mod record;
pub mod regularize;
pub mod source;
pub mod views;

pub use aggregate::{AggregationResult, Filter, GroupKey, KeyValue, aggregate};
pub use config::{ColumnMap, LoaderSettings, ReportConfig, SourceFormat, SourceSettings};
pub use dataset::{Dataset, FilterOptions, MonthOption};
pub use error::{FilterField, ReportError, Result};
pub use loader::LoadReport;
pub use metric::{Metric, MetricValues, Reducer, ReducerTable};
pub use record::Record;
pub use regularize::{
    Fill, FillPolicy, Granularity, Grid, Period, RegularizedSeries, SeriesRow, regularize,
};
pub use source::{CsvSource, RawCell, RawTable, TableSource, XlsxSource, open_source};
pub use views::{
    DetailRow, DetailTable, MonthlyComparison, YearSeries, annual_production, daily_combined,
    detail_table, filter_options, monthly_combined, monthly_wind_comparison, weekly_wind,
};
