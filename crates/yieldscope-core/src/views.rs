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

//! Named report queries.
//!
//! Each view validates its selection, aggregates, and regularizes onto the grid
//! its chart needs. Views are pure functions of the dataset and the selection.
//! Monthly and daily combined views fill gaps with zero; the weekly view keeps them.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::aggregate::{AggregationResult, Filter, GroupKey, KeyValue, aggregate};
use crate::dataset::{Dataset, FilterOptions};
use crate::error::Result;
use crate::metric::{Metric, ReducerTable};
use crate::regularize::{FillPolicy, Grid, RegularizedSeries, regularize};

/// Leading columns of the detail table, before the metric headers
pub const DETAIL_KEY_COLUMNS: [&str; 2] = ["Device Name", "Day"];

/// Monthly series for one year
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearSeries {
    pub year: i32,
    pub series: RegularizedSeries,
}

/// One monthly series per dataset year, oldest first
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyComparison {
    pub plant: String,
    pub years: Vec<YearSeries>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailRow {
    pub device: String,
    pub day: NaiveDate,
    /// Values in [`Metric::ALL`] order
    pub values: Vec<Option<f64>>,
}

/// Per-device daily breakdown, sorted by device then day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailTable {
    pub columns: Vec<String>,
    pub rows: Vec<DetailRow>,
}

impl DetailTable {
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Selection surface for a front end
#[must_use]
pub fn filter_options(dataset: &Dataset) -> FilterOptions {
    dataset.filter_options()
}

/// Average wind speed per month, one series per year in the dataset
pub fn monthly_wind_comparison(dataset: &Dataset, plant: &str) -> Result<MonthlyComparison> {
    let filter = Filter::plant(plant);
    dataset.check_filter(&filter)?;

    let reducers = ReducerTable::of(&[Metric::WindSpeed]);
    let result = aggregate(dataset, &filter, &[GroupKey::Year, GroupKey::Month], &reducers);
    let mut parts = result.split_by(GroupKey::Year).unwrap_or_default();

    let grid = Grid::months();
    let policy = FillPolicy::absent();
    let years = dataset
        .years()
        .iter()
        .map(|&year| {
            let part = parts
                .remove(&KeyValue::Int(i64::from(year)))
                .unwrap_or_else(|| {
                    let metrics = reducers.metrics();
                    AggregationResult::from_rows(vec![GroupKey::Month], metrics, Vec::new())
                });
            regularize(&part, &grid, &policy).map(|series| YearSeries { year, series })
        })
        .collect::<Result<Vec<_>>>()?;

    debug!("Monthly wind comparison for {plant}: {} years", years.len());
    Ok(MonthlyComparison {
        plant: plant.to_owned(),
        years,
    })
}

/// Average wind speed per week over the whole dataset span, gaps kept
pub fn weekly_wind(dataset: &Dataset, plant: &str) -> Result<RegularizedSeries> {
    let filter = Filter::plant(plant);
    dataset.check_filter(&filter)?;

    let result = aggregate(
        dataset,
        &filter,
        &[GroupKey::WeekStart],
        &ReducerTable::of(&[Metric::WindSpeed]),
    );
    let series = regularize(&result, &Grid::dataset_weeks(dataset), &FillPolicy::absent())?;
    debug!(
        "Weekly wind for {plant}: {}/{} weeks observed",
        series.observed_periods(),
        series.len()
    );
    Ok(series)
}

/// Exported energy per observed year
pub fn annual_production(dataset: &Dataset, plant: &str) -> Result<RegularizedSeries> {
    let filter = Filter::plant(plant);
    dataset.check_filter(&filter)?;

    let result = aggregate(
        dataset,
        &filter,
        &[GroupKey::Year],
        &ReducerTable::of(&[Metric::EnergyExported]),
    );
    let grid = Grid::observed_years(&result)?;
    let series = regularize(&result, &grid, &FillPolicy::zero())?;
    debug!("Annual production for {plant}: {} years", series.len());
    Ok(series)
}

/// Exported energy total and mean wind speed per month of one year
pub fn monthly_combined(dataset: &Dataset, plant: &str, year: i32) -> Result<RegularizedSeries> {
    let filter = Filter::plant(plant).year(year);
    dataset.check_filter(&filter)?;

    let result = aggregate(dataset, &filter, &[GroupKey::Month], &combined_reducers());
    let series = regularize(&result, &Grid::months(), &FillPolicy::zero())?;
    debug!(
        "Monthly combined for {plant} {year}: {} months observed",
        series.observed_periods()
    );
    Ok(series)
}

/// Exported energy total and mean wind speed per day of one month
pub fn daily_combined(
    dataset: &Dataset,
    plant: &str,
    year: i32,
    month: u32,
) -> Result<RegularizedSeries> {
    let filter = Filter::plant(plant).year(year).month(month);
    dataset.check_filter(&filter)?;

    let grid = Grid::days_in_month(year, month)?;
    let result = aggregate(dataset, &filter, &[GroupKey::Day], &combined_reducers());
    let series = regularize(&result, &grid, &FillPolicy::zero())?;
    debug!(
        "Daily combined for {plant} {year}-{month:02}: {} days observed",
        series.observed_periods()
    );
    Ok(series)
}

/// Every metric per device and day of one month, with its declared reducer
pub fn detail_table(dataset: &Dataset, plant: &str, year: i32, month: u32) -> Result<DetailTable> {
    let filter = Filter::plant(plant).year(year).month(month);
    dataset.check_filter(&filter)?;

    let result = aggregate(
        dataset,
        &filter,
        &[GroupKey::DeviceId, GroupKey::Day],
        &ReducerTable::defaults(),
    );

    let rows: Vec<DetailRow> = result
        .iter()
        .filter_map(|(key, values)| match key.as_slice() {
            [KeyValue::Text(device), KeyValue::Date(day)] => Some(DetailRow {
                device: device.clone(),
                day: *day,
                values: values.to_vec(),
            }),
            _ => None,
        })
        .collect();

    let columns = DETAIL_KEY_COLUMNS
        .iter()
        .copied()
        .chain(result.metrics().iter().map(|m| m.column_name()))
        .map(str::to_owned)
        .collect();

    debug!("Detail table for {plant} {year}-{month:02}: {} rows", rows.len());
    Ok(DetailTable { columns, rows })
}

fn combined_reducers() -> ReducerTable {
    ReducerTable::of(&[Metric::EnergyExported, Metric::WindSpeed])
}
