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

//! Calendar grids and the left join of aggregation results onto them.
//!
//! The grid alone decides which rows exist and in what order; the aggregation
//! result only supplies values. Every output has exactly one row per grid period.

use std::collections::{BTreeMap, HashSet};

use chrono::{Days, NaiveDate};
use serde::{Serialize, Serializer};

use crate::aggregate::{AggregationResult, GroupKey, KeyValue};
use crate::calendar::{month_bounds, month_label, week_start};
use crate::dataset::Dataset;
use crate::error::{FilterField, ReportError, Result};
use crate::metric::Metric;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Month,
    Week,
    Day,
    Year,
}

impl Granularity {
    /// The single grouping key an aggregation must use to join onto this grid
    #[must_use]
    pub fn group_key(self) -> GroupKey {
        match self {
            Self::Month => GroupKey::Month,
            Self::Week => GroupKey::WeekStart,
            Self::Day => GroupKey::Day,
            Self::Year => GroupKey::Year,
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Month => "month",
            Self::Week => "week",
            Self::Day => "day",
            Self::Year => "year",
        }
    }
}

/// Identifier of one grid slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Period {
    /// 1-12
    Month(u32),
    /// Monday opening the week
    Week(NaiveDate),
    Day(NaiveDate),
    Year(i32),
}

impl Period {
    /// Display label: month abbreviation, ISO date or year
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Month(m) => month_label(*m).map_or_else(|| m.to_string(), str::to_owned),
            Self::Week(d) | Self::Day(d) => d.format("%Y-%m-%d").to_string(),
            Self::Year(y) => y.to_string(),
        }
    }

    #[must_use]
    pub fn granularity(&self) -> Granularity {
        match self {
            Self::Month(_) => Granularity::Month,
            Self::Week(_) => Granularity::Week,
            Self::Day(_) => Granularity::Day,
            Self::Year(_) => Granularity::Year,
        }
    }

    #[must_use]
    pub fn key_value(&self) -> KeyValue {
        match self {
            Self::Month(m) => KeyValue::Int(i64::from(*m)),
            Self::Week(d) | Self::Day(d) => KeyValue::Date(*d),
            Self::Year(y) => KeyValue::Int(i64::from(*y)),
        }
    }

    /// Interpret an aggregation key as a period of `granularity`
    #[must_use]
    pub fn from_key(granularity: Granularity, key: &KeyValue) -> Option<Self> {
        match granularity {
            Granularity::Month => u32::try_from(key.as_int()?).ok().map(Self::Month),
            Granularity::Week => key.as_date().map(Self::Week),
            Granularity::Day => key.as_date().map(Self::Day),
            Granularity::Year => i32::try_from(key.as_int()?).ok().map(Self::Year),
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.label())
    }
}

impl Serialize for Period {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Year(y) => serializer.serialize_i32(*y),
            Self::Month(_) | Self::Week(_) | Self::Day(_) => {
                serializer.serialize_str(&self.label())
            }
        }
    }
}

/// Complete, ordered set of periods expected for one granularity and span
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    granularity: Granularity,
    periods: Vec<Period>,
}

impl Grid {
    /// January to December
    #[must_use]
    pub fn months() -> Self {
        Self {
            granularity: Granularity::Month,
            periods: (1..=12).map(Period::Month).collect(),
        }
    }

    /// Every Monday from the week of `first` to the week of `last`, inclusive
    #[must_use]
    pub fn weeks(first: NaiveDate, last: NaiveDate) -> Self {
        let mut periods = Vec::new();
        let end = week_start(last);
        let mut current = week_start(first);
        while current <= end {
            periods.push(Period::Week(current));
            match current.checked_add_days(Days::new(7)) {
                Some(next) => current = next,
                None => break,
            }
        }
        Self {
            granularity: Granularity::Week,
            periods,
        }
    }

    /// Week grid over the whole dataset, independent of any filter
    #[must_use]
    pub fn dataset_weeks(dataset: &Dataset) -> Self {
        dataset.week_span().map_or(
            Self {
                granularity: Granularity::Week,
                periods: Vec::new(),
            },
            |(first, last)| Self::weeks(first, last),
        )
    }

    /// Every calendar day of one month
    pub fn days_in_month(year: i32, month: u32) -> Result<Self> {
        let (first, last) = month_bounds(year, month)
            .ok_or_else(|| ReportError::unknown(FilterField::Month, month))?;
        let periods = first
            .iter_days()
            .take_while(|d| *d <= last)
            .map(Period::Day)
            .collect();
        Ok(Self {
            granularity: Granularity::Day,
            periods,
        })
    }

    /// Years present in a result grouped by year, ascending; gaps are not filled
    pub fn observed_years(result: &AggregationResult) -> Result<Self> {
        check_keys(result, Granularity::Year)?;
        let periods = result
            .iter()
            .filter_map(|(key, _)| {
                key.first()
                    .and_then(|value| Period::from_key(Granularity::Year, value))
            })
            .collect();
        Ok(Self {
            granularity: Granularity::Year,
            periods,
        })
    }

    #[must_use]
    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    #[must_use]
    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.periods.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }
}

/// How a grid slot without a value is represented
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Fill {
    /// Keep the no-data marker, so line charts show a gap
    #[default]
    Absent,
    /// Use 0, so bars and totals stay aligned
    Zero,
}

impl Fill {
    fn apply(self, value: Option<f64>) -> Option<f64> {
        match self {
            Self::Absent => value,
            Self::Zero => Some(value.unwrap_or(0.0)),
        }
    }
}

/// Per-metric fill rule with a fallback for unlisted metrics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FillPolicy {
    fallback: Fill,
    per_metric: BTreeMap<Metric, Fill>,
}

impl FillPolicy {
    #[must_use]
    pub fn absent() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn zero() -> Self {
        Self {
            fallback: Fill::Zero,
            per_metric: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with(mut self, metric: Metric, fill: Fill) -> Self {
        self.per_metric.insert(metric, fill);
        self
    }

    #[must_use]
    pub fn fill_for(&self, metric: Metric) -> Fill {
        self.per_metric.get(&metric).copied().unwrap_or(self.fallback)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesRow {
    pub period: Period,
    /// One value per series metric, `None` being no data
    pub values: Vec<Option<f64>>,
    /// Whether any record contributed to this period
    pub observed: bool,
}

/// Aggregation result reindexed onto a grid
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegularizedSeries {
    granularity: Granularity,
    metrics: Vec<Metric>,
    rows: Vec<SeriesRow>,
}

impl RegularizedSeries {
    #[must_use]
    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    #[must_use]
    pub fn metrics(&self) -> &[Metric] {
        &self.metrics
    }

    #[must_use]
    pub fn rows(&self) -> &[SeriesRow] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn periods(&self) -> Vec<Period> {
        self.rows.iter().map(|r| r.period).collect()
    }

    /// Number of grid periods that had at least one contributing record
    #[must_use]
    pub fn observed_periods(&self) -> usize {
        self.rows.iter().filter(|r| r.observed).count()
    }

    /// True when the filter matched nothing on this grid
    #[must_use]
    pub fn is_empty_result(&self) -> bool {
        self.observed_periods() == 0
    }

    /// Values of one metric in grid order
    #[must_use]
    pub fn column(&self, metric: Metric) -> Vec<Option<f64>> {
        let Some(idx) = self.metrics.iter().position(|m| *m == metric) else {
            return vec![None; self.rows.len()];
        };
        self.rows
            .iter()
            .map(|r| r.values.get(idx).copied().flatten())
            .collect()
    }

    #[must_use]
    pub fn value(&self, period: Period, metric: Metric) -> Option<f64> {
        let idx = self.metrics.iter().position(|m| *m == metric)?;
        self.rows
            .iter()
            .find(|r| r.period == period)
            .and_then(|r| r.values.get(idx).copied().flatten())
    }

    /// Sum of the present values of one metric
    #[must_use]
    pub fn total(&self, metric: Metric) -> f64 {
        self.column(metric).into_iter().flatten().sum()
    }

    /// Observed rows as an aggregation result keyed by period
    #[must_use]
    pub fn to_aggregation(&self) -> AggregationResult {
        AggregationResult::from_rows(
            vec![self.granularity.group_key()],
            self.metrics.clone(),
            self.rows
                .iter()
                .filter(|r| r.observed)
                .map(|r| (vec![r.period.key_value()], r.values.clone())),
        )
    }
}

/// The result must be keyed by the grid's single key, in its declaration and in every row
fn check_keys(result: &AggregationResult, granularity: Granularity) -> Result<()> {
    let expected = granularity.group_key();
    let mismatch = |actual: String| ReportError::GridKeyMismatch {
        granularity: granularity.name().to_owned(),
        expected: expected.name().to_owned(),
        actual,
    };

    if result.group_keys() != [expected] {
        return Err(mismatch(
            result
                .group_keys()
                .iter()
                .map(|k| k.name())
                .collect::<Vec<_>>()
                .join(", "),
        ));
    }
    if let Some((key, _)) = result.iter().find(|(key, _)| key.len() != 1) {
        return Err(mismatch(format!("a key tuple of {} values", key.len())));
    }
    Ok(())
}

/// Left join `result` onto `grid`, filling empty slots per `policy`.
///
/// The fill rule applies to every missing value in the output, whether the period
/// had no records or its mean had no readings.
pub fn regularize(
    result: &AggregationResult,
    grid: &Grid,
    policy: &FillPolicy,
) -> Result<RegularizedSeries> {
    let granularity = grid.granularity();
    check_keys(result, granularity)?;

    let on_grid: HashSet<&Period> = grid.periods().iter().collect();
    for (key, _) in result.iter() {
        let value = key.first();
        let period = value.and_then(|v| Period::from_key(granularity, v));
        if !period.is_some_and(|p| on_grid.contains(&p)) {
            return Err(ReportError::OffGridPeriod {
                granularity: granularity.name().to_owned(),
                period: value.map_or_else(String::new, ToString::to_string),
            });
        }
    }

    let fills: Vec<Fill> = result.metrics().iter().map(|m| policy.fill_for(*m)).collect();
    let rows = grid
        .periods()
        .iter()
        .map(|period| {
            let found = result.row(&[period.key_value()]);
            let values = fills
                .iter()
                .enumerate()
                // A row narrower than the metric list reads as no data
                .map(|(i, fill)| fill.apply(found.and_then(|v| v.get(i).copied().flatten())))
                .collect();
            SeriesRow {
                period: *period,
                values,
                observed: found.is_some(),
            }
        })
        .collect();

    Ok(RegularizedSeries {
        granularity,
        metrics: result.metrics().to_vec(),
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{Filter, aggregate};
    use crate::calendar::MONTH_LABELS;
    use crate::loader::LoadReport;
    use crate::metric::{MetricValues, ReducerTable};
    use crate::record::Record;
    use chrono::{Datelike, NaiveDateTime};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(ts: &str, exported: f64, wind: Option<f64>) -> Record {
        let ts = NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M:%S").unwrap();
        let mut metrics = MetricValues::default().with(Metric::EnergyExported, exported);
        metrics.set(Metric::WindSpeed, wind);
        Record::new(ts, "A", None, metrics)
    }

    fn dataset() -> Dataset {
        Dataset::from_records(
            vec![
                record("2024-01-10 00:00:00", 10.0, Some(5.0)),
                record("2024-03-05 00:00:00", 20.0, Some(7.0)),
                record("2024-03-20 00:00:00", 5.0, None),
                record("2024-07-01 00:00:00", 1.0, None),
            ],
            LoadReport::default(),
        )
    }

    fn by(ds: &Dataset, key: GroupKey) -> AggregationResult {
        aggregate(
            ds,
            &Filter::plant("A"),
            &[key],
            &ReducerTable::of(&[Metric::EnergyExported, Metric::WindSpeed]),
        )
    }

    #[test]
    fn test_month_grid() {
        let grid = Grid::months();
        assert_eq!(grid.len(), 12);
        let labels: Vec<String> = grid.periods().iter().map(Period::label).collect();
        assert_eq!(labels, MONTH_LABELS);
    }

    #[test]
    fn test_week_grid_mondays() {
        let grid = Grid::weeks(date(2024, 1, 3), date(2024, 2, 1));
        assert_eq!(grid.periods().first(), Some(&Period::Week(date(2024, 1, 1))));
        assert_eq!(grid.periods().last(), Some(&Period::Week(date(2024, 1, 29))));
        assert_eq!(grid.len(), 5);
        assert!(
            grid.periods()
                .iter()
                .all(|p| matches!(p, Period::Week(d) if d.weekday() == chrono::Weekday::Mon))
        );
    }

    #[test]
    fn test_day_grid() {
        let grid = Grid::days_in_month(2024, 2).unwrap();
        assert_eq!(grid.len(), 29);
        assert_eq!(grid.periods()[0], Period::Day(date(2024, 2, 1)));
        assert_eq!(grid.periods()[28], Period::Day(date(2024, 2, 29)));
        assert_eq!(Grid::days_in_month(2023, 2).unwrap().len(), 28);
        assert!(Grid::days_in_month(2024, 13).is_err());
    }

    #[test]
    fn test_grid_completeness_and_order() {
        let ds = dataset();
        let grid = Grid::months();
        let series = regularize(&by(&ds, GroupKey::Month), &grid, &FillPolicy::absent()).unwrap();
        assert_eq!(series.len(), grid.len());
        for (row, period) in series.rows().iter().zip(grid.periods()) {
            assert_eq!(row.period, *period);
        }
        assert_eq!(series.observed_periods(), 3);
    }

    #[test]
    fn test_mixed_fill_policy() {
        let ds = dataset();
        let policy = FillPolicy::absent().with(Metric::EnergyExported, Fill::Zero);
        let series = regularize(&by(&ds, GroupKey::Month), &Grid::months(), &policy).unwrap();

        assert_eq!(series.value(Period::Month(2), Metric::EnergyExported), Some(0.0));
        assert_eq!(series.value(Period::Month(2), Metric::WindSpeed), None);
        assert_eq!(series.value(Period::Month(3), Metric::EnergyExported), Some(25.0));
        assert_eq!(series.value(Period::Month(3), Metric::WindSpeed), Some(7.0));
        // July has production but no wind readings at all
        assert_eq!(series.value(Period::Month(7), Metric::WindSpeed), None);
    }

    #[test]
    fn test_zero_fill_covers_null_means() {
        let ds = dataset();
        let result = by(&ds, GroupKey::Month);
        let series = regularize(&result, &Grid::months(), &FillPolicy::zero()).unwrap();
        assert!(series.rows().iter().all(|r| r.values.iter().all(Option::is_some)));
        assert_eq!(series.value(Period::Month(7), Metric::WindSpeed), Some(0.0));
    }

    #[test]
    fn test_sum_preserved() {
        let ds = dataset();
        let result = by(&ds, GroupKey::Day);
        let march = Grid::days_in_month(2024, 3).unwrap();
        let series = regularize(&result, &march, &FillPolicy::zero());
        // January and July days are not on a March grid
        assert!(matches!(series, Err(ReportError::OffGridPeriod { .. })));

        let result = by(&ds, GroupKey::WeekStart);
        let grid = Grid::dataset_weeks(&ds);
        for policy in [FillPolicy::zero(), FillPolicy::absent()] {
            let series = regularize(&result, &grid, &policy).unwrap();
            let direct = result.column_total(Metric::EnergyExported);
            assert!((series.total(Metric::EnergyExported) - direct).abs() < 1e-9);
        }
    }

    #[test]
    fn test_idempotent() {
        let ds = dataset();
        let grid = Grid::dataset_weeks(&ds);
        for policy in [FillPolicy::zero(), FillPolicy::absent()] {
            let once = regularize(&by(&ds, GroupKey::WeekStart), &grid, &policy).unwrap();
            let twice = regularize(&once.to_aggregation(), &grid, &policy).unwrap();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_key_mismatch() {
        let ds = dataset();
        let err = regularize(&by(&ds, GroupKey::Day), &Grid::months(), &FillPolicy::absent())
            .unwrap_err();
        assert!(matches!(err, ReportError::GridKeyMismatch { .. }));
    }

    #[test]
    fn test_malformed_key_tuple_is_mismatch() {
        let result = AggregationResult::from_rows(
            vec![GroupKey::Month],
            vec![Metric::WindSpeed],
            vec![(Vec::new(), vec![Some(1.0)])],
        );
        let err = regularize(&result, &Grid::months(), &FillPolicy::absent()).unwrap_err();
        assert!(matches!(err, ReportError::GridKeyMismatch { .. }));

        let result = AggregationResult::from_rows(
            vec![GroupKey::Year],
            vec![Metric::EnergyExported],
            vec![(vec![KeyValue::Int(2021), KeyValue::Int(1)], vec![Some(1.0)])],
        );
        let err = Grid::observed_years(&result).unwrap_err();
        assert!(matches!(err, ReportError::GridKeyMismatch { .. }));
    }

    #[test]
    fn test_narrow_value_row_reads_as_no_data() {
        let result = AggregationResult::from_rows(
            vec![GroupKey::Month],
            vec![Metric::EnergyExported, Metric::WindSpeed],
            vec![(vec![KeyValue::Int(1)], vec![Some(2.0)])],
        );
        let series = regularize(&result, &Grid::months(), &FillPolicy::absent()).unwrap();
        assert_eq!(series.value(Period::Month(1), Metric::EnergyExported), Some(2.0));
        assert_eq!(series.value(Period::Month(1), Metric::WindSpeed), None);
        assert_eq!(series.observed_periods(), 1);
    }

    #[test]
    fn test_observed_years_no_gaps_synthesized() {
        let ds = Dataset::from_records(
            vec![
                record("2021-06-01 00:00:00", 3.0, None),
                record("2023-06-01 00:00:00", 4.0, None),
            ],
            LoadReport::default(),
        );
        let result = by(&ds, GroupKey::Year);
        let grid = Grid::observed_years(&result).unwrap();
        assert_eq!(grid.periods(), &[Period::Year(2021), Period::Year(2023)]);
    }

    #[test]
    fn test_empty_input_full_grid() {
        let ds = dataset();
        let result = aggregate(
            &ds,
            &Filter::plant("A").year(2024).month(2),
            &[GroupKey::Day],
            &ReducerTable::of(&[Metric::EnergyExported, Metric::WindSpeed]),
        );
        let february = Grid::days_in_month(2024, 2).unwrap();
        let series = regularize(&result, &february, &FillPolicy::zero()).unwrap();
        assert_eq!(series.len(), 29);
        assert!(series.is_empty_result());
        assert!(series.rows().iter().all(|r| r.values == vec![Some(0.0), Some(0.0)]));
    }

    #[test]
    fn test_period_labels() {
        assert_eq!(Period::Month(3).label(), "Mar");
        assert_eq!(Period::Week(date(2024, 1, 1)).label(), "2024-01-01");
        assert_eq!(Period::Year(2022).label(), "2022");
    }
}
