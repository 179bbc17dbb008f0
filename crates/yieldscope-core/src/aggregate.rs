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

//! Group-by-reduce over records.
//!
//! One pass over the filtered records feeds a running sum and count per
//! (group, metric); reducers are applied when the pass ends. Groups are kept in
//! a `BTreeMap`, so the same input always yields the same rows in the same order.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::dataset::Dataset;
use crate::metric::{Metric, Reducer, ReducerTable};
use crate::record::Record;

/// Conjunction of equality predicates; `None` leaves that attribute unconstrained
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    pub plant_id: Option<String>,
    pub year: Option<i32>,
    pub month: Option<u32>,
}

impl Filter {
    /// Matches every record
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn plant(plant_id: impl Into<String>) -> Self {
        Self {
            plant_id: Some(plant_id.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    #[must_use]
    pub fn month(mut self, month: u32) -> Self {
        self.month = Some(month);
        self
    }

    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        self.plant_id
            .as_deref()
            .is_none_or(|plant| record.plant_id() == plant)
            && self.year.is_none_or(|year| record.keys().year == year)
            && self.month.is_none_or(|month| record.keys().month == month)
    }
}

/// Record attribute usable as a grouping key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKey {
    PlantId,
    DeviceId,
    Year,
    Month,
    IsoWeek,
    WeekStart,
    Day,
}

impl GroupKey {
    /// Value of this attribute for a record; only the device can be missing
    #[must_use]
    pub fn extract(self, record: &Record) -> Option<KeyValue> {
        let keys = record.keys();
        Some(match self {
            Self::PlantId => KeyValue::Text(record.plant_id().to_owned()),
            Self::DeviceId => KeyValue::Text(record.device_id()?.to_owned()),
            Self::Year => KeyValue::Int(i64::from(keys.year)),
            Self::Month => KeyValue::Int(i64::from(keys.month)),
            Self::IsoWeek => KeyValue::Int(i64::from(keys.iso_week)),
            Self::WeekStart => KeyValue::Date(keys.week_start),
            Self::Day => KeyValue::Date(keys.day),
        })
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::PlantId => "plant_id",
            Self::DeviceId => "device_id",
            Self::Year => "year",
            Self::Month => "month",
            Self::IsoWeek => "iso_week",
            Self::WeekStart => "week_start",
            Self::Day => "day",
        }
    }
}

/// One component of a grouping-key tuple
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(untagged)]
pub enum KeyValue {
    Int(i64),
    Date(NaiveDate),
    Text(String),
}

impl KeyValue {
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Date(_) | Self::Text(_) => None,
        }
    }

    #[must_use]
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            Self::Int(_) | Self::Text(_) => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Int(_) | Self::Date(_) => None,
        }
    }
}

impl std::fmt::Display for KeyValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::Text(s) => f.write_str(s),
        }
    }
}

pub type KeyTuple = Vec<KeyValue>;

/// Reduced metric values per observed grouping key
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationResult {
    group_keys: Vec<GroupKey>,
    metrics: Vec<Metric>,
    rows: BTreeMap<KeyTuple, Vec<Option<f64>>>,
}

#[derive(Debug, Clone, Copy, Default)]
struct Accumulator {
    sum: f64,
    count: usize,
}

impl Accumulator {
    fn push(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.sum += v;
            self.count += 1;
        }
    }

    #[expect(clippy::cast_precision_loss, reason = "group sizes stay far below 2^52")]
    fn finish(self, reducer: Reducer) -> Option<f64> {
        match reducer {
            Reducer::Sum => Some(self.sum),
            Reducer::Mean => (self.count > 0).then(|| self.sum / self.count as f64),
        }
    }
}

/// Group the dataset's records matching `filter` by `group_keys` and reduce each
/// metric in `reducers`
#[must_use]
pub fn aggregate(
    dataset: &Dataset,
    filter: &Filter,
    group_keys: &[GroupKey],
    reducers: &ReducerTable,
) -> AggregationResult {
    aggregate_records(
        dataset.records().iter().filter(|r| filter.matches(r)),
        group_keys,
        reducers,
    )
}

/// Same as [`aggregate`] over an arbitrary record iterator
#[must_use]
pub fn aggregate_records<'a>(
    records: impl IntoIterator<Item = &'a Record>,
    group_keys: &[GroupKey],
    reducers: &ReducerTable,
) -> AggregationResult {
    let mut groups: BTreeMap<KeyTuple, Vec<Accumulator>> = BTreeMap::new();
    let mut seen = 0usize;
    let mut skipped = 0usize;

    for record in records {
        seen += 1;
        let key: Option<KeyTuple> = group_keys.iter().map(|k| k.extract(record)).collect();
        let Some(key) = key else {
            skipped += 1;
            continue;
        };
        let accumulators = groups
            .entry(key)
            .or_insert_with(|| vec![Accumulator::default(); reducers.len()]);
        for (acc, (metric, _)) in accumulators.iter_mut().zip(reducers.iter()) {
            acc.push(record.metric(metric));
        }
    }

    debug!(
        "Aggregated {seen} records ({skipped} without key) into {} groups by {:?}",
        groups.len(),
        group_keys
    );

    let rows = groups
        .into_iter()
        .map(|(key, accumulators)| {
            let values = accumulators
                .into_iter()
                .zip(reducers.iter())
                .map(|(acc, (_, reducer))| acc.finish(reducer))
                .collect();
            (key, values)
        })
        .collect();

    AggregationResult {
        group_keys: group_keys.to_vec(),
        metrics: reducers.metrics(),
        rows,
    }
}

impl AggregationResult {
    /// Assemble a result from rows already reduced elsewhere.
    /// Later duplicates of a key replace earlier ones.
    pub fn from_rows(
        group_keys: Vec<GroupKey>,
        metrics: Vec<Metric>,
        rows: impl IntoIterator<Item = (KeyTuple, Vec<Option<f64>>)>,
    ) -> Self {
        Self {
            group_keys,
            metrics,
            rows: rows.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn group_keys(&self) -> &[GroupKey] {
        &self.group_keys
    }

    #[must_use]
    pub fn metrics(&self) -> &[Metric] {
        &self.metrics
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows in ascending key order
    pub fn iter(&self) -> impl Iterator<Item = (&KeyTuple, &[Option<f64>])> + '_ {
        self.rows.iter().map(|(k, v)| (k, v.as_slice()))
    }

    #[must_use]
    pub fn row(&self, key: &[KeyValue]) -> Option<&[Option<f64>]> {
        self.rows.get(key).map(Vec::as_slice)
    }

    /// Reduced value of `metric` for one key
    #[must_use]
    pub fn value(&self, key: &[KeyValue], metric: Metric) -> Option<f64> {
        let column = self.metrics.iter().position(|m| *m == metric)?;
        self.row(key)?.get(column).copied().flatten()
    }

    /// Sum of the present values of one metric over all rows
    #[must_use]
    pub fn column_total(&self, metric: Metric) -> f64 {
        let Some(column) = self.metrics.iter().position(|m| *m == metric) else {
            return 0.0;
        };
        self.rows
            .values()
            .filter_map(|values| values.get(column).copied().flatten())
            .sum()
    }

    /// Partition on one grouping key, dropping it from the remaining tuples.
    /// Returns `None` if the result is not grouped by `key`. Tuples too short
    /// to hold the key are left out.
    #[must_use]
    pub fn split_by(&self, key: GroupKey) -> Option<BTreeMap<KeyValue, AggregationResult>> {
        let position = self.group_keys.iter().position(|k| *k == key)?;
        let remaining: Vec<GroupKey> = self
            .group_keys
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != position)
            .map(|(_, k)| *k)
            .collect();

        let mut parts: BTreeMap<KeyValue, AggregationResult> = BTreeMap::new();
        for (tuple, values) in &self.rows {
            if position >= tuple.len() {
                continue;
            }
            let mut rest = tuple.clone();
            let value = rest.remove(position);
            parts
                .entry(value)
                .or_insert_with(|| AggregationResult {
                    group_keys: remaining.clone(),
                    metrics: self.metrics.clone(),
                    rows: BTreeMap::new(),
                })
                .rows
                .insert(rest, values.clone());
        }
        Some(parts)
    }
}
