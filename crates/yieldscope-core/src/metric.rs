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

//! Telemetry metrics and the reducer each one aggregates with.
//!
//! [`Metric::ALL`] together with [`Metric::default_reducer`] is the single table
//! that decides which metrics exist and how they combine.

use serde::{Deserialize, Serialize};

/// Numeric telemetry field carried by every record
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    AmbientTemperature,
    EnergyImported,
    EnergyExported,
    ProductionTime,
    UtilizationHours,
    CurtailmentLoss,
    CurtailmentDuration,
    FaultLoss,
    FaultDuration,
    WindSpeed,
}

/// How values of one metric are combined within a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reducer {
    /// Additive; zero contributing values give 0
    Sum,
    /// Mean over non-null values; zero contributing values give no data
    Mean,
}

impl Metric {
    pub const COUNT: usize = 10;

    /// Column order of the telemetry export
    pub const ALL: [Metric; Self::COUNT] = [
        Self::AmbientTemperature,
        Self::EnergyImported,
        Self::EnergyExported,
        Self::ProductionTime,
        Self::UtilizationHours,
        Self::CurtailmentLoss,
        Self::CurtailmentDuration,
        Self::FaultLoss,
        Self::FaultDuration,
        Self::WindSpeed,
    ];

    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Header used for this metric in the production statistics export
    #[must_use]
    pub fn column_name(self) -> &'static str {
        match self {
            Self::AmbientTemperature => "Average ambient temperature (°C)",
            Self::EnergyImported => "Active Energy Imported(kWh)",
            Self::EnergyExported => "Active Energy Exported(kWh)",
            Self::ProductionTime => "Energy production time (h)",
            Self::UtilizationHours => "Equivalent Utilization Hours (H)",
            Self::CurtailmentLoss => "Loss due to curtailment (kWh)",
            Self::CurtailmentDuration => "Curtailment duration (h)",
            Self::FaultLoss => "Loss due to fault (kWh)",
            Self::FaultDuration => "Fault duration (h)",
            Self::WindSpeed => "Average wind speed (m/s)",
        }
    }

    /// Stable snake_case identifier, used as config key and JSON field name
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::AmbientTemperature => "ambient_temperature",
            Self::EnergyImported => "energy_imported",
            Self::EnergyExported => "energy_exported",
            Self::ProductionTime => "production_time",
            Self::UtilizationHours => "utilization_hours",
            Self::CurtailmentLoss => "curtailment_loss",
            Self::CurtailmentDuration => "curtailment_duration",
            Self::FaultLoss => "fault_loss",
            Self::FaultDuration => "fault_duration",
            Self::WindSpeed => "wind_speed",
        }
    }

    /// Averaged readings use the mean, energy and time counters are summed
    #[must_use]
    pub fn default_reducer(self) -> Reducer {
        match self {
            Self::AmbientTemperature | Self::WindSpeed => Reducer::Mean,
            Self::EnergyImported
            | Self::EnergyExported
            | Self::ProductionTime
            | Self::UtilizationHours
            | Self::CurtailmentLoss
            | Self::CurtailmentDuration
            | Self::FaultLoss
            | Self::FaultDuration => Reducer::Sum,
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.key() == key)
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// The ten metric readings of one record; `None` is the no-data marker
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MetricValues([Option<f64>; Metric::COUNT]);

impl MetricValues {
    #[must_use]
    pub fn get(&self, metric: Metric) -> Option<f64> {
        self.0[metric.index()]
    }

    pub fn set(&mut self, metric: Metric, value: Option<f64>) {
        self.0[metric.index()] = value;
    }

    #[must_use]
    pub fn with(mut self, metric: Metric, value: f64) -> Self {
        self.set(metric, Some(value));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (Metric, Option<f64>)> + '_ {
        Metric::ALL.into_iter().map(|m| (m, self.get(m)))
    }
}

/// Metric to reducer assignments for one aggregation, in output column order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReducerTable(Vec<(Metric, Reducer)>);

impl ReducerTable {
    /// Every metric with its declared reducer
    #[must_use]
    pub fn defaults() -> Self {
        Self(
            Metric::ALL
                .into_iter()
                .map(|m| (m, m.default_reducer()))
                .collect(),
        )
    }

    /// Only the given metrics, each with its declared reducer
    #[must_use]
    pub fn of(metrics: &[Metric]) -> Self {
        let mut table = Self(Vec::with_capacity(metrics.len()));
        for &metric in metrics {
            table.insert(metric, metric.default_reducer());
        }
        table
    }

    /// Add or replace the reducer for `metric`
    pub fn insert(&mut self, metric: Metric, reducer: Reducer) {
        if let Some(entry) = self.0.iter_mut().find(|(m, _)| *m == metric) {
            entry.1 = reducer;
        } else {
            self.0.push((metric, reducer));
        }
    }

    #[must_use]
    pub fn with(mut self, metric: Metric, reducer: Reducer) -> Self {
        self.insert(metric, reducer);
        self
    }

    #[must_use]
    pub fn metrics(&self) -> Vec<Metric> {
        self.0.iter().map(|(m, _)| *m).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Metric, Reducer)> + '_ {
        self.0.iter().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_reducers() {
        assert_eq!(Metric::WindSpeed.default_reducer(), Reducer::Mean);
        assert_eq!(Metric::AmbientTemperature.default_reducer(), Reducer::Mean);
        let summed = Metric::ALL
            .into_iter()
            .filter(|m| m.default_reducer() == Reducer::Sum)
            .count();
        assert_eq!(summed, 8);
    }

    #[test]
    fn test_index_matches_export_order() {
        for (i, metric) in Metric::ALL.into_iter().enumerate() {
            assert_eq!(metric.index(), i);
            assert_eq!(Metric::from_key(metric.key()), Some(metric));
        }
    }

    #[test]
    fn test_reducer_table_insert_replaces() {
        let table = ReducerTable::of(&[Metric::EnergyExported, Metric::WindSpeed])
            .with(Metric::WindSpeed, Reducer::Sum);
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.iter().collect::<Vec<_>>(),
            vec![
                (Metric::EnergyExported, Reducer::Sum),
                (Metric::WindSpeed, Reducer::Sum)
            ]
        );
    }

    #[test]
    fn test_metric_values_default_is_no_data() {
        let values = MetricValues::default().with(Metric::FaultLoss, 2.5);
        assert_eq!(values.get(Metric::FaultLoss), Some(2.5));
        assert!(values.get(Metric::WindSpeed).is_none());
    }
}
