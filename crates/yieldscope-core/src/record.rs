// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of YieldScope.

use chrono::NaiveDateTime;

use crate::calendar::CalendarKeys;
use crate::metric::{Metric, MetricValues};

/// A single cleaned telemetry observation (typically one device, one interval)
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    timestamp: NaiveDateTime,
    plant_id: String,
    device_id: Option<String>,
    metrics: MetricValues,
    keys: CalendarKeys,
}

impl Record {
    /// Build a record, deriving its calendar keys from `timestamp`
    pub fn new(
        timestamp: NaiveDateTime,
        plant_id: impl Into<String>,
        device_id: Option<String>,
        metrics: MetricValues,
    ) -> Self {
        Self {
            timestamp,
            plant_id: plant_id.into(),
            device_id,
            metrics,
            keys: CalendarKeys::derive(timestamp),
        }
    }

    #[must_use]
    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    #[must_use]
    pub fn plant_id(&self) -> &str {
        &self.plant_id
    }

    #[must_use]
    pub fn device_id(&self) -> Option<&str> {
        self.device_id.as_deref()
    }

    #[must_use]
    pub fn metric(&self, metric: Metric) -> Option<f64> {
        self.metrics.get(metric)
    }

    #[must_use]
    pub fn metrics(&self) -> &MetricValues {
        &self.metrics
    }

    #[must_use]
    pub fn keys(&self) -> &CalendarKeys {
        &self.keys
    }
}
