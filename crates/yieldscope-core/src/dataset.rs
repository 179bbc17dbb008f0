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

//! Immutable, load-once telemetry table.
//!
//! Statistics every view needs (global span, year and plant lists) are computed
//! once here so queries never rescan the whole table for them. Hosts that serve
//! several selections share one `Arc<Dataset>`.

use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use tracing::info;

use crate::aggregate::Filter;
use crate::calendar::{MONTH_LABELS, week_start};
use crate::config::ReportConfig;
use crate::error::{FilterField, ReportError, Result};
use crate::loader::{LoadReport, clean_table};
use crate::record::Record;
use crate::source::TableSource;

#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<Record>,
    report: LoadReport,
    span: Option<(NaiveDateTime, NaiveDateTime)>,
    years: Vec<i32>,
    plants: Vec<String>,
}

/// Values a caller may pick from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    /// Ascending
    pub plants: Vec<String>,
    /// Newest first
    pub years: Vec<i32>,
    pub months: Vec<MonthOption>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthOption {
    pub value: u32,
    pub label: &'static str,
}

impl Dataset {
    /// Read and clean a source. The only fallible step of a process lifetime.
    pub fn load(source: &dyn TableSource, config: &ReportConfig) -> Result<Self> {
        info!("Loading telemetry from {}", source.describe());
        let table = source.read_table()?;
        let (records, report) = clean_table(&table, &config.columns, &config.loader)?;
        let dataset = Self::from_records(records, report);
        info!(
            "Dataset ready: {} records, {} plants, years {:?}",
            dataset.len(),
            dataset.plants.len(),
            dataset.years
        );
        Ok(dataset)
    }

    /// Build from already cleaned records
    #[must_use]
    pub fn from_records(records: Vec<Record>, report: LoadReport) -> Self {
        let span = records
            .iter()
            .map(Record::timestamp)
            .fold(None, |acc: Option<(NaiveDateTime, NaiveDateTime)>, ts| {
                Some(acc.map_or((ts, ts), |(lo, hi)| (lo.min(ts), hi.max(ts))))
            });
        let years: BTreeSet<i32> = records.iter().map(|r| r.keys().year).collect();
        let plants: BTreeSet<&str> = records.iter().map(Record::plant_id).collect();
        let plants = plants.into_iter().map(str::to_owned).collect();

        Self {
            span,
            years: years.into_iter().collect(),
            plants,
            records,
            report,
        }
    }

    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn load_report(&self) -> &LoadReport {
        &self.report
    }

    /// Earliest and latest timestamp of the whole table
    #[must_use]
    pub fn span(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        self.span
    }

    /// Monday of the first and of the last week touched by the table
    #[must_use]
    pub fn week_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.span
            .map(|(lo, hi)| (week_start(lo.date()), week_start(hi.date())))
    }

    /// Distinct years, ascending
    #[must_use]
    pub fn years(&self) -> &[i32] {
        &self.years
    }

    /// Distinct plants, ascending
    #[must_use]
    pub fn plants(&self) -> &[String] {
        &self.plants
    }

    #[must_use]
    pub fn has_plant(&self, plant: &str) -> bool {
        self.plants
            .binary_search_by(|p| p.as_str().cmp(plant))
            .is_ok()
    }

    #[must_use]
    pub fn has_year(&self, year: i32) -> bool {
        self.years.binary_search(&year).is_ok()
    }

    #[must_use]
    pub fn filter_options(&self) -> FilterOptions {
        FilterOptions {
            plants: self.plants.clone(),
            years: self.years.iter().rev().copied().collect(),
            months: (1..=12)
                .zip(MONTH_LABELS)
                .map(|(value, label)| MonthOption { value, label })
                .collect(),
        }
    }

    /// Reject selections outside the observed domain.
    /// A valid selection that matches no rows is not an error.
    pub fn check_filter(&self, filter: &Filter) -> Result<()> {
        if let Some(plant) = filter.plant_id.as_deref()
            && !self.has_plant(plant)
        {
            return Err(ReportError::unknown(FilterField::Plant, plant));
        }
        if let Some(year) = filter.year
            && !self.has_year(year)
        {
            return Err(ReportError::unknown(FilterField::Year, year));
        }
        if let Some(month) = filter.month
            && !(1..=12).contains(&month)
        {
            return Err(ReportError::unknown(FilterField::Month, month));
        }
        Ok(())
    }
}
