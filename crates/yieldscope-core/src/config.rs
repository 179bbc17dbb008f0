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

//! Report configuration loaded from TOML

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ReportError, Result};
use crate::metric::Metric;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default)]
    pub source: SourceSettings,

    #[serde(default)]
    pub columns: ColumnMap,

    #[serde(default)]
    pub loader: LoaderSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSettings {
    /// Telemetry export to load (xlsx or csv)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Worksheet holding the telemetry table (xlsx only)
    #[serde(default = "default_sheet")]
    pub sheet: String,

    /// Force a format instead of guessing from the file extension
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<SourceFormat>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Xlsx,
    Csv,
}

impl SourceFormat {
    /// Guess from the extension; anything that is not csv is read as a workbook
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        match extension.as_str() {
            "csv" | "txt" => Self::Csv,
            _ => Self::Xlsx,
        }
    }
}

/// Header names of the columns the loader reads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnMap {
    #[serde(default = "default_timestamp_column")]
    pub timestamp: String,

    #[serde(default = "default_plant_column")]
    pub plant: String,

    #[serde(default = "default_device_column")]
    pub device: String,

    /// Per-metric header overrides, keyed by metric key (e.g. `wind_speed`)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metrics: BTreeMap<Metric, String>,
}

impl ColumnMap {
    #[must_use]
    pub fn metric_column(&self, metric: Metric) -> &str {
        self.metrics
            .get(&metric)
            .map_or_else(|| metric.column_name(), String::as_str)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderSettings {
    /// chrono formats tried in order for text timestamps
    #[serde(default = "default_timestamp_formats")]
    pub timestamp_formats: Vec<String>,
}

fn default_sheet() -> String {
    "Production statistics".to_owned()
}

fn default_timestamp_column() -> String {
    "Statistical time".to_owned()
}

fn default_plant_column() -> String {
    "Power plant name".to_owned()
}

fn default_device_column() -> String {
    "Device Name".to_owned()
}

fn default_timestamp_formats() -> Vec<String> {
    [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M:%S",
        "%Y/%m/%d %H:%M",
        "%d/%m/%Y %H:%M:%S",
        "%d.%m.%Y %H:%M:%S",
        "%Y-%m-%d",
        "%Y/%m/%d",
    ]
    .into_iter()
    .map(str::to_owned)
    .collect()
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            path: None,
            sheet: default_sheet(),
            format: None,
        }
    }
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            timestamp: default_timestamp_column(),
            plant: default_plant_column(),
            device: default_device_column(),
            metrics: BTreeMap::new(),
        }
    }
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self {
            timestamp_formats: default_timestamp_formats(),
        }
    }
}

impl ReportConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ReportError::Config(format!("Failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ReportError::Config(format!("Failed to parse config TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.source.sheet.trim().is_empty() {
            return Err(ReportError::Config("source.sheet must not be empty".to_owned()));
        }
        if self.loader.timestamp_formats.is_empty() {
            return Err(ReportError::Config(
                "loader.timestamp_formats must contain at least one format".to_owned(),
            ));
        }

        let mut seen = HashSet::new();
        let headers = [
            self.columns.timestamp.as_str(),
            self.columns.plant.as_str(),
            self.columns.device.as_str(),
        ]
        .into_iter()
        .chain(Metric::ALL.into_iter().map(|m| self.columns.metric_column(m)));
        for header in headers {
            if header.trim().is_empty() {
                return Err(ReportError::Config("column names must not be empty".to_owned()));
            }
            if !seen.insert(header.trim()) {
                return Err(ReportError::Config(format!(
                    "column '{header}' is mapped more than once"
                )));
            }
        }
        Ok(())
    }
}
