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

//! Error types for the reporting core

use std::path::PathBuf;

use thiserror::Error;

/// Filter attribute that carried an unknown value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    Plant,
    Year,
    Month,
}

impl std::fmt::Display for FilterField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Plant => "plant",
            Self::Year => "year",
            Self::Month => "month",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("source unavailable: {path}: {reason}")]
    SourceUnavailable { path: PathBuf, reason: String },

    #[error("required column '{0}' not found in source header")]
    MissingColumn(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("unknown {field} '{value}'")]
    UnknownFilterValue { field: FilterField, value: String },

    #[error("period {period} is not on the {granularity} grid")]
    OffGridPeriod { granularity: String, period: String },

    #[error("{granularity} grid expects results grouped by {expected} only, got [{actual}]")]
    GridKeyMismatch {
        granularity: String,
        expected: String,
        actual: String,
    },
}

impl ReportError {
    pub(crate) fn source_unavailable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::SourceUnavailable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn unknown(field: FilterField, value: impl ToString) -> Self {
        Self::UnknownFilterValue {
            field,
            value: value.to_string(),
        }
    }

    /// True when the caller picked a plant/year/month outside the dataset's domain
    #[must_use]
    pub fn is_bad_selection(&self) -> bool {
        matches!(self, Self::UnknownFilterValue { .. })
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;
