// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Error and warning types for fairness evaluation
//!
//! Fatal problems (bad column bindings, unusable data, invalid configuration)
//! are returned as [`MdfiError`]. Recoverable data-quality issues never abort
//! a computation; they are recorded as [`DataQualityWarning`]s on the result.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Top-level error type for MDFI computation and data loading
#[derive(Debug, Error)]
pub enum MdfiError {
    /// Required columns missing or no usable records
    #[error("Input error: {0}")]
    Input(String),

    /// Invalid weights, scale factor or thresholds
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MdfiError {
    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, MdfiError>;

/// One of the three MDFI components
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    Group,
    Content,
    Procedural,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Component::Group => "group fairness",
            Component::Content => "content fairness",
            Component::Procedural => "procedural fairness",
        };
        f.write_str(name)
    }
}

/// Non-fatal data-quality issue recorded in a result's provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataQualityWarning {
    /// An optional column was not bound, or is not present in the dataset
    ColumnAbsent {
        component: Component,
        column: Option<String>,
    },
    /// Column present but every value is missing or unparseable
    ColumnEmpty { component: Component, column: String },
    /// Fewer than two slices with a defined rate, so no disparity exists
    InsufficientSlices {
        component: Component,
        column: String,
        usable_slices: usize,
    },
    /// Slices below the configured minimum size were left out of the disparity
    SmallSlicesExcluded {
        component: Component,
        column: String,
        slices: Vec<String>,
        min_slice_size: usize,
    },
    /// Records without a binary label and prediction were skipped
    ExcludedRecords { count: usize },
    /// Component dropped from the overall score and remaining weights rescaled
    ComponentRenormalized { component: Component },
}

impl DataQualityWarning {
    /// Component this warning degrades, if any
    pub fn component(&self) -> Option<Component> {
        match self {
            Self::ColumnAbsent { component, .. }
            | Self::ColumnEmpty { component, .. }
            | Self::InsufficientSlices { component, .. }
            | Self::SmallSlicesExcluded { component, .. }
            | Self::ComponentRenormalized { component } => Some(*component),
            Self::ExcludedRecords { .. } => None,
        }
    }
}

impl fmt::Display for DataQualityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ColumnAbsent { component, column: Some(column) } => {
                write!(f, "{}: column '{}' not found in dataset", component, column)
            }
            Self::ColumnAbsent { component, column: None } => {
                write!(f, "{}: no column bound", component)
            }
            Self::ColumnEmpty { component, column } => {
                write!(f, "{}: column '{}' has no usable values", component, column)
            }
            Self::InsufficientSlices { component, column, usable_slices } => write!(
                f,
                "{}: column '{}' has {} usable slice(s), need at least 2",
                component, column, usable_slices
            ),
            Self::SmallSlicesExcluded { component, column, slices, min_slice_size } => write!(
                f,
                "{}: slices [{}] of '{}' have fewer than {} records and were excluded",
                component,
                slices.join(", "),
                column,
                min_slice_size
            ),
            Self::ExcludedRecords { count } => {
                write!(f, "{} record(s) lacked a binary label or prediction and were skipped", count)
            }
            Self::ComponentRenormalized { component } => {
                write!(f, "{} unavailable; dropped from overall score", component)
            }
        }
    }
}
