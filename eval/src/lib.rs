// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Multi-Dimensional Fairness Index (MDFI) for misinformation detection
//!
//! This crate provides:
//! - In-memory tabular datasets (CSV loading, seeded synthetic data)
//! - Per-slice error-rate statistics (FPR, FNR, accuracy)
//! - Group, content and procedural fairness sub-scores
//! - The weighted 0-100 MDFI score with data-quality provenance
//! - Text, markdown and JSON reports

pub mod config;
pub mod datasets;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod report;

pub use config::{ColumnBindings, ComponentWeights, MdfiConfig, MissingComponentPolicy};
pub use datasets::{Dataset, Label, Value};
pub use engine::{calculate_mdfi, FairnessResult};
pub use error::{Component, DataQualityWarning, MdfiError};
pub use metrics::{ConfusionMatrix, SliceStatistic};
pub use report::{FairnessReport, Interpretation};
