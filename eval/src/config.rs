// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Column bindings and scoring configuration for the MDFI engine

use crate::error::{MdfiError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tolerance used when checking that a set of weights sums to 1.0
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Maps dataset columns to the roles the engine needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnBindings {
    /// Model prediction (binary, 1 = fake)
    pub prediction_col: String,
    /// Ground truth label (binary, 1 = fake)
    pub label_col: String,
    /// Demographic slice attribute (e.g. age group)
    #[serde(default)]
    pub demographic_col: Option<String>,
    /// Geographic slice attribute (e.g. user location)
    #[serde(default)]
    pub geographic_col: Option<String>,
    /// Content category slice attribute
    #[serde(default)]
    pub content_col: Option<String>,
    /// Boolean flag: was an explanation provided with the decision
    #[serde(default)]
    pub explanation_col: Option<String>,
    /// Appeal resolution time in hours
    #[serde(default)]
    pub appeal_time_col: Option<String>,
}

impl ColumnBindings {
    pub fn new(prediction_col: &str, label_col: &str) -> Self {
        Self {
            prediction_col: prediction_col.to_string(),
            label_col: label_col.to_string(),
            demographic_col: None,
            geographic_col: None,
            content_col: None,
            explanation_col: None,
            appeal_time_col: None,
        }
    }

    pub fn demographic(mut self, col: &str) -> Self {
        self.demographic_col = Some(col.to_string());
        self
    }

    pub fn geographic(mut self, col: &str) -> Self {
        self.geographic_col = Some(col.to_string());
        self
    }

    pub fn content(mut self, col: &str) -> Self {
        self.content_col = Some(col.to_string());
        self
    }

    pub fn explanation(mut self, col: &str) -> Self {
        self.explanation_col = Some(col.to_string());
        self
    }

    pub fn appeal_time(mut self, col: &str) -> Self {
        self.appeal_time_col = Some(col.to_string());
        self
    }

    /// Bindings for the columns of the sample misinformation CSV
    pub fn sample_csv() -> Self {
        Self::new("predicted_label", "is_fake")
            .demographic("user_age_group")
            .geographic("user_location")
            .content("content_category")
            .explanation("has_explanation")
            .appeal_time("appeal_time_hours")
    }

    /// Reject empty column names; absence is expressed with `None`
    pub fn validate(&self) -> Result<()> {
        if self.prediction_col.trim().is_empty() {
            return Err(MdfiError::input("prediction column name is empty"));
        }
        if self.label_col.trim().is_empty() {
            return Err(MdfiError::input("label column name is empty"));
        }
        let optional = [
            ("demographic", &self.demographic_col),
            ("geographic", &self.geographic_col),
            ("content", &self.content_col),
            ("explanation", &self.explanation_col),
            ("appeal time", &self.appeal_time_col),
        ];
        for (role, col) in optional {
            if matches!(col, Some(name) if name.trim().is_empty()) {
                return Err(MdfiError::input(format!("{} column name is empty", role)));
            }
        }
        Ok(())
    }
}

/// Weights of the three MDFI components
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentWeights {
    pub group: f64,
    pub content: f64,
    pub procedural: f64,
}

impl Default for ComponentWeights {
    fn default() -> Self {
        Self {
            group: 0.4,
            content: 0.3,
            procedural: 0.3,
        }
    }
}

impl ComponentWeights {
    pub fn new(group: f64, content: f64, procedural: f64) -> Self {
        Self { group, content, procedural }
    }

    pub fn sum(&self) -> f64 {
        self.group + self.content + self.procedural
    }

    pub fn validate(&self) -> Result<()> {
        validate_weight_set("component", &[self.group, self.content, self.procedural])
    }
}

/// Split of procedural fairness between its two rates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProceduralWeights {
    pub explanation: f64,
    pub appeal: f64,
}

impl Default for ProceduralWeights {
    fn default() -> Self {
        Self {
            explanation: 0.5,
            appeal: 0.5,
        }
    }
}

impl ProceduralWeights {
    pub fn validate(&self) -> Result<()> {
        validate_weight_set("procedural", &[self.explanation, self.appeal])
    }
}

fn validate_weight_set(name: &str, weights: &[f64]) -> Result<()> {
    if let Some(w) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
        return Err(MdfiError::config(format!(
            "{} weights must be finite and non-negative, got {}",
            name, w
        )));
    }
    let sum: f64 = weights.iter().sum();
    if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
        return Err(MdfiError::config(format!(
            "{} weights must sum to 1.0, got {:.6}",
            name, sum
        )));
    }
    Ok(())
}

/// Rate compared across demographic/geographic slices
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupMetric {
    /// Spread of false-positive rates
    #[default]
    FalsePositiveRate,
    /// Larger of the FPR spread and the TPR spread
    EqualizedOdds,
}

/// How appeal resolution times become a 0-100 rate
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AppealScoring {
    /// Share of appeals resolved within the threshold
    #[default]
    WithinThreshold,
    /// 100 while the mean time is within the threshold, falling linearly to 0
    /// at `zero_at_hours`
    MeanLinearDecay { zero_at_hours: f64 },
}

/// What an unavailable component contributes to the overall score
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingComponentPolicy {
    /// Score the component 100 and flag it
    #[default]
    AssumeFair,
    /// Drop the component and rescale the remaining weights
    Renormalize,
}

/// Scoring options for [`crate::engine::calculate_mdfi`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MdfiConfig {
    pub weights: ComponentWeights,
    /// Score points lost per percentage point of disparity
    pub scale_factor: f64,
    /// Appeals resolved within this many hours count as timely
    pub appeal_threshold_hours: f64,
    pub procedural_weights: ProceduralWeights,
    pub appeal_scoring: AppealScoring,
    pub group_metric: GroupMetric,
    /// Slices smaller than this are reported but left out of disparities
    pub min_slice_size: usize,
    pub missing_component_policy: MissingComponentPolicy,
}

impl Default for MdfiConfig {
    fn default() -> Self {
        Self {
            weights: ComponentWeights::default(),
            scale_factor: 1.0,
            appeal_threshold_hours: 72.0,
            procedural_weights: ProceduralWeights::default(),
            appeal_scoring: AppealScoring::default(),
            group_metric: GroupMetric::default(),
            min_slice_size: 1,
            missing_component_policy: MissingComponentPolicy::default(),
        }
    }
}

impl MdfiConfig {
    /// Default configuration with custom component weights
    pub fn with_weights(group: f64, content: f64, procedural: f64) -> Result<Self> {
        let config = Self {
            weights: ComponentWeights::new(group, content, procedural),
            ..Default::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.weights.validate()?;
        self.procedural_weights.validate()?;

        if !self.scale_factor.is_finite() || self.scale_factor <= 0.0 {
            return Err(MdfiError::config(format!(
                "scale factor must be finite and positive, got {}",
                self.scale_factor
            )));
        }
        if !self.appeal_threshold_hours.is_finite() || self.appeal_threshold_hours < 0.0 {
            return Err(MdfiError::config(format!(
                "appeal threshold must be finite and non-negative, got {}",
                self.appeal_threshold_hours
            )));
        }
        if let AppealScoring::MeanLinearDecay { zero_at_hours } = self.appeal_scoring {
            if !zero_at_hours.is_finite() || zero_at_hours <= self.appeal_threshold_hours {
                return Err(MdfiError::config(format!(
                    "appeal decay end ({}h) must exceed the threshold ({}h)",
                    zero_at_hours, self.appeal_threshold_hours
                )));
            }
        }
        if self.min_slice_size == 0 {
            return Err(MdfiError::config("minimum slice size must be at least 1"));
        }
        Ok(())
    }

    /// Load and validate a configuration from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        tracing::debug!("Loaded MDFI configuration from {}", path.display());
        Ok(config)
    }
}
