// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Multi-Dimensional Fairness Index (MDFI) computation
//!
//! The MDFI combines three dimensions into a 0-100 score:
//! - Group fairness: error-rate parity across demographic/geographic slices
//! - Content fairness: accuracy parity across content categories
//! - Procedural fairness: explanation availability and appeal timeliness
//!
//! [`calculate_mdfi`] is a pure function of the dataset, column bindings and
//! configuration. Components that cannot be measured degrade according to
//! [`MissingComponentPolicy`] and are always flagged in
//! [`FairnessResult::warnings`].

use crate::config::{
    AppealScoring, ColumnBindings, ComponentWeights, GroupMetric, MdfiConfig,
    MissingComponentPolicy, ProceduralWeights,
};
use crate::datasets::{Dataset, Label, Value};
use crate::error::{Component, DataQualityWarning, MdfiError, Result};
use crate::metrics::{disparity_score, slice_statistics, ConfusionMatrix, RateSpread, SliceStatistic};
use serde::{Deserialize, Serialize};

/// Score given to a component that could not be measured
pub const UNMEASURED_SCORE: f64 = 100.0;

/// Rate compared across the slices of an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateMetric {
    FalsePositiveRate,
    TruePositiveRate,
    Accuracy,
}

impl RateMetric {
    fn value(&self, stat: &SliceStatistic) -> Option<f64> {
        match self {
            RateMetric::FalsePositiveRate => stat.false_positive_rate,
            RateMetric::TruePositiveRate => stat.true_positive_rate,
            RateMetric::Accuracy => (stat.count > 0).then_some(stat.accuracy),
        }
    }
}

/// Spread of one rate across an attribute's slices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSpread {
    pub metric: RateMetric,
    pub spread: RateSpread,
}

/// Slice statistics for one attribute and the disparity derived from them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeBreakdown {
    pub column: String,
    /// Every observed slice, including ones excluded for size
    pub slices: Vec<SliceStatistic>,
    /// Slices below the minimum size, left out of the disparity
    pub excluded_slices: Vec<String>,
    /// Slices that contributed a defined rate
    pub usable_slices: usize,
    pub spreads: Vec<MetricSpread>,
    /// Largest spread across the measured rates, `None` with fewer than two usable slices
    pub disparity: Option<f64>,
}

/// Group fairness sub-score with its supporting statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupFairness {
    pub score: f64,
    /// False when no attribute yielded a disparity
    pub available: bool,
    /// Worst disparity across attributes
    pub disparity: Option<f64>,
    pub metric: GroupMetric,
    pub attributes: Vec<AttributeBreakdown>,
}

/// Content fairness sub-score with its supporting statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentFairness {
    pub score: f64,
    pub available: bool,
    pub disparity: Option<f64>,
    pub attribute: Option<AttributeBreakdown>,
}

/// Explanation availability over usable records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplanationRate {
    pub column: String,
    /// Records with a readable flag
    pub observed: usize,
    pub explained: usize,
    pub rate: f64,
    pub score: f64,
}

/// Appeal resolution timeliness over usable records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppealTimeliness {
    pub column: String,
    /// Records with a readable, non-negative time
    pub observed: usize,
    pub within_threshold: usize,
    pub threshold_hours: f64,
    pub mean_hours: f64,
    pub scoring: AppealScoring,
    pub score: f64,
}

/// Procedural fairness sub-score with its supporting statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProceduralFairness {
    pub score: f64,
    pub available: bool,
    pub explanation: Option<ExplanationRate>,
    pub appeal: Option<AppealTimeliness>,
    /// Weights actually applied; a missing field's weight moves to the other
    pub effective_weights: ProceduralWeights,
}

/// Record counts and overall error rates of the evaluated data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub total_records: usize,
    /// Records with a binary label and prediction
    pub usable_records: usize,
    pub excluded_records: usize,
    pub overall: SliceStatistic,
}

/// Output of [`calculate_mdfi`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FairnessResult {
    pub overall_score: f64,
    pub group_fairness: f64,
    pub content_fairness: f64,
    pub procedural_fairness: f64,
    pub group: GroupFairness,
    pub content: ContentFairness,
    pub procedural: ProceduralFairness,
    /// Weights used for the overall score after any renormalization
    pub effective_weights: ComponentWeights,
    pub dataset: DatasetSummary,
    pub warnings: Vec<DataQualityWarning>,
    pub bindings: ColumnBindings,
    pub config: MdfiConfig,
}

impl FairnessResult {
    /// Warnings that affect one component
    pub fn warnings_for(&self, component: Component) -> Vec<&DataQualityWarning> {
        self.warnings
            .iter()
            .filter(|w| w.component() == Some(component))
            .collect()
    }

    pub fn is_available(&self, component: Component) -> bool {
        match component {
            Component::Group => self.group.available,
            Component::Content => self.content.available,
            Component::Procedural => self.procedural.available,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Outcome {
    predicted: Label,
    actual: Label,
}

/// Compute the MDFI score and its components
pub fn calculate_mdfi(
    data: &Dataset,
    bindings: &ColumnBindings,
    config: &MdfiConfig,
) -> Result<FairnessResult> {
    bindings.validate()?;
    config.validate()?;

    let outcomes = collect_outcomes(data, bindings)?;
    let usable_records = outcomes.iter().flatten().count();
    let excluded_records = data.len() - usable_records;

    let mut warnings = Vec::new();
    if excluded_records > 0 {
        warnings.push(DataQualityWarning::ExcludedRecords {
            count: excluded_records,
        });
    }

    let mut overall_cm = ConfusionMatrix::default();
    for outcome in outcomes.iter().flatten() {
        overall_cm.record(outcome.predicted, outcome.actual);
    }

    tracing::info!(
        "Computing MDFI over {} usable records ({} excluded)",
        usable_records,
        excluded_records
    );

    let group = group_fairness(data, &outcomes, bindings, config, &mut warnings);
    let content = content_fairness(data, &outcomes, bindings, config, &mut warnings);
    let procedural = procedural_fairness(data, &outcomes, bindings, config, &mut warnings);

    let availability = [
        (Component::Group, group.available),
        (Component::Content, content.available),
        (Component::Procedural, procedural.available),
    ];
    let effective_weights = resolve_weights(&config.weights, config.missing_component_policy, &availability);
    if config.missing_component_policy == MissingComponentPolicy::Renormalize {
        for (component, available) in availability {
            if !available {
                warnings.push(DataQualityWarning::ComponentRenormalized { component });
            }
        }
    }

    let overall_score = combine_scores(&effective_weights, group.score, content.score, procedural.score);

    for warning in &warnings {
        tracing::warn!("{}", warning);
    }
    tracing::info!(
        "MDFI = {:.2} (group={:.2}, content={:.2}, procedural={:.2})",
        overall_score,
        group.score,
        content.score,
        procedural.score
    );

    Ok(FairnessResult {
        overall_score,
        group_fairness: group.score,
        content_fairness: content.score,
        procedural_fairness: procedural.score,
        group,
        content,
        procedural,
        effective_weights,
        dataset: DatasetSummary {
            total_records: data.len(),
            usable_records,
            excluded_records,
            overall: SliceStatistic::from_confusion_matrix("all".to_string(), overall_cm),
        },
        warnings,
        bindings: bindings.clone(),
        config: config.clone(),
    })
}

/// Weighted sum of the three sub-scores, clamped to [0, 100]
pub fn combine_scores(weights: &ComponentWeights, group: f64, content: f64, procedural: f64) -> f64 {
    (weights.group * group + weights.content * content + weights.procedural * procedural).clamp(0.0, 100.0)
}

fn resolve_weights(
    weights: &ComponentWeights,
    policy: MissingComponentPolicy,
    availability: &[(Component, bool); 3],
) -> ComponentWeights {
    if policy == MissingComponentPolicy::AssumeFair {
        return *weights;
    }

    let keep = |component: Component, weight: f64| {
        let available = availability
            .iter()
            .any(|(c, available)| *c == component && *available);
        if available { weight } else { 0.0 }
    };
    let kept = ComponentWeights::new(
        keep(Component::Group, weights.group),
        keep(Component::Content, weights.content),
        keep(Component::Procedural, weights.procedural),
    );

    let total = kept.sum();
    if total <= 0.0 {
        // Nothing measurable carries weight; unmeasured components already score 100
        return *weights;
    }
    ComponentWeights::new(kept.group / total, kept.content / total, kept.procedural / total)
}

fn collect_outcomes(data: &Dataset, bindings: &ColumnBindings) -> Result<Vec<Option<Outcome>>> {
    let predictions = data.column(&bindings.prediction_col).ok_or_else(|| {
        MdfiError::input(format!(
            "prediction column '{}' not found in dataset",
            bindings.prediction_col
        ))
    })?;
    let labels = data.column(&bindings.label_col).ok_or_else(|| {
        MdfiError::input(format!("label column '{}' not found in dataset", bindings.label_col))
    })?;

    let outcomes: Vec<Option<Outcome>> = predictions
        .iter()
        .zip(labels.iter())
        .map(|(pred, label)| {
            Some(Outcome {
                predicted: pred.as_label()?,
                actual: label.as_label()?,
            })
        })
        .collect();

    if outcomes.iter().all(Option::is_none) {
        return Err(MdfiError::input(format!(
            "no record has binary values in both '{}' and '{}'",
            bindings.prediction_col, bindings.label_col
        )));
    }
    Ok(outcomes)
}

/// Resolve an optional column, recording why it is unusable
fn bound_column<'a, 'b>(
    data: &'a Dataset,
    column: Option<&'b String>,
    component: Component,
    warnings: &mut Vec<DataQualityWarning>,
) -> Option<(&'b str, &'a [Value])> {
    let name = column?;
    match data.column(name) {
        Some(values) => Some((name.as_str(), values)),
        None => {
            warnings.push(DataQualityWarning::ColumnAbsent {
                component,
                column: Some(name.clone()),
            });
            None
        }
    }
}

fn attribute_breakdown(
    column: &str,
    values: &[Value],
    outcomes: &[Option<Outcome>],
    metrics: &[RateMetric],
    min_slice_size: usize,
) -> AttributeBreakdown {
    let slices = slice_statistics(
        values
            .iter()
            .zip(outcomes.iter())
            .filter_map(|(value, outcome)| {
                let outcome = outcome.as_ref()?;
                Some((value.slice_key()?, outcome.predicted, outcome.actual))
            }),
    );

    let (eligible, small): (Vec<&SliceStatistic>, Vec<&SliceStatistic>) =
        slices.iter().partition(|s| s.count >= min_slice_size);

    let mut usable_slices = 0;
    let spreads: Vec<MetricSpread> = metrics
        .iter()
        .filter_map(|metric| {
            let rates: Vec<(&str, f64)> = eligible
                .iter()
                .filter_map(|s| metric.value(s).map(|rate| (s.slice.as_str(), rate)))
                .collect();
            usable_slices = usable_slices.max(rates.len());
            RateSpread::from_rates(rates).map(|spread| MetricSpread {
                metric: *metric,
                spread,
            })
        })
        .collect();

    let disparity = spreads
        .iter()
        .map(|s| s.spread.disparity())
        .fold(None, |acc: Option<f64>, d| Some(acc.map_or(d, |a| a.max(d))));

    tracing::debug!(
        "Attribute '{}': {} slices, {} usable, disparity={:?}",
        column,
        slices.len(),
        usable_slices,
        disparity
    );

    AttributeBreakdown {
        column: column.to_string(),
        excluded_slices: small.iter().map(|s| s.slice.clone()).collect(),
        usable_slices,
        spreads,
        disparity,
        slices,
    }
}

fn flag_breakdown(
    breakdown: &AttributeBreakdown,
    component: Component,
    min_slice_size: usize,
    warnings: &mut Vec<DataQualityWarning>,
) {
    if breakdown.slices.is_empty() {
        warnings.push(DataQualityWarning::ColumnEmpty {
            component,
            column: breakdown.column.clone(),
        });
        return;
    }
    if !breakdown.excluded_slices.is_empty() {
        warnings.push(DataQualityWarning::SmallSlicesExcluded {
            component,
            column: breakdown.column.clone(),
            slices: breakdown.excluded_slices.clone(),
            min_slice_size,
        });
    }
    if breakdown.disparity.is_none() {
        warnings.push(DataQualityWarning::InsufficientSlices {
            component,
            column: breakdown.column.clone(),
            usable_slices: breakdown.usable_slices,
        });
    }
}

fn group_fairness(
    data: &Dataset,
    outcomes: &[Option<Outcome>],
    bindings: &ColumnBindings,
    config: &MdfiConfig,
    warnings: &mut Vec<DataQualityWarning>,
) -> GroupFairness {
    let metrics: &[RateMetric] = match config.group_metric {
        GroupMetric::FalsePositiveRate => &[RateMetric::FalsePositiveRate],
        GroupMetric::EqualizedOdds => &[RateMetric::FalsePositiveRate, RateMetric::TruePositiveRate],
    };

    if bindings.demographic_col.is_none() && bindings.geographic_col.is_none() {
        warnings.push(DataQualityWarning::ColumnAbsent {
            component: Component::Group,
            column: None,
        });
    }

    let mut attributes = Vec::new();
    for column in [bindings.demographic_col.as_ref(), bindings.geographic_col.as_ref()] {
        if let Some((name, values)) = bound_column(data, column, Component::Group, warnings) {
            let breakdown = attribute_breakdown(name, values, outcomes, metrics, config.min_slice_size);
            flag_breakdown(&breakdown, Component::Group, config.min_slice_size, warnings);
            attributes.push(breakdown);
        }
    }

    // Worst case across attributes
    let disparity = attributes
        .iter()
        .filter_map(|a| a.disparity)
        .fold(None, |acc: Option<f64>, d| Some(acc.map_or(d, |a| a.max(d))));

    GroupFairness {
        score: disparity.map_or(UNMEASURED_SCORE, |d| disparity_score(d, config.scale_factor)),
        available: disparity.is_some(),
        disparity,
        metric: config.group_metric,
        attributes,
    }
}

fn content_fairness(
    data: &Dataset,
    outcomes: &[Option<Outcome>],
    bindings: &ColumnBindings,
    config: &MdfiConfig,
    warnings: &mut Vec<DataQualityWarning>,
) -> ContentFairness {
    if bindings.content_col.is_none() {
        warnings.push(DataQualityWarning::ColumnAbsent {
            component: Component::Content,
            column: None,
        });
    }

    let attribute = bound_column(data, bindings.content_col.as_ref(), Component::Content, warnings).map(
        |(name, values)| {
            let breakdown = attribute_breakdown(
                name,
                values,
                outcomes,
                &[RateMetric::Accuracy],
                config.min_slice_size,
            );
            flag_breakdown(&breakdown, Component::Content, config.min_slice_size, warnings);
            breakdown
        },
    );

    let disparity = attribute.as_ref().and_then(|a| a.disparity);

    ContentFairness {
        score: disparity.map_or(UNMEASURED_SCORE, |d| disparity_score(d, config.scale_factor)),
        available: disparity.is_some(),
        disparity,
        attribute,
    }
}

fn procedural_fairness(
    data: &Dataset,
    outcomes: &[Option<Outcome>],
    bindings: &ColumnBindings,
    config: &MdfiConfig,
    warnings: &mut Vec<DataQualityWarning>,
) -> ProceduralFairness {
    let explanation = match bound_column(data, bindings.explanation_col.as_ref(), Component::Procedural, warnings) {
        Some((name, values)) => explanation_rate(name, values, outcomes, warnings),
        None => {
            if bindings.explanation_col.is_none() {
                warnings.push(DataQualityWarning::ColumnAbsent {
                    component: Component::Procedural,
                    column: None,
                });
            }
            None
        }
    };

    let appeal = match bound_column(data, bindings.appeal_time_col.as_ref(), Component::Procedural, warnings) {
        Some((name, values)) => appeal_timeliness(name, values, outcomes, config, warnings),
        None => {
            if bindings.appeal_time_col.is_none() {
                warnings.push(DataQualityWarning::ColumnAbsent {
                    component: Component::Procedural,
                    column: None,
                });
            }
            None
        }
    };

    let weights = config.procedural_weights;
    let (score, effective_weights) = match (&explanation, &appeal) {
        (Some(e), Some(a)) => (weights.explanation * e.score + weights.appeal * a.score, weights),
        (Some(e), None) => (
            e.score,
            ProceduralWeights {
                explanation: 1.0,
                appeal: 0.0,
            },
        ),
        (None, Some(a)) => (
            a.score,
            ProceduralWeights {
                explanation: 0.0,
                appeal: 1.0,
            },
        ),
        (None, None) => (UNMEASURED_SCORE, weights),
    };

    ProceduralFairness {
        score: score.clamp(0.0, 100.0),
        available: explanation.is_some() || appeal.is_some(),
        explanation,
        appeal,
        effective_weights,
    }
}

fn explanation_rate(
    column: &str,
    values: &[Value],
    outcomes: &[Option<Outcome>],
    warnings: &mut Vec<DataQualityWarning>,
) -> Option<ExplanationRate> {
    let flags: Vec<bool> = values
        .iter()
        .zip(outcomes.iter())
        .filter(|(_, outcome)| outcome.is_some())
        .filter_map(|(value, _)| value.as_bool())
        .collect();

    if flags.is_empty() {
        warnings.push(DataQualityWarning::ColumnEmpty {
            component: Component::Procedural,
            column: column.to_string(),
        });
        return None;
    }

    let explained = flags.iter().filter(|f| **f).count();
    let rate = explained as f64 / flags.len() as f64;

    Some(ExplanationRate {
        column: column.to_string(),
        observed: flags.len(),
        explained,
        rate,
        score: rate * 100.0,
    })
}

fn appeal_timeliness(
    column: &str,
    values: &[Value],
    outcomes: &[Option<Outcome>],
    config: &MdfiConfig,
    warnings: &mut Vec<DataQualityWarning>,
) -> Option<AppealTimeliness> {
    let hours: Vec<f64> = values
        .iter()
        .zip(outcomes.iter())
        .filter(|(_, outcome)| outcome.is_some())
        .filter_map(|(value, _)| value.as_f64())
        .filter(|h| *h >= 0.0)
        .collect();

    if hours.is_empty() {
        warnings.push(DataQualityWarning::ColumnEmpty {
            component: Component::Procedural,
            column: column.to_string(),
        });
        return None;
    }

    let threshold = config.appeal_threshold_hours;
    let within_threshold = hours.iter().filter(|h| **h <= threshold).count();
    let mean_hours = hours.iter().sum::<f64>() / hours.len() as f64;

    let score = match config.appeal_scoring {
        AppealScoring::WithinThreshold => within_threshold as f64 / hours.len() as f64 * 100.0,
        AppealScoring::MeanLinearDecay { zero_at_hours } => {
            if mean_hours <= threshold {
                100.0
            } else if mean_hours >= zero_at_hours {
                0.0
            } else {
                100.0 * (1.0 - (mean_hours - threshold) / (zero_at_hours - threshold))
            }
        }
    };

    Some(AppealTimeliness {
        column: column.to_string(),
        observed: hours.len(),
        within_threshold,
        threshold_hours: threshold,
        mean_hours,
        scoring: config.appeal_scoring,
        score,
    })
}
