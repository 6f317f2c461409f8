// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Per-slice error-rate statistics and disparity scoring
//!
//! Implements:
//! - Confusion matrix with FPR / FNR / TPR / accuracy
//! - Slice statistics keyed by a grouping attribute
//! - Disparity (max - min of a rate across slices)
//! - Mapping of disparity to a 0-100 fairness score

use crate::datasets::Label;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Confusion matrix for binary classification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    /// True Positives (correctly predicted disinformation)
    pub tp: usize,
    /// True Negatives (correctly predicted authentic)
    pub tn: usize,
    /// False Positives (authentic predicted as disinformation)
    pub fp: usize,
    /// False Negatives (disinformation predicted as authentic)
    pub fn_: usize,
}

impl ConfusionMatrix {
    /// Create from predictions and ground truth labels
    pub fn from_predictions(predictions: &[Label], ground_truth: &[Label]) -> Self {
        let mut matrix = Self::default();
        for (pred, truth) in predictions.iter().zip(ground_truth.iter()) {
            matrix.record(*pred, *truth);
        }
        matrix
    }

    /// Count one outcome
    pub fn record(&mut self, predicted: Label, actual: Label) {
        match (predicted, actual) {
            (Label::Disinformation, Label::Disinformation) => self.tp += 1,
            (Label::Authentic, Label::Authentic) => self.tn += 1,
            (Label::Disinformation, Label::Authentic) => self.fp += 1,
            (Label::Authentic, Label::Disinformation) => self.fn_ += 1,
        }
    }

    /// Total number of samples
    pub fn total(&self) -> usize {
        self.tp + self.tn + self.fp + self.fn_
    }

    /// Accuracy: (TP + TN) / Total
    pub fn accuracy(&self) -> Option<f64> {
        ratio(self.tp + self.tn, self.total())
    }

    /// False positive rate: FP / (FP + TN), undefined without authentic samples
    pub fn false_positive_rate(&self) -> Option<f64> {
        ratio(self.fp, self.fp + self.tn)
    }

    /// False negative rate: FN / (FN + TP), undefined without disinformation samples
    pub fn false_negative_rate(&self) -> Option<f64> {
        ratio(self.fn_, self.fn_ + self.tp)
    }

    /// True positive rate (recall): TP / (TP + FN)
    pub fn true_positive_rate(&self) -> Option<f64> {
        ratio(self.tp, self.tp + self.fn_)
    }
}

fn ratio(num: usize, denom: usize) -> Option<f64> {
    (denom > 0).then(|| num as f64 / denom as f64)
}

/// Error-rate statistics for one value of a slice attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SliceStatistic {
    /// Attribute value defining the slice
    pub slice: String,
    pub count: usize,
    pub confusion_matrix: ConfusionMatrix,
    pub false_positive_rate: Option<f64>,
    pub false_negative_rate: Option<f64>,
    pub true_positive_rate: Option<f64>,
    pub accuracy: f64,
}

impl SliceStatistic {
    pub fn from_confusion_matrix(slice: String, cm: ConfusionMatrix) -> Self {
        Self {
            slice,
            count: cm.total(),
            false_positive_rate: cm.false_positive_rate(),
            false_negative_rate: cm.false_negative_rate(),
            true_positive_rate: cm.true_positive_rate(),
            accuracy: cm.accuracy().unwrap_or(0.0),
            confusion_matrix: cm,
        }
    }
}

/// Group `(slice, predicted, actual)` outcomes into per-slice statistics
///
/// Output is ordered by slice name.
pub fn slice_statistics<I>(outcomes: I) -> Vec<SliceStatistic>
where
    I: IntoIterator<Item = (String, Label, Label)>,
{
    let mut matrices: BTreeMap<String, ConfusionMatrix> = BTreeMap::new();
    for (slice, predicted, actual) in outcomes {
        matrices.entry(slice).or_default().record(predicted, actual);
    }
    matrices
        .into_iter()
        .map(|(slice, cm)| SliceStatistic::from_confusion_matrix(slice, cm))
        .collect()
}

/// Range of a rate across slices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateSpread {
    pub min: f64,
    pub max: f64,
    pub min_slice: String,
    pub max_slice: String,
}

impl RateSpread {
    /// Collect the spread of `(slice, rate)` pairs; needs at least two
    pub fn from_rates<'a, I>(rates: I) -> Option<Self>
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let mut count = 0;
        let mut spread: Option<Self> = None;

        for (slice, rate) in rates {
            count += 1;
            if let Some(s) = spread.as_mut() {
                if rate < s.min {
                    s.min = rate;
                    s.min_slice = slice.to_string();
                }
                if rate > s.max {
                    s.max = rate;
                    s.max_slice = slice.to_string();
                }
                continue;
            }
            spread = Some(Self {
                min: rate,
                max: rate,
                min_slice: slice.to_string(),
                max_slice: slice.to_string(),
            });
        }

        spread.filter(|_| count >= 2)
    }

    /// Disparity: max - min
    pub fn disparity(&self) -> f64 {
        self.max - self.min
    }
}

/// Map a disparity (0.0 to 1.0) to a 0-100 fairness score
///
/// `score = 100 - disparity_percentage * scale_factor`, clamped to [0, 100].
pub fn disparity_score(disparity: f64, scale_factor: f64) -> f64 {
    (100.0 - disparity * 100.0 * scale_factor).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(fake: bool) -> Label {
        if fake {
            Label::Disinformation
        } else {
            Label::Authentic
        }
    }

    fn outcome(slice: &str, predicted: u8, actual: u8) -> (String, Label, Label) {
        (slice.to_string(), label(predicted == 1), label(actual == 1))
    }

    #[test]
    fn test_confusion_matrix_perfect() {
        let predictions = vec![Label::Disinformation, Label::Disinformation, Label::Authentic, Label::Authentic];
        let ground_truth = vec![Label::Disinformation, Label::Disinformation, Label::Authentic, Label::Authentic];

        let cm = ConfusionMatrix::from_predictions(&predictions, &ground_truth);

        assert_eq!(cm.tp, 2);
        assert_eq!(cm.tn, 2);
        assert_eq!(cm.fp, 0);
        assert_eq!(cm.fn_, 0);
        assert_eq!(cm.accuracy(), Some(1.0));
        assert_eq!(cm.false_positive_rate(), Some(0.0));
        assert_eq!(cm.false_negative_rate(), Some(0.0));
    }

    #[test]
    fn test_confusion_matrix_rates() {
        let predictions = vec![Label::Disinformation, Label::Authentic, Label::Disinformation, Label::Authentic];
        let ground_truth = vec![Label::Disinformation, Label::Disinformation, Label::Authentic, Label::Authentic];

        let cm = ConfusionMatrix::from_predictions(&predictions, &ground_truth);

        assert!((cm.accuracy().unwrap() - 0.5).abs() < 1e-6);
        assert!((cm.false_positive_rate().unwrap() - 0.5).abs() < 1e-6);
        assert!((cm.false_negative_rate().unwrap() - 0.5).abs() < 1e-6);
        assert!((cm.true_positive_rate().unwrap() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_rates_undefined_without_class() {
        // Only disinformation in ground truth: FPR has no denominator
        let cm = ConfusionMatrix::from_predictions(&[Label::Disinformation], &[Label::Disinformation]);
        assert_eq!(cm.false_positive_rate(), None);
        assert_eq!(cm.false_negative_rate(), Some(0.0));

        assert_eq!(ConfusionMatrix::default().accuracy(), None);
    }

    #[test]
    fn test_slice_statistics_grouping() {
        let stats = slice_statistics(vec![
            outcome("young", 1, 0),
            outcome("young", 0, 0),
            outcome("elderly", 1, 1),
            outcome("elderly", 0, 0),
            outcome("elderly", 0, 1),
        ]);

        assert_eq!(stats.len(), 2);
        // BTreeMap ordering
        assert_eq!(stats[0].slice, "elderly");
        assert_eq!(stats[0].count, 3);
        assert_eq!(stats[0].false_positive_rate, Some(0.0));
        assert_eq!(stats[0].false_negative_rate, Some(0.5));
        assert!((stats[0].accuracy - 2.0 / 3.0).abs() < 1e-6);

        assert_eq!(stats[1].slice, "young");
        assert_eq!(stats[1].false_positive_rate, Some(0.5));
        assert_eq!(stats[1].false_negative_rate, None);
    }

    #[test]
    fn test_rate_spread() {
        let spread = RateSpread::from_rates(vec![("a", 0.2), ("b", 0.08), ("c", 0.1)]).unwrap();
        assert_eq!(spread.max_slice, "a");
        assert_eq!(spread.min_slice, "b");
        assert!((spread.disparity() - 0.12).abs() < 1e-9);
    }

    #[test]
    fn test_rate_spread_needs_two_slices() {
        assert!(RateSpread::from_rates(vec![("a", 0.2)]).is_none());
        assert!(RateSpread::from_rates(Vec::<(&str, f64)>::new()).is_none());
    }

    #[test]
    fn test_disparity_score() {
        assert!((disparity_score(0.0, 1.0) - 100.0).abs() < 1e-9);
        assert!((disparity_score(0.12, 1.0) - 88.0).abs() < 1e-6);
        assert!((disparity_score(0.12, 2.0) - 76.0).abs() < 1e-6);
        assert_eq!(disparity_score(1.0, 1.0), 0.0);
        assert_eq!(disparity_score(0.6, 2.0), 0.0);
    }
}
