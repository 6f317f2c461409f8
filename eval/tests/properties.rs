// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Property tests for MDFI scoring invariants

use mdfi_eval::config::{ColumnBindings, ComponentWeights, MdfiConfig, MissingComponentPolicy};
use mdfi_eval::datasets::{Dataset, Value};
use mdfi_eval::engine::{calculate_mdfi, combine_scores};
use proptest::prelude::*;

const AGES: [&str; 3] = ["young", "middle", "elderly"];
const TOPICS: [&str; 3] = ["health", "politics", "entertainment"];

#[derive(Debug, Clone)]
struct Row {
    predicted: u8,
    label: u8,
    age: Option<usize>,
    topic: usize,
    explained: bool,
    appeal_hours: f64,
}

fn row_strategy() -> impl Strategy<Value = Row> {
    (
        0u8..2,
        0u8..2,
        prop::option::weighted(0.9, 0usize..AGES.len()),
        0usize..TOPICS.len(),
        any::<bool>(),
        0.0f64..200.0,
    )
        .prop_map(|(predicted, label, age, topic, explained, appeal_hours)| Row {
            predicted,
            label,
            age,
            topic,
            explained,
            appeal_hours,
        })
}

fn column(rows: &[Row], f: impl Fn(&Row) -> Value) -> Vec<Value> {
    rows.iter().map(f).collect()
}

fn build_dataset(rows: &[Row]) -> Dataset {
    Dataset::from_columns(vec![
        ("predicted", column(rows, |r| Value::from(i64::from(r.predicted)))),
        ("label", column(rows, |r| Value::from(i64::from(r.label)))),
        ("age", column(rows, |r| Value::from(r.age.map(|i| AGES[i])))),
        ("topic", column(rows, |r| Value::from(TOPICS[r.topic]))),
        ("explained", column(rows, |r| Value::from(r.explained))),
        ("appeal", column(rows, |r| Value::from(r.appeal_hours))),
    ])
    .expect("columns have equal length")
}

fn full_bindings() -> ColumnBindings {
    ColumnBindings::new("predicted", "label")
        .demographic("age")
        .content("topic")
        .explanation("explained")
        .appeal_time("appeal")
}

fn in_range(score: f64) -> bool {
    (0.0..=100.0).contains(&score)
}

proptest! {
    #[test]
    fn all_scores_within_bounds(
        rows in prop::collection::vec(row_strategy(), 1..200),
        scale_factor in 0.1f64..10.0,
    ) {
        let config = MdfiConfig { scale_factor, ..Default::default() };
        let result = calculate_mdfi(&build_dataset(&rows), &full_bindings(), &config).unwrap();

        prop_assert!(in_range(result.overall_score));
        prop_assert!(in_range(result.group_fairness));
        prop_assert!(in_range(result.content_fairness));
        prop_assert!(in_range(result.procedural_fairness));
    }

    #[test]
    fn calculation_is_idempotent(rows in prop::collection::vec(row_strategy(), 1..100)) {
        let data = build_dataset(&rows);
        let config = MdfiConfig::default();
        let first = calculate_mdfi(&data, &full_bindings(), &config).unwrap();
        let second = calculate_mdfi(&data, &full_bindings(), &config).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn overall_is_weighted_sum(
        rows in prop::collection::vec(row_strategy(), 1..100),
        a in 0.0f64..1.0,
        b in 0.0f64..1.0,
    ) {
        let weights = ComponentWeights::new(a, (1.0 - a) * b, (1.0 - a) * (1.0 - b));
        let config = MdfiConfig { weights, ..Default::default() };
        let result = calculate_mdfi(&build_dataset(&rows), &full_bindings(), &config).unwrap();

        let expected = weights.group * result.group_fairness
            + weights.content * result.content_fairness
            + weights.procedural * result.procedural_fairness;
        prop_assert!((result.overall_score - expected).abs() < 1e-9);
        prop_assert!(
            (result.overall_score
                - combine_scores(&weights, result.group_fairness, result.content_fairness, result.procedural_fairness))
            .abs()
                < 1e-9
        );
    }

    #[test]
    fn identical_slices_score_perfect_group_fairness(
        pattern in prop::collection::vec((0u8..2, 0u8..2), 1..30),
    ) {
        // Every age slice sees the same outcomes, so FPRs are identical
        let rows: Vec<Row> = AGES
            .iter()
            .enumerate()
            .flat_map(|(age, _)| {
                pattern.iter().map(move |(predicted, label)| Row {
                    predicted: *predicted,
                    label: *label,
                    age: Some(age),
                    topic: 0,
                    explained: true,
                    appeal_hours: 1.0,
                })
            })
            .collect();
        let result = calculate_mdfi(&build_dataset(&rows), &full_bindings(), &MdfiConfig::default()).unwrap();
        prop_assert_eq!(result.group_fairness, 100.0);
    }

    #[test]
    fn renormalized_overall_stays_in_bounds(rows in prop::collection::vec(row_strategy(), 1..100)) {
        let bindings = ColumnBindings::new("predicted", "label").content("topic");
        let config = MdfiConfig {
            missing_component_policy: MissingComponentPolicy::Renormalize,
            ..Default::default()
        };
        let result = calculate_mdfi(&build_dataset(&rows), &bindings, &config).unwrap();

        prop_assert!(in_range(result.overall_score));
        prop_assert!((result.effective_weights.sum() - 1.0).abs() < 1e-9);
    }
}

#[test]
fn absent_demographic_column_is_flagged_not_silent() {
    let rows: Vec<Row> = (0..20)
        .map(|i| Row {
            predicted: (i % 2) as u8,
            label: ((i / 2) % 2) as u8,
            age: Some(i % 3),
            topic: i % 3,
            explained: i % 4 != 0,
            appeal_hours: 24.0 * (i % 5) as f64,
        })
        .collect();
    let data = build_dataset(&rows);
    let bindings = full_bindings().demographic("ethnicity");
    let result = calculate_mdfi(&data, &bindings, &MdfiConfig::default()).unwrap();

    assert_eq!(result.group_fairness, 100.0);
    assert!(!result.group.available);
    assert!(!result.warnings_for(mdfi_eval::Component::Group).is_empty());
}
