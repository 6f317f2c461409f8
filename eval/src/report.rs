// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Human-readable and JSON reports of an MDFI result

use crate::engine::{AttributeBreakdown, FairnessResult};
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Score band of an MDFI value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpretation {
    /// 70 and above
    Acceptable,
    /// 50 up to 70
    ModerateConcerns,
    /// Below 50
    UrgentIntervention,
}

impl Interpretation {
    pub fn from_score(score: f64) -> Self {
        if score >= 70.0 {
            Interpretation::Acceptable
        } else if score >= 50.0 {
            Interpretation::ModerateConcerns
        } else {
            Interpretation::UrgentIntervention
        }
    }

    /// Follow-up actions suggested for this band
    pub fn recommendations(&self) -> &'static [&'static str] {
        match self {
            Interpretation::Acceptable => &["Continue monitoring for any degradation over time"],
            Interpretation::ModerateConcerns => &[
                "Review demographic disparities",
                "Improve content category balance",
                "Enhance procedural transparency",
            ],
            Interpretation::UrgentIntervention => &[
                "Implement immediate fairness audits",
                "Adjust detection thresholds for disadvantaged groups",
                "Establish appeal mechanisms",
                "Diversify training data",
            ],
        }
    }
}

impl fmt::Display for Interpretation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Interpretation::Acceptable => "Acceptable fairness (meets threshold)",
            Interpretation::ModerateConcerns => "Moderate concerns (requires attention)",
            Interpretation::UrgentIntervention => "Urgent intervention needed",
        };
        f.write_str(text)
    }
}

/// A result stamped with generation time and crate version
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FairnessReport {
    pub result: FairnessResult,
    pub interpretation: Interpretation,
    pub generated_at: DateTime<Utc>,
    pub version: String,
}

impl FairnessReport {
    pub fn new(result: FairnessResult) -> Self {
        Self {
            interpretation: Interpretation::from_score(result.overall_score),
            result,
            generated_at: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Save as pretty-printed JSON
    pub fn save_json(&self, output_path: &Path) -> Result<()> {
        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(output_path, json)?;
        tracing::info!("Report saved to {}", output_path.display());
        Ok(())
    }

    /// Format as a plain-text summary
    pub fn format(&self) -> String {
        let r = &self.result;
        let w = &r.effective_weights;
        let mut output = format!(
            r#"MDFI Fairness Report
====================
Overall MDFI:        {:.2}/100
Interpretation:      {}

Component Scores:
  Group Fairness:      {:>6.2}/100  (weight {:.2}){}
  Content Fairness:    {:>6.2}/100  (weight {:.2}){}
  Procedural Fairness: {:>6.2}/100  (weight {:.2}){}

Records: {} total, {} usable, {} excluded
Overall accuracy: {:.4}
"#,
            r.overall_score,
            self.interpretation,
            r.group_fairness, w.group, unmeasured_marker(r.group.available),
            r.content_fairness, w.content, unmeasured_marker(r.content.available),
            r.procedural_fairness, w.procedural, unmeasured_marker(r.procedural.available),
            r.dataset.total_records,
            r.dataset.usable_records,
            r.dataset.excluded_records,
            r.dataset.overall.accuracy,
        );

        if !r.warnings.is_empty() {
            output.push_str("\nWarnings:\n");
            for warning in &r.warnings {
                output.push_str(&format!("  - {}\n", warning));
            }
        }

        output.push_str("\nRecommendations:\n");
        for recommendation in self.interpretation.recommendations() {
            output.push_str(&format!("  - {}\n", recommendation));
        }

        output
    }

    /// Render a markdown audit document
    pub fn to_markdown(&self) -> String {
        let r = &self.result;
        let mut report = String::new();

        report.push_str("# MDFI Fairness Report\n\n");
        report.push_str(&format!("**Generated:** {}\n\n", self.generated_at.format("%Y-%m-%d %H:%M:%S UTC")));
        report.push_str(&format!("**Version:** {}\n\n", self.version));

        report.push_str("## Summary\n\n");
        report.push_str(&format!("**Overall MDFI:** {:.2}/100 ({})\n\n", r.overall_score, self.interpretation));
        report.push_str("| Component | Score | Weight | Measured |\n");
        report.push_str("|-----------|-------|--------|----------|\n");
        for (name, score, weight, available) in [
            ("Group", r.group_fairness, r.effective_weights.group, r.group.available),
            ("Content", r.content_fairness, r.effective_weights.content, r.content.available),
            ("Procedural", r.procedural_fairness, r.effective_weights.procedural, r.procedural.available),
        ] {
            report.push_str(&format!(
                "| {} | {:.2} | {:.2} | {} |\n",
                name,
                score,
                weight,
                if available { "yes" } else { "no" }
            ));
        }

        report.push_str("\n## Dataset\n\n");
        report.push_str(&format!("- **Total records:** {}\n", r.dataset.total_records));
        report.push_str(&format!("- **Usable records:** {}\n", r.dataset.usable_records));
        report.push_str(&format!("- **Excluded records:** {}\n", r.dataset.excluded_records));
        report.push_str(&format!("- **Overall accuracy:** {:.4}\n\n", r.dataset.overall.accuracy));

        report.push_str("## Group Fairness\n\n");
        if r.group.attributes.is_empty() {
            report.push_str("_No demographic or geographic attribute available._\n\n");
        }
        for attribute in &r.group.attributes {
            push_attribute_table(&mut report, attribute);
        }

        report.push_str("## Content Fairness\n\n");
        match &r.content.attribute {
            Some(attribute) => push_attribute_table(&mut report, attribute),
            None => report.push_str("_No content category attribute available._\n\n"),
        }

        report.push_str("## Procedural Fairness\n\n");
        if let Some(e) = &r.procedural.explanation {
            report.push_str(&format!(
                "- **Explanation availability** (`{}`): {}/{} = {:.2}%\n",
                e.column,
                e.explained,
                e.observed,
                e.rate * 100.0
            ));
        }
        if let Some(a) = &r.procedural.appeal {
            report.push_str(&format!(
                "- **Appeal timeliness** (`{}`): {}/{} within {}h, mean {:.1}h, score {:.2}\n",
                a.column, a.within_threshold, a.observed, a.threshold_hours, a.mean_hours, a.score
            ));
        }
        if !r.procedural.available {
            report.push_str("_No procedural attribute available._\n");
        }
        report.push('\n');

        if !r.warnings.is_empty() {
            report.push_str("## Data Quality Warnings\n\n");
            for warning in &r.warnings {
                report.push_str(&format!("- {}\n", warning));
            }
            report.push('\n');
        }

        report.push_str("## Configuration\n\n");
        report.push_str(&format!(
            "```json\n{}\n```\n",
            serde_json::to_string_pretty(&r.config).unwrap_or_default()
        ));

        report
    }
}

fn unmeasured_marker(available: bool) -> &'static str {
    if available {
        ""
    } else {
        "  [not measured]"
    }
}

fn push_attribute_table(report: &mut String, attribute: &AttributeBreakdown) {
    let rate = |r: Option<f64>| r.map_or("-".to_string(), |v| format!("{:.4}", v));

    report.push_str(&format!("### `{}`\n\n", attribute.column));
    report.push_str("| Slice | Count | FPR | FNR | Accuracy |\n");
    report.push_str("|-------|-------|-----|-----|----------|\n");
    for slice in &attribute.slices {
        let excluded = if attribute.excluded_slices.contains(&slice.slice) { " (excluded)" } else { "" };
        report.push_str(&format!(
            "| {}{} | {} | {} | {} | {:.4} |\n",
            slice.slice,
            excluded,
            slice.count,
            rate(slice.false_positive_rate),
            rate(slice.false_negative_rate),
            slice.accuracy
        ));
    }
    match attribute.disparity {
        Some(d) => report.push_str(&format!("\nDisparity: {:.2} percentage points\n\n", d * 100.0)),
        None => report.push_str("\nDisparity: not measurable\n\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ColumnBindings, MdfiConfig};
    use crate::datasets::Dataset;
    use crate::engine::calculate_mdfi;

    fn synthetic_report() -> FairnessReport {
        let data = Dataset::load_synthetic(300, 42);
        let result = calculate_mdfi(&data, &ColumnBindings::sample_csv(), &MdfiConfig::default())
            .expect("synthetic data should score");
        FairnessReport::new(result)
    }

    #[test]
    fn test_interpretation_bands() {
        assert_eq!(Interpretation::from_score(85.0), Interpretation::Acceptable);
        assert_eq!(Interpretation::from_score(70.0), Interpretation::Acceptable);
        assert_eq!(Interpretation::from_score(69.9), Interpretation::ModerateConcerns);
        assert_eq!(Interpretation::from_score(50.0), Interpretation::ModerateConcerns);
        assert_eq!(Interpretation::from_score(12.0), Interpretation::UrgentIntervention);
    }

    #[test]
    fn test_recommendations_per_band() {
        assert_eq!(Interpretation::Acceptable.recommendations().len(), 1);
        assert!(Interpretation::ModerateConcerns
            .recommendations()
            .contains(&"Review demographic disparities"));
        assert!(Interpretation::UrgentIntervention
            .recommendations()
            .contains(&"Establish appeal mechanisms"));
    }

    #[test]
    fn test_format_lists_recommendations() {
        let report = synthetic_report();
        let formatted = report.format();

        assert!(formatted.contains("Recommendations:"));
        for recommendation in report.interpretation.recommendations() {
            assert!(formatted.contains(recommendation));
        }
    }

    #[test]
    fn test_format_contains_components() {
        let report = synthetic_report();
        let formatted = report.format();

        assert!(formatted.contains("MDFI Fairness Report"));
        assert!(formatted.contains("Group Fairness"));
        assert!(formatted.contains("Procedural Fairness"));
    }

    #[test]
    fn test_markdown_lists_slices() {
        let report = synthetic_report();
        let markdown = report.to_markdown();

        assert!(markdown.contains("# MDFI Fairness Report"));
        assert!(markdown.contains("### `user_age_group`"));
        assert!(markdown.contains("| elderly |"));
        assert!(markdown.contains("### `content_category`"));
        assert!(markdown.contains("Appeal timeliness"));
    }

    #[test]
    fn test_json_field_names_are_stable() {
        let report = synthetic_report();
        let value = serde_json::to_value(&report).unwrap();
        let result = &value["result"];

        for field in ["overall_score", "group_fairness", "content_fairness", "procedural_fairness", "warnings"] {
            assert!(result.get(field).is_some(), "missing field {}", field);
        }
        assert!(result["group"]["attributes"][0]["slices"].is_array());
    }

    #[test]
    fn test_unmeasured_component_marked() {
        let data = Dataset::load_synthetic(100, 1);
        let bindings = ColumnBindings::new("predicted_label", "is_fake");
        let result = calculate_mdfi(&data, &bindings, &MdfiConfig::default()).unwrap();
        let formatted = FairnessReport::new(result).format();

        assert!(formatted.contains("[not measured]"));
        assert!(formatted.contains("Warnings:"));
    }
}
