// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! MDFI command-line interface
//!
//! Usage:
//!   mdfi --synthetic 1000 --seed 42
//!   mdfi --input detections.csv --sample-columns --format markdown

use anyhow::{bail, Context, Result};
use clap::Parser;
use mdfi_eval::config::{ColumnBindings, ComponentWeights, MdfiConfig, MissingComponentPolicy};
use mdfi_eval::datasets::Dataset;
use mdfi_eval::engine::calculate_mdfi;
use mdfi_eval::report::FairnessReport;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "mdfi")]
#[command(about = "Compute the Multi-Dimensional Fairness Index of detection outcomes")]
#[command(version)]
struct Args {
    /// CSV file of detection outcomes (omit to use synthetic data)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Number of synthetic records when no input is given
    #[arg(long, default_value_t = 1000)]
    synthetic: usize,

    /// Random seed for synthetic data
    #[arg(short, long, default_value_t = 42)]
    seed: u64,

    /// Bind the sample CSV columns (predicted_label, is_fake, user_age_group, ...)
    #[arg(long)]
    sample_columns: bool,

    /// Prediction column
    #[arg(long, default_value = "predicted_label")]
    prediction_col: String,

    /// Ground truth label column
    #[arg(long, default_value = "is_fake")]
    label_col: String,

    #[arg(long)]
    demographic_col: Option<String>,

    #[arg(long)]
    geographic_col: Option<String>,

    #[arg(long)]
    content_col: Option<String>,

    #[arg(long)]
    explanation_col: Option<String>,

    #[arg(long)]
    appeal_time_col: Option<String>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Component weights as group,content,procedural
    #[arg(long)]
    weights: Option<String>,

    /// Score points lost per percentage point of disparity
    #[arg(long)]
    scale_factor: Option<f64>,

    /// Appeal timeliness threshold in hours
    #[arg(long)]
    appeal_threshold: Option<f64>,

    /// Drop unmeasured components and rescale the remaining weights
    #[arg(long)]
    renormalize: bool,

    /// Output directory for saved reports
    #[arg(short, long, default_value = "results")]
    output: PathBuf,

    /// Saved output format (json, markdown, both, none)
    #[arg(short, long, default_value = "both")]
    format: String,
}

impl Args {
    fn bindings(&self) -> ColumnBindings {
        if self.sample_columns || self.input.is_none() {
            return ColumnBindings::sample_csv();
        }
        ColumnBindings {
            prediction_col: self.prediction_col.clone(),
            label_col: self.label_col.clone(),
            demographic_col: self.demographic_col.clone(),
            geographic_col: self.geographic_col.clone(),
            content_col: self.content_col.clone(),
            explanation_col: self.explanation_col.clone(),
            appeal_time_col: self.appeal_time_col.clone(),
        }
    }

    fn mdfi_config(&self) -> Result<MdfiConfig> {
        let mut config = match &self.config {
            Some(path) => MdfiConfig::from_json_file(path)
                .with_context(|| format!("Failed to load config: {}", path.display()))?,
            None => MdfiConfig::default(),
        };

        if let Some(ref weights) = self.weights {
            config.weights = parse_weights(weights)?;
        }
        if let Some(scale_factor) = self.scale_factor {
            config.scale_factor = scale_factor;
        }
        if let Some(threshold) = self.appeal_threshold {
            config.appeal_threshold_hours = threshold;
        }
        if self.renormalize {
            config.missing_component_policy = MissingComponentPolicy::Renormalize;
        }

        config.validate()?;
        Ok(config)
    }
}

fn parse_weights(raw: &str) -> Result<ComponentWeights> {
    let parts: Vec<f64> = raw
        .split(',')
        .map(|s| s.trim().parse::<f64>())
        .collect::<std::result::Result<Vec<f64>, _>>()
        .with_context(|| format!("Invalid weights '{}'", raw))?;

    match parts.as_slice() {
        [group, content, procedural] => Ok(ComponentWeights::new(*group, *content, *procedural)),
        _ => bail!("Expected three comma-separated weights, got '{}'", raw),
    }
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = args.mdfi_config()?;
    let bindings = args.bindings();

    let (dataset, source) = match &args.input {
        Some(path) => {
            let dataset = Dataset::from_csv_path(path)
                .with_context(|| format!("Failed to load dataset: {}", path.display()))?;
            (dataset, path.display().to_string())
        }
        None => {
            tracing::info!("No input given, generating {} synthetic records (seed={})", args.synthetic, args.seed);
            (Dataset::load_synthetic(args.synthetic, args.seed), "synthetic".to_string())
        }
    };

    let result = calculate_mdfi(&dataset, &bindings, &config)?;
    let report = FairnessReport::new(result);

    println!("\n{}", "=".repeat(70));
    println!("Source: {}", source);
    println!("{}", "=".repeat(70));
    println!("{}", report.format());

    let timestamp = report.generated_at.format("%Y%m%d_%H%M%S");

    match args.format.as_str() {
        "none" => return Ok(()),
        "json" | "markdown" | "both" => {}
        other => bail!("Unknown format '{}' (expected json, markdown, both or none)", other),
    }

    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("Failed to create {}", args.output.display()))?;

    if args.format == "json" || args.format == "both" {
        let json_path = args.output.join(format!("mdfi_{}.json", timestamp));
        report.save_json(&json_path)?;
        println!("JSON report saved to: {}", json_path.display());
    }

    if args.format == "markdown" || args.format == "both" {
        let md_path = args.output.join(format!("mdfi_{}.md", timestamp));
        std::fs::write(&md_path, report.to_markdown())?;
        println!("Markdown report saved to: {}", md_path.display());
    }

    Ok(())
}
