// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! In-memory tabular datasets of labeled detection outcomes
//!
//! A [`Dataset`] is a set of equally long named columns. The engine never
//! assumes a schema: callers bind column names to roles through
//! [`crate::config::ColumnBindings`].

use crate::error::{MdfiError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Binary label for disinformation detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    /// Content identified as disinformation/fake
    Disinformation,
    /// Content identified as authentic/real
    Authentic,
}

/// A single cell of a dataset
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Missing,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Value {
    /// Infer a value from raw CSV text
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Value::Missing;
        }
        match trimmed.to_lowercase().as_str() {
            "na" | "n/a" | "nan" | "null" | "none" => return Value::Missing,
            "true" => return Value::Bool(true),
            "false" => return Value::Bool(false),
            _ => {}
        }
        match trimmed.parse::<f64>() {
            Ok(n) if n.is_finite() => Value::Number(n),
            Ok(_) => Value::Missing,
            Err(_) => Value::Text(trimmed.to_string()),
        }
    }

    /// Interpret as a boolean flag (`true/false`, `yes/no`, `1/0`)
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Number(n) if *n == 1.0 => Some(true),
            Value::Number(n) if *n == 0.0 => Some(false),
            Value::Text(s) => match s.trim().to_lowercase().as_str() {
                "true" | "yes" | "y" | "1" => Some(true),
                "false" | "no" | "n" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Interpret as a binary detection label; anything else is not usable
    pub fn as_label(&self) -> Option<Label> {
        if let Value::Text(s) = self {
            match s.trim().to_lowercase().as_str() {
                "fake" | "disinformation" | "misinformation" => return Some(Label::Disinformation),
                "real" | "authentic" => return Some(Label::Authentic),
                _ => {}
            }
        }
        self.as_bool().map(|fake| if fake { Label::Disinformation } else { Label::Authentic })
    }

    /// Interpret as a finite number
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) if n.is_finite() => Some(*n),
            Value::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }

    /// Grouping key used when slicing on this value
    pub fn slice_key(&self) -> Option<String> {
        match self {
            Value::Missing => None,
            Value::Bool(b) => Some(b.to_string()),
            Value::Number(n) => {
                // -0 and 0 are the same slice
                let n = if *n == 0.0 { 0.0 } else { *n };
                Some(n.to_string())
            }
            Value::Text(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Missing, Into::into)
    }
}

#[derive(Debug, Clone)]
struct Column {
    name: String,
    values: Vec<Value>,
}

/// Column-oriented in-memory table
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    columns: Vec<Column>,
    rows: usize,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(name, values)` pairs; all columns must be the same length
    pub fn from_columns<N, I>(columns: I) -> Result<Self>
    where
        N: Into<String>,
        I: IntoIterator<Item = (N, Vec<Value>)>,
    {
        let mut dataset = Self::new();
        for (name, values) in columns {
            dataset.push_column(name, values)?;
        }
        Ok(dataset)
    }

    /// Append a column
    pub fn push_column(&mut self, name: impl Into<String>, values: Vec<Value>) -> Result<()> {
        let name = name.into();
        if self.has_column(&name) {
            return Err(MdfiError::input(format!("duplicate column '{}'", name)));
        }
        if self.columns.is_empty() {
            self.rows = values.len();
        } else if values.len() != self.rows {
            return Err(MdfiError::input(format!(
                "column '{}' has {} values, dataset has {} rows",
                name,
                values.len(),
                self.rows
            )));
        }
        self.columns.push(Column { name, values });
        Ok(())
    }

    /// Load a CSV file with a header row
    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let dataset = Self::from_csv_reader(file)?;
        tracing::info!(
            "Loaded {} records with {} columns from {}",
            dataset.len(),
            dataset.columns.len(),
            path.display()
        );
        Ok(dataset)
    }

    /// Read CSV with a header row, inferring each cell's value
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
        let mut columns: Vec<Vec<Value>> = vec![Vec::new(); headers.len()];

        for result in reader.records() {
            let record = result?;
            for (idx, values) in columns.iter_mut().enumerate() {
                values.push(record.get(idx).map_or(Value::Missing, Value::parse));
            }
        }

        Self::from_columns(headers.into_iter().zip(columns))
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&[Value]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Number of distinct non-missing values in a column
    pub fn distinct_count(&self, name: &str) -> usize {
        self.column(name)
            .map(|values| {
                values
                    .iter()
                    .filter_map(Value::slice_key)
                    .collect::<HashSet<_>>()
                    .len()
            })
            .unwrap_or(0)
    }

    /// Get label distribution of a column
    pub fn label_distribution(&self, label_col: &str) -> HashMap<Label, usize> {
        let mut dist = HashMap::new();
        for label in self.column(label_col).unwrap_or(&[]).iter().filter_map(Value::as_label) {
            *dist.entry(label).or_insert(0) += 1;
        }
        dist
    }

    /// Generate a synthetic detection dataset laid out like the sample CSV
    ///
    /// Accuracy differs by content category and the elderly group receives
    /// more false positives, so every MDFI component has something to measure.
    pub fn load_synthetic(size: usize, seed: u64) -> Self {
        use rand::{Rng, SeedableRng};
        use rand_chacha::ChaCha8Rng;

        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let categories = [("health", 0.80), ("entertainment", 0.90), ("politics", 0.75)];
        let platforms = ["platform_a", "platform_b", "platform_c"];

        let mut record_id = Vec::with_capacity(size);
        let mut content_category = Vec::with_capacity(size);
        let mut is_fake = Vec::with_capacity(size);
        let mut platform = Vec::with_capacity(size);
        let mut age_group = Vec::with_capacity(size);
        let mut location = Vec::with_capacity(size);
        let mut has_explanation = Vec::with_capacity(size);
        let mut appeal_time = Vec::with_capacity(size);
        let mut predicted = Vec::with_capacity(size);
        let mut confidence = Vec::with_capacity(size);

        for i in 0..size {
            let (category, accuracy) = categories[rng.gen_range(0..categories.len())];
            let elderly = rng.gen_bool(0.3);
            let fake = rng.gen_bool(0.5);

            // Authentic content from elderly users is flagged more often
            let correct = if !fake && elderly {
                rng.gen_bool(accuracy - 0.1)
            } else {
                rng.gen_bool(accuracy)
            };
            let pred = if correct { fake } else { !fake };

            record_id.push(Value::from(format!("rec_{:05}", i)));
            content_category.push(Value::from(category));
            is_fake.push(Value::from(i64::from(fake)));
            platform.push(Value::from(platforms[rng.gen_range(0..platforms.len())]));
            age_group.push(Value::from(if elderly { "elderly" } else { "young" }));
            location.push(Value::from(if rng.gen_bool(0.6) { "urban" } else { "rural" }));
            has_explanation.push(Value::from(rng.gen_bool(0.85)));
            appeal_time.push(Value::from(rng.gen_range(12.0..120.0_f64)));
            predicted.push(Value::from(i64::from(pred)));
            confidence.push(Value::from(rng.gen_range(0.5..1.0_f64)));
        }

        let columns = vec![
            ("record_id", record_id),
            ("content_category", content_category),
            ("is_fake", is_fake),
            ("platform", platform),
            ("user_age_group", age_group),
            ("user_location", location),
            ("has_explanation", has_explanation),
            ("appeal_time_hours", appeal_time),
            ("predicted_label", predicted),
            ("confidence_score", confidence),
        ];

        let mut dataset = Self::new();
        for (name, values) in columns {
            dataset.columns.push(Column {
                name: name.to_string(),
                values,
            });
        }
        dataset.rows = size;
        dataset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_parse() {
        assert_eq!(Value::parse(""), Value::Missing);
        assert_eq!(Value::parse(" NA "), Value::Missing);
        assert_eq!(Value::parse("nan"), Value::Missing);
        assert_eq!(Value::parse("TRUE"), Value::Bool(true));
        assert_eq!(Value::parse("42.5"), Value::Number(42.5));
        assert_eq!(Value::parse("young"), Value::Text("young".to_string()));
    }

    #[test]
    fn test_label_coercion() {
        assert_eq!(Value::Number(1.0).as_label(), Some(Label::Disinformation));
        assert_eq!(Value::Number(0.0).as_label(), Some(Label::Authentic));
        assert_eq!(Value::from("FAKE").as_label(), Some(Label::Disinformation));
        assert_eq!(Value::from("real").as_label(), Some(Label::Authentic));
        assert_eq!(Value::Bool(false).as_label(), Some(Label::Authentic));
        assert_eq!(Value::Number(2.0).as_label(), None);
        assert_eq!(Value::from("maybe").as_label(), None);
        assert_eq!(Value::Missing.as_label(), None);
    }

    #[test]
    fn test_slice_key() {
        assert_eq!(Value::Number(1.0).slice_key(), Some("1".to_string()));
        assert_eq!(Value::from("  urban ").slice_key(), Some("urban".to_string()));
        assert_eq!(Value::from("").slice_key(), None);
        assert_eq!(Value::Missing.slice_key(), None);
    }

    #[test]
    fn test_slice_key_signed_zero() {
        assert_eq!(Value::Number(-0.0).slice_key(), Value::Number(0.0).slice_key());

        let csv = "cat\n0\n-0\n0\n-0\n";
        let dataset = Dataset::from_csv_reader(csv.as_bytes()).unwrap();
        assert_eq!(dataset.distinct_count("cat"), 1);
    }

    #[test]
    fn test_from_columns_rejects_ragged() {
        let result = Dataset::from_columns(vec![
            ("a", vec![Value::from(1_i64), Value::from(0_i64)]),
            ("b", vec![Value::from(1_i64)]),
        ]);
        assert!(matches!(result, Err(MdfiError::Input(_))));
    }

    #[test]
    fn test_from_columns_rejects_duplicates() {
        let result = Dataset::from_columns(vec![
            ("a", vec![Value::from(1_i64)]),
            ("a", vec![Value::from(0_i64)]),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_csv_reader() {
        let csv = "record_id,is_fake,predicted_label,user_age_group,appeal_time_hours\n\
                   r1,1,1,young,24\n\
                   r2,0,1,elderly,\n\
                   r3,0,0,,96.5\n";
        let dataset = Dataset::from_csv_reader(csv.as_bytes()).unwrap();

        assert_eq!(dataset.len(), 3);
        assert_eq!(
            dataset.column_names(),
            vec!["record_id", "is_fake", "predicted_label", "user_age_group", "appeal_time_hours"]
        );

        let ages = dataset.column("user_age_group").unwrap();
        assert_eq!(ages[2], Value::Missing);
        assert_eq!(dataset.distinct_count("user_age_group"), 2);

        let appeals = dataset.column("appeal_time_hours").unwrap();
        assert_eq!(appeals[1], Value::Missing);
        assert_eq!(appeals[2].as_f64(), Some(96.5));

        let dist = dataset.label_distribution("is_fake");
        assert_eq!(dist.get(&Label::Disinformation), Some(&1));
        assert_eq!(dist.get(&Label::Authentic), Some(&2));
    }

    #[test]
    fn test_synthetic_dataset() {
        let dataset = Dataset::load_synthetic(500, 42);

        assert_eq!(dataset.len(), 500);
        assert!(dataset.has_column("predicted_label"));
        assert_eq!(dataset.distinct_count("user_age_group"), 2);
        assert_eq!(dataset.distinct_count("content_category"), 3);
    }

    #[test]
    fn test_synthetic_is_reproducible() {
        let a = Dataset::load_synthetic(50, 7);
        let b = Dataset::load_synthetic(50, 7);
        assert_eq!(a.column("predicted_label"), b.column("predicted_label"));
        assert_eq!(a.column("appeal_time_hours"), b.column("appeal_time_hours"));
    }
}
