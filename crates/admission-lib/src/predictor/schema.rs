//! Feature schema alignment

use crate::error::LoadError;
use crate::models::FeatureRow;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Ordered column names the model was trained on
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct FeatureSchema {
    columns: Vec<String>,
}

impl TryFrom<Vec<String>> for FeatureSchema {
    type Error = String;

    fn try_from(columns: Vec<String>) -> Result<Self, Self::Error> {
        if columns.is_empty() {
            return Err("feature schema is empty".to_string());
        }
        let mut seen = HashSet::with_capacity(columns.len());
        if let Some(dup) = columns.iter().find(|c| !seen.insert(c.as_str())) {
            return Err(format!("feature schema lists {} twice", dup));
        }
        Ok(Self { columns })
    }
}

impl From<FeatureSchema> for Vec<String> {
    fn from(schema: FeatureSchema) -> Self {
        schema.columns
    }
}

impl FeatureSchema {
    pub fn new(columns: Vec<String>) -> Result<Self, LoadError> {
        Self::try_from(columns).map_err(|reason| LoadError::Invalid {
            key: crate::encoders::keys::FEATURE_SCHEMA.to_string(),
            reason,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn position(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.position(column).is_some()
    }
}

/// A feature row whose columns equal the schema, in schema order
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedRow {
    row: FeatureRow,
    filled: Vec<String>,
    dropped: Vec<String>,
}

impl AlignedRow {
    pub fn values(&self) -> &[f32] {
        self.row.values()
    }

    pub fn columns(&self) -> &[String] {
        self.row.columns()
    }

    pub fn len(&self) -> usize {
        self.row.len()
    }

    pub fn is_empty(&self) -> bool {
        self.row.is_empty()
    }

    pub fn get(&self, column: &str) -> Option<f32> {
        self.row.get(column)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f32)> {
        self.row.iter()
    }

    /// Schema columns absent from the transformed row, filled with NaN
    pub fn filled(&self) -> &[String] {
        &self.filled
    }

    /// Transformed columns the schema does not list
    pub fn dropped(&self) -> &[String] {
        &self.dropped
    }
}

/// Reconciles transformed rows with the feature schema
pub struct SchemaAligner<'a> {
    schema: &'a FeatureSchema,
}

impl<'a> SchemaAligner<'a> {
    pub fn new(schema: &'a FeatureSchema) -> Self {
        Self { schema }
    }

    /// Fill absent schema columns with NaN, drop extras, and order by schema
    pub fn align(&self, row: &FeatureRow) -> AlignedRow {
        let present: HashMap<&str, f32> = row.iter().collect();

        let mut aligned = FeatureRow::with_capacity(self.schema.len());
        let mut filled = Vec::new();
        for column in self.schema.columns() {
            match present.get(column.as_str()) {
                Some(value) => aligned.push(column.as_str(), *value),
                None => {
                    aligned.push(column.as_str(), f32::NAN);
                    filled.push(column.clone());
                }
            }
        }

        let dropped: Vec<String> = row
            .columns()
            .iter()
            .filter(|c| !self.schema.contains(c))
            .cloned()
            .collect();

        debug!(
            columns = aligned.len(),
            filled = filled.len(),
            dropped = dropped.len(),
            "Row aligned to feature schema"
        );

        AlignedRow {
            row: aligned,
            filled,
            dropped,
        }
    }
}
