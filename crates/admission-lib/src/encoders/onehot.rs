//! One-hot encoding over fit-time categories

use crate::error::PredictError;
use crate::models::FieldValue;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// What to do with a category the encoder never saw
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownCategoryPolicy {
    /// Emit an all-zero indicator block for the column
    #[default]
    Ignore,
    /// Fail the request
    Error,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
struct OneHotArtifact {
    feature_names_in: Vec<String>,
    categories: Vec<Vec<FieldValue>>,
    #[serde(default)]
    handle_unknown: UnknownCategoryPolicy,
}

/// Fitted one-hot encoder
///
/// Output columns are named `{column}_{category}` in fit order, one block per
/// input column.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(try_from = "OneHotArtifact", into = "OneHotArtifact")]
pub struct OneHotEncoder {
    feature_names_in: Vec<String>,
    categories: Vec<Vec<FieldValue>>,
    handle_unknown: UnknownCategoryPolicy,
    index: Vec<HashMap<String, usize>>,
    feature_names_out: Vec<String>,
}

impl TryFrom<OneHotArtifact> for OneHotEncoder {
    type Error = String;

    fn try_from(artifact: OneHotArtifact) -> Result<Self, Self::Error> {
        OneHotEncoder::new(
            artifact.feature_names_in,
            artifact.categories,
            artifact.handle_unknown,
        )
    }
}

impl From<OneHotEncoder> for OneHotArtifact {
    fn from(encoder: OneHotEncoder) -> Self {
        Self {
            feature_names_in: encoder.feature_names_in,
            categories: encoder.categories,
            handle_unknown: encoder.handle_unknown,
        }
    }
}

impl OneHotEncoder {
    pub fn new(
        feature_names_in: Vec<String>,
        categories: Vec<Vec<FieldValue>>,
        handle_unknown: UnknownCategoryPolicy,
    ) -> Result<Self, String> {
        if feature_names_in.len() != categories.len() {
            return Err(format!(
                "one-hot encoder has {} columns but {} category lists",
                feature_names_in.len(),
                categories.len()
            ));
        }

        let mut index = Vec::with_capacity(categories.len());
        let mut feature_names_out = Vec::new();
        for (column, cats) in feature_names_in.iter().zip(&categories) {
            let mut lookup = HashMap::with_capacity(cats.len());
            for (pos, cat) in cats.iter().enumerate() {
                let name = cat.as_category();
                feature_names_out.push(format!("{}_{}", column, name));
                if lookup.insert(name, pos).is_some() {
                    return Err(format!("duplicate category {} for column {}", cat, column));
                }
            }
            index.push(lookup);
        }

        Ok(Self {
            feature_names_in,
            categories,
            handle_unknown,
            index,
            feature_names_out,
        })
    }

    pub fn feature_names_in(&self) -> &[String] {
        &self.feature_names_in
    }

    pub fn feature_names_out(&self) -> &[String] {
        &self.feature_names_out
    }

    pub fn categories(&self, column: &str) -> Option<&[FieldValue]> {
        self.feature_names_in
            .iter()
            .position(|c| c == column)
            .map(|idx| self.categories[idx].as_slice())
    }

    pub fn handle_unknown(&self) -> UnknownCategoryPolicy {
        self.handle_unknown
    }

    /// Indicator block for one record; `values` follow `feature_names_in`
    pub fn transform(&self, values: &[String]) -> Result<Vec<f32>, PredictError> {
        if values.len() != self.feature_names_in.len() {
            return Err(PredictError::SchemaMismatch(format!(
                "one-hot encoder fitted on {} columns, given {}",
                self.feature_names_in.len(),
                values.len()
            )));
        }

        let mut out = vec![0.0; self.feature_names_out.len()];
        let mut offset = 0;
        for ((column, lookup), value) in self.feature_names_in.iter().zip(&self.index).zip(values) {
            match lookup.get(value) {
                Some(pos) => out[offset + pos] = 1.0,
                None if self.handle_unknown == UnknownCategoryPolicy::Ignore => {
                    tracing::debug!(
                        column = %column,
                        value = %value,
                        "Unseen category encoded as zeros"
                    );
                }
                None => {
                    return Err(PredictError::UnknownCategory {
                        field: column.clone(),
                        value: value.clone(),
                    })
                }
            }
            offset += lookup.len();
        }
        Ok(out)
    }
}
