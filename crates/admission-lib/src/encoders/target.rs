//! Target (mean) encoding
//!
//! The fitted target encoder ships with every model and is loaded with the
//! rest of the artifacts, but the active feature pipeline does not consume it.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TargetEncoder {
    pub feature_names_in: Vec<String>,
    pub categories: Vec<Vec<crate::models::FieldValue>>,
    pub encodings: Vec<Vec<f64>>,
    pub target_mean: f64,
}

impl TargetEncoder {
    pub fn validate(&self) -> Result<(), String> {
        let n = self.feature_names_in.len();
        if self.categories.len() != n || self.encodings.len() != n {
            return Err(format!(
                "target encoder has {} columns, {} category lists, {} encoding lists",
                n,
                self.categories.len(),
                self.encodings.len()
            ));
        }
        for (column, (cats, enc)) in self
            .feature_names_in
            .iter()
            .zip(self.categories.iter().zip(&self.encodings))
        {
            if cats.len() != enc.len() {
                return Err(format!(
                    "column {} has {} categories but {} encodings",
                    column,
                    cats.len(),
                    enc.len()
                ));
            }
        }
        Ok(())
    }
}
