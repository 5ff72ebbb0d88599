//! Ordinal label encoding

use crate::error::PredictError;
use crate::models::FieldValue;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Deserialize, Serialize)]
struct LabelEncoderArtifact {
    classes: Vec<FieldValue>,
}

/// Maps a categorical value to its fit-time integer code (its index in `classes`)
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(try_from = "LabelEncoderArtifact", into = "LabelEncoderArtifact")]
pub struct LabelEncoder {
    classes: Vec<FieldValue>,
    index: HashMap<String, usize>,
}

impl TryFrom<LabelEncoderArtifact> for LabelEncoder {
    type Error = String;

    fn try_from(artifact: LabelEncoderArtifact) -> Result<Self, Self::Error> {
        LabelEncoder::new(artifact.classes)
    }
}

impl From<LabelEncoder> for LabelEncoderArtifact {
    fn from(encoder: LabelEncoder) -> Self {
        Self {
            classes: encoder.classes,
        }
    }
}

impl LabelEncoder {
    pub fn new(classes: Vec<FieldValue>) -> Result<Self, String> {
        if classes.is_empty() {
            return Err("label encoder has no classes".to_string());
        }
        let mut index = HashMap::with_capacity(classes.len());
        for (code, class) in classes.iter().enumerate() {
            if index.insert(class.as_category(), code).is_some() {
                return Err(format!("duplicate class {}", class));
            }
        }
        Ok(Self { classes, index })
    }

    pub fn classes(&self) -> &[FieldValue] {
        &self.classes
    }

    pub fn code(&self, value: &FieldValue) -> Option<usize> {
        self.index.get(&value.as_category()).copied()
    }

    /// Encode one value of `column`; unseen values are an error, never a default
    pub fn transform(&self, column: &str, value: &FieldValue) -> Result<f32, PredictError> {
        self.code(value)
            .map(|code| code as f32)
            .ok_or_else(|| PredictError::UnknownCategory {
                field: column.to_string(),
                value: value.as_category(),
            })
    }
}

/// The label encoder bundle, one encoder per column
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(transparent)]
pub struct LabelEncoders {
    encoders: BTreeMap<String, LabelEncoder>,
}

impl LabelEncoders {
    pub fn new(encoders: impl IntoIterator<Item = (String, LabelEncoder)>) -> Self {
        Self {
            encoders: encoders.into_iter().collect(),
        }
    }

    pub fn get(&self, column: &str) -> Option<&LabelEncoder> {
        self.encoders.get(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.encoders.keys().map(String::as_str)
    }
}
