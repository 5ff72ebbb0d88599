//! Prediction invocation and output mapping
//!
//! Runs the classifier on an aligned row and maps the raw output to an
//! admission label and probability.

use super::schema::AlignedRow;
use super::Classifier;
use crate::error::ModelError;
use crate::models::{AdmissionLabel, PredictionResult};

/// Probability at or above which an applicant is labelled admitted
pub const DECISION_THRESHOLD: f32 = 0.5;

/// Configuration for output mapping
#[derive(Debug, Clone)]
pub struct InvokerConfig {
    /// Used when the model reports a probability but no class
    pub decision_threshold: f32,
}

impl Default for InvokerConfig {
    fn default() -> Self {
        Self {
            decision_threshold: DECISION_THRESHOLD,
        }
    }
}

/// Calls the classifier and interprets its output
pub struct PredictionInvoker<'a> {
    classifier: &'a dyn Classifier,
    config: &'a InvokerConfig,
}

impl<'a> PredictionInvoker<'a> {
    pub fn new(classifier: &'a dyn Classifier, config: &'a InvokerConfig) -> Self {
        Self { classifier, config }
    }

    pub fn invoke(&self, features: &AlignedRow) -> Result<PredictionResult, ModelError> {
        let output = self.classifier.predict(features)?;
        let probability = output.positive_probability;

        if !(0.0..=1.0).contains(&probability) {
            return Err(ModelError::Output(format!(
                "positive-class probability {} outside [0, 1]",
                probability
            )));
        }

        let admitted = match output.predicted_class {
            Some(class) => class == 1,
            None => probability >= self.config.decision_threshold,
        };

        Ok(PredictionResult {
            label: if admitted {
                AdmissionLabel::Admitted
            } else {
                AdmissionLabel::NotAdmitted
            },
            probability,
        })
    }
}
