//! Classifier implementations
//!
//! `OnnxClassifier` runs an exported ONNX classifier through tract.
//! `LinearClassifier` evaluates a JSON logistic model and is handy for
//! lightweight deployments and tests.

use super::schema::{AlignedRow, FeatureSchema};
use super::{Classifier, ModelOutput};
use crate::error::ModelError;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;
use tract_onnx::prelude::*;
use tracing::{debug, warn};

/// Inference latency above which a warning is logged
const MAX_INFERENCE_MS: u128 = 50;

type TractModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// ONNX binary classifier run with tract
///
/// Accepts models exporting a class label tensor (`i64`) and/or a probability
/// tensor (`f32`, shape `[1, 2]` or a single positive-class value).
pub struct OnnxClassifier {
    model: TractModel,
    input_width: usize,
}

impl OnnxClassifier {
    /// Parse and optimize an ONNX model for a `[1, input_width]` input
    pub fn from_bytes(model_bytes: &[u8], input_width: usize) -> anyhow::Result<Self> {
        let model = tract_onnx::onnx()
            .model_for_read(&mut std::io::Cursor::new(model_bytes))
            .context("Failed to parse ONNX model")?
            .with_input_fact(0, f32::fact([1, input_width]).into())
            .context("Failed to set input shape")?
            .into_optimized()
            .context("Failed to optimize model")?
            .into_runnable()
            .context("Failed to create runnable model")?;
        Ok(Self { model, input_width })
    }

    fn to_tensor(&self, features: &AlignedRow) -> Result<Tensor, ModelError> {
        let data = features.values().to_vec();
        tract_ndarray::Array2::from_shape_vec((1, self.input_width), data)
            .map(Tensor::from)
            .map_err(|e| ModelError::Internal(e.to_string()))
    }

    fn read_outputs(outputs: &[TValue]) -> Result<ModelOutput, ModelError> {
        let mut predicted_class = None;
        let mut positive_probability = None;

        for output in outputs {
            if output.datum_type() == i64::datum_type() {
                let view = output
                    .to_array_view::<i64>()
                    .map_err(|e| ModelError::Output(e.to_string()))?;
                predicted_class = view.iter().next().copied();
            } else if output.datum_type() == f32::datum_type() {
                let view = output
                    .to_array_view::<f32>()
                    .map_err(|e| ModelError::Output(e.to_string()))?;
                let values: Vec<f32> = view.iter().copied().collect();
                positive_probability = match values.as_slice() {
                    [p] => Some(*p),
                    [_, p] => Some(*p),
                    other => {
                        return Err(ModelError::Output(format!(
                            "expected 1 or 2 probabilities, got {}",
                            other.len()
                        )))
                    }
                };
            }
        }

        let positive_probability = positive_probability
            .ok_or_else(|| ModelError::Output("model produced no probability output".to_string()))?;
        Ok(ModelOutput {
            predicted_class,
            positive_probability,
        })
    }
}

impl Classifier for OnnxClassifier {
    fn predict(&self, features: &AlignedRow) -> Result<ModelOutput, ModelError> {
        if features.len() != self.input_width {
            return Err(ModelError::InputShape {
                expected: self.input_width,
                actual: features.len(),
            });
        }

        let start = Instant::now();
        let input = self.to_tensor(features)?;
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .map_err(|e| ModelError::Internal(format!("{:#}", e)))?;

        let elapsed = start.elapsed();
        if elapsed.as_millis() > MAX_INFERENCE_MS {
            warn!(
                elapsed_ms = elapsed.as_millis(),
                "Inference exceeded {}ms target",
                MAX_INFERENCE_MS
            );
        } else {
            debug!(elapsed_us = elapsed.as_micros(), "Inference completed");
        }

        Self::read_outputs(&outputs)
    }

    fn input_width(&self) -> usize {
        self.input_width
    }

    fn name(&self) -> &'static str {
        "onnx"
    }
}

/// JSON form of a logistic model
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LinearModelArtifact {
    pub intercept: f64,
    pub weights: BTreeMap<String, f64>,
}

/// Logistic regression over the schema columns
///
/// Missing (`NaN`) inputs contribute nothing to the score.
#[derive(Debug, Clone)]
pub struct LinearClassifier {
    intercept: f64,
    weights: Vec<f64>,
}

impl LinearClassifier {
    /// Bind named weights to schema positions; unnamed columns weigh zero
    pub fn from_artifact(
        artifact: LinearModelArtifact,
        schema: &FeatureSchema,
    ) -> Result<Self, String> {
        let mut weights = vec![0.0; schema.len()];
        for (column, weight) in &artifact.weights {
            let idx = schema.position(column).ok_or_else(|| {
                format!("weight for {} which is not in the feature schema", column)
            })?;
            weights[idx] = *weight;
        }
        Ok(Self {
            intercept: artifact.intercept,
            weights,
        })
    }
}

impl Classifier for LinearClassifier {
    fn predict(&self, features: &AlignedRow) -> Result<ModelOutput, ModelError> {
        if features.len() != self.weights.len() {
            return Err(ModelError::InputShape {
                expected: self.weights.len(),
                actual: features.len(),
            });
        }

        let score: f64 = self.intercept
            + features
                .values()
                .iter()
                .zip(&self.weights)
                .filter(|(x, _)| !x.is_nan())
                .map(|(x, w)| *x as f64 * w)
                .sum::<f64>();
        if !score.is_finite() {
            return Err(ModelError::Internal(format!("non-finite score {}", score)));
        }

        let probability = 1.0 / (1.0 + (-score).exp());
        Ok(ModelOutput {
            predicted_class: None,
            positive_probability: probability as f32,
        })
    }

    fn input_width(&self) -> usize {
        self.weights.len()
    }

    fn name(&self) -> &'static str {
        "linear"
    }
}
