//! Admission prediction engine

mod assembler;
mod context;
mod features;
mod inference;
mod layout;
mod output;
mod schema;

pub use assembler::{FeatureAssembler, IntakePolicy, PolicyViolation};
pub use context::{ArtifactConfig, Explanation, FeatureValue, ModelFormat, PredictionContext};
pub use features::TransformationPipeline;
pub use inference::{LinearClassifier, LinearModelArtifact, OnnxClassifier};
pub use layout::{FieldGroup, GroupLayout};
pub use output::{InvokerConfig, PredictionInvoker, DECISION_THRESHOLD};
pub use schema::{AlignedRow, FeatureSchema, SchemaAligner};

use crate::error::ModelError;

/// Raw classifier output for one row
#[derive(Debug, Clone, PartialEq)]
pub struct ModelOutput {
    /// Class the model itself predicted, when it reports one
    pub predicted_class: Option<i64>,
    /// Probability of the admitted class
    pub positive_probability: f32,
}

/// Trait for binary admission classifiers
pub trait Classifier: Send + Sync {
    /// Score one aligned feature row
    fn predict(&self, features: &AlignedRow) -> Result<ModelOutput, ModelError>;

    /// Number of features the model expects
    fn input_width(&self) -> usize;

    /// Short name for logs and metrics
    fn name(&self) -> &'static str;
}
