//! Prediction context: the immutable bundle of loaded artifacts
//!
//! Built once at startup and passed explicitly to every request. Every
//! consistency check between the artifacts happens in the constructor.

use super::assembler::{FeatureAssembler, IntakePolicy, PolicyViolation};
use super::features::TransformationPipeline;
use super::inference::{LinearClassifier, LinearModelArtifact, OnnxClassifier};
use super::layout::{FieldGroup, GroupLayout};
use super::output::{InvokerConfig, PredictionInvoker};
use super::schema::{AlignedRow, FeatureSchema, SchemaAligner};
use super::Classifier;
use crate::encoders::{keys, ArtifactFiles, ArtifactStore, EncoderRegistry};
use crate::error::{IntakeError, LoadError, PredictError};
use crate::models::{FieldValue, PredictionResult, RawRecord};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

/// Serialization of the classifier artifact
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelFormat {
    #[default]
    Onnx,
    Linear,
}

/// Where to find the artifacts and how to read the model
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArtifactConfig {
    pub dir: PathBuf,
    #[serde(default)]
    pub files: ArtifactFiles,
    #[serde(default)]
    pub model_format: ModelFormat,
}

impl ArtifactConfig {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            files: ArtifactFiles::default(),
            model_format: ModelFormat::default(),
        }
    }

    pub fn with_model(mut self, format: ModelFormat, file: impl Into<String>) -> Self {
        self.model_format = format;
        self.files.model = file.into();
        self
    }
}

/// One aligned feature, `None` when the column was filled as missing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureValue {
    pub column: String,
    pub value: Option<f32>,
}

/// A prediction together with the row the model saw
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Explanation {
    #[serde(flatten)]
    pub result: PredictionResult,
    pub features: Vec<FeatureValue>,
    pub filled: Vec<String>,
    pub dropped: Vec<String>,
}

pub struct PredictionContext {
    registry: EncoderRegistry,
    layout: GroupLayout,
    schema: FeatureSchema,
    classifier: Box<dyn Classifier>,
    invoker: InvokerConfig,
    verified: bool,
}

impl PredictionContext {
    /// Load every artifact from disk; the process must not serve on error
    pub fn load(config: &ArtifactConfig) -> Result<Self, LoadError> {
        let store = ArtifactStore::open(&config.dir)?;
        let registry = EncoderRegistry::load(&store, &config.files)?;
        let schema: FeatureSchema =
            store.read_json(keys::FEATURE_SCHEMA, &config.files.feature_schema)?;

        let model_bytes = store.read_bytes(keys::MODEL, &config.files.model)?;
        let model_path = store.path(&config.files.model);
        let classifier: Box<dyn Classifier> = match config.model_format {
            ModelFormat::Onnx => Box::new(
                OnnxClassifier::from_bytes(&model_bytes, schema.len()).map_err(|e| {
                    LoadError::Model {
                        path: model_path.clone(),
                        message: format!("{:#}", e),
                    }
                })?,
            ),
            ModelFormat::Linear => {
                let artifact: LinearModelArtifact = serde_json::from_slice(&model_bytes)
                    .map_err(|source| LoadError::Malformed {
                        key: keys::MODEL.to_string(),
                        source,
                    })?;
                Box::new(
                    LinearClassifier::from_artifact(artifact, &schema).map_err(|message| {
                        LoadError::Model {
                            path: model_path.clone(),
                            message,
                        }
                    })?,
                )
            }
        };

        info!(
            path = %model_path.display(),
            format = classifier.name(),
            features = schema.len(),
            "Classifier loaded"
        );

        let mut context = Self::new(registry, GroupLayout::default(), schema, classifier)?;
        context.verified = store.is_verified();
        Ok(context)
    }

    /// Bundle loaded artifacts, validating them against each other
    pub fn new(
        registry: EncoderRegistry,
        layout: GroupLayout,
        schema: FeatureSchema,
        classifier: Box<dyn Classifier>,
    ) -> Result<Self, LoadError> {
        layout.reconcile(&registry)?;

        if classifier.input_width() != schema.len() {
            return Err(LoadError::SchemaMismatch(format!(
                "classifier expects {} features but the feature schema has {}",
                classifier.input_width(),
                schema.len()
            )));
        }

        // Raw categorical text cannot be fed to a numeric model
        if let Some(field) = layout
            .fields(FieldGroup::PassThrough)
            .iter()
            .find(|f| schema.contains(f.column()))
        {
            return Err(LoadError::SchemaMismatch(format!(
                "feature schema requires pass-through field {} which is never encoded",
                field
            )));
        }

        let context = Self {
            registry,
            layout,
            schema,
            classifier,
            invoker: InvokerConfig::default(),
            verified: false,
        };

        let produced: HashSet<String> = context.produced_columns().into_iter().collect();
        let never_produced: Vec<&String> = context
            .schema
            .columns()
            .iter()
            .filter(|c| !produced.contains(*c))
            .collect();
        if !never_produced.is_empty() {
            warn!(
                columns = ?never_produced,
                "Feature schema columns no encoder produces; they are always missing"
            );
        }

        Ok(context)
    }

    pub fn with_invoker_config(mut self, config: InvokerConfig) -> Self {
        self.invoker = config;
        self
    }

    pub fn registry(&self) -> &EncoderRegistry {
        &self.registry
    }

    pub fn layout(&self) -> &GroupLayout {
        &self.layout
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Whether artifacts were checked against a manifest at load
    pub fn is_verified(&self) -> bool {
        self.verified
    }

    pub fn classifier_name(&self) -> &'static str {
        self.classifier.name()
    }

    /// Build a record from named values
    pub fn assemble<K, I>(&self, values: I) -> Result<RawRecord, IntakeError>
    where
        K: AsRef<str>,
        I: IntoIterator<Item = (K, FieldValue)>,
    {
        FeatureAssembler::new().assemble(values)
    }

    /// Intake-layer policy check against this context's catalog
    pub fn check_intake(
        &self,
        record: &RawRecord,
        policy: &IntakePolicy,
    ) -> Result<(), Vec<PolicyViolation>> {
        policy.check(record, &self.registry)
    }

    /// Run the full pipeline for one record
    pub fn predict(&self, record: &RawRecord) -> Result<PredictionResult, PredictError> {
        let aligned = self.features(record)?;
        self.invoke(&aligned)
    }

    /// Like [`predict`](Self::predict), also returning the aligned row
    pub fn explain(&self, record: &RawRecord) -> Result<Explanation, PredictError> {
        let aligned = self.features(record)?;
        let result = self.invoke(&aligned)?;
        Ok(Explanation {
            result,
            features: aligned
                .iter()
                .map(|(column, value)| FeatureValue {
                    column: column.to_string(),
                    value: (!value.is_nan()).then_some(value),
                })
                .collect(),
            filled: aligned.filled().to_vec(),
            dropped: aligned.dropped().to_vec(),
        })
    }

    /// Transformed and aligned row for `record`
    pub fn features(&self, record: &RawRecord) -> Result<AlignedRow, PredictError> {
        let row = TransformationPipeline::new(&self.registry, &self.layout)
            .transform(record)
            .inspect_err(|e| {
                if let PredictError::SchemaMismatch(reason) = e {
                    error!(
                        reason = %reason,
                        "Configuration defect: artifacts disagree with field groups"
                    );
                }
            })?;
        Ok(SchemaAligner::new(&self.schema).align(&row))
    }

    fn invoke(&self, aligned: &AlignedRow) -> Result<PredictionResult, PredictError> {
        let result = PredictionInvoker::new(self.classifier.as_ref(), &self.invoker)
            .invoke(aligned)?;
        debug!(
            label = %result.label,
            probability = result.probability,
            "Prediction completed"
        );
        Ok(result)
    }

    fn produced_columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = self
            .layout
            .fields(FieldGroup::Label)
            .iter()
            .map(|f| f.column().to_string())
            .collect();
        columns.extend(self.registry.robust_scaler().feature_names_in.iter().cloned());
        columns.extend(self.registry.minmax_scaler().feature_names_in.iter().cloned());
        columns.extend(self.registry.one_hot().feature_names_out().iter().cloned());
        columns
    }
}
