//! Admission prediction library
//!
//! This crate provides:
//! - Fitted encoder artifacts and their registry
//! - The feature pipeline (assembly, transformation, schema alignment)
//! - Classifier invocation (ONNX via tract, or a JSON logistic model)
//! - Health checks and observability

pub mod encoders;
pub mod error;
pub mod health;
pub mod models;
pub mod observability;
pub mod predictor;

#[cfg(test)]
mod testing;

pub use error::{IntakeError, LoadError, ModelError, PredictError};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{PredictorMetrics, StructuredLogger};
pub use predictor::{ArtifactConfig, ModelFormat, PredictionContext};
