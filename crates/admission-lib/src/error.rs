//! Error taxonomy for artifact loading and prediction requests

use std::path::PathBuf;
use thiserror::Error;

/// Startup failure; the process must not serve predictions after one of these
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("artifact `{key}` not found at {}", path.display())]
    Missing { key: String, path: PathBuf },

    #[error("failed to read artifact `{key}` from {}", path.display())]
    Unreadable {
        key: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("artifact `{key}` is malformed")]
    Malformed {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("artifact `{key}` is invalid: {reason}")]
    Invalid { key: String, reason: String },

    #[error("checksum mismatch for artifact `{key}`: expected {expected}, got {actual}")]
    Checksum {
        key: String,
        expected: String,
        actual: String,
    },

    #[error("artifacts disagree with field groups: {0}")]
    SchemaMismatch(String),

    #[error("failed to load model from {}: {message}", path.display())]
    Model { path: PathBuf, message: String },
}

/// Raw input could not be assembled into a record
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IntakeError {
    #[error("missing field {0}")]
    MissingField(String),

    #[error("unknown field {0}")]
    UnknownField(String),

    #[error("invalid value {value:?} for field {field}: expected {expected}")]
    InvalidValue {
        field: String,
        value: String,
        expected: &'static str,
    },
}

/// Failure reported by the classifier
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("input shape mismatch: model expects {expected} features, got {actual}")]
    InputShape { expected: usize, actual: usize },

    #[error("invalid model output: {0}")]
    Output(String),

    #[error("internal model error: {0}")]
    Internal(String),
}

/// Per-request failure; recovered at the request boundary
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictError {
    #[error(transparent)]
    Intake(#[from] IntakeError),

    #[error("unknown category {value:?} for field {field}")]
    UnknownCategory { field: String, value: String },

    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("prediction failed: {0}")]
    Prediction(#[from] ModelError),
}

impl PredictError {
    /// Stable short name, used for metric labels and API error codes
    pub fn kind(&self) -> &'static str {
        match self {
            PredictError::Intake(_) => "invalid_input",
            PredictError::UnknownCategory { .. } => "unknown_category",
            PredictError::SchemaMismatch(_) => "schema_mismatch",
            PredictError::Prediction(_) => "prediction_error",
        }
    }

    /// True when the request itself is at fault rather than the deployment
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            PredictError::Intake(_) | PredictError::UnknownCategory { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let err = PredictError::UnknownCategory {
            field: "SEXO".to_string(),
            value: "OTRO".to_string(),
        };
        assert_eq!(err.kind(), "unknown_category");
        assert!(err.is_input_error());
        assert_eq!(err.to_string(), "unknown category \"OTRO\" for field SEXO");

        let err = PredictError::from(ModelError::Internal("boom".to_string()));
        assert_eq!(err.kind(), "prediction_error");
        assert!(!err.is_input_error());
    }

    #[test]
    fn test_schema_mismatch_is_not_input_error() {
        let err = PredictError::SchemaMismatch("scaler columns".to_string());
        assert!(!err.is_input_error());
    }
}
