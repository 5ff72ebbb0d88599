//! Prometheus metrics and structured event logging

use crate::error::PredictError;
use crate::models::PredictionResult;
use prometheus::{
    register_gauge_vec, register_histogram, register_int_counter, register_int_counter_vec,
    GaugeVec, Histogram, IntCounter, IntCounterVec,
};
use std::sync::OnceLock;
use tracing::{error, info, warn};

/// Latency buckets in seconds
const LATENCY_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
];

static GLOBAL_METRICS: OnceLock<Option<MetricsInner>> = OnceLock::new();

struct MetricsInner {
    prediction_latency_seconds: Histogram,
    predictions: IntCounterVec,
    rejected_requests: IntCounter,
    prediction_errors: IntCounterVec,
    artifacts_info: GaugeVec,
}

impl MetricsInner {
    fn register() -> Result<Self, prometheus::Error> {
        Ok(Self {
            prediction_latency_seconds: register_histogram!(
                "admission_prediction_latency_seconds",
                "Time spent transforming a record and scoring it",
                LATENCY_BUCKETS.to_vec()
            )?,
            predictions: register_int_counter_vec!(
                "admission_predictions_total",
                "Predictions served, by label",
                &["label"]
            )?,
            rejected_requests: register_int_counter!(
                "admission_rejected_requests_total",
                "Requests rejected by intake validation"
            )?,
            prediction_errors: register_int_counter_vec!(
                "admission_prediction_errors_total",
                "Failed predictions, by error kind",
                &["kind"]
            )?,
            artifacts_info: register_gauge_vec!(
                "admission_artifacts_info",
                "Loaded artifact set",
                &["classifier", "features", "verified"]
            )?,
        })
    }
}

/// Handle to the process-wide metrics
///
/// Clones share the same registered collectors. If registration failed the
/// handle is inert and every method is a no-op.
#[derive(Clone)]
pub struct PredictorMetrics {
    _private: (),
}

impl Default for PredictorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl PredictorMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(|| match MetricsInner::register() {
            Ok(metrics) => Some(metrics),
            Err(e) => {
                warn!(error = %e, "Failed to register Prometheus metrics");
                None
            }
        });
        Self { _private: () }
    }

    fn inner(&self) -> Option<&MetricsInner> {
        GLOBAL_METRICS.get().and_then(Option::as_ref)
    }

    pub fn observe_prediction_latency(&self, duration_secs: f64) {
        if let Some(m) = self.inner() {
            m.prediction_latency_seconds.observe(duration_secs);
        }
    }

    pub fn record_prediction(&self, result: &PredictionResult) {
        if let Some(m) = self.inner() {
            m.predictions.with_label_values(&[result.label.as_str()]).inc();
        }
    }

    pub fn inc_rejected(&self) {
        if let Some(m) = self.inner() {
            m.rejected_requests.inc();
        }
    }

    pub fn record_error(&self, err: &PredictError) {
        if let Some(m) = self.inner() {
            m.prediction_errors.with_label_values(&[err.kind()]).inc();
        }
    }

    pub fn set_artifacts(&self, classifier: &str, features: usize, verified: bool) {
        if let Some(m) = self.inner() {
            m.artifacts_info.reset();
            m.artifacts_info
                .with_label_values(&[classifier, &features.to_string(), &verified.to_string()])
                .set(1.0);
        }
    }
}

/// Structured logger for predictor events
#[derive(Clone)]
pub struct StructuredLogger {
    service: String,
}

impl StructuredLogger {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    pub fn log_startup(&self, version: &str, artifact_dir: &str) {
        info!(
            event = "service_started",
            service = %self.service,
            version = %version,
            artifact_dir = %artifact_dir,
            "Admission predictor started"
        );
    }

    pub fn log_artifacts_loaded(&self, classifier: &str, features: usize, verified: bool) {
        info!(
            event = "artifacts_loaded",
            service = %self.service,
            classifier = %classifier,
            features = features,
            checksums_verified = verified,
            "Prediction artifacts loaded"
        );
    }

    pub fn log_prediction(&self, result: &PredictionResult, elapsed_ms: f64) {
        info!(
            event = "prediction",
            service = %self.service,
            label = %result.label,
            probability = result.probability,
            elapsed_ms = elapsed_ms,
            "Prediction served"
        );
    }

    pub fn log_rejected(&self, reason: &str, violations: usize) {
        warn!(
            event = "request_rejected",
            service = %self.service,
            reason = %reason,
            violations = violations,
            "Request rejected at intake"
        );
    }

    /// Schema mismatches indicate a deployment defect, not bad input
    pub fn log_prediction_failed(&self, err: &PredictError) {
        if err.is_input_error() {
            warn!(
                event = "prediction_failed",
                service = %self.service,
                kind = err.kind(),
                error = %err,
                "Prediction failed on input"
            );
        } else {
            error!(
                event = "prediction_failed",
                service = %self.service,
                kind = err.kind(),
                error = %err,
                "Prediction failed"
            );
        }
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            service = %self.service,
            reason = %reason,
            "Admission predictor shutting down"
        );
    }
}
