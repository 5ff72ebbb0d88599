//! HTTP API: prediction, catalog, health and Prometheus metrics

use admission_lib::{
    health::{components, ComponentStatus, HealthRegistry},
    predictor::{Explanation, IntakePolicy, PolicyViolation},
    Field, FieldKind, FieldValue, IntakeError, PredictError, PredictionContext,
    PredictionResult, PredictorMetrics, RawRecord, StructuredLogger,
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub context: Arc<PredictionContext>,
    pub health_registry: HealthRegistry,
    pub metrics: PredictorMetrics,
    pub logger: StructuredLogger,
    pub policy: IntakePolicy,
}

impl AppState {
    pub fn new(
        context: Arc<PredictionContext>,
        health_registry: HealthRegistry,
        metrics: PredictorMetrics,
        logger: StructuredLogger,
    ) -> Self {
        Self {
            context,
            health_registry,
            metrics,
            logger,
            policy: IntakePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: IntakePolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// Request failures and their HTTP mapping
#[derive(Debug)]
pub enum ApiError {
    /// Body is not a JSON object of field values
    BadRequest(String),
    Rejected(Vec<PolicyViolation>),
    Predict(PredictError),
    NotFound(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    violations: Vec<PolicyViolation>,
}

impl From<PredictError> for ApiError {
    fn from(err: PredictError) -> Self {
        ApiError::Predict(err)
    }
}

impl From<IntakeError> for ApiError {
    fn from(err: IntakeError) -> Self {
        ApiError::Predict(err.into())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: "bad_request",
                    message,
                    violations: Vec::new(),
                },
            ),
            ApiError::Rejected(violations) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorBody {
                    error: "policy_violation",
                    message: format!("{} field(s) outside the allowed values", violations.len()),
                    violations,
                },
            ),
            ApiError::NotFound(message) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    error: "not_found",
                    message,
                    violations: Vec::new(),
                },
            ),
            ApiError::Predict(err) => {
                let status = match err {
                    PredictError::Intake(_) | PredictError::UnknownCategory { .. } => {
                        StatusCode::UNPROCESSABLE_ENTITY
                    }
                    PredictError::SchemaMismatch(_) | PredictError::Prediction(_) => {
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                (
                    status,
                    ErrorBody {
                        error: err.kind(),
                        message: err.to_string(),
                        violations: Vec::new(),
                    },
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub label: String,
    pub admitted: bool,
    pub probability: f32,
}

impl From<PredictionResult> for PredictResponse {
    fn from(result: PredictionResult) -> Self {
        Self {
            label: result.label.to_string(),
            admitted: result.label.is_admitted(),
            probability: result.probability,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CatalogEntry {
    pub field: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<FieldValue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl CatalogEntry {
    fn build(state: &AppState, field: Field) -> Self {
        let range = state.policy.range(field);
        Self {
            field: field.column(),
            label: field.label(),
            kind: field.kind(),
            values: state
                .context
                .registry()
                .valid_values(field)
                .map(|v| v.to_vec()),
            min: range.map(|r| *r.start()),
            max: range.map(|r| *r.end()),
        }
    }
}

/// Returns 200 while operational, 503 once a component is unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy | ComponentStatus::Degraded => StatusCode::OK,
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %e, "Failed to encode metrics");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

async fn catalog(State(state): State<Arc<AppState>>) -> Json<Vec<CatalogEntry>> {
    Json(
        Field::ALL
            .iter()
            .map(|field| CatalogEntry::build(&state, *field))
            .collect(),
    )
}

async fn catalog_field(
    State(state): State<Arc<AppState>>,
    Path(column): Path<String>,
) -> Result<Json<CatalogEntry>, ApiError> {
    let field = Field::from_column(&column)
        .ok_or_else(|| ApiError::NotFound(format!("unknown field {}", column)))?;
    Ok(Json(CatalogEntry::build(&state, field)))
}

/// Assemble and policy-check a request body
fn intake(
    state: &AppState,
    body: Result<Json<BTreeMap<String, FieldValue>>, JsonRejection>,
) -> Result<RawRecord, ApiError> {
    let Json(values) = body?;
    let record = state.context.assemble(values)?;
    state
        .context
        .check_intake(&record, &state.policy)
        .map_err(ApiError::Rejected)?;
    Ok(record)
}

/// Record the outcome of one request in logs, metrics and component health
async fn observe<T>(
    state: &AppState,
    outcome: &Result<T, ApiError>,
    result: impl Fn(&T) -> &PredictionResult,
    started: Instant,
) {
    match outcome {
        Ok(value) => {
            let elapsed = started.elapsed();
            state.metrics.observe_prediction_latency(elapsed.as_secs_f64());
            state.metrics.record_prediction(result(value));
            state
                .logger
                .log_prediction(result(value), elapsed.as_secs_f64() * 1000.0);
        }
        Err(ApiError::Rejected(violations)) => {
            state.metrics.inc_rejected();
            state.logger.log_rejected("policy_violation", violations.len());
        }
        Err(ApiError::BadRequest(message)) => {
            state.metrics.inc_rejected();
            state.logger.log_rejected(message, 0);
        }
        Err(ApiError::Predict(err)) => {
            state.metrics.record_error(err);
            state.logger.log_prediction_failed(err);
            let component = match err {
                PredictError::Prediction(_) => Some(components::CLASSIFIER),
                PredictError::SchemaMismatch(_) => Some(components::ARTIFACTS),
                PredictError::Intake(_) | PredictError::UnknownCategory { .. } => None,
            };
            if let Some(component) = component {
                state
                    .health_registry
                    .set_degraded(component, err.to_string())
                    .await;
            }
        }
        Err(ApiError::NotFound(_)) => {}
    }
}

async fn predict(
    State(state): State<Arc<AppState>>,
    body: Result<Json<BTreeMap<String, FieldValue>>, JsonRejection>,
) -> Result<Json<PredictResponse>, ApiError> {
    let started = Instant::now();
    let outcome = intake(&state, body)
        .and_then(|record| state.context.predict(&record).map_err(ApiError::from));
    observe(&state, &outcome, |r| r, started).await;
    outcome.map(|r| Json(r.into()))
}

async fn explain(
    State(state): State<Arc<AppState>>,
    body: Result<Json<BTreeMap<String, FieldValue>>, JsonRejection>,
) -> Result<Json<Explanation>, ApiError> {
    let started = Instant::now();
    let outcome = intake(&state, body)
        .and_then(|record| state.context.explain(&record).map_err(ApiError::from));
    observe(&state, &outcome, |e| &e.result, started).await;
    outcome.map(Json)
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .route("/api/v1/catalog", get(catalog))
        .route("/api/v1/catalog/:field", get(catalog_field))
        .route("/api/v1/predict", post(predict))
        .route("/api/v1/predict/explain", post(explain))
        .with_state(state)
}

/// Serve until `shutdown` resolves
pub async fn serve(
    port: u16,
    state: Arc<AppState>,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
