//! API client for the admission prediction service

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use url::Url;

/// Error reported by the service in its JSON error body
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message} ({status}, {code})")]
pub struct ApiFailure {
    pub status: StatusCode,
    pub code: String,
    pub message: String,
    pub violations: Vec<Violation>,
}

pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid API URL")?;

        Ok(Self { client, base_url })
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.get_allowing(path, &[]).await
    }

    /// GET that also accepts the listed non-success statuses as valid bodies
    pub async fn get_allowing<T: DeserializeOwned>(
        &self,
        path: &str,
        allowed: &[StatusCode],
    ) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;

        if !response.status().is_success() && !allowed.contains(&response.status()) {
            return Err(failure(response).await);
        }

        response.json().await.context("Failed to parse response")
    }

    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .context("Failed to send request")?;

        if !response.status().is_success() {
            return Err(failure(response).await);
        }

        response.json().await.context("Failed to parse response")
    }

    pub async fn predict(&self, record: &Map<String, Value>) -> Result<Prediction> {
        self.post("api/v1/predict", record).await
    }

    pub async fn explain(&self, record: &Map<String, Value>) -> Result<Explanation> {
        self.post("api/v1/predict/explain", record).await
    }

    pub async fn catalog(&self) -> Result<Vec<CatalogEntry>> {
        self.get("api/v1/catalog").await
    }

    pub async fn catalog_field(&self, field: &str) -> Result<CatalogEntry> {
        self.get(&format!("api/v1/catalog/{}", field)).await
    }

    pub async fn health(&self) -> Result<HealthResponse> {
        self.get_allowing("healthz", &[StatusCode::SERVICE_UNAVAILABLE])
            .await
    }

    pub async fn readiness(&self) -> Result<ReadinessResponse> {
        self.get_allowing("readyz", &[StatusCode::SERVICE_UNAVAILABLE])
            .await
    }
}

async fn failure(response: reqwest::Response) -> anyhow::Error {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorResponse>(&body) {
        Ok(err) => ApiFailure {
            status,
            code: err.error,
            message: err.message,
            violations: err.violations,
        }
        .into(),
        Err(_) => anyhow::anyhow!("API error ({}): {}", status, body),
    }
}

// API response types

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,
    pub admitted: bool,
    pub probability: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureValue {
    pub column: String,
    pub value: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Explanation {
    pub label: String,
    pub probability: f32,
    pub features: Vec<FeatureValue>,
    #[serde(default)]
    pub filled: Vec<String>,
    #[serde(default)]
    pub dropped: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub field: String,
    pub label: String,
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub last_check_timestamp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub components: BTreeMap<String, ComponentHealth>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    pub field: String,
    pub value: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(default)]
    pub violations: Vec<Violation>,
}
