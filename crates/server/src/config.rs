//! Server configuration

use admission_lib::{ArtifactConfig, ModelFormat};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

const ENV_PREFIX: &str = "ADMISSION";

/// Server configuration, read from `ADMISSION_*` environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Name reported in structured logs
    #[serde(default = "default_service_name")]
    pub service_name: String,

    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Directory holding the fitted artifacts
    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: PathBuf,

    #[serde(default)]
    pub model_format: ModelFormat,

    /// Model file name; defaults by format
    #[serde(default)]
    pub model_file: Option<String>,

    /// Reject out-of-catalog selections at intake
    #[serde(default = "default_enforce_catalog")]
    pub enforce_catalog: bool,
}

fn default_service_name() -> String {
    "admission-server".to_string()
}

fn default_api_port() -> u16 {
    8080
}

fn default_artifact_dir() -> PathBuf {
    PathBuf::from("artifacts")
}

fn default_enforce_catalog() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            api_port: default_api_port(),
            artifact_dir: default_artifact_dir(),
            model_format: ModelFormat::default(),
            model_file: None,
            enforce_catalog: default_enforce_catalog(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from the process environment
    pub fn load() -> Result<Self> {
        Self::from_source(config::Environment::with_prefix(ENV_PREFIX))
    }

    fn from_source(env: config::Environment) -> Result<Self> {
        config::Config::builder()
            .add_source(env.try_parsing(true))
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")
    }

    pub fn artifact_config(&self) -> ArtifactConfig {
        let file = self.model_file.clone().unwrap_or_else(|| {
            match self.model_format {
                ModelFormat::Onnx => "model.onnx",
                ModelFormat::Linear => "model.json",
            }
            .to_string()
        });
        ArtifactConfig::new(&self.artifact_dir).with_model(self.model_format, file)
    }
}
