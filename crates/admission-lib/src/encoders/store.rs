//! Artifact directory access with optional checksum verification
//!
//! Every artifact is addressed by a stable key and read from a file inside one
//! directory. When a `manifest.json` is present, each listed artifact must hash
//! to its recorded SHA-256 before it is parsed.

use crate::error::LoadError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Default manifest file name
pub const MANIFEST_FILE: &str = "manifest.json";

/// Stable artifact keys
pub mod keys {
    pub const LABEL_ENCODERS: &str = "label_encoders";
    pub const ROBUST_SCALER: &str = "robust_scaler";
    pub const MINMAX_SCALER: &str = "minmax_scaler";
    pub const ONE_HOT: &str = "one_hot";
    pub const TARGET_ENCODER: &str = "target_encoder";
    pub const VALUE_CATALOG: &str = "value_catalog";
    pub const FEATURE_SCHEMA: &str = "feature_schema";
    pub const MODEL: &str = "model";

    /// Every artifact a prediction context reads
    pub const ALL: [&str; 8] = [
        LABEL_ENCODERS,
        ROBUST_SCALER,
        MINMAX_SCALER,
        ONE_HOT,
        TARGET_ENCODER,
        VALUE_CATALOG,
        FEATURE_SCHEMA,
        MODEL,
    ];
}

/// File name for each artifact key
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ArtifactFiles {
    pub label_encoders: String,
    pub robust_scaler: String,
    pub minmax_scaler: String,
    pub one_hot: String,
    pub target_encoder: String,
    pub value_catalog: String,
    pub feature_schema: String,
    pub model: String,
}

impl Default for ArtifactFiles {
    fn default() -> Self {
        Self {
            label_encoders: "label_encoders.json".to_string(),
            robust_scaler: "robust_scaler.json".to_string(),
            minmax_scaler: "minmax_scaler.json".to_string(),
            one_hot: "one_hot.json".to_string(),
            target_encoder: "target_encoder.json".to_string(),
            value_catalog: "value_catalog.json".to_string(),
            feature_schema: "feature_schema.json".to_string(),
            model: "model.onnx".to_string(),
        }
    }
}

/// Recorded SHA-256 digests, keyed by artifact key
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Manifest {
    pub artifacts: BTreeMap<String, String>,
}

impl Manifest {
    /// Artifact keys with no recorded checksum
    pub fn unlisted(&self) -> Vec<&'static str> {
        keys::ALL
            .into_iter()
            .filter(|key| !self.artifacts.contains_key(*key))
            .collect()
    }
}

/// Read-only view of an artifact directory
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
    manifest: Option<Manifest>,
}

impl ArtifactStore {
    /// Open `dir`, loading its manifest when one exists
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, LoadError> {
        let dir = dir.into();
        let manifest_path = dir.join(MANIFEST_FILE);
        let manifest = if manifest_path.exists() {
            let bytes = read_file("manifest", &manifest_path)?;
            let manifest: Manifest =
                serde_json::from_slice(&bytes).map_err(|source| LoadError::Malformed {
                    key: "manifest".to_string(),
                    source,
                })?;
            info!(
                path = %manifest_path.display(),
                artifacts = manifest.artifacts.len(),
                "Artifact manifest loaded"
            );
            let unlisted = manifest.unlisted();
            if !unlisted.is_empty() {
                warn!(
                    artifacts = ?unlisted,
                    "Manifest has no checksum for some artifacts; load is unverified"
                );
            }
            Some(manifest)
        } else {
            debug!(dir = %dir.display(), "No artifact manifest, skipping checksum verification");
            None
        };
        Ok(Self { dir, manifest })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    /// True only when the manifest records a checksum for every artifact
    ///
    /// Listed artifacts fail to read on a mismatch, so a successful load with
    /// a complete manifest has hashed everything.
    pub fn is_verified(&self) -> bool {
        self.manifest
            .as_ref()
            .is_some_and(|manifest| manifest.unlisted().is_empty())
    }

    /// Raw artifact bytes, checksum-verified when the manifest lists `key`
    pub fn read_bytes(&self, key: &str, file: &str) -> Result<Vec<u8>, LoadError> {
        let path = self.path(file);
        let bytes = read_file(key, &path)?;

        if let Some(expected) = self.manifest.as_ref().and_then(|m| m.artifacts.get(key)) {
            let actual = compute_checksum(&bytes);
            if !actual.eq_ignore_ascii_case(expected) {
                return Err(LoadError::Checksum {
                    key: key.to_string(),
                    expected: expected.clone(),
                    actual,
                });
            }
            debug!(key = %key, checksum = %actual, "Artifact checksum validated");
        }

        Ok(bytes)
    }

    /// Parse a JSON artifact
    pub fn read_json<T: DeserializeOwned>(&self, key: &str, file: &str) -> Result<T, LoadError> {
        let bytes = self.read_bytes(key, file)?;
        serde_json::from_slice(&bytes).map_err(|source| LoadError::Malformed {
            key: key.to_string(),
            source,
        })
    }
}

fn read_file(key: &str, path: &Path) -> Result<Vec<u8>, LoadError> {
    if !path.exists() {
        return Err(LoadError::Missing {
            key: key.to_string(),
            path: path.to_path_buf(),
        });
    }
    fs::read(path).map_err(|source| LoadError::Unreadable {
        key: key.to_string(),
        path: path.to_path_buf(),
        source,
    })
}

/// Hex-encoded SHA-256 of `data`
pub fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
