//! JSON-serialized linear regression model and standard scaler

use crate::error::ArtifactError;
use crate::models::{Artifact, Scaler};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Artifact format version this build reads and writes
pub const FORMAT_VERSION: u32 = 1;

#[derive(Deserialize)]
struct Header {
    format_version: u32,
}

/// Read a versioned JSON artifact from disk
fn read_versioned<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let bytes = std::fs::read(path).map_err(|source| match source.kind() {
        std::io::ErrorKind::NotFound => ArtifactError::NotFound {
            path: path.to_path_buf(),
        },
        _ => ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        },
    })?;

    let deserialize_error = |e: serde_json::Error| ArtifactError::Deserialize {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let header: Header = serde_json::from_slice(&bytes).map_err(deserialize_error)?;
    if header.format_version != FORMAT_VERSION {
        return Err(ArtifactError::VersionMismatch {
            path: path.to_path_buf(),
            found: header.format_version,
            expected: FORMAT_VERSION,
        });
    }

    serde_json::from_slice(&bytes).map_err(deserialize_error)
}

/// Ordinary least squares model: `intercept + coefficients · x`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearModel {
    pub format_version: u32,
    /// Training-time column names
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
    /// Declared input width; defaults to the number of coefficients
    #[serde(default)]
    pub n_features_in: Option<usize>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LinearModel {
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            feature_names: None,
            n_features_in: None,
            coefficients,
            intercept,
        }
    }

    pub fn with_feature_names(mut self, names: Vec<String>) -> Self {
        self.feature_names = Some(names);
        self
    }

    /// Load and check a model file
    pub fn from_path(path: &Path) -> Result<Self, ArtifactError> {
        let model: Self = read_versioned(path)?;

        let width = model.coefficients.len();
        let declared = model
            .feature_names
            .as_ref()
            .map(Vec::len)
            .into_iter()
            .chain(model.n_features_in);
        for count in declared {
            if count != width {
                return Err(ArtifactError::Deserialize {
                    path: path.to_path_buf(),
                    message: format!(
                        "model declares {} features but has {} coefficients",
                        count, width
                    ),
                });
            }
        }

        Ok(model)
    }
}

impl Artifact for LinearModel {
    fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    fn n_features(&self) -> Option<usize> {
        Some(self.n_features_in.unwrap_or(self.coefficients.len()))
    }

    fn predict(&self, features: &[f64]) -> Result<f64, ArtifactError> {
        if features.len() != self.coefficients.len() {
            return Err(ArtifactError::Runtime(format!(
                "X has {} features, but LinearModel is expecting {} features as input",
                features.len(),
                self.coefficients.len()
            )));
        }

        Ok(self.intercept
            + self
                .coefficients
                .iter()
                .zip(features)
                .map(|(w, x)| w * x)
                .sum::<f64>())
    }
}

/// Standardizes each column as `(x - mean) / scale`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    pub format_version: u32,
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            mean,
            scale,
        }
    }

    /// Load and check a scaler file
    pub fn from_path(path: &Path) -> Result<Self, ArtifactError> {
        let scaler: Self = read_versioned(path)?;
        if scaler.mean.len() != scaler.scale.len() {
            return Err(ArtifactError::Deserialize {
                path: path.to_path_buf(),
                message: format!(
                    "mean has {} entries but scale has {}",
                    scaler.mean.len(),
                    scaler.scale.len()
                ),
            });
        }
        Ok(scaler)
    }
}

impl Scaler for StandardScaler {
    fn transform(&self, features: &[f64]) -> Result<Vec<f64>, ArtifactError> {
        if features.len() != self.mean.len() {
            return Err(ArtifactError::Runtime(format!(
                "X has {} features, but StandardScaler is expecting {} features as input",
                features.len(),
                self.mean.len()
            )));
        }

        // Zero-variance columns pass through centered only
        Ok(features
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (mean, scale))| {
                let scale = if *scale == 0.0 { 1.0 } else { *scale };
                (x - mean) / scale
            })
            .collect())
    }
}
