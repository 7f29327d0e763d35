//! ONNX Runtime backed model and scaler

use crate::error::ArtifactError;
use crate::models::{Artifact, Scaler};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::{Tensor, ValueType};
use std::path::Path;
use std::sync::{Mutex, Once};
use tracing::{debug, info, warn};

/// Custom metadata key holding the training-time column names
pub const FEATURE_NAMES_KEY: &str = "feature_names";

static RUNTIME_INIT: Once = Once::new();

fn init_runtime() {
    RUNTIME_INIT.call_once(|| {
        match ort::init().with_name("solar-predictor").commit() {
            Ok(_) => info!("ONNX Runtime initialized"),
            Err(e) => warn!(error = %e, "ONNX Runtime environment setup failed"),
        }
    });
}

fn runtime_error(e: impl std::fmt::Display) -> ArtifactError {
    ArtifactError::Runtime(e.to_string())
}

fn build_session(path: &Path, threads: usize) -> anyhow::Result<Session> {
    let session = Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .with_intra_threads(threads)?
        .commit_from_file(path)?;
    Ok(session)
}

/// Parse the `feature_names` metadata value: a JSON array or a comma list
pub fn parse_feature_names(raw: &str) -> Vec<String> {
    let raw = raw.trim();
    if raw.starts_with('[') {
        if let Ok(names) = serde_json::from_str::<Vec<String>>(raw) {
            return names;
        }
    }
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// A loaded graph taking one `[1, N]` float row
struct OnnxGraph {
    /// Session::run needs exclusive access
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
    /// Static width of the input row, when the graph declares one
    width: Option<usize>,
}

impl OnnxGraph {
    fn load(path: &Path, threads: usize) -> Result<Self, ArtifactError> {
        if !path.exists() {
            return Err(ArtifactError::NotFound {
                path: path.to_path_buf(),
            });
        }
        init_runtime();

        let session = build_session(path, threads).map_err(|e| ArtifactError::Deserialize {
            path: path.to_path_buf(),
            message: format!("{:#}", e),
        })?;

        let input = session
            .inputs
            .first()
            .ok_or_else(|| ArtifactError::Deserialize {
                path: path.to_path_buf(),
                message: "graph has no inputs".to_string(),
            })?;
        let input_name = input.name.clone();
        let width = match &input.input_type {
            ValueType::Tensor { shape, .. } => shape
                .last()
                .copied()
                .filter(|&dim| dim > 0)
                .map(|dim| dim as usize),
            _ => None,
        };

        let output_name = session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .ok_or_else(|| ArtifactError::Deserialize {
                path: path.to_path_buf(),
                message: "graph has no outputs".to_string(),
            })?;

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            output_name,
            width,
        })
    }

    fn run(&self, features: &[f64]) -> Result<Vec<f64>, ArtifactError> {
        let row: Vec<f32> = features.iter().map(|&x| x as f32).collect();
        let shape = vec![1_i64, row.len() as i64];
        let input_tensor = Tensor::from_array((shape, row)).map_err(runtime_error)?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| ArtifactError::Runtime(format!("Lock error: {}", e)))?;

        let outputs = session
            .run(ort::inputs![&self.input_name => input_tensor])
            .map_err(runtime_error)?;

        let output = outputs.get(self.output_name.as_str()).ok_or_else(|| {
            ArtifactError::Runtime(format!("graph produced no '{}' output", self.output_name))
        })?;
        let (_, data) = output.try_extract_tensor::<f32>().map_err(runtime_error)?;

        Ok(data.iter().map(|&v| v as f64).collect())
    }
}

/// Regression model exported to ONNX
pub struct OnnxModel {
    graph: OnnxGraph,
    feature_names: Option<Vec<String>>,
}

impl OnnxModel {
    pub fn load(path: &Path, threads: usize) -> Result<Self, ArtifactError> {
        info!(path = %path.display(), threads, "Loading ONNX model");
        let graph = OnnxGraph::load(path, threads)?;

        let feature_names = {
            let session = graph
                .session
                .lock()
                .map_err(|e| ArtifactError::Runtime(format!("Lock error: {}", e)))?;
            session
                .metadata()
                .ok()
                .and_then(|metadata| metadata.custom(FEATURE_NAMES_KEY).ok().flatten())
                .map(|raw| parse_feature_names(&raw))
                .filter(|names| !names.is_empty())
        };

        info!(
            input = %graph.input_name,
            output = %graph.output_name,
            width = ?graph.width,
            named_features = feature_names.as_ref().map(Vec::len),
            "ONNX model loaded"
        );

        Ok(Self {
            graph,
            feature_names,
        })
    }
}

impl Artifact for OnnxModel {
    fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    fn n_features(&self) -> Option<usize> {
        self.graph.width
    }

    fn predict(&self, features: &[f64]) -> Result<f64, ArtifactError> {
        let values = self.graph.run(features)?;
        debug!(outputs = values.len(), "ONNX model run complete");
        values
            .first()
            .copied()
            .ok_or_else(|| ArtifactError::Runtime("model produced an empty output".to_string()))
    }
}

/// Feature scaler exported to ONNX, mapping `[1, N]` to `[1, N]`
pub struct OnnxScaler {
    graph: OnnxGraph,
}

impl OnnxScaler {
    pub fn load(path: &Path, threads: usize) -> Result<Self, ArtifactError> {
        info!(path = %path.display(), "Loading ONNX scaler");
        Ok(Self {
            graph: OnnxGraph::load(path, threads)?,
        })
    }
}

impl Scaler for OnnxScaler {
    fn transform(&self, features: &[f64]) -> Result<Vec<f64>, ArtifactError> {
        self.graph.run(features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_feature_names_json() {
        assert_eq!(
            parse_feature_names(r#"["Temperature", "Humidity"]"#),
            vec!["Temperature", "Humidity"]
        );
    }

    #[test]
    fn test_parse_feature_names_comma_list() {
        assert_eq!(
            parse_feature_names(" irradiance, ambient_temp ,,module_temp "),
            vec!["irradiance", "ambient_temp", "module_temp"]
        );
        assert!(parse_feature_names("  ").is_empty());
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = OnnxModel::load(&dir.path().join("model.onnx"), 1)
            .err()
            .unwrap();
        assert_eq!(err.kind(), "not_found");
    }

    #[test]
    fn test_runtime_init_runs_once_without_panicking() {
        init_runtime();
        init_runtime();
        assert!(RUNTIME_INIT.is_completed());
    }
}
