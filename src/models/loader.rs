//! Artifact loader and process-wide artifact cache

use crate::error::ArtifactError;
use crate::models::linear::{LinearModel, StandardScaler};
use crate::models::{Artifact, Scaler};
use crate::types::diagnostic::Diagnostic;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::{info, warn};

/// On-disk artifact format, chosen by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactFormat {
    /// ONNX graph run through ONNX Runtime
    Onnx,
    /// serde JSON linear model or standard scaler
    Json,
}

impl ArtifactFormat {
    pub fn from_path(path: &Path) -> Result<Self, ArtifactError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("onnx") => Ok(ArtifactFormat::Onnx),
            Some("json") => Ok(ArtifactFormat::Json),
            _ => Err(ArtifactError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }
}

/// Model, scaler and diagnostic produced by one load
pub struct LoadedArtifacts {
    pub model: Option<Arc<dyn Artifact>>,
    pub scaler: Option<Arc<dyn Scaler>>,
    pub diagnostic: Diagnostic,
}

impl LoadedArtifacts {
    /// Wrap already-constructed artifacts, e.g. test doubles
    pub fn from_parts(model: Arc<dyn Artifact>, scaler: Option<Arc<dyn Scaler>>) -> Self {
        let mut diagnostic = Diagnostic::new();
        diagnostic.info("loaded", "model supplied directly");
        Self {
            model: Some(model),
            scaler,
            diagnostic,
        }
    }
}

/// Loads model and scaler artifacts without ever failing the caller
#[derive(Debug, Clone)]
pub struct ArtifactLoader {
    /// Number of threads for ONNX inference
    onnx_threads: usize,
}

impl ArtifactLoader {
    /// Create a loader with default settings (1 thread)
    pub fn new() -> Self {
        Self::with_threads(1)
    }

    /// Create a loader with the given ONNX intra-op thread count
    pub fn with_threads(onnx_threads: usize) -> Self {
        Self {
            onnx_threads: onnx_threads.max(1),
        }
    }

    /// Load the model and, when present on disk, the scaler.
    ///
    /// Every failure is reported through the returned diagnostic: a model
    /// failure leaves `model` empty, a scaler failure leaves `scaler` empty
    /// and is only a warning.
    pub fn load(&self, model_path: &Path, scaler_path: Option<&Path>) -> LoadedArtifacts {
        let mut diagnostic = Diagnostic::new();

        if let Some(dir) = model_path.parent() {
            let dir = if dir.as_os_str().is_empty() {
                Path::new(".")
            } else {
                dir
            };
            diagnostic.record_storage(dir);
        }

        let model = match self.load_model(model_path) {
            Ok(model) => {
                diagnostic.info(
                    "loaded",
                    format!("model loaded from {}", model_path.display()),
                );
                Some(model)
            }
            Err(e) => {
                warn!(path = %model_path.display(), error = %e, "Failed to load model");
                diagnostic.error(e.kind(), format!("model failed to load: {}", e));
                None
            }
        };

        let scaler = match scaler_path {
            Some(path) if path.exists() => match self.load_scaler(path) {
                Ok(scaler) => {
                    diagnostic.info("loaded", format!("scaler loaded from {}", path.display()));
                    Some(scaler)
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Scaler exists but failed to load, continuing without scaling");
                    diagnostic.warn(
                        e.kind(),
                        format!("{} exists but failed to load: {}", path.display(), e),
                    );
                    None
                }
            },
            Some(path) => {
                info!(path = %path.display(), "No scaler file, inputs will not be scaled");
                diagnostic.info(
                    "no_scaler",
                    format!("no scaler at {}, inputs are not scaled", path.display()),
                );
                None
            }
            None => None,
        };

        LoadedArtifacts {
            model,
            scaler,
            diagnostic,
        }
    }

    /// Load a model artifact
    pub fn load_model(&self, path: &Path) -> Result<Arc<dyn Artifact>, ArtifactError> {
        info!(path = %path.display(), "Loading model");
        match ArtifactFormat::from_path(path)? {
            ArtifactFormat::Json => Ok(Arc::new(LinearModel::from_path(path)?)),
            ArtifactFormat::Onnx => self.load_onnx_model(path),
        }
    }

    /// Load a scaler artifact
    pub fn load_scaler(&self, path: &Path) -> Result<Arc<dyn Scaler>, ArtifactError> {
        info!(path = %path.display(), "Loading scaler");
        match ArtifactFormat::from_path(path)? {
            ArtifactFormat::Json => Ok(Arc::new(StandardScaler::from_path(path)?)),
            ArtifactFormat::Onnx => self.load_onnx_scaler(path),
        }
    }

    #[cfg(feature = "onnx")]
    fn load_onnx_model(&self, path: &Path) -> Result<Arc<dyn Artifact>, ArtifactError> {
        Ok(Arc::new(crate::models::onnx::OnnxModel::load(
            path,
            self.onnx_threads,
        )?))
    }

    #[cfg(feature = "onnx")]
    fn load_onnx_scaler(&self, path: &Path) -> Result<Arc<dyn Scaler>, ArtifactError> {
        Ok(Arc::new(crate::models::onnx::OnnxScaler::load(
            path,
            self.onnx_threads,
        )?))
    }

    #[cfg(not(feature = "onnx"))]
    fn load_onnx_model(&self, path: &Path) -> Result<Arc<dyn Artifact>, ArtifactError> {
        Err(ArtifactError::UnsupportedFormat {
            path: path.to_path_buf(),
        })
    }

    #[cfg(not(feature = "onnx"))]
    fn load_onnx_scaler(&self, path: &Path) -> Result<Arc<dyn Scaler>, ArtifactError> {
        Err(ArtifactError::UnsupportedFormat {
            path: path.to_path_buf(),
        })
    }
}

impl Default for ArtifactLoader {
    fn default() -> Self {
        Self::new()
    }
}

type CacheKey = (PathBuf, Option<PathBuf>);

/// Memoizes loads for the process lifetime, keyed on the artifact paths.
///
/// Constructed explicitly and passed to whoever needs it; there is no global
/// instance. Entries are never invalidated.
pub struct ArtifactCache {
    loader: ArtifactLoader,
    entries: RwLock<HashMap<CacheKey, Arc<LoadedArtifacts>>>,
}

impl ArtifactCache {
    pub fn new(loader: ArtifactLoader) -> Self {
        Self {
            loader,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Return the cached load for these paths, loading on first use
    pub fn get_or_load(&self, model_path: &Path, scaler_path: Option<&Path>) -> Arc<LoadedArtifacts> {
        let key: CacheKey = (model_path.to_path_buf(), scaler_path.map(Path::to_path_buf));

        {
            let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
            if let Some(loaded) = entries.get(&key) {
                return loaded.clone();
            }
        }

        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries
            .entry(key)
            .or_insert_with(|| Arc::new(self.loader.load(model_path, scaler_path)))
            .clone()
    }

    /// Seed the cache with artifacts built elsewhere
    pub fn insert(
        &self,
        model_path: &Path,
        scaler_path: Option<&Path>,
        loaded: LoadedArtifacts,
    ) -> Arc<LoadedArtifacts> {
        let key: CacheKey = (model_path.to_path_buf(), scaler_path.map(Path::to_path_buf));
        let loaded = Arc::new(loaded);
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key, loaded.clone());
        loaded
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ArtifactCache {
    fn default() -> Self {
        Self::new(ArtifactLoader::default())
    }
}
