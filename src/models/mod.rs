//! Model and scaler artifacts

pub mod inference;
pub mod linear;
pub mod loader;
#[cfg(feature = "onnx")]
pub mod onnx;

use crate::error::ArtifactError;

pub use inference::{validate_and_predict, Predictor};
pub use linear::{LinearModel, StandardScaler};
pub use loader::{ArtifactCache, ArtifactFormat, ArtifactLoader, LoadedArtifacts};

/// A trained regression model.
///
/// Feature introspection is optional: a model may expose its training-time
/// column names, only its input width, or neither.
pub trait Artifact: Send + Sync {
    /// Ordered feature names recorded at training time
    fn feature_names(&self) -> Option<&[String]> {
        None
    }

    /// Number of input features the model expects
    fn n_features(&self) -> Option<usize> {
        None
    }

    /// Predict a single output from one ordered feature row
    fn predict(&self, features: &[f64]) -> Result<f64, ArtifactError>;
}

/// A pre-processing transform applied to a feature row before prediction.
pub trait Scaler: Send + Sync {
    fn transform(&self, features: &[f64]) -> Result<Vec<f64>, ArtifactError>;
}
