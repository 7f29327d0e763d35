//! Error types for artifact loading and prediction.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading an artifact or running it.
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// No file at the given path.
    #[error("artifact not found: {}", path.display())]
    NotFound {
        /// Path that was looked up
        path: PathBuf,
    },

    /// The file exists but could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// Path being read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The file content is not a valid artifact.
    #[error("failed to deserialize {}: {message}", path.display())]
    Deserialize {
        /// Path being decoded
        path: PathBuf,
        /// Decoder message
        message: String,
    },

    /// The artifact was written by an incompatible format version.
    #[error("unsupported format version {found} in {} (expected {expected})", path.display())]
    VersionMismatch {
        /// Path being decoded
        path: PathBuf,
        /// Version found in the file
        found: u32,
        /// Version this build reads
        expected: u32,
    },

    /// The file extension does not map to a known artifact format.
    #[error("unsupported artifact format: {}", path.display())]
    UnsupportedFormat {
        /// Offending path
        path: PathBuf,
    },

    /// The model or scaler failed while running.
    #[error("{0}")]
    Runtime(String),
}

impl ArtifactError {
    /// Short machine-readable tag for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            ArtifactError::NotFound { .. } => "not_found",
            ArtifactError::Io { .. } => "io",
            ArtifactError::Deserialize { .. } => "deserialize",
            ArtifactError::VersionMismatch { .. } => "version_mismatch",
            ArtifactError::UnsupportedFormat { .. } => "unsupported_format",
            ArtifactError::Runtime(_) => "runtime",
        }
    }
}

/// Per-request prediction failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictError {
    /// The model failed to load, so no prediction can be made.
    #[error("model unavailable: {reason}")]
    ModelUnavailable {
        /// Load failure reported at startup
        reason: String,
    },

    /// A required feature has no value in the input.
    #[error("missing feature: {0}")]
    MissingFeature(String),

    /// The input carries a value for a feature the model does not take.
    #[error("unexpected feature: {0}")]
    UnexpectedFeature(String),

    /// Input length differs from the model's declared feature count.
    #[error("shape mismatch: model expects {expected} features, got {actual}")]
    ShapeMismatch {
        /// Count declared by the model
        expected: usize,
        /// Length of the assembled input vector
        actual: usize,
    },

    /// The model's own predict call failed.
    #[error("prediction failed: {0}")]
    PredictionFailure(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_mismatch_message() {
        let err = PredictError::ShapeMismatch {
            expected: 6,
            actual: 5,
        };
        assert_eq!(
            err.to_string(),
            "shape mismatch: model expects 6 features, got 5"
        );
    }

    #[test]
    fn test_artifact_error_kind() {
        let err = ArtifactError::VersionMismatch {
            path: PathBuf::from("model.json"),
            found: 3,
            expected: 1,
        };
        assert_eq!(err.kind(), "version_mismatch");
        assert!(err.to_string().contains("model.json"));
    }
}
