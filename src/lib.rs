//! Solar Power Predictor Library
//!
//! Loads a trained regression model and an optional feature scaler, works
//! out which input features the model expects, and turns one value per
//! feature into a predicted power output.

pub mod cli;
pub mod config;
pub mod error;
pub mod features;
pub mod models;
pub mod types;

pub use config::AppConfig;
pub use error::{ArtifactError, PredictError};
pub use features::{resolve, FeatureSpec, Provenance};
pub use models::{validate_and_predict, Artifact, ArtifactCache, ArtifactLoader, Predictor, Scaler};
pub use types::{diagnostic::Diagnostic, input::InputVector, prediction::Prediction};
