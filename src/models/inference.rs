//! Prediction path: input validation, scaling and model invocation

use crate::config::AppConfig;
use crate::error::PredictError;
use crate::features::{self, FeatureSpec};
use crate::models::loader::{ArtifactCache, LoadedArtifacts};
use crate::models::{Artifact, Scaler};
use crate::types::diagnostic::Diagnostic;
use crate::types::input::InputVector;
use crate::types::prediction::{Prediction, PredictionResult};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Validate `input` against `spec`, scale it if a scaler is present, and
/// predict.
///
/// The row is assembled in `spec` order. Missing or unexpected features and
/// a row width that disagrees with the model's declared count are rejected
/// before the model is called. A scaler failure does not fail the request:
/// the unscaled row is used and the prediction is marked degraded.
pub fn validate_and_predict(
    artifact: &dyn Artifact,
    scaler: Option<&dyn Scaler>,
    input: &InputVector,
    spec: &FeatureSpec,
) -> PredictionResult {
    let row = input.ordered(spec)?;

    let mut degradation = None;
    let row = match scaler {
        Some(scaler) => match scaler.transform(&row) {
            Ok(scaled) if scaled.len() == row.len() => scaled,
            Ok(scaled) => {
                degradation = Some(format!(
                    "scaler returned {} values for {} features, using unscaled input",
                    scaled.len(),
                    row.len()
                ));
                row
            }
            Err(e) => {
                degradation = Some(format!(
                    "scaler transform failed, using unscaled input: {}",
                    e
                ));
                row
            }
        },
        None => row,
    };

    if let Some(expected) = artifact.n_features() {
        if expected != row.len() {
            return Err(PredictError::ShapeMismatch {
                expected,
                actual: row.len(),
            });
        }
    }

    let value = artifact
        .predict(&row)
        .map_err(|e| PredictError::PredictionFailure(e.to_string()))?;

    let prediction = Prediction::new(value, spec.provenance());
    Ok(match degradation {
        Some(warning) => {
            warn!(request_id = %prediction.request_id, warning = %warning, "Prediction degraded");
            prediction.with_degradation(warning)
        }
        None => prediction,
    })
}

/// Loaded artifacts plus the feature spec resolved from them.
///
/// When the model failed to load, every prediction is refused with
/// [`PredictError::ModelUnavailable`].
pub struct Predictor {
    loaded: Arc<LoadedArtifacts>,
    features: Option<FeatureSpec>,
}

impl Predictor {
    /// Resolve the feature spec of an already loaded model
    pub fn new(loaded: Arc<LoadedArtifacts>) -> Self {
        let features = loaded.model.as_deref().map(|model| features::resolve(model));

        match &features {
            Some(spec) => info!(
                provenance = %spec.provenance(),
                count = spec.len(),
                scaler = loaded.scaler.is_some(),
                "Predictor ready"
            ),
            None => warn!("Predictor has no model, predictions are disabled"),
        }

        Self { loaded, features }
    }

    /// Load (or reuse) the configured artifacts through `cache`
    pub fn from_config(config: &AppConfig, cache: &ArtifactCache) -> Self {
        let model_path = config.artifacts.model_path();
        let scaler_path = config.artifacts.scaler_path();
        Self::new(cache.get_or_load(&model_path, scaler_path.as_deref()))
    }

    /// Whether a model is available
    pub fn is_ready(&self) -> bool {
        self.loaded.model.is_some()
    }

    /// Whether inputs will be scaled before prediction
    pub fn has_scaler(&self) -> bool {
        self.loaded.scaler.is_some()
    }

    /// Resolved feature spec, absent when no model loaded
    pub fn features(&self) -> Option<&FeatureSpec> {
        self.features.as_ref()
    }

    /// Loader report for display
    pub fn diagnostic(&self) -> &Diagnostic {
        &self.loaded.diagnostic
    }

    /// Form state with every feature set to `default`
    pub fn default_input(&self, default: f64) -> Option<InputVector> {
        self.features
            .as_ref()
            .map(|spec| InputVector::with_defaults(spec, default))
    }

    /// Run one prediction request
    pub fn predict(&self, input: &InputVector) -> PredictionResult {
        let (model, spec) = match (self.loaded.model.as_deref(), self.features.as_ref()) {
            (Some(model), Some(spec)) => (model, spec),
            _ => {
                let reason = self
                    .loaded
                    .diagnostic
                    .errors()
                    .first()
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "no model loaded".to_string());
                return Err(PredictError::ModelUnavailable { reason });
            }
        };

        let result = validate_and_predict(model, self.loaded.scaler.as_deref(), input, spec);
        match &result {
            Ok(prediction) => debug!(
                request_id = %prediction.request_id,
                value = prediction.value,
                degraded = prediction.degraded,
                "Prediction complete"
            ),
            Err(e) => warn!(error = %e, "Prediction rejected"),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ArtifactError;
    use crate::features::Provenance;
    use std::sync::Mutex;

    /// Records every row it is asked to predict on
    struct RecordingModel {
        names: Option<Vec<String>>,
        count: Option<usize>,
        output: Result<f64, String>,
        calls: Mutex<Vec<Vec<f64>>>,
    }

    impl RecordingModel {
        fn with_count(count: usize) -> Self {
            Self {
                names: None,
                count: Some(count),
                output: Ok(42.0),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn with_names(names: &[&str]) -> Self {
            Self {
                names: Some(names.iter().map(|s| s.to_string()).collect()),
                count: Some(names.len()),
                output: Ok(42.0),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<Vec<f64>> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Artifact for RecordingModel {
        fn feature_names(&self) -> Option<&[String]> {
            self.names.as_deref()
        }

        fn n_features(&self) -> Option<usize> {
            self.count
        }

        fn predict(&self, features: &[f64]) -> Result<f64, ArtifactError> {
            self.calls.lock().unwrap().push(features.to_vec());
            self.output.clone().map_err(ArtifactError::Runtime)
        }
    }

    struct FailingScaler;

    impl Scaler for FailingScaler {
        fn transform(&self, _features: &[f64]) -> Result<Vec<f64>, ArtifactError> {
            Err(ArtifactError::Runtime("scaler fitted on 4 features".to_string()))
        }
    }

    struct DoublingScaler;

    impl Scaler for DoublingScaler {
        fn transform(&self, features: &[f64]) -> Result<Vec<f64>, ArtifactError> {
            Ok(features.iter().map(|x| x * 2.0).collect())
        }
    }

    struct TruncatingScaler;

    impl Scaler for TruncatingScaler {
        fn transform(&self, features: &[f64]) -> Result<Vec<f64>, ArtifactError> {
            Ok(features[..1].to_vec())
        }
    }

    fn spec(names: &[&str], provenance: Provenance) -> FeatureSpec {
        FeatureSpec::new(names.iter().map(|s| s.to_string()).collect(), provenance)
    }

    #[test]
    fn test_row_follows_spec_order() {
        let model = RecordingModel::with_names(&["A", "B", "C"]);
        let spec = features::resolve(&model);
        let input: InputVector = [("C", 3.0), ("B", 2.0), ("A", 1.0)].into_iter().collect();

        let prediction = validate_and_predict(&model, None, &input, &spec).unwrap();
        assert_eq!(prediction.value, 42.0);
        assert_eq!(prediction.provenance, Provenance::Explicit);
        assert_eq!(model.calls(), vec![vec![1.0, 2.0, 3.0]]);
    }

    #[test]
    fn test_missing_feature_never_calls_predict() {
        let model = RecordingModel::with_names(&["A", "B", "C"]);
        let spec = features::resolve(&model);
        let input: InputVector = [("A", 1.0), ("C", 3.0)].into_iter().collect();

        let err = validate_and_predict(&model, None, &input, &spec).unwrap_err();
        assert_eq!(err, PredictError::MissingFeature("B".to_string()));
        assert!(model.calls().is_empty());
    }

    #[test]
    fn test_shape_mismatch_never_calls_predict() {
        let model = RecordingModel::with_count(6);
        let spec = spec(&["a", "b", "c", "d", "e"], Provenance::Explicit);
        let input = InputVector::with_defaults(&spec, 0.0);

        let err = validate_and_predict(&model, None, &input, &spec).unwrap_err();
        assert_eq!(
            err,
            PredictError::ShapeMismatch {
                expected: 6,
                actual: 5
            }
        );
        assert!(model.calls().is_empty());
    }

    #[test]
    fn test_failing_scaler_degrades() {
        let model = RecordingModel::with_names(&["A", "B"]);
        let spec = features::resolve(&model);
        let input: InputVector = [("A", 1.0), ("B", 2.0)].into_iter().collect();

        let scaler: &dyn Scaler = &FailingScaler;
        let prediction = validate_and_predict(&model, Some(scaler), &input, &spec).unwrap();
        assert!(prediction.degraded);
        assert_eq!(prediction.warnings.len(), 1);
        assert!(prediction.warnings[0].contains("scaler fitted on 4 features"));
        assert_eq!(model.calls(), vec![vec![1.0, 2.0]]);
    }

    #[test]
    fn test_scaler_applied_before_predict() {
        let model = RecordingModel::with_names(&["A", "B"]);
        let spec = features::resolve(&model);
        let input: InputVector = [("A", 1.0), ("B", 2.5)].into_iter().collect();

        let scaler: &dyn Scaler = &DoublingScaler;
        let prediction = validate_and_predict(&model, Some(scaler), &input, &spec).unwrap();
        assert!(!prediction.degraded);
        assert_eq!(model.calls(), vec![vec![2.0, 5.0]]);
    }

    #[test]
    fn test_scaler_width_change_degrades() {
        let model = RecordingModel::with_names(&["A", "B"]);
        let spec = features::resolve(&model);
        let input: InputVector = [("A", 1.0), ("B", 2.0)].into_iter().collect();

        let scaler: &dyn Scaler = &TruncatingScaler;
        let prediction = validate_and_predict(&model, Some(scaler), &input, &spec).unwrap();
        assert!(prediction.degraded);
        assert_eq!(model.calls(), vec![vec![1.0, 2.0]]);
    }

    #[test]
    fn test_predict_error_is_wrapped() {
        let mut model = RecordingModel::with_count(1);
        model.output = Err("tree ensemble is corrupt".to_string());
        let spec = features::resolve(&model);
        let input = InputVector::with_defaults(&spec, 0.0);

        let err = validate_and_predict(&model, None, &input, &spec).unwrap_err();
        assert_eq!(
            err,
            PredictError::PredictionFailure("tree ensemble is corrupt".to_string())
        );
    }

    #[test]
    fn test_synthesized_six_feature_scenario() {
        let model = Arc::new(RecordingModel::with_count(6));
        let predictor = Predictor::new(Arc::new(LoadedArtifacts::from_parts(model.clone(), None)));

        let spec = predictor.features().unwrap();
        assert_eq!(spec.provenance(), Provenance::Synthesized);
        assert_eq!(spec.names()[4], "feature_5");

        let mut input = predictor.default_input(0.0).unwrap();
        input.set("feature_5", 500.0);

        let prediction = predictor.predict(&input).unwrap();
        assert_eq!(prediction.value, 42.0);
        assert_eq!(prediction.provenance, Provenance::Synthesized);
        assert!(!prediction.degraded);
        assert_eq!(model.calls(), vec![vec![0.0, 0.0, 0.0, 0.0, 500.0, 0.0]]);
    }

    #[test]
    fn test_defaulted_model_without_count() {
        let model = Arc::new(RecordingModel {
            names: None,
            count: None,
            output: Ok(3.5),
            calls: Mutex::new(Vec::new()),
        });
        let predictor = Predictor::new(Arc::new(LoadedArtifacts::from_parts(model, None)));

        let input = predictor.default_input(1.0).unwrap();
        let prediction = predictor.predict(&input).unwrap();
        assert_eq!(prediction.provenance, Provenance::Defaulted);
        assert_eq!(prediction.value, 3.5);
    }

    #[test]
    fn test_predictor_without_model_refuses() {
        let mut diagnostic = Diagnostic::new();
        diagnostic.error("not_found", "model failed to load: artifact not found: model.onnx");
        let predictor = Predictor::new(Arc::new(LoadedArtifacts {
            model: None,
            scaler: None,
            diagnostic,
        }));

        assert!(!predictor.is_ready());
        assert!(predictor.features().is_none());
        match predictor.predict(&InputVector::new()) {
            Err(PredictError::ModelUnavailable { reason }) => {
                assert!(reason.contains("model.onnx"))
            }
            other => panic!("expected model unavailable, got {:?}", other),
        }
    }

    #[test]
    fn test_request_failure_keeps_predictor_usable() {
        let model = Arc::new(RecordingModel::with_names(&["A"]));
        let predictor = Predictor::new(Arc::new(LoadedArtifacts::from_parts(model, None)));

        assert!(predictor.predict(&InputVector::new()).is_err());
        let input: InputVector = [("A", 1.0)].into_iter().collect();
        assert!(predictor.predict(&input).is_ok());
    }
}
