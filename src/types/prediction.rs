//! Prediction results returned to the form

use crate::error::PredictError;
use crate::features::Provenance;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Outcome of one prediction request
pub type PredictionResult = Result<Prediction, PredictError>;

/// A successful prediction
#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    /// Unique request identifier, also attached to log events
    pub request_id: Uuid,

    /// Predicted output
    pub value: f64,

    /// How the feature spec behind this prediction was determined
    pub provenance: Provenance,

    /// True when an expected transform step was skipped
    pub degraded: bool,

    /// Reasons for degradation
    pub warnings: Vec<String>,

    /// Prediction timestamp
    pub timestamp: DateTime<Utc>,
}

impl Prediction {
    pub fn new(value: f64, provenance: Provenance) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            value,
            provenance,
            degraded: false,
            warnings: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    /// Mark the prediction as computed without the scaling step
    pub fn with_degradation(mut self, warning: String) -> Self {
        self.degraded = true;
        self.warnings.push(warning);
        self
    }

    /// Render as `Estimated Solar Power Output: 12.35 kW`
    pub fn render(&self, precision: usize, unit: &str) -> String {
        format!(
            "Estimated Solar Power Output: {:.*} {}",
            precision, self.value, unit
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render() {
        let prediction = Prediction::new(12.345_6, Provenance::Explicit);
        assert_eq!(
            prediction.render(2, "kW"),
            "Estimated Solar Power Output: 12.35 kW"
        );
        assert!(!prediction.degraded);
    }

    #[test]
    fn test_degradation_flag() {
        let prediction = Prediction::new(1.0, Provenance::Synthesized)
            .with_degradation("scaler transform failed".to_string());
        assert!(prediction.degraded);
        assert_eq!(prediction.warnings, vec!["scaler transform failed"]);

        let json = serde_json::to_value(&prediction).unwrap();
        assert_eq!(json["degraded"], true);
        assert_eq!(json["provenance"], "SYNTHESIZED");
    }
}
