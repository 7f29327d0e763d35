//! Per-request feature values supplied by the form

use crate::error::PredictError;
use crate::features::FeatureSpec;
use std::collections::HashMap;

/// Feature name to value mapping for one prediction request.
///
/// Insertion order carries no meaning; [`InputVector::ordered`] lays values
/// out in the order of a [`FeatureSpec`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputVector {
    values: HashMap<String, f64>,
}

impl InputVector {
    pub fn new() -> Self {
        Self::default()
    }

    /// One entry per feature, each set to `default`
    pub fn with_defaults(spec: &FeatureSpec, default: f64) -> Self {
        spec.iter().map(|name| (name.to_string(), default)).collect()
    }

    /// Set a value, returning the previous one
    pub fn set(&mut self, name: impl Into<String>, value: f64) -> Option<f64> {
        self.values.insert(name.into(), value)
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values in `spec` order.
    ///
    /// Fails on the first name in `spec` without a value, then on any name `spec`
    /// does not contain (reported in sorted order so the error is stable).
    pub fn ordered(&self, spec: &FeatureSpec) -> Result<Vec<f64>, PredictError> {
        let row = spec
            .iter()
            .map(|name| {
                self.get(name)
                    .ok_or_else(|| PredictError::MissingFeature(name.to_string()))
            })
            .collect::<Result<Vec<f64>, PredictError>>()?;

        let mut unexpected: Vec<&String> = self
            .values
            .keys()
            .filter(|name| !spec.contains(name))
            .collect();
        unexpected.sort();
        if let Some(name) = unexpected.first() {
            return Err(PredictError::UnexpectedFeature(name.to_string()));
        }

        Ok(row)
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for InputVector {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl From<HashMap<String, f64>> for InputVector {
    fn from(values: HashMap<String, f64>) -> Self {
        Self { values }
    }
}
