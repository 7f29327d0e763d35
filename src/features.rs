//! Feature contract resolution.
//!
//! Works out which named inputs a loaded model takes, and in which order.
//! The order is the column order used at training time, so every input row
//! handed to the model is assembled from the resolved spec.

use crate::models::Artifact;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, warn};

/// Feature names used when the model exposes neither names nor a count.
///
/// These are the inputs of the original solar power form.
pub const DEFAULT_FEATURE_NAMES: [&str; 6] = [
    "Temperature",
    "Humidity",
    "WindSpeed",
    "Pressure",
    "SolarRadiation",
    "CloudCover",
];

/// How a feature spec was determined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Provenance {
    /// Names recorded in the model itself
    Explicit,
    /// Positional names generated from the model's feature count
    Synthesized,
    /// Fixed fallback list; the model said nothing about its inputs
    Defaulted,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::Explicit => write!(f, "EXPLICIT"),
            Provenance::Synthesized => write!(f, "SYNTHESIZED"),
            Provenance::Defaulted => write!(f, "DEFAULTED"),
        }
    }
}

/// Ordered feature names the model expects, with their provenance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureSpec {
    names: Vec<String>,
    provenance: Provenance,
}

impl FeatureSpec {
    pub fn new(names: Vec<String>, provenance: Provenance) -> Self {
        Self { names, provenance }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn provenance(&self) -> Provenance {
        self.provenance
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

/// Derive the feature spec of a loaded model.
///
/// Explicit names win, then a synthesized `feature_1..feature_N` list, then
/// [`DEFAULT_FEATURE_NAMES`]. An empty name list or a zero count counts as
/// not exposed.
pub fn resolve(artifact: &dyn Artifact) -> FeatureSpec {
    if let Some(names) = artifact.feature_names().filter(|names| !names.is_empty()) {
        let unique: HashSet<&str> = names.iter().map(String::as_str).collect();
        if unique.len() != names.len() {
            warn!(
                count = names.len(),
                unique = unique.len(),
                "Model feature names contain duplicates"
            );
        }
        debug!(count = names.len(), "Using feature names recorded in model");
        return FeatureSpec::new(names.to_vec(), Provenance::Explicit);
    }

    if let Some(count) = artifact.n_features().filter(|&count| count > 0) {
        debug!(count, "Model exposes only a feature count, synthesizing names");
        return FeatureSpec::new(synthesize_names(count), Provenance::Synthesized);
    }

    warn!(
        defaults = ?DEFAULT_FEATURE_NAMES,
        "Model exposes no feature names or count, falling back to default feature list"
    );
    FeatureSpec::new(
        DEFAULT_FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
        Provenance::Defaulted,
    )
}

/// Positional names `feature_1..feature_count`
pub fn synthesize_names(count: usize) -> Vec<String> {
    (1..=count).map(|i| format!("feature_{}", i)).collect()
}

/// Human readable form label for a feature name.
///
/// Underscores become spaces and each word is title-cased, so `wind_speed`
/// reads `Wind Speed` and `feature_3` reads `Feature 3`.
pub fn display_label(name: &str) -> String {
    let mut label = String::with_capacity(name.len());
    let mut prev_alphabetic = false;

    for c in name.replace('_', " ").chars() {
        if c.is_alphabetic() {
            if prev_alphabetic {
                label.extend(c.to_lowercase());
            } else {
                label.extend(c.to_uppercase());
            }
            prev_alphabetic = true;
        } else {
            label.push(c);
            prev_alphabetic = false;
        }
    }

    label
}
