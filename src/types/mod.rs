//! Type definitions shared by the loader, resolver and form

pub mod diagnostic;
pub mod input;
pub mod prediction;

pub use diagnostic::{Diagnostic, Severity};
pub use input::InputVector;
pub use prediction::{Prediction, PredictionResult};
