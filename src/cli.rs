//! Terminal front-end.
//!
//! Stands in for the interactive form: lists the resolved features, collects
//! one value per feature (from flags or prompts) and prints the prediction.

use crate::config::{AppConfig, FormConfig, DEFAULT_CONFIG_PATH};
use crate::features::display_label;
use crate::models::Predictor;
use crate::types::input::InputVector;
use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use serde_json::json;
use std::io::{BufRead, Write};
use std::path::PathBuf;

/// Solar power generation predictor
///
/// Loads a trained regression model (and optional scaler), works out the
/// features it expects, and predicts the power output for given inputs.
#[derive(Parser, Debug)]
#[command(name = "solar-predictor")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file
    #[arg(long, short = 'c', default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Model artifact, overriding the configured one
    #[arg(long)]
    pub model: Option<PathBuf>,

    /// Scaler artifact, overriding the configured one
    #[arg(long, conflicts_with = "no_scaler")]
    pub scaler: Option<PathBuf>,

    /// Do not scale inputs even if a scaler is configured
    #[arg(long)]
    pub no_scaler: bool,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the loader report and the features the model expects
    Features,

    /// Predict from `--set name=value` assignments
    Predict(PredictArgs),

    /// Prompt for each feature value, then predict
    Interactive,
}

#[derive(Args, Debug, Clone)]
pub struct PredictArgs {
    /// Feature value; features not set keep the form default
    #[arg(long = "set", value_name = "NAME=VALUE", value_parser = parse_assignment)]
    pub assignments: Vec<(String, f64)>,
}

/// Parse a `name=value` assignment
pub fn parse_assignment(raw: &str) -> Result<(String, f64), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", raw))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing feature name in '{}'", raw));
    }
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number", value.trim()))?;
    Ok((name.to_string(), value))
}

impl Cli {
    /// Model and scaler paths after applying command-line overrides
    pub fn artifact_paths(&self, config: &AppConfig) -> (PathBuf, Option<PathBuf>) {
        let model_path = self
            .model
            .clone()
            .unwrap_or_else(|| config.artifacts.model_path());
        let scaler_path = if self.no_scaler {
            None
        } else {
            self.scaler
                .clone()
                .or_else(|| config.artifacts.scaler_path())
        };
        (model_path, scaler_path)
    }
}

/// Print the loader report and feature list. Returns false without a model.
pub fn show_features<W: Write>(predictor: &Predictor, json: bool, out: &mut W) -> Result<bool> {
    if json {
        let report = json!({
            "ready": predictor.is_ready(),
            "scaler": predictor.has_scaler(),
            "features": predictor.features(),
            "diagnostic": predictor.diagnostic(),
        });
        writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
        return Ok(predictor.is_ready());
    }

    write!(out, "{}", predictor.diagnostic())?;
    let Some(spec) = predictor.features() else {
        writeln!(out, "Model unavailable, no features to show")?;
        return Ok(false);
    };

    writeln!(out, "Input features ({}, {}):", spec.len(), spec.provenance())?;
    for (i, name) in spec.iter().enumerate() {
        writeln!(out, "  {:>2}. {} [{}]", i + 1, display_label(name), name)?;
    }
    Ok(true)
}

/// Predict from form defaults overridden by `assignments`
pub fn predict_with<W: Write>(
    predictor: &Predictor,
    form: &FormConfig,
    assignments: &[(String, f64)],
    json: bool,
    out: &mut W,
) -> Result<bool> {
    let mut input = predictor
        .default_input(form.default_value)
        .unwrap_or_default();
    for (name, value) in assignments {
        input.set(name.clone(), *value);
    }
    report(predictor, form, &input, json, out)
}

/// Prompt for each feature on `input`; an empty line keeps the default
pub fn interactive<R: BufRead, W: Write>(
    predictor: &Predictor,
    form: &FormConfig,
    mut reader: R,
    out: &mut W,
) -> Result<bool> {
    let Some(spec) = predictor.features() else {
        return report(predictor, form, &InputVector::new(), false, out);
    };

    writeln!(out, "Enter Input Features")?;
    let mut input = InputVector::with_defaults(spec, form.default_value);
    let mut line = String::new();

    'features: for name in spec.iter() {
        loop {
            write!(
                out,
                "{} [{:.3}]: ",
                display_label(name),
                form.default_value
            )?;
            out.flush()?;

            line.clear();
            if reader.read_line(&mut line)? == 0 {
                // End of input: the remaining features keep their defaults
                writeln!(out)?;
                break 'features;
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                break;
            }
            match trimmed.parse::<f64>() {
                Ok(value) => {
                    input.set(name, value);
                    break;
                }
                Err(_) => writeln!(out, "'{}' is not a number, try again", trimmed)?,
            }
        }
    }

    report(predictor, form, &input, false, out)
}

fn report<W: Write>(
    predictor: &Predictor,
    form: &FormConfig,
    input: &InputVector,
    json: bool,
    out: &mut W,
) -> Result<bool> {
    let result = predictor.predict(input);

    if json {
        let value = match &result {
            Ok(prediction) => serde_json::to_value(prediction)?,
            Err(e) => json!({ "error": e.to_string() }),
        };
        writeln!(out, "{}", serde_json::to_string_pretty(&value)?)?;
        return Ok(result.is_ok());
    }

    match &result {
        Ok(prediction) => {
            writeln!(out, "{}", prediction.render(form.precision, &form.unit))?;
            for warning in &prediction.warnings {
                writeln!(out, "Warning: {}", warning)?;
            }
        }
        Err(e) => writeln!(out, "Prediction failed: {}", e)?,
    }
    Ok(result.is_ok())
}
