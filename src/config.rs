//! Configuration management for the solar power predictor

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub artifacts: ArtifactsConfig,
    #[serde(default)]
    pub form: FormConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Model and scaler artifact locations
#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactsConfig {
    /// Directory containing the artifact files
    #[serde(default = "default_root_dir")]
    pub root_dir: String,
    /// Model file name, relative to `root_dir`
    #[serde(default = "default_model_file")]
    pub model_file: String,
    /// Optional scaler file name, relative to `root_dir`
    #[serde(default = "default_scaler_file")]
    pub scaler_file: Option<String>,
    /// Number of threads for ONNX inference (default: 1)
    #[serde(default = "default_onnx_threads")]
    pub onnx_threads: usize,
}

fn default_root_dir() -> String {
    ".".to_string()
}

fn default_model_file() -> String {
    "random_forest_model.onnx".to_string()
}

fn default_scaler_file() -> Option<String> {
    Some("scaler.onnx".to_string())
}

fn default_onnx_threads() -> usize {
    1
}

impl ArtifactsConfig {
    /// Full path of the model artifact
    pub fn model_path(&self) -> PathBuf {
        Path::new(&self.root_dir).join(&self.model_file)
    }

    /// Full path of the scaler artifact, if one is configured
    pub fn scaler_path(&self) -> Option<PathBuf> {
        self.scaler_file
            .as_ref()
            .filter(|name| !name.trim().is_empty())
            .map(|name| Path::new(&self.root_dir).join(name))
    }
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            root_dir: default_root_dir(),
            model_file: default_model_file(),
            scaler_file: default_scaler_file(),
            onnx_threads: default_onnx_threads(),
        }
    }
}

/// Input form presentation settings
#[derive(Debug, Clone, Deserialize)]
pub struct FormConfig {
    /// Initial value of every input field
    #[serde(default)]
    pub default_value: f64,
    /// Decimal places shown for the prediction
    #[serde(default = "default_precision")]
    pub precision: usize,
    /// Unit appended to the prediction
    #[serde(default = "default_unit")]
    pub unit: String,
}

fn default_precision() -> usize {
    2
}

fn default_unit() -> String {
    "kW".to_string()
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            default_value: 0.0,
            precision: default_precision(),
            unit: default_unit(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (json, pretty)
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default file
    pub fn load() -> Result<Self> {
        Self::load_from_path(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from a specific path.
    ///
    /// A missing file yields the defaults. `SOLAR_`-prefixed environment
    /// variables override file values, e.g. `SOLAR_ARTIFACTS__ROOT_DIR`.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()).required(false))
            .add_source(
                Environment::with_prefix("SOLAR")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}
