//! Solar Power Predictor - Main Entry Point
//!
//! Loads the configured model and scaler once, then serves a single
//! features/predict/interactive command from the terminal.

use anyhow::{Context, Result};
use clap::Parser;
use solar_predictor::{
    cli::{interactive, predict_with, show_features, Cli, Commands},
    config::{AppConfig, LoggingConfig},
    models::{ArtifactCache, ArtifactLoader, Predictor},
};
use std::io;
use std::process::ExitCode;
use tracing::info;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Load configuration
    let config = AppConfig::load_from_path(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;

    init_logging(&config.logging)?;
    info!(config = %cli.config.display(), "Configuration loaded");

    let cache = ArtifactCache::new(ArtifactLoader::with_threads(config.artifacts.onnx_threads));
    let (model_path, scaler_path) = cli.artifact_paths(&config);
    info!(
        model = %model_path.display(),
        scaler = ?scaler_path,
        "Loading artifacts"
    );
    let predictor = Predictor::new(cache.get_or_load(&model_path, scaler_path.as_deref()));

    let stdout = io::stdout();
    let mut out = stdout.lock();

    let ok = match &cli.command {
        Commands::Features => show_features(&predictor, cli.json, &mut out)?,
        Commands::Predict(args) => {
            predict_with(&predictor, &config.form, &args.assignments, cli.json, &mut out)?
        }
        Commands::Interactive => {
            interactive(&predictor, &config.form, io::stdin().lock(), &mut out)?
        }
    };

    Ok(if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Initialize tracing; logs go to stderr so stdout carries only the form
fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(format!("solar_predictor={}", logging.level).parse()?);

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);

    match logging.format.as_str() {
        "json" => subscriber.json().init(),
        _ => subscriber.init(),
    }
    Ok(())
}
