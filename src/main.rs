use anyhow::Result;
use ask_ollama::{
    config,
    controller::Controller,
    inference::OllamaClient,
    view::{self, TerminalSurface},
};
use std::sync::Arc;
use tracing::info;

/// Validates that a log level string is valid
fn validate_log_level(level: &str) -> Result<()> {
    level
        .parse::<tracing_subscriber::filter::LevelFilter>()
        .map_err(|_| {
            anyhow::anyhow!(
                "Invalid log level: '{}'. Valid levels: error, warn, info, debug, trace",
                level
            )
        })?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (before logging setup)
    let config = match config::load().await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // RUST_LOG, when set, overrides the configured level
    let log_level = config.logs.level.clone();
    if let Err(e) = validate_log_level(&log_level) {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    // Logs go to stderr, stdout belongs to the view
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .or_else(|_| tracing_subscriber::EnvFilter::try_new(&log_level))?,
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    info!("Starting ask-ollama with log level: {}", log_level);

    let client = OllamaClient::new(&config.inference)?;
    info!(
        "Inference endpoint: {} (model {})",
        client.url(),
        client.model()
    );

    let controller = Controller::mount(
        Arc::new(client),
        Arc::new(TerminalSurface),
        &config.controller,
    );

    view::run(controller, &config.view).await?;

    info!("Bye");
    Ok(())
}
