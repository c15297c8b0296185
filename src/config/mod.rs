mod types;

pub use types::*;

use crate::Result;
use std::{env, path::Path};
use tracing::{debug, info};

/// Loads the configuration from `CONFIG_PATH` (default `config.yaml`) and
/// applies the `OLLAMA_BASE_URL` / `OLLAMA_MODEL` environment overrides.
pub async fn load() -> Result<Config> {
    let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string());

    let mut config = load_from(&config_path).await?;
    apply_overrides(
        &mut config,
        env::var("OLLAMA_BASE_URL").ok(),
        env::var("OLLAMA_MODEL").ok(),
    );
    config.validate()?;

    Ok(config)
}

/// Reads a YAML config file. A missing file yields the defaults.
pub async fn load_from(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    debug!("Loading configuration from: {}", path.display());

    if !tokio::fs::try_exists(path).await? {
        info!(
            "No configuration file at {}, using defaults",
            path.display()
        );
        return Ok(Config::default());
    }

    let config_str = tokio::fs::read_to_string(path).await?;
    let config: Config = serde_yaml::from_str(&config_str)?;

    Ok(config)
}

/// Overrides resolved after the file, so one config can serve both an
/// emulator and a real device on the LAN.
pub fn apply_overrides(config: &mut Config, base_url: Option<String>, model: Option<String>) {
    if let Some(url) = base_url.filter(|u| !u.trim().is_empty()) {
        debug!("Overriding inference base URL: {}", url);
        config.inference.base_url = Some(url);
    }
    if let Some(model) = model.filter(|m| !m.trim().is_empty()) {
        debug!("Overriding inference model: {}", model);
        config.inference.model = model;
    }
}
