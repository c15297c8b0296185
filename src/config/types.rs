use serde::{Deserialize, Serialize};

use crate::{Error, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub inference: InferenceConfig,
    #[serde(default)]
    pub controller: ControllerConfig,
    #[serde(default)]
    pub view: ViewConfig,
    #[serde(default)]
    pub logs: LogsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    #[serde(default)]
    pub endpoint: EndpointProfile,
    /// Host used when `endpoint` is `lan`.
    #[serde(default)]
    pub lan_host: Option<String>,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_path")]
    pub path: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Full base URL, e.g. `http://10.0.0.5:11434`. Wins over endpoint and port.
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Where the inference server lives relative to this client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointProfile {
    #[default]
    Loopback,
    /// Android emulator alias for the host machine's loopback.
    Emulator,
    Lan,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ControllerConfig {
    #[serde(default)]
    pub busy_policy: BusyPolicy,
}

/// What `submit` does while another request is in flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusyPolicy {
    #[default]
    Reject,
    Supersede,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewConfig {
    #[serde(default = "default_placeholder")]
    pub placeholder: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogsConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            endpoint: EndpointProfile::default(),
            lan_host: None,
            port: default_port(),
            path: default_path(),
            model: default_model(),
            base_url: None,
            timeout_secs: None,
        }
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            placeholder: default_placeholder(),
        }
    }
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl EndpointProfile {
    pub fn host<'a>(&self, lan_host: Option<&'a str>) -> Result<&'a str> {
        match self {
            Self::Loopback => Ok("127.0.0.1"),
            Self::Emulator => Ok("10.0.2.2"),
            Self::Lan => lan_host
                .filter(|h| !h.trim().is_empty())
                .ok_or_else(|| Error::config("endpoint 'lan' requires inference.lan_host")),
        }
    }
}

impl InferenceConfig {
    pub fn base_url(&self) -> Result<String> {
        if let Some(ref url) = self.base_url {
            return Ok(url.trim_end_matches('/').to_string());
        }
        let host = self.endpoint.host(self.lan_host.as_deref())?;
        Ok(format!("http://{}:{}", host, self.port))
    }

    /// The URL the generate request is posted to.
    pub fn generate_url(&self) -> Result<String> {
        Ok(format!("{}{}", self.base_url()?, self.path))
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.inference.model.trim().is_empty() {
            return Err(Error::config("inference.model must not be empty"));
        }
        if !self.inference.path.starts_with('/') {
            return Err(Error::config(format!(
                "inference.path must start with '/': {}",
                self.inference.path
            )));
        }
        self.inference.base_url()?;
        Ok(())
    }
}

fn default_port() -> u16 {
    11434
}

fn default_path() -> String {
    "/api/generate".to_string()
}

fn default_model() -> String {
    "llama3:8b".to_string()
}

fn default_placeholder() -> String {
    "今天想吃什么？".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}
