use super::types::*;
use crate::{Error, Result, config::InferenceConfig};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::{debug, warn};

#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Runs one non-streamed generation and returns the model's text.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

pub struct OllamaClient {
    client: reqwest::Client,
    url: String,
    model: String,
}

impl OllamaClient {
    pub fn new(config: &InferenceConfig) -> Result<Self> {
        let url = config.generate_url()?;

        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        debug!("Inference client targeting {} with model {}", url, config.model);

        Ok(Self {
            client,
            url,
            model: config.model.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl InferenceClient for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = GenerateRequest::new(&self.model, prompt);

        debug!("Posting prompt ({} chars) to {}", prompt.chars().count(), self.url);

        let response = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .body(serde_json::to_vec(&request)?)
            .send()
            .await
            .map_err(|e| Error::transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!("Inference endpoint answered with status {}", status);
            return Err(Error::Api {
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::transport(format!("Failed to read response body: {}", e)))?;

        let parsed: GenerateResponse = serde_json::from_str(&body)
            .map_err(|e| Error::parse(format!("Unexpected generate response: {}", e)))?;

        debug!(
            model = ?parsed.model,
            done = ?parsed.done,
            total_duration_ns = ?parsed.total_duration,
            eval_count = ?parsed.eval_count,
            "Received generate response"
        );

        Ok(parsed.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EndpointProfile;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn create_test_config() -> InferenceConfig {
        InferenceConfig::default()
    }

    #[test]
    fn test_client_uses_loopback_by_default() {
        let client = OllamaClient::new(&create_test_config()).unwrap();

        assert_eq!(client.url(), "http://127.0.0.1:11434/api/generate");
        assert_eq!(client.model(), "llama3:8b");
    }

    #[test]
    fn test_client_with_emulator_endpoint() {
        let mut config = create_test_config();
        config.endpoint = EndpointProfile::Emulator;

        let client = OllamaClient::new(&config).unwrap();
        assert_eq!(client.url(), "http://10.0.2.2:11434/api/generate");
    }

    #[test]
    fn test_client_rejects_lan_without_host() {
        let mut config = create_test_config();
        config.endpoint = EndpointProfile::Lan;

        let result = OllamaClient::new(&config);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_generate_request_serialization() {
        let request = GenerateRequest::new("llama3:8b", "今天想吃什么？");

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "model": "llama3:8b",
                "prompt": "今天想吃什么？",
                "stream": false
            })
        );
    }

    #[test]
    fn test_generate_response_with_only_response_field() {
        let parsed: GenerateResponse = serde_json::from_str(r#"{"response":"试试火锅"}"#).unwrap();

        assert_eq!(parsed.response, "试试火锅");
        assert_eq!(parsed.done, None);
        assert_eq!(parsed.eval_count, None);
    }

    #[test]
    fn test_generate_response_missing_field_fails() {
        let parsed = serde_json::from_str::<GenerateResponse>(r#"{"done":true}"#);
        assert!(parsed.is_err());
    }
}
