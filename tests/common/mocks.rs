use async_trait::async_trait;
use ask_ollama::{Error, Result, inference::InferenceClient};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Mock inference client for testing
#[derive(Debug)]
pub struct MockInferenceClient {
    pub responses: Arc<Mutex<Vec<Result<String>>>>,
    pub prompts: Arc<Mutex<Vec<String>>>,
    /// When set, every call waits for one notification before answering.
    pub gate: Option<Arc<Notify>>,
}

impl MockInferenceClient {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            prompts: Arc::new(Mutex::new(Vec::new())),
            gate: None,
        }
    }

    pub fn with_response(self, text: &str) -> Self {
        self.responses.lock().unwrap().push(Ok(text.to_string()));
        self
    }

    pub fn with_error(self, error: Error) -> Self {
        self.responses.lock().unwrap().push(Err(error));
        self
    }

    pub fn with_gate(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn get_prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

impl Default for MockInferenceClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InferenceClient for MockInferenceClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());

        if let Some(ref gate) = self.gate {
            gate.notified().await;
        }

        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Err(Error::internal("No more mock responses available"));
        }
        responses.remove(0)
    }
}

/// Client that panics mid-request
pub struct PanickingClient;

#[async_trait]
impl InferenceClient for PanickingClient {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        tokio::task::yield_now().await;
        panic!("inference backend exploded");
    }
}
