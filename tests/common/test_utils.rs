use ask_ollama::{
    config::{BusyPolicy, ControllerConfig, InferenceConfig},
    controller::{Controller, InputSurface, NoopSurface},
    inference::{InferenceClient, OllamaClient},
};
use std::sync::Arc;
use wiremock::MockServer;

/// Inference config pointed at a wiremock server
pub fn create_test_inference_config(server: &MockServer) -> InferenceConfig {
    InferenceConfig {
        base_url: Some(server.uri()),
        ..Default::default()
    }
}

pub fn create_test_ollama_client(server: &MockServer) -> OllamaClient {
    OllamaClient::new(&create_test_inference_config(server)).expect("valid test config")
}

/// Mount a controller with a no-op input surface
pub fn mount_controller(client: Arc<dyn InferenceClient>, policy: BusyPolicy) -> Controller {
    mount_controller_with_surface(client, Arc::new(NoopSurface), policy)
}

pub fn mount_controller_with_surface(
    client: Arc<dyn InferenceClient>,
    surface: Arc<dyn InputSurface>,
    policy: BusyPolicy,
) -> Controller {
    Controller::mount(
        client,
        surface,
        &ControllerConfig {
            busy_policy: policy,
        },
    )
}

/// An address nothing listens on
pub async fn unused_local_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{}", addr)
}

/// Sample configuration YAML for testing
pub const SAMPLE_CONFIG_YAML: &str = r#"
inference:
  endpoint: lan
  lan_host: "192.168.1.20"
  port: 11500
  model: "qwen2:7b"
  timeout_secs: 30

controller:
  busy_policy: supersede

view:
  placeholder: "Ask me anything"

logs:
  level: "debug"
"#;

/// Invalid configuration YAML for testing error cases
pub const INVALID_CONFIG_YAML: &str = r#"
inference:
  endpoint: "satellite"
  port: "not-a-number"
"#;
