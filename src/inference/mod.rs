mod client;
mod types;

pub use client::{InferenceClient, OllamaClient};
pub use types::{GenerateRequest, GenerateResponse};
