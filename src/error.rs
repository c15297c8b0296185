use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("API request failed: {status}")]
    Api { status: u16 },

    #[error("Network error: {0}")]
    Transport(String),

    #[error("Malformed response: {0}")]
    Parse(String),

    #[error("Invalid state transition: {current} -> {requested}")]
    InvalidTransition { current: String, requested: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Clone for Error {
    fn clone(&self) -> Self {
        match self {
            Self::Config(s) => Self::Config(s.clone()),
            Self::Api { status } => Self::Api { status: *status },
            Self::Transport(s) => Self::Transport(s.clone()),
            Self::Parse(s) => Self::Parse(s.clone()),
            Self::InvalidTransition { current, requested } => Self::InvalidTransition {
                current: current.clone(),
                requested: requested.clone(),
            },
            Self::Internal(s) => Self::Internal(s.clone()),
            // Wrapped foreign errors are not Clone, keep their message
            Self::Serialization(e) => Self::Internal(format!("Serialization error: {}", e)),
            Self::Yaml(e) => Self::Internal(format!("YAML error: {}", e)),
            Self::Io(e) => Self::Internal(format!("IO error: {}", e)),
        }
    }
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether the failure came from the inference endpoint rather than local code.
    pub fn is_inference_failure(&self) -> bool {
        matches!(
            self,
            Self::Api { .. } | Self::Transport(_) | Self::Parse(_)
        )
    }
}
