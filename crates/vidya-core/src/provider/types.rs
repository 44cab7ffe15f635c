//! Types shared by the provider traits.

use serde::{Deserialize, Serialize};

/// Output format requested from a reasoning call.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseFormat {
    /// Free text; the provider chooses the shape.
    Text,
    /// JSON conforming to the given response schema.
    Json { schema: serde_json::Value },
}

/// A single reasoning call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    /// The user-turn prompt.
    pub prompt: String,
    /// Optional system instruction.
    pub system: Option<String>,
    pub format: ResponseFormat,
}

impl GenerateRequest {
    /// A free-text request with no system instruction.
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system: None,
            format: ResponseFormat::Text,
        }
    }

    /// A request constrained to the given JSON response schema.
    pub fn json(prompt: impl Into<String>, schema: serde_json::Value) -> Self {
        Self {
            prompt: prompt.into(),
            system: None,
            format: ResponseFormat::Json { schema },
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

/// One incremental event from a search-augmented agent run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentEvent {
    /// Text carried by this event, if any.
    pub text: Option<String>,
    /// Whether the agent marked this event as its final response.
    pub is_final: bool,
}

impl AgentEvent {
    pub fn partial(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            is_final: false,
        }
    }

    pub fn final_response(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            is_final: true,
        }
    }

    /// An event with no text (e.g. a tool invocation notice).
    pub fn empty() -> Self {
        Self {
            text: None,
            is_final: false,
        }
    }
}

/// Correlation handle grouping the provider calls of the search stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub app_name: String,
    pub user_id: String,
}

/// Errors raised by provider implementations.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("no API key configured for {provider}; set VIDYA_GEMINI_API_KEY or run `vidya init`")]
    MissingApiKey { provider: String },

    #[error("{provider} rejected the credentials (HTTP {status})")]
    Auth { provider: String, status: u16 },

    #[error("request to {provider} failed: {message}")]
    Request { provider: String, message: String },

    #[error("{provider} returned HTTP {status}: {body}")]
    Api {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("malformed response from {provider}: {message}")]
    ResponseParse { provider: String, message: String },

    #[error("{provider} returned no content")]
    EmptyResponse { provider: String },

    #[error("stream from {provider} failed: {message}")]
    Stream { provider: String, message: String },

    #[error("session store error: {0}")]
    Session(String),

    #[error("cancelled")]
    Cancelled,
}

impl ProviderError {
    /// Whether this error stems from missing or rejected credentials.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::MissingApiKey { .. } | Self::Auth { .. })
    }
}
