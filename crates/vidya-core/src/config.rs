//! Runtime configuration for the pipeline and its providers.
//!
//! These are plain resolved values; reading files and environment variables
//! is the binary's job.

/// Gemini API connection settings.
#[derive(Clone)]
pub struct GeminiConfig {
    /// API key. `None` is allowed here: the first provider call fails with
    /// [`crate::provider::ProviderError::MissingApiKey`].
    pub api_key: Option<String>,
    /// Base endpoint URL, without a trailing slash.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl GeminiConfig {
    pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
    pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            timeout_secs: Self::DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self::new(None)
    }
}

// Never print the key.
impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Model used by each pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelConfig {
    pub planner: String,
    pub researcher: String,
    pub synthesizer: String,
}

impl ModelConfig {
    pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            planner: Self::DEFAULT_MODEL.to_string(),
            researcher: Self::DEFAULT_MODEL.to_string(),
            synthesizer: Self::DEFAULT_MODEL.to_string(),
        }
    }
}

/// Everything needed to build a [`crate::Pipeline`].
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub gemini: GeminiConfig,
    pub models: ModelConfig,
    /// Attempts for the final generation call, clamped to `1..=MAX_SYNTHESIS_ATTEMPTS`.
    pub synthesis_attempts: u32,
}

impl PipelineConfig {
    pub const MAX_SYNTHESIS_ATTEMPTS: u32 = crate::plan::MAX_SYNTHESIS_ATTEMPTS;

    pub fn new(gemini: GeminiConfig) -> Self {
        Self {
            gemini,
            models: ModelConfig::default(),
            synthesis_attempts: 1,
        }
    }

    /// The configured attempt count, bounded.
    pub fn effective_synthesis_attempts(&self) -> u32 {
        self.synthesis_attempts.clamp(1, Self::MAX_SYNTHESIS_ATTEMPTS)
    }
}
