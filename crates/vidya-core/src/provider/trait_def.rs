//! Provider traits -- the seams between the pipeline and model backends.
//!
//! All three traits are object-safe so the pipeline can hold them as
//! `Arc<dyn ...>` and tests can substitute scripted fakes.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use super::types::{AgentEvent, GenerateRequest, ProviderError, Session};

/// Lazily-produced events from one search-augmented agent run.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<AgentEvent, ProviderError>> + Send>>;

/// A reasoning model that turns a prompt into text.
#[async_trait]
pub trait ReasoningProvider: Send + Sync {
    /// Human-readable name, used in logs (e.g. "gemini:gemini-2.0-flash").
    fn name(&self) -> &str;

    /// Run one reasoning call and return the reply text.
    ///
    /// When `request.format` is [`super::ResponseFormat::Json`] the provider
    /// is asked to conform to the schema, but callers must still validate.
    async fn generate(&self, request: &GenerateRequest) -> Result<String, ProviderError>;
}

/// A reasoning agent with web-search capability.
pub trait SearchAgent: Send + Sync {
    fn name(&self) -> &str;

    /// Start an agent run for `message` within `session`.
    ///
    /// Nothing happens until the returned stream is polled. Errors may
    /// surface either as the first item or mid-stream.
    fn run(&self, session: &Session, message: &str) -> EventStream;
}

/// Creates the session handle shared by the search stage.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create_session(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: &str,
    ) -> Result<Session, ProviderError>;
}

// Compile-time assertion: the traits must be usable as trait objects.
const _: () = {
    fn _assert_object_safe(
        _: &dyn ReasoningProvider,
        _: &dyn SearchAgent,
        _: &dyn SessionStore,
    ) {
    }
};
