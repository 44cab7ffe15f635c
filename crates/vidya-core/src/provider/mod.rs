//! Provider interfaces for the models the pipeline talks to.
//!
//! This module defines the [`ReasoningProvider`], [`SearchAgent`] and
//! [`SessionStore`] traits, the request/event types that cross them, and the
//! Gemini-backed implementations used in production.
//!
//! # Architecture
//!
//! ```text
//! QueryPlanner ----generate(req)----> &dyn ReasoningProvider
//!                                          (GeminiClient)
//! ContentResearcher --run(session, msg)--> &dyn SearchAgent
//!                                          (GeminiSearchAgent)
//!                         |
//!                         v
//!                  Stream<Result<AgentEvent>>
//!
//! PlanSynthesizer --generate(req + schema)--> &dyn ReasoningProvider
//!
//! SessionManager --create_session(...)--> &dyn SessionStore
//!                                          (InMemorySessionStore)
//! ```

pub mod cancel;
pub mod gemini;
pub mod session;
pub mod trait_def;
pub mod types;

pub use cancel::cancellable;
pub use gemini::{GeminiClient, GeminiSearchAgent};
pub use session::InMemorySessionStore;
pub use trait_def::{EventStream, ReasoningProvider, SearchAgent, SessionStore};
pub use types::{AgentEvent, GenerateRequest, ProviderError, ResponseFormat, Session};
