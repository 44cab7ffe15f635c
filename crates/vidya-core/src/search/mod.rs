//! Agentic search stage.
//!
//! ```text
//! prompt --> QueryPlanner --queries--> ContentResearcher (x <= 3) --> SearchResult
//!                 |                           |
//!           ReasoningProvider            SearchAgent (streamed events)
//! ```

pub mod orchestrator;
pub mod planner;
pub mod researcher;
pub mod session;
pub mod types;

pub use orchestrator::{MAX_QUERIES, SearchError, SearchOrchestrator};
pub use planner::{QueryPlan, QueryPlanner, fallback_queries, parse_planner_reply};
pub use researcher::{ContentResearcher, reduce_events};
pub use session::SessionManager;
pub use types::{ExtractedContext, ResearchFinding, SearchResult, SearchStatus};
