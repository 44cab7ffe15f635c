//! Plan synthesis stage: the lesson-plan document, the enriched prompt, and
//! the schema-constrained generation call.

pub mod document;
pub mod prompt;
pub mod synthesize;

pub use document::{
    Assessment, AssessmentKind, CourseInfo, PlanDocument, PlanValidationError, TermInfo,
    TermPlan, Topic, TopicKind, WeekSchedule, response_schema,
};
pub use prompt::build_enriched_prompt;
pub use synthesize::{
    MAX_SYNTHESIS_ATTEMPTS, PlanMetadata, PlanResponse, PlanSynthesizer, SynthesisError,
};
