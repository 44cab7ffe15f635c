//! The lesson-plan document returned by the synthesis call.
//!
//! Decoding is strict: every required field must be present with the right
//! type. Minimum list lengths, which serde cannot express, are checked by
//! [`PlanDocument::validate`]. Week numbers and term ranges are free-form
//! and only logged when they look off.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanDocument {
    pub course_info: CourseInfo,
    pub schedule: Vec<WeekSchedule>,
    pub term_plan: TermPlan,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseInfo {
    pub title: String,
    /// Class level, e.g. "XII".
    #[serde(rename = "class", alias = "class_")]
    pub class_level: String,
    /// Subject with code, e.g. "Computer Science (083)".
    pub subject: String,
    pub academic_year: String,
    pub total_weeks: u32,
    pub periods_per_week: u32,
    pub practical_hours: u32,
    pub theory_hours: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekSchedule {
    pub week: u32,
    pub unit: String,
    pub title: String,
    pub topics: Vec<Topic>,
    pub learning_outcomes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cbse_assessment: Option<Assessment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub topic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtopics: Option<Vec<String>>,
    pub cbse_reference: String,
    pub periods: u32,
    #[serde(rename = "type")]
    pub kind: TopicKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equipment: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TopicKind {
    Theory,
    Practical,
    Revision,
    Assessment,
}

impl TopicKind {
    pub const ALL: [TopicKind; 4] = [
        TopicKind::Theory,
        TopicKind::Practical,
        TopicKind::Revision,
        TopicKind::Assessment,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Theory => "theory",
            Self::Practical => "practical",
            Self::Revision => "revision",
            Self::Assessment => "assessment",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assessment {
    #[serde(rename = "type")]
    pub kind: AssessmentKind,
    pub marks: u32,
    pub technique: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssessmentKind {
    #[serde(rename = "Formative Assessment")]
    Formative,
    #[serde(rename = "Summative Assessment")]
    Summative,
    #[serde(rename = "Term Exam")]
    TermExam,
    #[serde(rename = "Practical Exam")]
    PracticalExam,
    #[serde(rename = "Project")]
    Project,
}

impl AssessmentKind {
    pub const ALL: [AssessmentKind; 5] = [
        AssessmentKind::Formative,
        AssessmentKind::Summative,
        AssessmentKind::TermExam,
        AssessmentKind::PracticalExam,
        AssessmentKind::Project,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Formative => "Formative Assessment",
            Self::Summative => "Summative Assessment",
            Self::TermExam => "Term Exam",
            Self::PracticalExam => "Practical Exam",
            Self::Project => "Project",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermPlan {
    pub term1: TermInfo,
    pub term2: TermInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermInfo {
    /// Week range as the model wrote it, usually "1-18".
    pub weeks: String,
    pub units: Vec<String>,
    pub assessment: String,
}

impl TermInfo {
    /// Parse `weeks` as `start-end`, if it has that shape.
    pub fn week_range(&self) -> Option<(u32, u32)> {
        let (start, end) = self.weeks.split_once('-')?;
        let start = start.trim().parse().ok()?;
        let end = end.trim().parse().ok()?;
        Some((start, end))
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanValidationError {
    #[error("schedule must contain at least one week")]
    EmptySchedule,

    #[error("week {week} has no topics")]
    NoTopics { week: u32 },

    #[error("week {week} has no learning outcomes")]
    NoLearningOutcomes { week: u32 },

    #[error("{term} lists no units")]
    NoUnits { term: &'static str },
}

impl PlanDocument {
    /// Check the structural constraints typed decoding does not enforce.
    ///
    /// Only empty required lists are errors. Odd week numbers and term
    /// ranges are logged and accepted.
    pub fn validate(&self) -> Result<(), PlanValidationError> {
        if self.schedule.is_empty() {
            return Err(PlanValidationError::EmptySchedule);
        }
        for (index, week) in self.schedule.iter().enumerate() {
            if week.week == 0 {
                warn!(index, "schedule entry has week number 0");
            }
            if week.topics.is_empty() {
                return Err(PlanValidationError::NoTopics { week: week.week });
            }
            if week.learning_outcomes.is_empty() {
                return Err(PlanValidationError::NoLearningOutcomes { week: week.week });
            }
        }
        for (term, info) in [
            ("term1", &self.term_plan.term1),
            ("term2", &self.term_plan.term2),
        ] {
            if info.units.is_empty() {
                return Err(PlanValidationError::NoUnits { term });
            }
            match info.week_range() {
                Some((start, end)) if start <= end => {}
                _ => warn!(term, weeks = %info.weeks, "term week range is not \"start-end\""),
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Response schema
// ---------------------------------------------------------------------------

fn string() -> Value {
    json!({ "type": "STRING" })
}

fn integer() -> Value {
    json!({ "type": "INTEGER" })
}

fn string_array() -> Value {
    json!({ "type": "ARRAY", "items": string() })
}

fn string_enum(values: &[&str]) -> Value {
    json!({ "type": "STRING", "format": "enum", "enum": values })
}

fn term_info_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "weeks": { "type": "STRING", "description": "Week range, e.g. '1-18'" },
            "units": { "type": "ARRAY", "items": string(), "minItems": 1 },
            "assessment": string(),
        },
        "required": ["weeks", "units", "assessment"],
    })
}

/// JSON schema for [`PlanDocument`] in the OpenAPI subset Gemini accepts
/// as `responseSchema`.
pub fn response_schema() -> Value {
    let topic_kinds: Vec<&str> = TopicKind::ALL.iter().map(|k| k.as_str()).collect();
    let assessment_kinds: Vec<&str> = AssessmentKind::ALL.iter().map(|k| k.as_str()).collect();

    let course_info = json!({
        "type": "OBJECT",
        "properties": {
            "title": string(),
            "class": { "type": "STRING", "description": "Class level, e.g. XII" },
            "subject": { "type": "STRING", "description": "Subject with code, e.g. Computer Science (083)" },
            "academic_year": string(),
            "total_weeks": integer(),
            "periods_per_week": integer(),
            "practical_hours": { "type": "INTEGER", "minimum": 0 },
            "theory_hours": { "type": "INTEGER", "minimum": 0 },
        },
        "required": [
            "title", "class", "subject", "academic_year",
            "total_weeks", "periods_per_week", "practical_hours", "theory_hours"
        ],
        "propertyOrdering": [
            "title", "class", "subject", "academic_year",
            "total_weeks", "periods_per_week", "practical_hours", "theory_hours"
        ],
    });

    let topic = json!({
        "type": "OBJECT",
        "properties": {
            "topic": string(),
            "subtopics": string_array(),
            "cbse_reference": string(),
            "periods": integer(),
            "type": string_enum(&topic_kinds),
            "equipment": string_array(),
        },
        "required": ["topic", "cbse_reference", "periods", "type"],
    });

    let assessment = json!({
        "type": "OBJECT",
        "properties": {
            "type": string_enum(&assessment_kinds),
            "marks": { "type": "INTEGER", "minimum": 0 },
            "technique": string(),
        },
        "required": ["type", "marks", "technique"],
    });

    let week = json!({
        "type": "OBJECT",
        "properties": {
            "week": { "type": "INTEGER", "minimum": 1 },
            "unit": string(),
            "title": string(),
            "topics": { "type": "ARRAY", "items": topic, "minItems": 1 },
            "learning_outcomes": { "type": "ARRAY", "items": string(), "minItems": 1 },
            "cbse_assessment": assessment,
        },
        "required": ["week", "unit", "title", "topics", "learning_outcomes"],
    });

    json!({
        "type": "OBJECT",
        "properties": {
            "course_info": course_info,
            "schedule": { "type": "ARRAY", "items": week, "minItems": 1 },
            "term_plan": {
                "type": "OBJECT",
                "properties": {
                    "term1": term_info_schema(),
                    "term2": term_info_schema(),
                },
                "required": ["term1", "term2"],
            },
        },
        "required": ["course_info", "schedule", "term_plan"],
        "propertyOrdering": ["course_info", "schedule", "term_plan"],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Value {
        json!({
            "course_info": {
                "title": "Physics",
                "class": "XI",
                "subject": "Physics (042)",
                "academic_year": "2024-25",
                "total_weeks": 36,
                "periods_per_week": 6,
                "practical_hours": 60,
                "theory_hours": 120
            },
            "schedule": [{
                "week": 1,
                "unit": "Unit I",
                "title": "Units and Measurement",
                "topics": [{
                    "topic": "SI units",
                    "cbse_reference": "Unit I, Ch 1",
                    "periods": 4,
                    "type": "theory"
                }],
                "learning_outcomes": ["Use SI units"],
                "cbse_assessment": {
                    "type": "Formative Assessment",
                    "marks": 10,
                    "technique": "Quiz"
                }
            }],
            "term_plan": {
                "term1": { "weeks": "1-18", "units": ["Unit I"], "assessment": "Half yearly" },
                "term2": { "weeks": "19-36", "units": ["Unit II"], "assessment": "Annual" }
            }
        })
    }

    fn decode(value: Value) -> PlanDocument {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn sample_document_is_valid() {
        let doc = decode(sample());
        assert_eq!(doc.course_info.class_level, "XI");
        assert_eq!(doc.schedule[0].topics[0].kind, TopicKind::Theory);
        assert_eq!(
            doc.schedule[0].cbse_assessment.as_ref().unwrap().kind,
            AssessmentKind::Formative
        );
        assert_eq!(doc.validate(), Ok(()));
    }

    #[test]
    fn class_underscore_alias_is_accepted() {
        let mut value = sample();
        let info = value["course_info"].as_object_mut().unwrap();
        let class = info.remove("class").unwrap();
        info.insert("class_".to_string(), class);

        let doc = decode(value);
        assert_eq!(doc.course_info.class_level, "XI");
        // Re-serializes under the canonical key.
        let out = serde_json::to_value(&doc).unwrap();
        assert_eq!(out["course_info"]["class"], "XI");
        assert!(out["course_info"].get("class_").is_none());
    }

    #[test]
    fn unknown_topic_type_is_rejected() {
        let mut value = sample();
        value["schedule"][0]["topics"][0]["type"] = json!("lecture");
        assert!(serde_json::from_value::<PlanDocument>(value).is_err());
    }

    #[test]
    fn negative_hours_are_rejected() {
        let mut value = sample();
        value["course_info"]["practical_hours"] = json!(-5);
        assert!(serde_json::from_value::<PlanDocument>(value).is_err());
    }

    #[test]
    fn missing_required_field_is_rejected() {
        let mut value = sample();
        value["course_info"].as_object_mut().unwrap().remove("title");
        assert!(serde_json::from_value::<PlanDocument>(value).is_err());
    }

    #[test]
    fn empty_schedule_fails_validation() {
        let mut value = sample();
        value["schedule"] = json!([]);
        assert_eq!(
            decode(value).validate(),
            Err(PlanValidationError::EmptySchedule)
        );
    }

    #[test]
    fn week_without_topics_fails_validation() {
        let mut value = sample();
        value["schedule"][0]["topics"] = json!([]);
        assert_eq!(
            decode(value).validate(),
            Err(PlanValidationError::NoTopics { week: 1 })
        );
    }

    #[test]
    fn week_zero_passes_validation() {
        let mut value = sample();
        value["schedule"][0]["week"] = json!(0);
        assert_eq!(decode(value).validate(), Ok(()));
    }

    #[test]
    fn free_form_term_weeks_pass_validation() {
        for weeks in ["36-19", "Weeks 1\u{2013}18", "first half"] {
            let mut value = sample();
            value["term_plan"]["term2"]["weeks"] = json!(weeks);
            let doc = decode(value);
            assert_eq!(doc.validate(), Ok(()), "weeks {weeks:?}");
            assert_eq!(doc.term_plan.term2.weeks, weeks);
        }
    }

    #[test]
    fn term_without_units_fails_validation() {
        let mut value = sample();
        value["term_plan"]["term1"]["units"] = json!([]);
        assert_eq!(
            decode(value).validate(),
            Err(PlanValidationError::NoUnits { term: "term1" })
        );
    }

    #[test]
    fn week_range_tolerates_spaces() {
        let info = TermInfo {
            weeks: " 1 - 18 ".to_string(),
            units: vec![],
            assessment: String::new(),
        };
        assert_eq!(info.week_range(), Some((1, 18)));
    }

    #[test]
    fn schema_lists_enum_values() {
        let schema = response_schema();
        let week = &schema["properties"]["schedule"]["items"];
        let topic_type = &week["properties"]["topics"]["items"]["properties"]["type"];
        assert_eq!(
            topic_type["enum"],
            json!(["theory", "practical", "revision", "assessment"])
        );
        let assessment_type = &week["properties"]["cbse_assessment"]["properties"]["type"];
        assert_eq!(assessment_type["enum"].as_array().unwrap().len(), 5);
        assert_eq!(
            schema["properties"]["course_info"]["required"][1],
            json!("class")
        );
    }
}
