//! Saved activity responses and the rules for merging new submissions.
//!
//! A learner may save a lesson many times (interactive answers, tool results,
//! a reflection). Each save is normalized into a [`ResponsePatch`] and merged
//! into the stored row for the (enrollment, lesson) pair.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;
use verdant_core::error::DomainError;

use super::enrollment::Enrollment;

/// One save request, discriminated by `kind`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActivityPayload {
    /// Structured answers from an interactive activity.
    Interactive {
        /// Lesson answered.
        lesson_id: Uuid,
        /// Module of the lesson.
        module_id: Uuid,
        /// Activity kind.
        activity_type: String,
        /// Answers keyed by field.
        #[serde(default)]
        responses: Map<String, Value>,
        /// Links to uploaded evidence.
        #[serde(default)]
        evidence_urls: Vec<String>,
        /// Questions answered so far.
        #[serde(default)]
        questions_answered: Option<i32>,
        /// Questions in the activity.
        #[serde(default)]
        total_questions: Option<i32>,
        /// Client-reported completion, 0..=100.
        #[serde(default)]
        completion_percentage: Option<i32>,
        /// Minutes spent in this session.
        #[serde(default)]
        time_spent_minutes: i32,
    },
    /// Output of an embedded calculator or tool.
    Tool {
        /// Lesson answered.
        lesson_id: Uuid,
        /// Module of the lesson.
        module_id: Uuid,
        /// Tool identifier, e.g. `carbon_calculator`.
        tool_name: String,
        /// Tool output.
        tool_result: Value,
        /// Minutes spent in this session.
        #[serde(default)]
        time_spent_minutes: i32,
    },
    /// A free-text reflection.
    Reflection {
        /// Lesson answered.
        lesson_id: Uuid,
        /// Module of the lesson.
        module_id: Uuid,
        /// Reflection text.
        reflection: String,
        /// Minutes spent in this session.
        #[serde(default)]
        time_spent_minutes: i32,
    },
}

/// A normalized save, ready to merge.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponsePatch {
    /// Lesson answered.
    pub lesson_id: Uuid,
    /// Module of the lesson.
    pub module_id: Uuid,
    /// Activity kind, when the payload states one.
    pub activity_type: Option<String>,
    /// Answers to merge key-wise.
    pub responses: Map<String, Value>,
    /// Tool results to merge key-wise.
    pub tool_results: Map<String, Value>,
    /// Evidence links to add.
    pub evidence_urls: Vec<String>,
    /// Replacement reflection.
    pub reflection: Option<String>,
    /// Replacement answered count.
    pub questions_answered: Option<i32>,
    /// Replacement question total.
    pub total_questions: Option<i32>,
    /// Completion to raise to.
    pub completion_percentage: Option<i32>,
    /// Minutes to add.
    pub time_spent_minutes: i32,
}

fn check_time(minutes: i32) -> Result<i32, DomainError> {
    if minutes < 0 {
        Err(DomainError::validation(
            "El tiempo dedicado no puede ser negativo",
        ))
    } else {
        Ok(minutes)
    }
}

impl ActivityPayload {
    /// Lesson the payload belongs to.
    #[must_use]
    pub fn lesson_id(&self) -> Uuid {
        match self {
            Self::Interactive { lesson_id, .. }
            | Self::Tool { lesson_id, .. }
            | Self::Reflection { lesson_id, .. } => *lesson_id,
        }
    }

    /// Validates the payload and converts it into a patch.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for a negative time, a completion
    /// outside 0..=100, negative counts, or an empty tool name, activity
    /// type or reflection.
    pub fn normalize(self) -> Result<ResponsePatch, DomainError> {
        match self {
            Self::Interactive {
                lesson_id,
                module_id,
                activity_type,
                responses,
                evidence_urls,
                questions_answered,
                total_questions,
                completion_percentage,
                time_spent_minutes,
            } => {
                let activity_type = activity_type.trim().to_owned();
                if activity_type.is_empty() {
                    return Err(DomainError::validation(
                        "El tipo de actividad es obligatorio",
                    ));
                }
                if completion_percentage.is_some_and(|p| !(0..=100).contains(&p)) {
                    return Err(DomainError::validation(
                        "El porcentaje de avance debe estar entre 0 y 100",
                    ));
                }
                if questions_answered.is_some_and(|n| n < 0) || total_questions.is_some_and(|n| n < 0)
                {
                    return Err(DomainError::validation(
                        "El número de preguntas no puede ser negativo",
                    ));
                }
                Ok(ResponsePatch {
                    lesson_id,
                    module_id,
                    activity_type: Some(activity_type),
                    responses,
                    evidence_urls: evidence_urls
                        .into_iter()
                        .map(|u| u.trim().to_owned())
                        .filter(|u| !u.is_empty())
                        .collect(),
                    questions_answered,
                    total_questions,
                    completion_percentage,
                    time_spent_minutes: check_time(time_spent_minutes)?,
                    ..ResponsePatch::default()
                })
            }
            Self::Tool {
                lesson_id,
                module_id,
                tool_name,
                tool_result,
                time_spent_minutes,
            } => {
                let tool_name = tool_name.trim().to_owned();
                if tool_name.is_empty() {
                    return Err(DomainError::validation(
                        "El nombre de la herramienta es obligatorio",
                    ));
                }
                let mut tool_results = Map::new();
                tool_results.insert(tool_name, tool_result);
                Ok(ResponsePatch {
                    lesson_id,
                    module_id,
                    tool_results,
                    time_spent_minutes: check_time(time_spent_minutes)?,
                    ..ResponsePatch::default()
                })
            }
            Self::Reflection {
                lesson_id,
                module_id,
                reflection,
                time_spent_minutes,
            } => {
                if reflection.trim().is_empty() {
                    return Err(DomainError::validation("La reflexión está vacía"));
                }
                Ok(ResponsePatch {
                    lesson_id,
                    module_id,
                    reflection: Some(reflection),
                    time_spent_minutes: check_time(time_spent_minutes)?,
                    ..ResponsePatch::default()
                })
            }
        }
    }
}

/// The stored answers for one lesson of one enrollment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityResponse {
    /// Enrollment answering.
    pub enrollment_id: Uuid,
    /// Lesson answered.
    pub lesson_id: Uuid,
    /// Module of the lesson.
    pub module_id: Uuid,
    /// Learner.
    pub user_id: Uuid,
    /// Activity kind.
    pub activity_type: String,
    /// Structured answers.
    pub responses: Map<String, Value>,
    /// Latest reflection.
    pub reflection: Option<String>,
    /// Tool name to result.
    pub tool_results: Map<String, Value>,
    /// Evidence links, in submission order.
    pub evidence_urls: Vec<String>,
    /// Questions answered.
    pub questions_answered: Option<i32>,
    /// Questions in the activity.
    pub total_questions: Option<i32>,
    /// Completion, 0..=100; never decreases.
    pub completion_percentage: i32,
    /// Accumulated minutes.
    pub time_spent_minutes: i32,
    /// First save.
    pub created_at: DateTime<Utc>,
    /// Last save.
    pub updated_at: DateTime<Utc>,
}

const DEFAULT_ACTIVITY_TYPE: &str = "interactive";
const TOOL_ACTIVITY_TYPE: &str = "tool";
const REFLECTION_ACTIVITY_TYPE: &str = "reflection";

impl ActivityResponse {
    /// Merges a patch into the existing row, or starts a new row.
    #[must_use]
    pub fn merge(
        existing: Option<Self>,
        patch: ResponsePatch,
        enrollment: &Enrollment,
        now: DateTime<Utc>,
    ) -> Self {
        let fallback_type = if patch.reflection.is_some() {
            REFLECTION_ACTIVITY_TYPE
        } else if !patch.tool_results.is_empty() {
            TOOL_ACTIVITY_TYPE
        } else {
            DEFAULT_ACTIVITY_TYPE
        };

        let mut row = existing.unwrap_or_else(|| Self {
            enrollment_id: enrollment.id,
            lesson_id: patch.lesson_id,
            module_id: patch.module_id,
            user_id: enrollment.user_id,
            activity_type: fallback_type.to_owned(),
            responses: Map::new(),
            reflection: None,
            tool_results: Map::new(),
            evidence_urls: Vec::new(),
            questions_answered: None,
            total_questions: None,
            completion_percentage: 0,
            time_spent_minutes: 0,
            created_at: now,
            updated_at: now,
        });

        if let Some(activity_type) = patch.activity_type {
            row.activity_type = activity_type;
        }
        row.responses.extend(patch.responses);
        row.tool_results.extend(patch.tool_results);
        for url in patch.evidence_urls {
            if !row.evidence_urls.contains(&url) {
                row.evidence_urls.push(url);
            }
        }
        if let Some(reflection) = patch.reflection {
            row.reflection = Some(reflection);
        }
        if let Some(n) = patch.questions_answered {
            row.questions_answered = Some(n);
        }
        if let Some(n) = patch.total_questions {
            row.total_questions = Some(n);
        }
        if let Some(pct) = patch.completion_percentage {
            row.completion_percentage = row.completion_percentage.max(pct);
        }
        row.time_spent_minutes = row
            .time_spent_minutes
            .saturating_add(patch.time_spent_minutes);
        row.updated_at = now;
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;
    use verdant_core::purchase::PurchaseType;

    use crate::domain::enrollment::EnrollmentStatus;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()
    }

    fn enrollment() -> Enrollment {
        Enrollment {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            module_id: Uuid::new_v4(),
            corporate_account_id: None,
            purchase_type: PurchaseType::Individual,
            price_paid_cents: 18_000,
            status: EnrollmentStatus::NotStarted,
            progress_percentage: 0,
            completed: false,
            completed_at: None,
            xp_earned: 0,
            purchased_at: fixed_now(),
            last_accessed_at: None,
        }
    }

    fn payload(value: Value) -> ActivityPayload {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_payload_kinds_deserialize() {
        let lesson = Uuid::new_v4();
        let module = Uuid::new_v4();
        let tool = payload(json!({
            "kind": "tool",
            "lesson_id": lesson,
            "module_id": module,
            "tool_name": "carbon_calculator",
            "tool_result": {"co2_reduction_kg": 12.5}
        }));
        assert_eq!(tool.lesson_id(), lesson);
        assert!(matches!(tool, ActivityPayload::Tool { time_spent_minutes: 0, .. }));
    }

    #[test]
    fn test_normalize_rejects_out_of_range_completion() {
        let p = payload(json!({
            "kind": "interactive",
            "lesson_id": Uuid::new_v4(),
            "module_id": Uuid::new_v4(),
            "activity_type": "waste_audit",
            "completion_percentage": 140
        }));
        assert!(matches!(p.normalize(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_normalize_rejects_blank_reflection() {
        let p = payload(json!({
            "kind": "reflection",
            "lesson_id": Uuid::new_v4(),
            "module_id": Uuid::new_v4(),
            "reflection": "   "
        }));
        assert!(p.normalize().is_err());
    }

    #[test]
    fn test_merge_combines_successive_saves() {
        // Arrange
        let enrollment = enrollment();
        let lesson_id = Uuid::new_v4();
        let module_id = enrollment.module_id;
        let first = payload(json!({
            "kind": "interactive",
            "lesson_id": lesson_id,
            "module_id": module_id,
            "activity_type": "waste_audit",
            "responses": {"bins": 3, "notes": "primera"},
            "evidence_urls": ["https://a.example/1.jpg"],
            "completion_percentage": 60,
            "time_spent_minutes": 10
        }))
        .normalize()
        .unwrap();
        let second = payload(json!({
            "kind": "interactive",
            "lesson_id": lesson_id,
            "module_id": module_id,
            "activity_type": "waste_audit",
            "responses": {"notes": "segunda"},
            "evidence_urls": ["https://a.example/1.jpg", "https://a.example/2.jpg"],
            "completion_percentage": 40,
            "time_spent_minutes": 5
        }))
        .normalize()
        .unwrap();
        let tool = payload(json!({
            "kind": "tool",
            "lesson_id": lesson_id,
            "module_id": module_id,
            "tool_name": "carbon_calculator",
            "tool_result": {"co2_reduction_kg": 4}
        }))
        .normalize()
        .unwrap();
        let later = Utc.with_ymd_and_hms(2026, 1, 15, 11, 0, 0).unwrap();

        // Act
        let row = ActivityResponse::merge(None, first, &enrollment, fixed_now());
        let row = ActivityResponse::merge(Some(row), second, &enrollment, later);
        let row = ActivityResponse::merge(Some(row), tool, &enrollment, later);

        // Assert
        assert_eq!(row.activity_type, "waste_audit");
        assert_eq!(row.responses.get("bins"), Some(&json!(3)));
        assert_eq!(row.responses.get("notes"), Some(&json!("segunda")));
        assert_eq!(
            row.evidence_urls,
            vec!["https://a.example/1.jpg", "https://a.example/2.jpg"]
        );
        assert_eq!(row.completion_percentage, 60);
        assert_eq!(row.time_spent_minutes, 15);
        assert!(row.tool_results.contains_key("carbon_calculator"));
        assert_eq!(row.created_at, fixed_now());
        assert_eq!(row.updated_at, later);
        assert_eq!(row.user_id, enrollment.user_id);
    }

    #[test]
    fn test_reflection_replaces_previous_text() {
        let enrollment = enrollment();
        let lesson_id = Uuid::new_v4();
        let make = |text: &str| ResponsePatch {
            lesson_id,
            module_id: enrollment.module_id,
            reflection: Some(text.to_owned()),
            ..ResponsePatch::default()
        };

        let row = ActivityResponse::merge(None, make("uno"), &enrollment, fixed_now());
        let row = ActivityResponse::merge(Some(row), make("dos"), &enrollment, fixed_now());

        assert_eq!(row.reflection.as_deref(), Some("dos"));
        assert_eq!(row.activity_type, "reflection");
    }
}
