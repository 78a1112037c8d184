//! Lesson definitions as seen by the learning context.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::activity::ActivityResponse;
use super::validation::{LessonSubmission, QuizSubmission, requires_evidence};

/// Quiz definition inside an activity config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizConfig {
    /// Questions, by id.
    #[serde(default)]
    pub question_ids: Vec<String>,
    /// Correct answers keyed by question id; ungraded when absent.
    #[serde(default)]
    pub correct_answers: Option<HashMap<String, String>>,
}

/// What a lesson's activity asks for and how it is validated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityConfig {
    /// Response fields holding free text (`reflection` reads the reflection).
    #[serde(default)]
    pub text_fields: Vec<String>,
    /// Quiz, if the lesson has one.
    #[serde(default)]
    pub quiz: Option<QuizConfig>,
    /// Structured fields that must be filled in.
    #[serde(default)]
    pub activity_fields: Vec<String>,
    /// Whether evidence is required regardless of activity type.
    #[serde(default)]
    pub requires_evidence: bool,
}

impl ActivityConfig {
    /// Reads a config from its stored JSON, treating unknown or malformed
    /// content as an empty config.
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_default()
    }
}

/// A lesson, with the parts learning needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LessonDefinition {
    /// Lesson identifier.
    pub id: Uuid,
    /// Owning module.
    pub module_id: Uuid,
    /// 1-based position.
    pub lesson_order: i32,
    /// Title.
    pub title: String,
    /// XP granted on completion.
    pub xp_reward: i32,
    /// Activity kind.
    pub activity_type: String,
    /// Validation configuration.
    pub config: ActivityConfig,
}

const REFLECTION_FIELD: &str = "reflection";

impl LessonDefinition {
    /// Builds the validation input from the saved response (if any).
    #[must_use]
    pub fn submission(&self, response: Option<&ActivityResponse>) -> LessonSubmission {
        let responses = response.map(|r| r.responses.clone()).unwrap_or_default();
        let reflection = response.and_then(|r| r.reflection.clone());

        let mut text_fields = self.config.text_fields.clone();
        if text_fields.is_empty() && self.activity_type == REFLECTION_FIELD {
            text_fields.push(REFLECTION_FIELD.to_owned());
        }
        let text_responses = text_fields
            .into_iter()
            .map(|field| {
                let text = if field == REFLECTION_FIELD {
                    reflection.clone().unwrap_or_default()
                } else {
                    responses
                        .get(&field)
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_owned()
                };
                (field, text)
            })
            .collect();

        let quiz = self.config.quiz.as_ref().map(|quiz| QuizSubmission {
            answers: responses
                .get("quiz_answers")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_else(|| responses.clone()),
            question_ids: quiz.question_ids.clone(),
            correct_answers: quiz.correct_answers.clone(),
        });

        let activity = (!self.config.activity_fields.is_empty())
            .then(|| (responses.clone(), self.config.activity_fields.clone()));

        let evidence = (self.config.requires_evidence || requires_evidence(&self.activity_type))
            .then(|| {
                (
                    response.map(|r| r.evidence_urls.clone()).unwrap_or_default(),
                    self.config.requires_evidence,
                )
            });

        LessonSubmission {
            activity_type: self.activity_type.clone(),
            text_responses,
            quiz,
            activity,
            evidence,
        }
    }
}
