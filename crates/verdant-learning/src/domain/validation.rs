//! Quality-control validation of lesson submissions.
//!
//! Every check is pure and deterministic. Each component yields a
//! [`ValidationResult`] with a 0..=100 score; a lesson passes when the
//! average of its component scores reaches [`QualityThresholds::pass_score`].

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

/// Activity types that always require photo or document evidence.
pub const EVIDENCE_ACTIVITY_TYPES: [&str; 5] = [
    "air_quality_assessment",
    "waste_audit",
    "water_audit",
    "photo_documentation",
    "community_mapping",
];

/// Pass/fail thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityThresholds {
    /// Minimum words in a free-text answer.
    pub min_words: usize,
    /// Minimum quiz score, in percent.
    pub min_quiz_score: u32,
    /// Minimum fraction of activity fields that must be filled in.
    pub min_activity_completion: f64,
    /// Minimum average score for a lesson to pass.
    pub pass_score: u32,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            min_words: 30,
            min_quiz_score: 60,
            min_activity_completion: 0.8,
            pass_score: 70,
        }
    }
}

/// Outcome of one validation check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    /// Whether the check passed.
    pub valid: bool,
    /// Score, 0..=100.
    pub score: u32,
    /// User-facing problems found.
    pub issues: Vec<String>,
}

impl ValidationResult {
    fn pass(score: u32) -> Self {
        Self {
            valid: true,
            score,
            issues: Vec::new(),
        }
    }

    fn fail(score: u32, issue: impl Into<String>) -> Self {
        Self {
            valid: false,
            score,
            issues: vec![issue.into()],
        }
    }
}

/// Whole-text placeholders, matched case-insensitively after trimming.
static PLACEHOLDER_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)^(test|testing|prueba|asdf|qwerty|n/?a|nada|ninguno)$",
        r"(?i)^x{3,}$",
        r"^\.{3,}$",
        r"(?i)^(test\s*)+$",
        r"(?i)asdf|qwerty|lorem\s+ipsum",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

const MAX_CHAR_RUN: usize = 6;
const REPETITIVE_MIN_WORDS: usize = 10;
const REPETITIVE_PENALTY: u32 = 40;

fn has_long_char_run(text: &str) -> bool {
    let mut previous = None;
    let mut run = 0;
    for ch in text.chars() {
        if ch.is_whitespace() {
            previous = None;
            run = 0;
            continue;
        }
        if Some(ch) == previous {
            run += 1;
        } else {
            previous = Some(ch);
            run = 1;
        }
        if run >= MAX_CHAR_RUN {
            return true;
        }
    }
    false
}

/// Whether the text is filler rather than an answer.
#[must_use]
pub fn is_placeholder(text: &str) -> bool {
    let trimmed = text.trim();
    PLACEHOLDER_PATTERNS.iter().any(|re| re.is_match(trimmed)) || has_long_char_run(trimmed)
}

fn percent(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 100;
    }
    u32::try_from((part * 100 / whole).min(100)).unwrap_or(100)
}

/// Validates a free-text answer.
#[must_use]
pub fn validate_text_response(text: &str, thresholds: &QualityThresholds) -> ValidationResult {
    let words: Vec<&str> = text.split_whitespace().collect();
    let word_count = words.len();

    if word_count == 0 {
        return ValidationResult::fail(0, "La respuesta está vacía");
    }
    if is_placeholder(text) {
        return ValidationResult::fail(
            0,
            "La respuesta parece un texto de relleno; escribe una respuesta real",
        );
    }

    let mut result = ValidationResult::pass(percent(word_count, thresholds.min_words));

    if word_count < thresholds.min_words {
        result.valid = false;
        result.issues.push(format!(
            "La respuesta tiene {word_count} palabras; se requieren al menos {}",
            thresholds.min_words
        ));
    }

    if word_count >= REPETITIVE_MIN_WORDS {
        let distinct: HashSet<String> = words.iter().map(|w| w.to_lowercase()).collect();
        if distinct.len() * 10 < word_count * 3 {
            result.valid = false;
            result.score = result.score.saturating_sub(REPETITIVE_PENALTY);
            result
                .issues
                .push("La respuesta repite demasiado las mismas palabras".to_owned());
        }
    }

    result
}

fn answer_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.trim().to_owned()),
        other => Some(other.to_string()),
    }
}

/// Validates quiz answers. Every question must be answered; when correct
/// answers are known the score is the share answered correctly.
#[must_use]
pub fn validate_quiz_response(
    answers: &Map<String, Value>,
    question_ids: &[String],
    correct_answers: Option<&HashMap<String, String>>,
    thresholds: &QualityThresholds,
) -> ValidationResult {
    if question_ids.is_empty() {
        return ValidationResult::pass(100);
    }

    let given: Vec<Option<String>> = question_ids
        .iter()
        .map(|id| answer_text(answers.get(id)))
        .collect();
    let answered = given.iter().filter(|a| a.is_some()).count();
    let total = question_ids.len();

    let score = match correct_answers {
        Some(correct) => {
            let right = question_ids
                .iter()
                .zip(&given)
                .filter(|(id, answer)| {
                    matches!(
                        (answer.as_deref(), correct.get(id.as_str())),
                        (Some(a), Some(c)) if a.eq_ignore_ascii_case(c.trim())
                    )
                })
                .count();
            percent(right, total)
        }
        None => percent(answered, total),
    };

    let mut result = ValidationResult::pass(score);
    if answered < total {
        result.valid = false;
        result.issues.push(format!(
            "Faltan {} de {total} preguntas por responder",
            total - answered
        ));
    }
    if correct_answers.is_some() && score < thresholds.min_quiz_score {
        result.valid = false;
        result.issues.push(format!(
            "Obtuviste {score}% en el cuestionario; se requiere al menos {}%",
            thresholds.min_quiz_score
        ));
    }
    result
}

fn is_filled(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
        Some(Value::Bool(_) | Value::Number(_)) => true,
    }
}

/// Validates that a structured activity was filled in.
#[must_use]
pub fn validate_activity_completion(
    fields: &Map<String, Value>,
    expected_fields: &[String],
    thresholds: &QualityThresholds,
) -> ValidationResult {
    let (filled, total) = if expected_fields.is_empty() {
        (
            fields.values().filter(|v| is_filled(Some(v))).count(),
            fields.len(),
        )
    } else {
        (
            expected_fields
                .iter()
                .filter(|f| is_filled(fields.get(f.as_str())))
                .count(),
            expected_fields.len(),
        )
    };

    if total == 0 {
        return ValidationResult::fail(0, "La actividad no tiene respuestas");
    }

    #[allow(clippy::cast_precision_loss)]
    let fraction = filled as f64 / total as f64;
    let score = percent(filled, total);
    if fraction < thresholds.min_activity_completion {
        ValidationResult::fail(
            score,
            format!("Completaste {filled} de {total} campos de la actividad"),
        )
    } else {
        ValidationResult::pass(score)
    }
}

/// Whether an activity type always requires evidence.
#[must_use]
pub fn requires_evidence(activity_type: &str) -> bool {
    EVIDENCE_ACTIVITY_TYPES.contains(&activity_type)
}

fn is_valid_evidence_url(raw: &str) -> bool {
    Url::parse(raw.trim())
        .is_ok_and(|url| matches!(url.scheme(), "http" | "https") && url.host().is_some())
}

/// Validates evidence links.
#[must_use]
pub fn validate_evidence(activity_type: &str, urls: &[String], required: bool) -> ValidationResult {
    let required = required || requires_evidence(activity_type);
    let valid = urls.iter().filter(|u| is_valid_evidence_url(u)).count();
    let invalid = urls.len() - valid;

    if required && valid == 0 {
        return ValidationResult::fail(
            0,
            "Esta actividad requiere evidencia (fotos o documentos)",
        );
    }
    let mut result = ValidationResult::pass(100);
    if invalid > 0 {
        result
            .issues
            .push(format!("{invalid} enlaces de evidencia no son válidos"));
    }
    result
}

/// Everything submitted for one lesson, as needed by validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LessonSubmission {
    /// Activity type of the lesson.
    pub activity_type: String,
    /// Free-text answers to check, labelled by field.
    pub text_responses: Vec<(String, String)>,
    /// Quiz answers and definition, when the lesson has a quiz.
    pub quiz: Option<QuizSubmission>,
    /// Structured activity fields and the ones expected, when the lesson has
    /// a structured activity.
    pub activity: Option<(Map<String, Value>, Vec<String>)>,
    /// Evidence links, when evidence applies to the lesson.
    pub evidence: Option<(Vec<String>, bool)>,
}

/// Quiz part of a submission.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuizSubmission {
    /// Answers keyed by question id.
    pub answers: Map<String, Value>,
    /// Questions in the quiz.
    pub question_ids: Vec<String>,
    /// Correct answers keyed by question id, when grading applies.
    pub correct_answers: Option<HashMap<String, String>>,
}

/// Result of one component inside a lesson report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentResult {
    /// `text:<field>`, `quiz`, `activity` or `evidence`.
    pub component: String,
    /// Outcome of the component.
    #[serde(flatten)]
    pub result: ValidationResult,
}

/// Aggregated validation of a lesson.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LessonValidationReport {
    /// Whether the lesson can be completed.
    pub valid: bool,
    /// Average component score.
    pub score: u32,
    /// Per-component results.
    pub components: Vec<ComponentResult>,
    /// Every issue, in component order.
    pub issues: Vec<String>,
}

/// Validates a whole lesson submission.
#[must_use]
pub fn validate_lesson(
    submission: &LessonSubmission,
    thresholds: &QualityThresholds,
) -> LessonValidationReport {
    let mut components = Vec::new();

    for (field, text) in &submission.text_responses {
        components.push(ComponentResult {
            component: format!("text:{field}"),
            result: validate_text_response(text, thresholds),
        });
    }
    if let Some(quiz) = &submission.quiz {
        components.push(ComponentResult {
            component: "quiz".to_owned(),
            result: validate_quiz_response(
                &quiz.answers,
                &quiz.question_ids,
                quiz.correct_answers.as_ref(),
                thresholds,
            ),
        });
    }
    if let Some((fields, expected)) = &submission.activity {
        components.push(ComponentResult {
            component: "activity".to_owned(),
            result: validate_activity_completion(fields, expected, thresholds),
        });
    }
    if let Some((urls, required)) = &submission.evidence {
        components.push(ComponentResult {
            component: "evidence".to_owned(),
            result: validate_evidence(&submission.activity_type, urls, *required),
        });
    }

    if components.is_empty() {
        return LessonValidationReport {
            valid: true,
            score: 100,
            components,
            issues: Vec::new(),
        };
    }

    let total: u32 = components.iter().map(|c| c.result.score).sum();
    let count = u32::try_from(components.len()).unwrap_or(u32::MAX);
    let score = total / count;
    let issues = components
        .iter()
        .flat_map(|c| c.result.issues.iter().cloned())
        .collect();

    LessonValidationReport {
        valid: score >= thresholds.pass_score,
        score,
        components,
        issues,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn thresholds() -> QualityThresholds {
        QualityThresholds::default()
    }

    fn words(n: usize) -> String {
        (0..n)
            .map(|i| format!("palabra{i}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn test_placeholders_are_detected() {
        for text in [
            "test",
            "TESTING",
            "prueba",
            "n/a",
            "NA",
            "Nada",
            "xxxxx",
            "...",
            "test test test",
            "lorem ipsum dolor",
            "mi respuesta asdf",
            "aaaaaaa",
        ] {
            assert!(is_placeholder(text), "expected placeholder: {text}");
        }
        assert!(!is_placeholder("Medimos el aire en la oficina"));
    }

    #[test]
    fn test_spaced_thousands_are_not_a_char_run() {
        // Arrange
        let text = format!(
            "Nuestra planta consume 1 000 000 litros de agua al año y {}",
            words(25)
        );

        // Act
        let result = validate_text_response(&text, &thresholds());

        // Assert
        assert!(!is_placeholder("1 000 000"));
        assert!(is_placeholder("1 0000000"));
        assert!(result.valid);
        assert_eq!(result.score, 100);
    }

    #[test]
    fn test_placeholder_scores_zero() {
        let result = validate_text_response("prueba", &thresholds());
        assert!(!result.valid);
        assert_eq!(result.score, 0);
    }

    #[test]
    fn test_short_answer_is_invalid_with_partial_score() {
        // Arrange
        let text = words(15);

        // Act
        let result = validate_text_response(&text, &thresholds());

        // Assert
        assert!(!result.valid);
        assert_eq!(result.score, 50);
        assert_eq!(
            result.issues,
            vec!["La respuesta tiene 15 palabras; se requieren al menos 30".to_owned()]
        );
    }

    #[test]
    fn test_long_varied_answer_passes() {
        let result = validate_text_response(&words(45), &thresholds());
        assert!(result.valid);
        assert_eq!(result.score, 100);
    }

    #[test]
    fn test_repetitive_answer_is_penalized() {
        let text = "el aire es bueno ".repeat(10);
        let result = validate_text_response(&text, &thresholds());
        assert!(!result.valid);
        assert_eq!(result.score, 60);
    }

    #[test]
    fn test_quiz_with_unanswered_question_is_invalid() {
        let answers = json!({"q1": "a", "q2": ""}).as_object().cloned().unwrap();
        let ids = vec!["q1".to_owned(), "q2".to_owned()];

        let result = validate_quiz_response(&answers, &ids, None, &thresholds());

        assert!(!result.valid);
        assert_eq!(result.score, 50);
    }

    #[test]
    fn test_quiz_scored_against_correct_answers() {
        // Arrange
        let answers = json!({"q1": "A", "q2": "b", "q3": "c"})
            .as_object()
            .cloned()
            .unwrap();
        let ids = vec!["q1".to_owned(), "q2".to_owned(), "q3".to_owned()];
        let correct: HashMap<String, String> = [("q1", "a"), ("q2", "b"), ("q3", "d")]
            .into_iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();

        // Act
        let result = validate_quiz_response(&answers, &ids, Some(&correct), &thresholds());

        // Assert
        assert!(result.valid);
        assert_eq!(result.score, 66);
    }

    #[test]
    fn test_quiz_below_minimum_is_invalid() {
        let answers = json!({"q1": "x", "q2": "y"}).as_object().cloned().unwrap();
        let ids = vec!["q1".to_owned(), "q2".to_owned()];
        let correct: HashMap<String, String> =
            [("q1".to_owned(), "a".to_owned()), ("q2".to_owned(), "y".to_owned())].into();

        let result = validate_quiz_response(&answers, &ids, Some(&correct), &thresholds());

        assert!(!result.valid);
        assert_eq!(result.score, 50);
    }

    #[test]
    fn test_activity_completion_uses_expected_fields() {
        let fields = json!({"a": "1", "b": 2, "c": "", "d": [], "extra": "x"})
            .as_object()
            .cloned()
            .unwrap();
        let expected: Vec<String> = ["a", "b", "c", "d", "e"]
            .iter()
            .map(|s| (*s).to_owned())
            .collect();

        let result = validate_activity_completion(&fields, &expected, &thresholds());

        assert!(!result.valid);
        assert_eq!(result.score, 40);
    }

    #[test]
    fn test_activity_completion_without_expected_fields() {
        let fields = json!({"a": "1", "b": true, "c": {"k": 1}, "d": "x", "e": ""})
            .as_object()
            .cloned()
            .unwrap();
        let result = validate_activity_completion(&fields, &[], &thresholds());
        assert!(result.valid);
        assert_eq!(result.score, 80);
    }

    #[test]
    fn test_evidence_required_by_activity_type() {
        let missing = validate_evidence("waste_audit", &[], false);
        assert!(!missing.valid);
        assert_eq!(missing.score, 0);

        let bad_only = validate_evidence("waste_audit", &["ftp://x/y.png".to_owned()], false);
        assert!(!bad_only.valid);

        let ok = validate_evidence(
            "waste_audit",
            &["https://cdn.example.com/foto.jpg".to_owned()],
            false,
        );
        assert!(ok.valid);
        assert_eq!(ok.score, 100);
    }

    #[test]
    fn test_evidence_optional_for_other_types() {
        let result = validate_evidence("reflection", &[], false);
        assert!(result.valid);
    }

    #[test]
    fn test_lesson_without_components_passes() {
        let report = validate_lesson(&LessonSubmission::default(), &thresholds());
        assert!(report.valid);
        assert_eq!(report.score, 100);
        assert!(report.components.is_empty());
    }

    #[test]
    fn test_lesson_averages_components() {
        // Arrange
        let submission = LessonSubmission {
            activity_type: "waste_audit".to_owned(),
            text_responses: vec![("reflection".to_owned(), words(45))],
            quiz: None,
            activity: None,
            evidence: Some((Vec::new(), false)),
        };

        // Act
        let report = validate_lesson(&submission, &thresholds());

        // Assert
        assert_eq!(report.score, 50);
        assert!(!report.valid);
        assert_eq!(report.components.len(), 2);
        assert_eq!(report.components[1].component, "evidence");
        assert_eq!(report.issues.len(), 1);
    }

    #[test]
    fn test_custom_word_threshold() {
        let thresholds = QualityThresholds {
            min_words: 10,
            ..QualityThresholds::default()
        };
        let result = validate_text_response(&words(10), &thresholds);
        assert!(result.valid);
        assert_eq!(result.score, 100);
    }
}
