//! Application layer: activity saving, lesson completion, and queries.

pub mod activity_handlers;
pub mod completion_handlers;
pub mod query_handlers;

use crate::domain::validation::QualityThresholds;

/// Runtime switches for the learning context.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LearningSettings {
    /// Thresholds used when validating lesson submissions.
    pub thresholds: QualityThresholds,
    /// Also write saved responses to the legacy `lesson_responses` table.
    pub legacy_dual_write: bool,
}

