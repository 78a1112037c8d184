//! Commands for the Learning context.

use uuid::Uuid;
use verdant_core::command::Command;

use super::activity::ActivityPayload;

/// Command to save progress on a lesson activity.
#[derive(Debug, Clone)]
pub struct SaveActivity {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The learner.
    pub user_id: Uuid,
    /// The enrollment being worked on.
    pub enrollment_id: Uuid,
    /// What was submitted.
    pub payload: ActivityPayload,
}

impl Command for SaveActivity {
    fn command_type(&self) -> &'static str {
        "learning.save_activity"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn actor_id(&self) -> Option<Uuid> {
        Some(self.user_id)
    }
}

/// Command to complete a lesson after validation.
#[derive(Debug, Clone)]
pub struct CompleteLesson {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The learner.
    pub user_id: Uuid,
    /// The enrollment.
    pub enrollment_id: Uuid,
    /// The lesson to complete.
    pub lesson_id: Uuid,
}

impl Command for CompleteLesson {
    fn command_type(&self) -> &'static str {
        "learning.complete_lesson"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn actor_id(&self) -> Option<Uuid> {
        Some(self.user_id)
    }
}
