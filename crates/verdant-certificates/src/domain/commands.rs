//! Commands for the Certificates context.

use uuid::Uuid;
use verdant_core::command::Command;

/// Command to issue the certificate of a completed enrollment.
#[derive(Debug, Clone)]
pub struct IssueCertificate {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The learner; must own the enrollment.
    pub user_id: Uuid,
    /// The completed enrollment.
    pub enrollment_id: Uuid,
}

impl Command for IssueCertificate {
    fn command_type(&self) -> &'static str {
        "certificate.issue"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn actor_id(&self) -> Option<Uuid> {
        Some(self.user_id)
    }
}
