//! Commands for the Community context.

use uuid::Uuid;
use verdant_core::command::Command;

/// Command to create a community.
#[derive(Debug, Clone)]
pub struct CreateCommunity {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The founding profile.
    pub founder_id: Uuid,
    /// Display name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Core value wire names.
    pub core_values: Vec<String>,
}

impl Command for CreateCommunity {
    fn command_type(&self) -> &'static str {
        "community.create"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn actor_id(&self) -> Option<Uuid> {
        Some(self.founder_id)
    }
}

/// Command to join a community.
#[derive(Debug, Clone)]
pub struct JoinCommunity {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The community to join.
    pub community_id: Uuid,
    /// The joining profile.
    pub user_id: Uuid,
}

impl Command for JoinCommunity {
    fn command_type(&self) -> &'static str {
        "community.join"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn actor_id(&self) -> Option<Uuid> {
        Some(self.user_id)
    }
}

/// Command to leave a community.
#[derive(Debug, Clone)]
pub struct LeaveCommunity {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The community to leave.
    pub community_id: Uuid,
    /// The leaving profile.
    pub user_id: Uuid,
}

impl Command for LeaveCommunity {
    fn command_type(&self) -> &'static str {
        "community.leave"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn actor_id(&self) -> Option<Uuid> {
        Some(self.user_id)
    }
}
