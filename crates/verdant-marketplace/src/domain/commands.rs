//! Commands for the Marketplace context.

use uuid::Uuid;
use verdant_core::command::Command;

use super::module::ReviewAction;
use super::purchase::PurchaseMetadata;

/// Command to create a draft module.
#[derive(Debug, Clone)]
pub struct CreateModule {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The authoring profile.
    pub user_id: Uuid,
    /// Authoring community; `None` creates a platform module (admins only).
    pub community_id: Option<Uuid>,
    /// Module title.
    pub title: String,
    /// Catalog description.
    pub description: String,
    /// Core value wire name.
    pub core_value: String,
    /// Price in minor units.
    pub price_cents: i64,
}

impl Command for CreateModule {
    fn command_type(&self) -> &'static str {
        "module.create"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn actor_id(&self) -> Option<Uuid> {
        Some(self.user_id)
    }
}

/// Command to append a lesson to a draft module.
#[derive(Debug, Clone)]
pub struct AddLesson {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The caller; must be the module creator.
    pub user_id: Uuid,
    /// The module to extend.
    pub module_id: Uuid,
    /// Lesson title.
    pub title: String,
    /// Markdown body.
    pub content: String,
    /// XP granted on completion.
    pub xp_reward: i32,
    /// Activity kind.
    pub activity_type: String,
    /// Validation configuration.
    pub activity_config: serde_json::Value,
}

impl Command for AddLesson {
    fn command_type(&self) -> &'static str {
        "module.add_lesson"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn actor_id(&self) -> Option<Uuid> {
        Some(self.user_id)
    }
}

/// Command to submit a draft for admin review.
#[derive(Debug, Clone)]
pub struct SubmitModule {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The caller; must be the module creator.
    pub user_id: Uuid,
    /// The module to submit.
    pub module_id: Uuid,
}

impl Command for SubmitModule {
    fn command_type(&self) -> &'static str {
        "module.submit"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn actor_id(&self) -> Option<Uuid> {
        Some(self.user_id)
    }
}

/// Command for an admin decision on a module under review.
#[derive(Debug, Clone)]
pub struct ReviewModule {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The reviewing profile.
    pub reviewer_id: Uuid,
    /// The module under review.
    pub module_id: Uuid,
    /// Approve or reject.
    pub action: ReviewAction,
    /// Reviewer notes; required when rejecting.
    pub notes: Option<String>,
}

impl Command for ReviewModule {
    fn command_type(&self) -> &'static str {
        "module.review"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn actor_id(&self) -> Option<Uuid> {
        Some(self.reviewer_id)
    }
}

/// Command to put a module in the caller's cart.
#[derive(Debug, Clone)]
pub struct AddToCart {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The buyer.
    pub user_id: Uuid,
    /// The module to buy.
    pub module_id: Uuid,
    /// Seats for corporate buyers; defaults to the account size.
    pub employee_count: Option<i64>,
}

impl Command for AddToCart {
    fn command_type(&self) -> &'static str {
        "cart.add_item"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn actor_id(&self) -> Option<Uuid> {
        Some(self.user_id)
    }
}

/// Command to drop a module from the caller's cart.
#[derive(Debug, Clone)]
pub struct RemoveFromCart {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The buyer.
    pub user_id: Uuid,
    /// The module to drop.
    pub module_id: Uuid,
}

impl Command for RemoveFromCart {
    fn command_type(&self) -> &'static str {
        "cart.remove_item"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn actor_id(&self) -> Option<Uuid> {
        Some(self.user_id)
    }
}

/// Command to quote a promo code against the caller's cart.
#[derive(Debug, Clone)]
pub struct ApplyPromoCode {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The buyer.
    pub user_id: Uuid,
    /// The code as typed.
    pub code: String,
}

impl Command for ApplyPromoCode {
    fn command_type(&self) -> &'static str {
        "cart.apply_promo"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn actor_id(&self) -> Option<Uuid> {
        Some(self.user_id)
    }
}

/// Command to open a hosted checkout for the caller's cart.
#[derive(Debug, Clone)]
pub struct StartCheckout {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The buyer.
    pub user_id: Uuid,
    /// Promo code to apply.
    pub promo_code: Option<String>,
}

impl Command for StartCheckout {
    fn command_type(&self) -> &'static str {
        "checkout.start"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn actor_id(&self) -> Option<Uuid> {
        Some(self.user_id)
    }
}

/// Command to fulfill a paid checkout session.
#[derive(Debug, Clone)]
pub struct ProcessPurchase {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Checkout session id.
    pub session_id: String,
    /// Decoded session metadata.
    pub metadata: PurchaseMetadata,
}

impl Command for ProcessPurchase {
    fn command_type(&self) -> &'static str {
        "purchase.process"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
