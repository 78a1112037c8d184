//! Persistence and payment-gateway contracts for the Marketplace context.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;
use verdant_core::core_value::CoreValue;
use verdant_core::error::DomainError;

use super::cart::CartItem;
use super::module::{Lesson, MarketplaceModule, ModuleStatus};
use super::promo::PromoCode;
use super::purchase::{ItemFulfillment, PromoCodeUse};

/// Repository for modules and their lessons.
#[async_trait]
pub trait ModuleRepository: Send + Sync {
    /// Loads a module by id.
    async fn find_module(&self, id: Uuid) -> Result<Option<MarketplaceModule>, DomainError>;

    /// Lists modules in a status, newest first, optionally by core value.
    async fn list_modules(
        &self,
        status: ModuleStatus,
        core_value: Option<CoreValue>,
    ) -> Result<Vec<MarketplaceModule>, DomainError>;

    /// Inserts a new module.
    async fn insert_module(&self, module: &MarketplaceModule) -> Result<(), DomainError>;

    /// Persists status, notes and timestamps of an existing module.
    async fn update_module(&self, module: &MarketplaceModule) -> Result<(), DomainError>;

    /// Lists a module's lessons in `lesson_order`.
    async fn list_lessons(&self, module_id: Uuid) -> Result<Vec<Lesson>, DomainError>;

    /// Inserts a lesson.
    async fn insert_lesson(&self, lesson: &Lesson) -> Result<(), DomainError>;
}

/// Repository for shopping carts.
#[async_trait]
pub trait CartRepository: Send + Sync {
    /// Lists a buyer's cart, oldest first.
    async fn list_cart(&self, user_id: Uuid) -> Result<Vec<CartItem>, DomainError>;

    /// Inserts an item or updates the seats and price of the existing
    /// (user, module) item.
    async fn upsert_cart_item(&self, item: &CartItem) -> Result<(), DomainError>;

    /// Removes one module from the cart. Returns whether a row was deleted.
    async fn remove_cart_item(&self, user_id: Uuid, module_id: Uuid) -> Result<bool, DomainError>;

    /// Empties the cart.
    async fn clear_cart(&self, user_id: Uuid) -> Result<(), DomainError>;
}

/// Repository for promo codes.
#[async_trait]
pub trait PromoCodeRepository: Send + Sync {
    /// Loads a promo code by its normalized code.
    async fn find_promo_code(&self, code: &str) -> Result<Option<PromoCode>, DomainError>;

    /// Records a redemption and increments `current_uses`.
    async fn record_promo_use(&self, redemption: &PromoCodeUse) -> Result<(), DomainError>;
}

/// Purchase fulfillment persistence.
#[async_trait]
pub trait PurchaseRepository: Send + Sync {
    /// Returns which of `user_ids` already hold an enrollment in the module.
    async fn existing_enrollees(
        &self,
        module_id: Uuid,
        user_ids: &[Uuid],
    ) -> Result<Vec<Uuid>, DomainError>;

    /// Atomically inserts the enrollments, skipping any (user, module) pair
    /// that already exists, and distributes revenue for the sale. When every
    /// pair already existed nothing is written, revenue included, and the
    /// result is zero. Returns the number of enrollments inserted.
    async fn fulfill_item(&self, fulfillment: &ItemFulfillment) -> Result<u64, DomainError>;
}

/// A line item of a hosted checkout session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutLineItem {
    /// Product name.
    pub name: String,
    /// Product description.
    pub description: String,
    /// Amount charged for the line, in minor units.
    pub amount_cents: i64,
}

/// Request for a hosted checkout session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutRequest {
    /// Email prefilled on the payment page.
    pub customer_email: String,
    /// Lines to charge.
    pub line_items: Vec<CheckoutLineItem>,
    /// Metadata echoed back in the completion webhook.
    pub metadata: BTreeMap<String, String>,
    /// Redirect after payment.
    pub success_url: String,
    /// Redirect when the buyer abandons checkout.
    pub cancel_url: String,
}

/// A created checkout session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutSession {
    /// Provider session id.
    pub session_id: String,
    /// Hosted payment page.
    pub url: String,
}

/// Payment provider that hosts checkout pages.
#[async_trait]
pub trait CheckoutGateway: Send + Sync {
    /// Creates a checkout session.
    async fn create_checkout_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, DomainError>;
}
