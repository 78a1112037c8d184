//! Shopping cart.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One module in a buyer's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Cart item identifier.
    pub id: Uuid,
    /// Buyer.
    pub user_id: Uuid,
    /// Module being bought.
    pub module_id: Uuid,
    /// Seats covered by the purchase (1 for individuals).
    pub employee_count: i64,
    /// Line price at the time the item was added, in minor units.
    pub price_snapshot_cents: i64,
    /// When the item was added or last updated.
    pub added_at: DateTime<Utc>,
}

/// A cart item joined with the module it refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartLine {
    /// The stored cart item.
    #[serde(flatten)]
    pub item: CartItem,
    /// Module title for display and checkout line items.
    pub module_title: String,
}

/// The buyer's cart with its subtotal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartView {
    /// Lines, oldest first.
    pub items: Vec<CartLine>,
    /// Sum of line prices, in minor units.
    pub subtotal_cents: i64,
}

impl CartView {
    /// Builds the view and computes the subtotal.
    #[must_use]
    pub fn new(items: Vec<CartLine>) -> Self {
        let subtotal_cents = items.iter().map(|l| l.item.price_snapshot_cents).sum();
        Self {
            items,
            subtotal_cents,
        }
    }

    /// Whether the cart has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Result of applying a promo code to the current cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromoQuote {
    /// Normalized code.
    pub code: String,
    /// Discount granted, in minor units.
    pub discount_cents: i64,
    /// Subtotal minus discount, in minor units.
    pub total_cents: i64,
}
