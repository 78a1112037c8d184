//! Promo codes and discount rules.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use verdant_core::error::DomainError;

/// How a promo code discounts the subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    /// `discount_value` is a percentage (1..=100).
    Percentage,
    /// `discount_value` is an amount in minor units.
    FixedAmount,
}

impl DiscountType {
    /// Database representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Percentage => "percentage",
            Self::FixedAmount => "fixed_amount",
        }
    }
}

impl FromStr for DiscountType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "percentage" => Ok(Self::Percentage),
            "fixed_amount" => Ok(Self::FixedAmount),
            other => Err(DomainError::infrastructure(format!(
                "unknown discount type: {other}"
            ))),
        }
    }
}

/// A promotional code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromoCode {
    /// Promo code identifier.
    pub id: Uuid,
    /// Upper-case code.
    pub code: String,
    /// Discount kind.
    pub discount_type: DiscountType,
    /// Percentage or minor units, depending on `discount_type`.
    pub discount_value: i64,
    /// Redemption cap.
    pub max_uses: Option<i64>,
    /// Redemptions so far.
    pub current_uses: i64,
    /// Start of validity.
    pub valid_from: Option<DateTime<Utc>>,
    /// End of validity.
    pub valid_until: Option<DateTime<Utc>>,
    /// Minimum subtotal required, in minor units.
    pub minimum_purchase_cents: i64,
    /// Whether the code can be redeemed at all.
    pub active: bool,
}

impl PromoCode {
    /// Computes the discount this code grants on `subtotal_cents` at `now`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` when the code is inactive, outside
    /// its validity window, exhausted, or the subtotal is below the minimum.
    pub fn discount_for(&self, subtotal_cents: i64, now: DateTime<Utc>) -> Result<i64, DomainError> {
        if !self.active {
            return Err(DomainError::validation("El código promocional no está activo"));
        }
        if self.valid_from.is_some_and(|from| now < from) {
            return Err(DomainError::validation(
                "El código promocional aún no es válido",
            ));
        }
        if self.valid_until.is_some_and(|until| now > until) {
            return Err(DomainError::validation("El código promocional expiró"));
        }
        if self.max_uses.is_some_and(|max| self.current_uses >= max) {
            return Err(DomainError::validation(
                "El código promocional alcanzó su límite de usos",
            ));
        }
        if subtotal_cents < self.minimum_purchase_cents {
            return Err(DomainError::validation(format!(
                "El código requiere una compra mínima de {}",
                format_cents(self.minimum_purchase_cents)
            )));
        }

        let discount = match self.discount_type {
            DiscountType::Percentage => {
                let pct = self.discount_value.clamp(0, 100);
                subtotal_cents * pct / 100
            }
            DiscountType::FixedAmount => self.discount_value.max(0),
        };
        Ok(discount.min(subtotal_cents))
    }
}

/// Normalizes user input into the stored code form.
#[must_use]
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Formats minor units as `$1,234.56`-style text for messages.
#[must_use]
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    let whole = (cents / 100).to_string();
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{sign}${grouped}.{:02}", cents % 100)
}
