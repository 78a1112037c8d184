//! Checkout session metadata and the purchase fulfillment model.
//!
//! Checkout sessions carry everything fulfillment needs in their metadata,
//! encoded as flat string pairs:
//!
//! | key | value |
//! |---|---|
//! | `purchase_type` | `individual` or `corporate` |
//! | `user_id` | buyer profile id |
//! | `corporate_account_id` | required for corporate purchases |
//! | `cart_items` | JSON array of `{module_id, employee_count, price}` |
//! | `promo_codes` | JSON array or comma-separated list (optional) |
//! | `total_amount` | minor units (optional) |
//! | `discount_amount` | minor units (optional) |

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use verdant_core::error::DomainError;
use verdant_core::purchase::PurchaseType;

/// One purchased cart line as carried in session metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchasedItem {
    /// Module bought.
    pub module_id: Uuid,
    /// Seats covered.
    #[serde(default = "default_employee_count")]
    pub employee_count: i64,
    /// Amount charged for this line, in minor units.
    #[serde(rename = "price")]
    pub price_cents: i64,
}

const fn default_employee_count() -> i64 {
    1
}

/// Decoded checkout session metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseMetadata {
    /// Individual or corporate purchase.
    pub purchase_type: PurchaseType,
    /// Buyer profile id.
    pub user_id: Uuid,
    /// Purchasing corporate account.
    pub corporate_account_id: Option<Uuid>,
    /// Purchased lines; never empty.
    pub cart_items: Vec<PurchasedItem>,
    /// Promo codes applied at checkout.
    pub promo_codes: Vec<String>,
    /// Total charged, in minor units.
    pub total_amount_cents: i64,
    /// Discount granted, in minor units.
    pub discount_amount_cents: i64,
}

impl PurchaseMetadata {
    /// Decodes session metadata.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` naming the first missing or
    /// malformed field.
    pub fn from_session_metadata(metadata: &HashMap<String, String>) -> Result<Self, DomainError> {
        let purchase_type: PurchaseType = required(metadata, "purchase_type")?.parse()?;
        let user_id = parse_uuid(required(metadata, "user_id")?, "user_id")?;

        let corporate_account_id = match optional(metadata, "corporate_account_id") {
            Some(raw) => Some(parse_uuid(raw, "corporate_account_id")?),
            None => None,
        };
        if purchase_type == PurchaseType::Corporate && corporate_account_id.is_none() {
            return Err(malformed("corporate_account_id"));
        }

        let cart_items: Vec<PurchasedItem> =
            serde_json::from_str(required(metadata, "cart_items")?)
                .map_err(|_| malformed("cart_items"))?;
        if cart_items.is_empty() {
            return Err(malformed("cart_items"));
        }
        if cart_items
            .iter()
            .any(|item| item.price_cents < 0 || item.employee_count < 1)
        {
            return Err(malformed("cart_items"));
        }

        let promo_codes = optional(metadata, "promo_codes")
            .map(parse_promo_codes)
            .transpose()?
            .unwrap_or_default();

        let total_amount_cents = match optional(metadata, "total_amount") {
            Some(raw) => parse_amount(raw, "total_amount")?,
            None => cart_items.iter().map(|item| item.price_cents).sum(),
        };
        let discount_amount_cents = match optional(metadata, "discount_amount") {
            Some(raw) => parse_amount(raw, "discount_amount")?,
            None => 0,
        };

        Ok(Self {
            purchase_type,
            user_id,
            corporate_account_id,
            cart_items,
            promo_codes,
            total_amount_cents,
            discount_amount_cents,
        })
    }

    /// Encodes the metadata for a new checkout session.
    #[must_use]
    pub fn to_session_metadata(&self) -> BTreeMap<String, String> {
        let mut metadata = BTreeMap::new();
        metadata.insert(
            "purchase_type".to_owned(),
            self.purchase_type.as_str().to_owned(),
        );
        metadata.insert("user_id".to_owned(), self.user_id.to_string());
        if let Some(account_id) = self.corporate_account_id {
            metadata.insert("corporate_account_id".to_owned(), account_id.to_string());
        }
        metadata.insert(
            "cart_items".to_owned(),
            serde_json::to_string(&self.cart_items).unwrap_or_else(|_| "[]".to_owned()),
        );
        if !self.promo_codes.is_empty() {
            metadata.insert("promo_codes".to_owned(), self.promo_codes.join(","));
        }
        metadata.insert(
            "total_amount".to_owned(),
            self.total_amount_cents.to_string(),
        );
        metadata.insert(
            "discount_amount".to_owned(),
            self.discount_amount_cents.to_string(),
        );
        metadata
    }
}

fn required<'a>(metadata: &'a HashMap<String, String>, key: &str) -> Result<&'a str, DomainError> {
    optional(metadata, key).ok_or_else(|| {
        DomainError::validation(format!("Falta el campo de metadatos: {key}"))
    })
}

fn optional<'a>(metadata: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    metadata
        .get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}

fn malformed(key: &str) -> DomainError {
    DomainError::validation(format!("Campo de metadatos inválido: {key}"))
}

fn parse_uuid(raw: &str, key: &str) -> Result<Uuid, DomainError> {
    Uuid::parse_str(raw).map_err(|_| malformed(key))
}

fn parse_amount(raw: &str, key: &str) -> Result<i64, DomainError> {
    raw.parse::<i64>()
        .ok()
        .filter(|v| *v >= 0)
        .ok_or_else(|| malformed(key))
}

fn parse_promo_codes(raw: &str) -> Result<Vec<String>, DomainError> {
    let codes: Vec<String> = if raw.starts_with('[') {
        serde_json::from_str(raw).map_err(|_| malformed("promo_codes"))?
    } else {
        raw.split(',').map(str::to_owned).collect()
    };
    Ok(codes
        .into_iter()
        .map(|c| c.trim().to_uppercase())
        .filter(|c| !c.is_empty())
        .collect())
}

/// An enrollment row to insert during fulfillment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewEnrollment {
    /// New enrollment id.
    pub id: Uuid,
    /// Enrolled learner.
    pub user_id: Uuid,
    /// Module enrolled in.
    pub module_id: Uuid,
    /// Paying corporate account, if any.
    pub corporate_account_id: Option<Uuid>,
    /// Individual or corporate.
    pub purchase_type: PurchaseType,
    /// Amount attributed to this seat, in minor units.
    pub price_paid_cents: i64,
    /// Purchase timestamp.
    pub purchased_at: DateTime<Utc>,
}

/// Everything that must happen atomically for one purchased cart line:
/// one enrollment per enrollee plus revenue distribution for the sale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFulfillment {
    /// Module sold.
    pub module_id: Uuid,
    /// Buyer credited with the sale.
    pub buyer_id: Uuid,
    /// Sale amount, in minor units.
    pub amount_cents: i64,
    /// Enrollments to create; existing ones are skipped by the store.
    pub enrollments: Vec<NewEnrollment>,
}

/// A promo code redemption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromoCodeUse {
    /// Code redeemed (normalized).
    pub code: String,
    /// Buyer.
    pub user_id: Uuid,
    /// Checkout session that redeemed it.
    pub stripe_session_id: String,
    /// Discount granted, in minor units.
    pub discount_cents: i64,
    /// Redemption time.
    pub used_at: DateTime<Utc>,
}

/// Summary of a processed purchase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PurchaseOutcome {
    /// Cart lines fulfilled by this call.
    pub items_fulfilled: u32,
    /// Cart lines already fulfilled earlier.
    pub items_skipped: u32,
    /// Enrollment rows inserted.
    pub enrollments_created: u64,
    /// Promo code redemptions recorded.
    pub promo_codes_recorded: u32,
    /// Whether the buyer's cart was cleared.
    pub cart_cleared: bool,
}

/// Spreads `discount_cents` across line prices proportionally, putting the
/// rounding remainder on the last line. Returns the discounted line prices.
#[must_use]
pub fn allocate_discount(prices: &[i64], discount_cents: i64) -> Vec<i64> {
    let subtotal: i64 = prices.iter().sum();
    if subtotal <= 0 || discount_cents <= 0 {
        return prices.to_vec();
    }
    let discount = discount_cents.min(subtotal);

    let mut allocated = 0;
    let mut result = Vec::with_capacity(prices.len());
    for (i, &price) in prices.iter().enumerate() {
        let share = if i + 1 == prices.len() {
            discount - allocated
        } else {
            let share = i64::try_from(i128::from(price) * i128::from(discount) / i128::from(subtotal))
                .unwrap_or(price);
            allocated += share;
            share
        };
        result.push((price - share).max(0));
    }
    result
}
