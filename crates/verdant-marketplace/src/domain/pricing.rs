//! Seat pricing and revenue distribution.

use serde::{Deserialize, Serialize};
use verdant_core::error::DomainError;

/// Corporate buyers pay the module price once per pack of this many
/// employees (rounded up).
pub const EMPLOYEES_PER_PACK: i64 = 50;

/// Largest seat count a single cart line may carry.
pub const MAX_SEATS: i64 = 100_000;

/// Checks a requested seat count against `1..=MAX_SEATS`.
///
/// # Errors
///
/// Returns `DomainError::Validation` outside that range.
pub fn validate_seats(employee_count: i64) -> Result<(), DomainError> {
    if employee_count < 1 {
        return Err(DomainError::validation(
            "El número de empleados debe ser al menos 1",
        ));
    }
    if employee_count > MAX_SEATS {
        return Err(DomainError::Validation(format!(
            "El número de empleados no puede superar {MAX_SEATS}"
        )));
    }
    Ok(())
}

/// Number of packs a purchase for `employee_count` seats is billed as.
/// Individual purchases (and zero or negative counts) bill one pack.
#[must_use]
pub fn packs_for(employee_count: i64) -> i64 {
    if employee_count <= EMPLOYEES_PER_PACK {
        1
    } else {
        (employee_count - 1) / EMPLOYEES_PER_PACK + 1
    }
}

/// Line price for a module bought for `employee_count` seats.
///
/// # Errors
///
/// Returns `DomainError::Validation` if the price does not fit in minor
/// units.
pub fn line_price(
    price_cents: i64,
    employee_count: i64,
    corporate: bool,
) -> Result<i64, DomainError> {
    if !corporate {
        return Ok(price_cents);
    }
    price_cents
        .checked_mul(packs_for(employee_count))
        .ok_or_else(|| DomainError::validation("El importe de la compra es demasiado alto"))
}

/// How a sale is split between the authoring community, the creator, and the
/// platform. Amounts are in minor units and always add up to the sale total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenueSplit {
    /// Share credited to the authoring community.
    pub community_cents: i64,
    /// Share credited to the creator.
    pub creator_cents: i64,
    /// Platform share, including rounding remainders.
    pub platform_cents: i64,
}

impl RevenueSplit {
    /// Splits a sale. Community modules pay 50% to the community and 30% to
    /// the creator; platform modules keep everything.
    #[must_use]
    pub fn for_sale(total_cents: i64, community_module: bool) -> Self {
        if !community_module {
            return Self {
                community_cents: 0,
                creator_cents: 0,
                platform_cents: total_cents,
            };
        }
        let community_cents = total_cents * 50 / 100;
        let creator_cents = total_cents * 30 / 100;
        Self {
            community_cents,
            creator_cents,
            platform_cents: total_cents - community_cents - creator_cents,
        }
    }
}
