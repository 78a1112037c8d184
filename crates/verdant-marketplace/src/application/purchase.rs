//! Fulfillment of paid checkout sessions.
//!
//! Each purchased line is fulfilled atomically (revenue distribution plus
//! enrollments) and is skipped when every enrollee already holds an
//! enrollment, so a redelivered webhook never distributes revenue twice.
//! Promo tracking, cart clearing and the confirmation email run afterwards
//! and never fail the purchase.

use tracing::{error, info, warn};
use uuid::Uuid;
use verdant_core::clock::Clock;
use verdant_core::command::Command;
use verdant_core::error::DomainError;
use verdant_core::profile::ProfileRepository;
use verdant_core::purchase::PurchaseType;
use verdant_notifications::{Mailer, templates};

use crate::domain::commands::ProcessPurchase;
use crate::domain::purchase::{
    ItemFulfillment, NewEnrollment, PromoCodeUse, PurchaseMetadata, PurchaseOutcome,
};
use crate::domain::repository::{
    CartRepository, ModuleRepository, PromoCodeRepository, PurchaseRepository,
};

/// Collaborators needed to fulfill a purchase.
pub struct PurchaseContext<'a> {
    /// Time source.
    pub clock: &'a dyn Clock,
    /// Profiles, to resolve corporate employees and the buyer.
    pub profiles: &'a dyn ProfileRepository,
    /// Enrollment and revenue persistence.
    pub purchases: &'a dyn PurchaseRepository,
    /// Promo code tracking.
    pub promos: &'a dyn PromoCodeRepository,
    /// Carts to clear.
    pub carts: &'a dyn CartRepository,
    /// Module titles for the confirmation email.
    pub modules: &'a dyn ModuleRepository,
    /// Email delivery.
    pub mailer: &'a dyn Mailer,
    /// Public base URL used in emails.
    pub base_url: &'a str,
}

/// Resolves who gets enrolled. Corporate purchases enroll every profile of
/// the account; an account without profiles falls back to the buyer.
async fn resolve_enrollees(
    metadata: &PurchaseMetadata,
    profiles: &dyn ProfileRepository,
) -> Result<Vec<Uuid>, DomainError> {
    match (metadata.purchase_type, metadata.corporate_account_id) {
        (PurchaseType::Corporate, Some(account_id)) => {
            let members: Vec<Uuid> = profiles
                .list_account_members(account_id)
                .await?
                .into_iter()
                .map(|p| p.id)
                .collect();
            if members.is_empty() {
                warn!(
                    corporate_account_id = %account_id,
                    "corporate account has no profiles, enrolling the buyer"
                );
                Ok(vec![metadata.user_id])
            } else {
                Ok(members)
            }
        }
        _ => Ok(vec![metadata.user_id]),
    }
}

/// Handles the `ProcessPurchase` command.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if resolving enrollees or fulfilling
/// any line fails. Lines fulfilled before the failure stay fulfilled and are
/// skipped when the webhook is redelivered.
pub async fn handle_process_purchase(
    command: &ProcessPurchase,
    ctx: &PurchaseContext<'_>,
) -> Result<PurchaseOutcome, DomainError> {
    let metadata = &command.metadata;
    let now = ctx.clock.now();
    let enrollees = resolve_enrollees(metadata, ctx.profiles).await?;

    let mut outcome = PurchaseOutcome::default();
    let mut fulfilled_modules = Vec::new();

    for item in &metadata.cart_items {
        let existing = ctx
            .purchases
            .existing_enrollees(item.module_id, &enrollees)
            .await?;
        let remaining: Vec<Uuid> = enrollees
            .iter()
            .copied()
            .filter(|id| !existing.contains(id))
            .collect();

        if remaining.is_empty() {
            info!(
                correlation_id = %command.correlation_id(),
                module_id = %item.module_id,
                "line already fulfilled, skipping"
            );
            outcome.items_skipped += 1;
            continue;
        }

        let seats = i64::try_from(enrollees.len()).unwrap_or(i64::MAX).max(1);
        let enrollments = remaining
            .iter()
            .map(|&user_id| NewEnrollment {
                id: Uuid::new_v4(),
                user_id,
                module_id: item.module_id,
                corporate_account_id: metadata.corporate_account_id,
                purchase_type: metadata.purchase_type,
                price_paid_cents: item.price_cents / seats,
                purchased_at: now,
            })
            .collect();
        let fulfillment = ItemFulfillment {
            module_id: item.module_id,
            buyer_id: metadata.user_id,
            amount_cents: item.price_cents,
            enrollments,
        };

        let created = ctx.purchases.fulfill_item(&fulfillment).await.map_err(|e| {
            error!(
                correlation_id = %command.correlation_id(),
                session_id = %command.session_id,
                module_id = %item.module_id,
                error = %e,
                "failed to fulfill purchased line"
            );
            e
        })?;

        if created == 0 {
            info!(
                correlation_id = %command.correlation_id(),
                module_id = %item.module_id,
                "line fulfilled by a concurrent delivery, skipping"
            );
            outcome.items_skipped += 1;
            continue;
        }

        info!(
            correlation_id = %command.correlation_id(),
            module_id = %item.module_id,
            enrollments_created = created,
            amount_cents = item.price_cents,
            "line fulfilled"
        );
        outcome.items_fulfilled += 1;
        outcome.enrollments_created += created;
        fulfilled_modules.push(item.module_id);
    }

    if outcome.items_fulfilled > 0 {
        outcome.promo_codes_recorded = record_promo_codes(command, ctx).await;
    }

    match ctx.carts.clear_cart(metadata.user_id).await {
        Ok(()) => outcome.cart_cleared = true,
        Err(e) => warn!(user_id = %metadata.user_id, error = %e, "failed to clear cart"),
    }

    if !fulfilled_modules.is_empty() {
        send_confirmation(metadata.user_id, &fulfilled_modules, outcome, ctx).await;
    }

    info!(
        command = command.command_type(),
        correlation_id = %command.correlation_id(),
        actor = ?command.actor_id(),
        session_id = %command.session_id,
        items_fulfilled = outcome.items_fulfilled,
        items_skipped = outcome.items_skipped,
        enrollments_created = outcome.enrollments_created,
        "purchase processed"
    );

    Ok(outcome)
}

/// Records one redemption per code, splitting the discount evenly with the
/// remainder on the last code. Returns how many were recorded.
async fn record_promo_codes(command: &ProcessPurchase, ctx: &PurchaseContext<'_>) -> u32 {
    let metadata = &command.metadata;
    let codes = &metadata.promo_codes;
    if codes.is_empty() {
        return 0;
    }

    let count = i64::try_from(codes.len()).unwrap_or(i64::MAX);
    let share = metadata.discount_amount_cents / count;
    let mut recorded = 0;
    for (i, code) in codes.iter().enumerate() {
        let discount_cents = if i + 1 == codes.len() {
            metadata.discount_amount_cents - share * (count - 1)
        } else {
            share
        };
        let redemption = PromoCodeUse {
            code: code.clone(),
            user_id: metadata.user_id,
            stripe_session_id: command.session_id.clone(),
            discount_cents,
            used_at: ctx.clock.now(),
        };
        match ctx.promos.record_promo_use(&redemption).await {
            Ok(()) => recorded += 1,
            Err(e) => warn!(code = %code, error = %e, "failed to record promo code use"),
        }
    }
    recorded
}

async fn send_confirmation(
    buyer_id: Uuid,
    module_ids: &[Uuid],
    outcome: PurchaseOutcome,
    ctx: &PurchaseContext<'_>,
) {
    let buyer = match ctx.profiles.find_profile(buyer_id).await {
        Ok(Some(buyer)) => buyer,
        Ok(None) => {
            warn!(user_id = %buyer_id, "buyer has no profile, skipping confirmation email");
            return;
        }
        Err(e) => {
            warn!(user_id = %buyer_id, error = %e, "failed to load buyer for confirmation email");
            return;
        }
    };

    let mut titles = Vec::with_capacity(module_ids.len());
    for &module_id in module_ids {
        match ctx.modules.find_module(module_id).await {
            Ok(Some(module)) => titles.push(module.title),
            Ok(None) => titles.push(module_id.to_string()),
            Err(e) => {
                warn!(module_id = %module_id, error = %e, "failed to load module title");
                titles.push(module_id.to_string());
            }
        }
    }

    let email = templates::purchase_confirmation(
        &buyer.email,
        &buyer.full_name,
        &titles,
        outcome.enrollments_created,
        &format!("{}/dashboard", ctx.base_url),
    );
    if let Err(e) = ctx.mailer.send(&email).await {
        warn!(user_id = %buyer_id, error = %e, "failed to send purchase confirmation");
    }
}
