//! Promo quotes and hosted checkout.

use tracing::info;
use verdant_core::clock::Clock;
use verdant_core::command::Command;
use verdant_core::error::DomainError;
use verdant_core::profile::{ProfileRepository, require_profile};
use verdant_core::purchase::PurchaseType;

use crate::application::query_handlers::get_cart;
use crate::domain::cart::{CartView, PromoQuote};
use crate::domain::commands::{ApplyPromoCode, StartCheckout};
use crate::domain::promo::normalize_code;
use crate::domain::purchase::{PurchaseMetadata, PurchasedItem, allocate_discount};
use crate::domain::repository::{
    CartRepository, CheckoutGateway, CheckoutLineItem, CheckoutRequest, CheckoutSession,
    ModuleRepository, PromoCodeRepository,
};

/// Collaborators needed to open a checkout session.
pub struct CheckoutContext<'a> {
    /// Time source.
    pub clock: &'a dyn Clock,
    /// Profiles, for the buyer and their corporate account.
    pub profiles: &'a dyn ProfileRepository,
    /// Module catalog.
    pub modules: &'a dyn ModuleRepository,
    /// Carts.
    pub carts: &'a dyn CartRepository,
    /// Promo codes.
    pub promos: &'a dyn PromoCodeRepository,
    /// Payment provider.
    pub gateway: &'a dyn CheckoutGateway,
    /// Public base URL used for redirects.
    pub base_url: &'a str,
}

async fn quote(
    code: &str,
    cart: &CartView,
    clock: &dyn Clock,
    promos: &dyn PromoCodeRepository,
) -> Result<PromoQuote, DomainError> {
    let code = normalize_code(code);
    let promo = promos
        .find_promo_code(&code)
        .await?
        .ok_or_else(|| DomainError::validation("Código promocional inválido"))?;
    let discount_cents = promo.discount_for(cart.subtotal_cents, clock.now())?;
    Ok(PromoQuote {
        code,
        discount_cents,
        total_cents: cart.subtotal_cents - discount_cents,
    })
}

/// Handles the `ApplyPromoCode` command: validates a code against the
/// current cart without redeeming it.
///
/// # Errors
///
/// Returns `DomainError::Validation` for an empty cart or an unusable code.
pub async fn handle_apply_promo_code(
    command: &ApplyPromoCode,
    clock: &dyn Clock,
    modules: &dyn ModuleRepository,
    carts: &dyn CartRepository,
    promos: &dyn PromoCodeRepository,
) -> Result<PromoQuote, DomainError> {
    let cart = get_cart(command.user_id, carts, modules).await?;
    if cart.is_empty() {
        return Err(DomainError::validation("El carrito está vacío"));
    }
    let quote = quote(&command.code, &cart, clock, promos).await?;

    info!(
        command = command.command_type(),
        correlation_id = %command.correlation_id(),
        actor = ?command.actor_id(),
        code = %quote.code,
        discount_cents = quote.discount_cents,
        "promo code quoted"
    );

    Ok(quote)
}

/// Handles the `StartCheckout` command.
///
/// One line item is created per cart line; a promo discount is spread over
/// the lines in proportion to their price. The session metadata carries
/// everything the completion webhook needs to fulfill the purchase.
///
/// # Errors
///
/// Returns `DomainError::Unauthorized` without a profile,
/// `DomainError::Validation` for an empty cart, an unusable promo code or a
/// zero total, and `DomainError::Infrastructure` if the gateway fails.
pub async fn handle_start_checkout(
    command: &StartCheckout,
    ctx: &CheckoutContext<'_>,
) -> Result<CheckoutSession, DomainError> {
    let buyer = require_profile(command.user_id, ctx.profiles).await?;
    let cart = get_cart(buyer.id, ctx.carts, ctx.modules).await?;
    if cart.is_empty() {
        return Err(DomainError::validation("El carrito está vacío"));
    }

    let promo = match command.promo_code.as_deref().map(str::trim) {
        Some(code) if !code.is_empty() => Some(quote(code, &cart, ctx.clock, ctx.promos).await?),
        _ => None,
    };
    let discount_cents = promo.as_ref().map_or(0, |q| q.discount_cents);
    let total_cents = cart.subtotal_cents - discount_cents;
    if total_cents <= 0 {
        return Err(DomainError::validation(
            "El total de la compra debe ser mayor a cero",
        ));
    }

    let prices: Vec<i64> = cart
        .items
        .iter()
        .map(|l| l.item.price_snapshot_cents)
        .collect();
    let charged = allocate_discount(&prices, discount_cents);

    let corporate_account_id = buyer.administered_account();
    let purchase_type = if corporate_account_id.is_some() {
        PurchaseType::Corporate
    } else {
        PurchaseType::Individual
    };

    let mut line_items = Vec::with_capacity(cart.items.len());
    let mut cart_items = Vec::with_capacity(cart.items.len());
    for (line, amount_cents) in cart.items.iter().zip(charged) {
        let description = match purchase_type {
            PurchaseType::Corporate => format!("{} empleados", line.item.employee_count),
            PurchaseType::Individual => "Acceso individual".to_owned(),
        };
        line_items.push(CheckoutLineItem {
            name: line.module_title.clone(),
            description,
            amount_cents,
        });
        cart_items.push(PurchasedItem {
            module_id: line.item.module_id,
            employee_count: line.item.employee_count,
            price_cents: amount_cents,
        });
    }

    let metadata = PurchaseMetadata {
        purchase_type,
        user_id: buyer.id,
        corporate_account_id,
        cart_items,
        promo_codes: promo.iter().map(|q| q.code.clone()).collect(),
        total_amount_cents: total_cents,
        discount_amount_cents: discount_cents,
    };

    let request = CheckoutRequest {
        customer_email: buyer.email.clone(),
        line_items,
        metadata: metadata.to_session_metadata(),
        success_url: format!(
            "{}/checkout/success?session_id={{CHECKOUT_SESSION_ID}}",
            ctx.base_url
        ),
        cancel_url: format!("{}/cart", ctx.base_url),
    };
    let session = ctx.gateway.create_checkout_session(&request).await?;

    info!(
        command = command.command_type(),
        correlation_id = %command.correlation_id(),
        actor = ?command.actor_id(),
        session_id = %session.session_id,
        purchase_type = %purchase_type,
        total_cents,
        discount_cents,
        "checkout session created"
    );

    Ok(session)
}
