//! Command handlers for module authoring, admin review, and the cart.

use tracing::{info, warn};
use uuid::Uuid;
use verdant_community::domain::repository::CommunityRepository;
use verdant_core::clock::Clock;
use verdant_core::command::Command;
use verdant_core::error::DomainError;
use verdant_core::profile::{ProfileRepository, require_platform_admin, require_profile};
use verdant_notifications::{Mailer, templates};

use crate::domain::cart::CartItem;
use crate::domain::commands::{
    AddLesson, AddToCart, CreateModule, RemoveFromCart, ReviewModule, SubmitModule,
};
use crate::domain::module::{Lesson, MarketplaceModule, ModuleStatus, ReviewAction};
use crate::domain::pricing::{line_price, validate_seats};
use crate::domain::repository::{CartRepository, ModuleRepository, PurchaseRepository};

/// Handles the `CreateModule` command.
///
/// Community modules may be created by the community's founder or admins;
/// platform modules (no community) only by platform administrators.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the community does not exist,
/// `DomainError::Forbidden` if the caller may not author for it, and
/// `DomainError::Validation` for invalid module fields.
pub async fn handle_create_module(
    command: &CreateModule,
    clock: &dyn Clock,
    communities: &dyn CommunityRepository,
    profiles: &dyn ProfileRepository,
    repo: &dyn ModuleRepository,
) -> Result<MarketplaceModule, DomainError> {
    match command.community_id {
        Some(community_id) => {
            if communities.find_community(community_id).await?.is_none() {
                return Err(DomainError::not_found("community", community_id));
            }
            let can_manage = communities
                .find_member(community_id, command.user_id)
                .await?
                .is_some_and(|m| m.role.can_manage());
            if !can_manage {
                return Err(DomainError::Forbidden(
                    "Solo fundadores y administradores de la comunidad pueden crear módulos"
                        .to_owned(),
                ));
            }
        }
        None => {
            require_platform_admin(command.user_id, profiles).await?;
        }
    }

    let module = MarketplaceModule::new_draft(
        Uuid::new_v4(),
        command.community_id,
        command.user_id,
        &command.title,
        &command.description,
        &command.core_value,
        command.price_cents,
        clock.now(),
    )?;
    repo.insert_module(&module).await?;

    info!(
        command = command.command_type(),
        correlation_id = %command.correlation_id(),
        actor = ?command.actor_id(),
        module_id = %module.id,
        "module draft created"
    );

    Ok(module)
}

async fn load_own_module(
    module_id: Uuid,
    user_id: Uuid,
    repo: &dyn ModuleRepository,
) -> Result<MarketplaceModule, DomainError> {
    let module = repo
        .find_module(module_id)
        .await?
        .ok_or_else(|| DomainError::not_found("module", module_id))?;
    if module.creator_user_id != user_id {
        return Err(DomainError::Forbidden(
            "Solo el creador puede modificar este módulo".to_owned(),
        ));
    }
    Ok(module)
}

/// Handles the `AddLesson` command: appends a lesson at the next position.
///
/// # Errors
///
/// Returns `DomainError::NotFound`, `DomainError::Forbidden` for anyone but
/// the creator, and `DomainError::Validation` if the module is not a draft
/// or the lesson is invalid.
pub async fn handle_add_lesson(
    command: &AddLesson,
    repo: &dyn ModuleRepository,
) -> Result<Lesson, DomainError> {
    let module = load_own_module(command.module_id, command.user_id, repo).await?;
    module.ensure_editable()?;

    let existing = repo.list_lessons(module.id).await?;
    let next_order = existing
        .iter()
        .map(|l| l.lesson_order)
        .max()
        .unwrap_or(0)
        + 1;

    let lesson = Lesson::new(
        Uuid::new_v4(),
        module.id,
        next_order,
        &command.title,
        &command.content,
        command.xp_reward,
        &command.activity_type,
        command.activity_config.clone(),
    )?;
    repo.insert_lesson(&lesson).await?;

    info!(
        command = command.command_type(),
        correlation_id = %command.correlation_id(),
        actor = ?command.actor_id(),
        module_id = %module.id,
        lesson_id = %lesson.id,
        lesson_order = lesson.lesson_order,
        "lesson added"
    );

    Ok(lesson)
}

/// Handles the `SubmitModule` command (`draft → review`).
///
/// # Errors
///
/// Returns `DomainError::NotFound`, `DomainError::Forbidden` for anyone but
/// the creator, and `DomainError::Validation` if the module cannot be
/// submitted.
pub async fn handle_submit_module(
    command: &SubmitModule,
    clock: &dyn Clock,
    repo: &dyn ModuleRepository,
) -> Result<MarketplaceModule, DomainError> {
    let mut module = load_own_module(command.module_id, command.user_id, repo).await?;
    let lessons = repo.list_lessons(module.id).await?;
    module.submit_for_review(lessons.len(), clock.now())?;
    repo.update_module(&module).await?;

    info!(
        command = command.command_type(),
        correlation_id = %command.correlation_id(),
        actor = ?command.actor_id(),
        module_id = %module.id,
        "module submitted for review"
    );

    Ok(module)
}

/// Handles the `ReviewModule` command and notifies the creator.
///
/// The notification is best-effort: a delivery failure is logged and the
/// review still succeeds.
///
/// # Errors
///
/// Returns `DomainError::Unauthorized`/`Forbidden` unless the reviewer is a
/// platform admin, `DomainError::NotFound` for an unknown module, and
/// `DomainError::Validation` for an invalid transition.
pub async fn handle_review_module(
    command: &ReviewModule,
    clock: &dyn Clock,
    profiles: &dyn ProfileRepository,
    repo: &dyn ModuleRepository,
    mailer: &dyn Mailer,
    base_url: &str,
) -> Result<MarketplaceModule, DomainError> {
    require_platform_admin(command.reviewer_id, profiles).await?;

    let mut module = repo
        .find_module(command.module_id)
        .await?
        .ok_or_else(|| DomainError::not_found("module", command.module_id))?;
    module.apply_review(command.action, command.notes.as_deref(), clock.now())?;
    repo.update_module(&module).await?;

    info!(
        command = command.command_type(),
        correlation_id = %command.correlation_id(),
        actor = ?command.actor_id(),
        module_id = %module.id,
        status = %module.status,
        "module reviewed"
    );

    notify_creator(&module, command.action, profiles, mailer, base_url).await;

    Ok(module)
}

async fn notify_creator(
    module: &MarketplaceModule,
    action: ReviewAction,
    profiles: &dyn ProfileRepository,
    mailer: &dyn Mailer,
    base_url: &str,
) {
    let creator = match profiles.find_profile(module.creator_user_id).await {
        Ok(Some(creator)) => creator,
        Ok(None) => {
            warn!(module_id = %module.id, "module creator has no profile, skipping review email");
            return;
        }
        Err(e) => {
            warn!(module_id = %module.id, error = %e, "failed to load module creator");
            return;
        }
    };

    let email = match action {
        ReviewAction::Approve => templates::module_approved(
            &creator.email,
            &creator.full_name,
            &module.title,
            &format!("{base_url}/marketplace/{}", module.id),
        ),
        ReviewAction::Reject => templates::module_rejected(
            &creator.email,
            &creator.full_name,
            &module.title,
            module.review_notes.as_deref().unwrap_or_default(),
        ),
    };
    if let Err(e) = mailer.send(&email).await {
        warn!(module_id = %module.id, error = %e, "failed to send review email");
    }
}

/// Handles the `AddToCart` command.
///
/// Individual buyers always buy one seat. Corporate admins buy
/// `employee_count` seats, defaulting to the size of their account. Adding a
/// module already in the cart updates its seats and price.
///
/// # Errors
///
/// Returns `DomainError::NotFound` for an unknown module,
/// `DomainError::Validation` if it is not published or the seat count is
/// invalid, and `DomainError::Conflict` if an individual buyer is already
/// enrolled.
pub async fn handle_add_to_cart(
    command: &AddToCart,
    clock: &dyn Clock,
    profiles: &dyn ProfileRepository,
    modules: &dyn ModuleRepository,
    purchases: &dyn PurchaseRepository,
    carts: &dyn CartRepository,
) -> Result<CartItem, DomainError> {
    let buyer = require_profile(command.user_id, profiles).await?;
    let module = modules
        .find_module(command.module_id)
        .await?
        .ok_or_else(|| DomainError::not_found("module", command.module_id))?;
    if module.status != ModuleStatus::Published {
        return Err(DomainError::validation(
            "El módulo no está disponible para la venta",
        ));
    }

    let (employee_count, corporate) = match buyer.administered_account() {
        Some(account_id) => {
            let count = match command.employee_count {
                Some(count) => count,
                None => i64::try_from(profiles.list_account_members(account_id).await?.len())
                    .unwrap_or(i64::MAX),
            };
            validate_seats(count)?;
            (count, true)
        }
        None => {
            let enrolled = purchases
                .existing_enrollees(module.id, &[buyer.id])
                .await?;
            if !enrolled.is_empty() {
                return Err(DomainError::Conflict(
                    "Ya estás inscrito en este módulo".to_owned(),
                ));
            }
            (1, false)
        }
    };

    let item = CartItem {
        id: Uuid::new_v4(),
        user_id: buyer.id,
        module_id: module.id,
        employee_count,
        price_snapshot_cents: line_price(module.price_cents, employee_count, corporate)?,
        added_at: clock.now(),
    };
    carts.upsert_cart_item(&item).await?;

    info!(
        command = command.command_type(),
        correlation_id = %command.correlation_id(),
        actor = ?command.actor_id(),
        module_id = %module.id,
        employee_count,
        price_cents = item.price_snapshot_cents,
        "module added to cart"
    );

    Ok(item)
}

/// Handles the `RemoveFromCart` command.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the module is not in the cart.
pub async fn handle_remove_from_cart(
    command: &RemoveFromCart,
    carts: &dyn CartRepository,
) -> Result<(), DomainError> {
    if !carts
        .remove_cart_item(command.user_id, command.module_id)
        .await?
    {
        return Err(DomainError::not_found("cart item", command.module_id));
    }

    info!(
        command = command.command_type(),
        correlation_id = %command.correlation_id(),
        actor = ?command.actor_id(),
        module_id = %command.module_id,
        "module removed from cart"
    );

    Ok(())
}
