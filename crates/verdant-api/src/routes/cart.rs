//! Routes for the cart, promo codes and checkout.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;
use verdant_marketplace::application::checkout::{self, CheckoutContext};
use verdant_marketplace::application::{command_handlers, query_handlers};
use verdant_marketplace::domain::cart::{CartItem, CartView, PromoQuote};
use verdant_marketplace::domain::commands::{
    AddToCart, ApplyPromoCode, RemoveFromCart, StartCheckout,
};
use verdant_marketplace::domain::repository::CheckoutSession;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /cart/items.
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    /// Module to buy.
    pub module_id: Uuid,
    /// Seats, for corporate buyers.
    pub employee_count: Option<i64>,
}

/// Request body for POST /cart/promo.
#[derive(Debug, Deserialize)]
pub struct PromoRequest {
    /// Promo code as typed.
    pub code: String,
}

/// Request body for POST /checkout.
#[derive(Debug, Default, Deserialize)]
pub struct StartCheckoutRequest {
    /// Promo code to apply.
    pub promo_code: Option<String>,
}

/// GET /cart
#[instrument(skip(state), fields(user_id = %user.user_id))]
async fn get_cart(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<CartView>, ApiError> {
    let cart = query_handlers::get_cart(user.user_id, &*state.carts, &*state.modules).await?;
    Ok(Json(cart))
}

/// POST /cart/items
#[instrument(skip(state, request), fields(user_id = %user.user_id, module_id = %request.module_id))]
async fn add_item(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<AddItemRequest>,
) -> Result<(StatusCode, Json<CartItem>), ApiError> {
    let command = AddToCart {
        correlation_id: Uuid::new_v4(),
        user_id: user.user_id,
        module_id: request.module_id,
        employee_count: request.employee_count,
    };
    let item = command_handlers::handle_add_to_cart(
        &command,
        state.clock.as_ref(),
        &*state.profiles,
        &*state.modules,
        &*state.purchases,
        &*state.carts,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// DELETE /cart/items/{module_id}
#[instrument(skip(state), fields(user_id = %user.user_id))]
async fn remove_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(module_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let command = RemoveFromCart {
        correlation_id: Uuid::new_v4(),
        user_id: user.user_id,
        module_id,
    };
    command_handlers::handle_remove_from_cart(&command, &*state.carts).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /cart/promo
#[instrument(skip(state, request), fields(user_id = %user.user_id))]
async fn apply_promo(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<PromoRequest>,
) -> Result<Json<PromoQuote>, ApiError> {
    let command = ApplyPromoCode {
        correlation_id: Uuid::new_v4(),
        user_id: user.user_id,
        code: request.code,
    };
    let quote = checkout::handle_apply_promo_code(
        &command,
        state.clock.as_ref(),
        &*state.modules,
        &*state.carts,
        &*state.promos,
    )
    .await?;
    Ok(Json(quote))
}

/// POST /checkout
#[instrument(skip(state, request), fields(user_id = %user.user_id))]
async fn start_checkout(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<StartCheckoutRequest>,
) -> Result<Json<CheckoutSession>, ApiError> {
    let command = StartCheckout {
        correlation_id: Uuid::new_v4(),
        user_id: user.user_id,
        promo_code: request.promo_code,
    };
    let ctx = CheckoutContext {
        clock: state.clock.as_ref(),
        profiles: &*state.profiles,
        modules: &*state.modules,
        carts: &*state.carts,
        promos: &*state.promos,
        gateway: &*state.gateway,
        base_url: &state.settings.base_url,
    };
    let session = checkout::handle_start_checkout(&command, &ctx).await?;
    Ok(Json(session))
}

/// Returns the router for cart and checkout endpoints.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/cart", get(get_cart))
        .route("/cart/items", post(add_item))
        .route("/cart/items/{module_id}", delete(remove_item))
        .route("/cart/promo", post(apply_promo))
        .route("/checkout", post(start_checkout))
}
