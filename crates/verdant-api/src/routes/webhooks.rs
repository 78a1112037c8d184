//! Stripe webhook endpoint.
//!
//! Client errors (bad signature, undecodable body, malformed metadata) are
//! answered with 400 so Stripe stops retrying; fulfillment failures return
//! 500 so the event is redelivered.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;
use verdant_core::error::DomainError;
use verdant_marketplace::application::purchase::{PurchaseContext, handle_process_purchase};
use verdant_marketplace::domain::commands::ProcessPurchase;
use verdant_marketplace::domain::purchase::PurchaseMetadata;
use verdant_payments::{PaymentError, WebhookEvent, decode_event, verify_signature};

use crate::error::ApiError;
use crate::state::AppState;

/// Header carrying the webhook signature.
pub const SIGNATURE_HEADER: &str = "stripe-signature";

fn rejected(err: PaymentError) -> ApiError {
    warn!(error = %err, "rejected webhook");
    ApiError(DomainError::from(err))
}

/// POST /stripe
#[instrument(skip_all)]
async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or(PaymentError::MissingSignature)
        .map_err(rejected)?;
    verify_signature(
        &body,
        signature,
        &state.settings.webhook_secret,
        state.clock.now(),
    )
    .map_err(rejected)?;

    let (event_id, session) = match decode_event(&body).map_err(rejected)? {
        WebhookEvent::Ignored {
            event_id,
            event_type,
            reason,
        } => {
            info!(%event_id, %event_type, reason, "webhook acknowledged without processing");
            return Ok(Json(json!({ "received": true, "outcome": null })));
        }
        WebhookEvent::CheckoutCompleted { event_id, session } => (event_id, session),
    };

    let metadata = PurchaseMetadata::from_session_metadata(&session.metadata).map_err(|e| {
        warn!(%event_id, session_id = %session.id, error = %e, "malformed checkout metadata");
        ApiError(e)
    })?;

    let command = ProcessPurchase {
        correlation_id: Uuid::new_v4(),
        session_id: session.id,
        metadata,
    };
    let ctx = PurchaseContext {
        clock: state.clock.as_ref(),
        profiles: &*state.profiles,
        purchases: &*state.purchases,
        promos: &*state.promos,
        carts: &*state.carts,
        modules: &*state.modules,
        mailer: &*state.mailer,
        base_url: &state.settings.base_url,
    };
    let outcome = handle_process_purchase(&command, &ctx)
        .await
        .map_err(|e| {
            error!(%event_id, session_id = %command.session_id, error = %e, "purchase fulfillment failed");
            ApiError(DomainError::Infrastructure(e.to_string()))
        })?;

    Ok(Json(json!({ "received": true, "outcome": outcome })))
}

/// Returns the webhook router.
pub fn router() -> Router<AppState> {
    Router::new().route("/stripe", post(stripe_webhook))
}
