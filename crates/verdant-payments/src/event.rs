//! Webhook event envelope.

use std::collections::HashMap;

use serde::Deserialize;

use crate::error::PaymentError;

const CHECKOUT_COMPLETED: &str = "checkout.session.completed";

#[derive(Debug, Deserialize)]
struct Envelope {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    data: EnvelopeData,
}

#[derive(Debug, Deserialize)]
struct EnvelopeData {
    object: serde_json::Value,
}

/// The Checkout Session carried by a completion event.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CheckoutSessionObject {
    /// Session id (`cs_...`).
    pub id: String,
    /// `paid`, `unpaid` or `no_payment_required`.
    #[serde(default)]
    pub payment_status: Option<String>,
    /// Metadata attached when the session was created.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// A decoded webhook event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEvent {
    /// A paid Checkout Session to fulfill.
    CheckoutCompleted {
        /// Event id (`evt_...`).
        event_id: String,
        /// The session.
        session: CheckoutSessionObject,
    },
    /// Anything else; acknowledged without action.
    Ignored {
        /// Event id.
        event_id: String,
        /// Event type.
        event_type: String,
        /// Why it was ignored.
        reason: &'static str,
    },
}

/// Decodes a verified webhook body.
///
/// Completed sessions whose payment is not `paid` come back as
/// [`WebhookEvent::Ignored`].
///
/// # Errors
///
/// Returns `PaymentError::InvalidPayload` if the body is not an event
/// envelope, or a completion event does not carry a session.
pub fn decode_event(payload: &[u8]) -> Result<WebhookEvent, PaymentError> {
    let envelope: Envelope =
        serde_json::from_slice(payload).map_err(|e| PaymentError::InvalidPayload(e.to_string()))?;

    if envelope.event_type != CHECKOUT_COMPLETED {
        return Ok(WebhookEvent::Ignored {
            event_id: envelope.id,
            event_type: envelope.event_type,
            reason: "unhandled event type",
        });
    }

    let session: CheckoutSessionObject = serde_json::from_value(envelope.data.object)
        .map_err(|e| PaymentError::InvalidPayload(e.to_string()))?;
    if session.payment_status.as_deref() != Some("paid") {
        return Ok(WebhookEvent::Ignored {
            event_id: envelope.id,
            event_type: envelope.event_type,
            reason: "session not paid",
        });
    }

    Ok(WebhookEvent::CheckoutCompleted {
        event_id: envelope.id,
        session,
    })
}
