//! Verdant: Stripe integration.
//!
//! Creates hosted Checkout Sessions for the marketplace and authenticates
//! the `checkout.session.completed` webhooks that drive purchase
//! fulfillment.

mod error;
pub mod event;
pub mod signature;
mod stripe;

pub use error::PaymentError;
pub use event::{CheckoutSessionObject, WebhookEvent, decode_event};
pub use signature::{SIGNATURE_TOLERANCE_SECS, sign_payload, verify_signature};
pub use stripe::StripeClient;
