//! Error types for the Stripe integration.

use thiserror::Error;
use verdant_core::error::DomainError;

/// Errors raised while talking to Stripe or authenticating its webhooks.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// The `Stripe-Signature` header is missing.
    #[error("missing signature header")]
    MissingSignature,

    /// The signature header has an invalid format.
    #[error("invalid signature format: {0}")]
    InvalidSignatureFormat(String),

    /// No `v1` signature matched the payload.
    #[error("invalid signature")]
    InvalidSignature,

    /// The signed timestamp is older than the tolerance.
    #[error("signature timestamp outside tolerance")]
    TimestampOutsideTolerance,

    /// The event body could not be decoded.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// The request never reached Stripe.
    #[error("stripe transport error: {0}")]
    Transport(String),

    /// Stripe answered with a non-success status.
    #[error("stripe rejected the request ({status}): {body}")]
    Rejected {
        /// HTTP status returned by Stripe.
        status: u16,
        /// Response body.
        body: String,
    },
}

impl PaymentError {
    /// Whether the error comes from the incoming request rather than from
    /// Stripe or the network. Such webhooks are answered with 400 so Stripe
    /// does not retry them.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::MissingSignature
                | Self::InvalidSignatureFormat(_)
                | Self::InvalidSignature
                | Self::TimestampOutsideTolerance
                | Self::InvalidPayload(_)
        )
    }
}

impl From<PaymentError> for DomainError {
    fn from(err: PaymentError) -> Self {
        if err.is_client_error() {
            DomainError::Validation(err.to_string())
        } else {
            DomainError::Infrastructure(err.to_string())
        }
    }
}
