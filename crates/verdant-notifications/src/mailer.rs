//! Mailer abstraction.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::info;
use verdant_core::error::DomainError;

/// Errors raised while delivering an email.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// The request never reached the provider.
    #[error("email transport error: {0}")]
    Transport(String),

    /// The provider answered with a non-success status.
    #[error("email provider rejected the message ({status}): {body}")]
    Rejected {
        /// HTTP status returned by the provider.
        status: u16,
        /// Response body, truncated by the provider.
        body: String,
    },
}

impl From<NotificationError> for DomainError {
    fn from(err: NotificationError) -> Self {
        DomainError::Infrastructure(err.to_string())
    }
}

/// A rendered email ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingEmail {
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// HTML body.
    pub html: String,
}

/// Delivers transactional email.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Sends one email.
    async fn send(&self, email: &OutgoingEmail) -> Result<(), NotificationError>;
}

/// Mailer used when no provider is configured: logs and drops the message.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), NotificationError> {
        info!(to = %email.to, subject = %email.subject, "email delivery disabled, dropping message");
        Ok(())
    }
}
