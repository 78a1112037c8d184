//! Resend HTTP API client.

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use crate::mailer::{Mailer, NotificationError, OutgoingEmail};

const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";

/// Sends email through the Resend REST API.
#[derive(Debug, Clone)]
pub struct ResendMailer {
    client: reqwest::Client,
    api_key: String,
    from: String,
    endpoint: String,
}

#[derive(Serialize)]
struct SendEmailBody<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

impl ResendMailer {
    /// Creates a mailer that sends as `from` (e.g. `Verdant <no-reply@verdant.app>`).
    #[must_use]
    pub fn new(client: reqwest::Client, api_key: String, from: String) -> Self {
        Self {
            client,
            api_key,
            from,
            endpoint: RESEND_ENDPOINT.to_owned(),
        }
    }

    /// Overrides the API endpoint (used against local fakes).
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), NotificationError> {
        let body = SendEmailBody {
            from: &self.from,
            to: [&email.to],
            subject: &email.subject,
            html: &email.html,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| NotificationError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotificationError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        debug!(to = %email.to, subject = %email.subject, "email accepted by provider");
        Ok(())
    }
}
