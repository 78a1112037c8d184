//! Verdant: transactional email.
//!
//! Senders depend on the [`Mailer`] trait; production wires a
//! [`ResendMailer`], local development a [`LogMailer`]. Email delivery is
//! always a best-effort side effect: callers log failures and continue.

mod mailer;
mod resend;
pub mod templates;

pub use mailer::{LogMailer, Mailer, NotificationError, OutgoingEmail};
pub use resend::ResendMailer;
