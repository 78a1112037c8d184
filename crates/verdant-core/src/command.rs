//! Commands: intent-carrying requests handled by a bounded context.
//!
//! Every command carries a correlation id so that one HTTP request (or one
//! webhook delivery) can be followed across contexts in the logs.

use uuid::Uuid;

/// A request to change state, issued by an actor or by the payment gateway.
pub trait Command: Send + Sync + std::fmt::Debug {
    /// Dotted name such as `marketplace.add_to_cart`, used as a log field.
    fn command_type(&self) -> &'static str;

    /// Trace id shared by everything done on behalf of this command.
    fn correlation_id(&self) -> Uuid;

    /// The profile acting, when the command comes from a signed-in user.
    ///
    /// Gateway-driven commands have no actor.
    fn actor_id(&self) -> Option<Uuid> {
        None
    }
}
