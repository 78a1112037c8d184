//! Application layer: command handlers, checkout, purchase fulfillment and
//! queries.

pub mod checkout;
pub mod command_handlers;
pub mod purchase;
pub mod query_handlers;
