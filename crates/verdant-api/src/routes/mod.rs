//! HTTP routes, one module per resource. Each exposes a `router()`.

pub mod cart;
pub mod certificates;
pub mod communities;
pub mod health;
pub mod learning;
pub mod modules;
pub mod reports;
pub mod webhooks;
