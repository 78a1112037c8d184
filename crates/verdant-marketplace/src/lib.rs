//! Verdant: Training Module Marketplace bounded context.
//!
//! Responsible for purchasable training modules and their lessons, the admin
//! review workflow, carts and promo codes, checkout, and the fulfillment of
//! paid checkout sessions into enrollments.

pub mod application;
pub mod domain;
