//! Domain layer.

pub mod cart;
pub mod commands;
pub mod module;
pub mod pricing;
pub mod promo;
pub mod purchase;
pub mod repository;
