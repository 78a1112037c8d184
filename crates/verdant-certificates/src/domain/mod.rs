//! Domain layer.

pub mod certificate;
pub mod commands;
pub mod repository;
