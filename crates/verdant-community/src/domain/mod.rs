//! Domain layer: model, commands, repository contract.

pub mod commands;
pub mod model;
pub mod repository;
