//! Domain layer.

pub mod report;
pub mod repository;
