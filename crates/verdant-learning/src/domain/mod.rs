//! Domain layer.

pub mod activity;
pub mod commands;
pub mod enrollment;
pub mod gamification;
pub mod lesson;
pub mod repository;
pub mod validation;
