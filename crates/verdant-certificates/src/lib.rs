//! Verdant: Certificates bounded context.
//!
//! Issues one certificate per completed enrollment and verifies
//! certificates publicly by their code.

pub mod application;
pub mod domain;
