//! Verdant: Community Management bounded context.
//!
//! Responsible for communities, their core values, and the member roster
//! (founder, admins, members).

pub mod application;
pub mod domain;
