//! Verdant: ESG Reporting bounded context.
//!
//! Aggregates a corporate account's training progress and tool results into
//! an impact report, exported as JSON, CSV or PDF.

pub mod application;
pub mod domain;
pub mod render;
