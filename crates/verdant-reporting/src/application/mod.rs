//! Application layer.

pub mod query_handlers;
