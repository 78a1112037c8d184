//! `PostgreSQL` persistence for the Verdant platform.
//!
//! [`PgStore`] implements every repository trait of the bounded contexts on
//! top of one connection pool. Queries are checked at runtime; the schema
//! lives in the workspace `migrations/` directory.

mod certificates;
mod community;
mod error;
mod learning;
mod marketplace;
mod pg_store;
mod profiles;
mod reporting;

pub use pg_store::{MIGRATOR, PgStore};
