//! Verdant API: HTTP surface of the sustainability training marketplace.
//!
//! The binary in `main.rs` wires configuration, tracing and the `PostgreSQL`
//! store; [`router`] assembles the routes so tests can drive them against
//! in-memory state.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod telemetry;

use axum::Router;

use crate::state::AppState;

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::router())
        .nest("/api/communities", routes::communities::router())
        .nest("/api/marketplace", routes::modules::catalog_router())
        .nest("/api/modules", routes::modules::authoring_router())
        .nest("/api/admin/modules", routes::modules::admin_router())
        .nest("/api/webhooks", routes::webhooks::router())
        .nest("/api/corporate/reports", routes::reports::router())
        .nest(
            "/api",
            routes::cart::router()
                .merge(routes::learning::router())
                .merge(routes::certificates::router()),
        )
        .with_state(state)
}
