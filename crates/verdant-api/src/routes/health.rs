//! Liveness endpoint.

use axum::extract::State;
use axum::{Json, Router, routing::get};
use chrono::{DateTime, Utc};
use serde::Serialize;
use verdant_core::clock::Clock;

use crate::state::AppState;

/// Body of `GET /health`.
#[derive(Serialize)]
pub struct Liveness {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    /// Server time as seen by the injected clock.
    pub time: DateTime<Utc>,
}

async fn liveness(State(state): State<AppState>) -> Json<Liveness> {
    Json(Liveness {
        status: "ok",
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        time: state.clock.now(),
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(liveness))
}
