//! Routes for the Certificates bounded context.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tracing::instrument;
use uuid::Uuid;
use verdant_certificates::application::command_handlers::{IssueContext, handle_issue_certificate};
use verdant_certificates::application::query_handlers::verify_certificate;
use verdant_certificates::domain::certificate::Certificate;
use verdant_certificates::domain::commands::IssueCertificate;
use verdant_core::error::DomainError;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// POST /enrollments/{id}/certificate
#[instrument(skip(state), fields(user_id = %user.user_id))]
async fn issue_certificate(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Certificate>, ApiError> {
    let command = IssueCertificate {
        correlation_id: Uuid::new_v4(),
        user_id: user.user_id,
        enrollment_id: id,
    };
    let ctx = IssueContext {
        clock: state.clock.as_ref(),
        rng: &state.rng,
        profiles: &*state.profiles,
        repo: &*state.certificates,
        mailer: &*state.mailer,
        base_url: &state.settings.base_url,
    };
    Ok(Json(handle_issue_certificate(&command, &ctx).await?))
}

/// GET /certificates/verify/{code}
#[instrument(skip(state))]
async fn verify(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Response, ApiError> {
    match verify_certificate(&code, &*state.certificates).await {
        Ok(certificate) => Ok(Json(json!({
            "valid": true,
            "certificate": certificate,
        }))
        .into_response()),
        Err(DomainError::NotFound { .. }) => Ok((
            StatusCode::NOT_FOUND,
            Json(json!({
                "valid": false,
                "message": "Certificado no encontrado",
            })),
        )
            .into_response()),
        Err(e) => Err(e.into()),
    }
}

/// Returns the router for the certificates context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/enrollments/{id}/certificate", post(issue_certificate))
        .route("/certificates/verify/{code}", get(verify))
}
