//! Routes for the Learning bounded context: enrollments, saved activities,
//! lesson completion and gamification.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;
use uuid::Uuid;
use verdant_learning::application::activity_handlers::handle_save_activity;
use verdant_learning::application::completion_handlers::{
    CompletionResult, handle_complete_lesson, preview_lesson_validation,
};
use verdant_learning::application::query_handlers::{self, GamificationSummary};
use verdant_learning::domain::activity::{ActivityPayload, ActivityResponse};
use verdant_learning::domain::commands::{CompleteLesson, SaveActivity};
use verdant_learning::domain::enrollment::Enrollment;
use verdant_learning::domain::validation::LessonValidationReport;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Query string of GET /enrollments/{id}/activities.
#[derive(Debug, Deserialize)]
pub struct ActivitiesQuery {
    /// Only the response to this lesson.
    pub lesson_id: Option<Uuid>,
}

/// GET /enrollments
#[instrument(skip(state), fields(user_id = %user.user_id))]
async fn list_enrollments(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<Enrollment>>, ApiError> {
    Ok(Json(
        query_handlers::list_enrollments(user.user_id, &*state.learning).await?,
    ))
}

/// GET /enrollments/{id}/activities
#[instrument(skip(state), fields(user_id = %user.user_id))]
async fn list_activities(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Query(query): Query<ActivitiesQuery>,
) -> Result<Json<Vec<ActivityResponse>>, ApiError> {
    let responses =
        query_handlers::list_activity_responses(user.user_id, id, query.lesson_id, &*state.learning)
            .await?;
    Ok(Json(responses))
}

/// POST /enrollments/{id}/activities
#[instrument(skip(state, payload), fields(user_id = %user.user_id))]
async fn save_activity(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ActivityPayload>,
) -> Result<Json<ActivityResponse>, ApiError> {
    let command = SaveActivity {
        correlation_id: Uuid::new_v4(),
        user_id: user.user_id,
        enrollment_id: id,
        payload,
    };
    let response = handle_save_activity(
        &command,
        state.clock.as_ref(),
        &state.settings.learning,
        &*state.learning,
    )
    .await?;
    Ok(Json(response))
}

/// POST /enrollments/{id}/lessons/{lesson_id}/complete
#[instrument(skip(state), fields(user_id = %user.user_id))]
async fn complete_lesson(
    State(state): State<AppState>,
    user: AuthUser,
    Path((id, lesson_id)): Path<(Uuid, Uuid)>,
) -> Result<Response, ApiError> {
    let command = CompleteLesson {
        correlation_id: Uuid::new_v4(),
        user_id: user.user_id,
        enrollment_id: id,
        lesson_id,
    };
    let result = handle_complete_lesson(
        &command,
        state.clock.as_ref(),
        &state.settings.learning,
        &*state.learning,
        &*state.gamification,
    )
    .await?;

    Ok(match result {
        CompletionResult::Completed(outcome) => Json(*outcome).into_response(),
        CompletionResult::Rejected(rejected) => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "validation_failed",
                "message": "La respuesta no cumple los criterios de calidad",
                "validation": rejected.validation,
            })),
        )
            .into_response(),
    })
}

/// GET /enrollments/{id}/lessons/{lesson_id}/validation
#[instrument(skip(state), fields(user_id = %user.user_id))]
async fn preview_validation(
    State(state): State<AppState>,
    user: AuthUser,
    Path((id, lesson_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<LessonValidationReport>, ApiError> {
    let report = preview_lesson_validation(
        user.user_id,
        id,
        lesson_id,
        &state.settings.learning,
        &*state.learning,
    )
    .await?;
    Ok(Json(report))
}

/// GET /gamification/me
#[instrument(skip(state), fields(user_id = %user.user_id))]
async fn my_gamification(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<GamificationSummary>, ApiError> {
    Ok(Json(
        query_handlers::get_gamification_summary(user.user_id, &*state.gamification).await?,
    ))
}

/// Returns the router for the learning context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/enrollments", get(list_enrollments))
        .route(
            "/enrollments/{id}/activities",
            get(list_activities).post(save_activity),
        )
        .route(
            "/enrollments/{id}/lessons/{lesson_id}/complete",
            post(complete_lesson),
        )
        .route(
            "/enrollments/{id}/lessons/{lesson_id}/validation",
            get(preview_validation),
        )
        .route("/gamification/me", get(my_gamification))
}
