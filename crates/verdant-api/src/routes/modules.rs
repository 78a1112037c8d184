//! Routes for the Marketplace catalog and the module review workflow.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;
use verdant_marketplace::application::command_handlers;
use verdant_marketplace::application::query_handlers::{self, ModuleDetail};
use verdant_marketplace::domain::commands::{AddLesson, CreateModule, ReviewModule, SubmitModule};
use verdant_marketplace::domain::module::{Lesson, MarketplaceModule, ReviewAction};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Query string of the catalog listing.
#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    /// Only modules teaching this core value.
    pub core_value: Option<String>,
}

/// Request body for POST /api/modules.
#[derive(Debug, Deserialize)]
pub struct CreateModuleRequest {
    /// Community publishing the module.
    pub community_id: Option<Uuid>,
    /// Title.
    pub title: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Core value key.
    pub core_value: String,
    /// Price per seat pack, in minor units.
    pub price_cents: i64,
}

/// Request body for POST /api/modules/{id}/lessons.
#[derive(Debug, Deserialize)]
pub struct AddLessonRequest {
    /// Lesson title.
    pub title: String,
    /// Markdown content.
    #[serde(default)]
    pub content: String,
    /// XP awarded on completion.
    #[serde(default)]
    pub xp_reward: i32,
    /// Activity kind.
    pub activity_type: String,
    /// Activity configuration.
    #[serde(default = "empty_config")]
    pub activity_config: serde_json::Value,
}

fn empty_config() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

/// Request body for POST /api/admin/modules/review.
#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    /// Module under review.
    pub module_id: Uuid,
    /// Decision.
    pub action: ReviewAction,
    /// Reviewer notes; required when rejecting.
    pub notes: Option<String>,
}

/// GET /api/marketplace/modules
#[instrument(skip(state))]
async fn list_catalog(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<Vec<MarketplaceModule>>, ApiError> {
    let modules =
        query_handlers::list_published_modules(query.core_value.as_deref(), &*state.modules)
            .await?;
    Ok(Json(modules))
}

/// GET /api/marketplace/modules/{id}
#[instrument(skip(state))]
async fn get_catalog_module(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ModuleDetail>, ApiError> {
    Ok(Json(
        query_handlers::get_published_module(id, &*state.modules).await?,
    ))
}

/// POST /api/modules
#[instrument(skip(state, request), fields(user_id = %user.user_id))]
async fn create_module(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CreateModuleRequest>,
) -> Result<(StatusCode, Json<MarketplaceModule>), ApiError> {
    let command = CreateModule {
        correlation_id: Uuid::new_v4(),
        user_id: user.user_id,
        community_id: request.community_id,
        title: request.title,
        description: request.description,
        core_value: request.core_value,
        price_cents: request.price_cents,
    };
    let module = command_handlers::handle_create_module(
        &command,
        state.clock.as_ref(),
        &*state.communities,
        &*state.profiles,
        &*state.modules,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(module)))
}

/// POST /api/modules/{id}/lessons
#[instrument(skip(state, request), fields(user_id = %user.user_id))]
async fn add_lesson(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(request): Json<AddLessonRequest>,
) -> Result<(StatusCode, Json<Lesson>), ApiError> {
    let command = AddLesson {
        correlation_id: Uuid::new_v4(),
        user_id: user.user_id,
        module_id: id,
        title: request.title,
        content: request.content,
        xp_reward: request.xp_reward,
        activity_type: request.activity_type,
        activity_config: request.activity_config,
    };
    let lesson = command_handlers::handle_add_lesson(&command, &*state.modules).await?;
    Ok((StatusCode::CREATED, Json(lesson)))
}

/// POST /api/modules/{id}/submit
#[instrument(skip(state), fields(user_id = %user.user_id))]
async fn submit_module(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MarketplaceModule>, ApiError> {
    let command = SubmitModule {
        correlation_id: Uuid::new_v4(),
        user_id: user.user_id,
        module_id: id,
    };
    let module =
        command_handlers::handle_submit_module(&command, state.clock.as_ref(), &*state.modules)
            .await?;
    Ok(Json(module))
}

/// GET /api/admin/modules/pending
#[instrument(skip(state), fields(user_id = %user.user_id))]
async fn list_pending(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<MarketplaceModule>>, ApiError> {
    let modules =
        query_handlers::list_pending_modules(user.user_id, &*state.profiles, &*state.modules)
            .await?;
    Ok(Json(modules))
}

/// POST /api/admin/modules/review
#[instrument(skip(state, request), fields(user_id = %user.user_id, module_id = %request.module_id))]
async fn review_module(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<ReviewRequest>,
) -> Result<Json<MarketplaceModule>, ApiError> {
    let command = ReviewModule {
        correlation_id: Uuid::new_v4(),
        reviewer_id: user.user_id,
        module_id: request.module_id,
        action: request.action,
        notes: request.notes,
    };
    let module = command_handlers::handle_review_module(
        &command,
        state.clock.as_ref(),
        &*state.profiles,
        &*state.modules,
        &*state.mailer,
        &state.settings.base_url,
    )
    .await?;
    Ok(Json(module))
}

/// Returns the public catalog router.
pub fn catalog_router() -> Router<AppState> {
    Router::new()
        .route("/modules", get(list_catalog))
        .route("/modules/{id}", get(get_catalog_module))
}

/// Returns the router creators use to author modules.
pub fn authoring_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_module))
        .route("/{id}/lessons", post(add_lesson))
        .route("/{id}/submit", post(submit_module))
}

/// Returns the platform admin review router.
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/pending", get(list_pending))
        .route("/review", post(review_module))
}
