//! Routes for the Community bounded context.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;
use verdant_community::application::{command_handlers, query_handlers};
use verdant_community::domain::commands::{CreateCommunity, JoinCommunity, LeaveCommunity};
use verdant_community::domain::model::{Community, CommunityMember};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /.
#[derive(Debug, Deserialize)]
pub struct CreateCommunityRequest {
    /// Display name.
    pub name: String,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Core value keys.
    #[serde(default)]
    pub core_values: Vec<String>,
}

/// Query string of GET /.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Only communities tagged with this core value.
    pub core_value: Option<String>,
}

/// GET /
#[instrument(skip(state))]
async fn list_communities(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Community>>, ApiError> {
    let communities =
        query_handlers::list_communities(query.core_value.as_deref(), &*state.communities).await?;
    Ok(Json(communities))
}

/// POST /
#[instrument(skip(state, request), fields(user_id = %user.user_id))]
async fn create_community(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CreateCommunityRequest>,
) -> Result<(StatusCode, Json<Community>), ApiError> {
    let command = CreateCommunity {
        correlation_id: Uuid::new_v4(),
        founder_id: user.user_id,
        name: request.name,
        description: request.description,
        core_values: request.core_values,
    };
    let community = command_handlers::handle_create_community(
        &command,
        state.clock.as_ref(),
        &*state.communities,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(community)))
}

/// GET /{id}
#[instrument(skip(state))]
async fn get_community(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Community>, ApiError> {
    Ok(Json(
        query_handlers::get_community(id, &*state.communities).await?,
    ))
}

/// POST /{id}/join
#[instrument(skip(state), fields(user_id = %user.user_id))]
async fn join_community(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<CommunityMember>, ApiError> {
    let command = JoinCommunity {
        correlation_id: Uuid::new_v4(),
        community_id: id,
        user_id: user.user_id,
    };
    let member =
        command_handlers::handle_join_community(&command, state.clock.as_ref(), &*state.communities)
            .await?;
    Ok(Json(member))
}

/// POST /{id}/leave
#[instrument(skip(state), fields(user_id = %user.user_id))]
async fn leave_community(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let command = LeaveCommunity {
        correlation_id: Uuid::new_v4(),
        community_id: id,
        user_id: user.user_id,
    };
    command_handlers::handle_leave_community(&command, &*state.communities).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /{id}/members
#[instrument(skip(state))]
async fn list_members(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<CommunityMember>>, ApiError> {
    Ok(Json(
        query_handlers::list_members(id, &*state.communities).await?,
    ))
}

/// Returns the router for the community context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_communities).post(create_community))
        .route("/{id}", get(get_community))
        .route("/{id}/join", post(join_community))
        .route("/{id}/leave", post(leave_community))
        .route("/{id}/members", get(list_members))
}
