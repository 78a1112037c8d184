//! Query handlers for the Community context.

use uuid::Uuid;
use verdant_core::core_value::CoreValue;
use verdant_core::error::DomainError;

use crate::domain::model::{Community, CommunityMember};
use crate::domain::repository::CommunityRepository;

/// Retrieves a community by id.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if no community has the id.
pub async fn get_community(
    community_id: Uuid,
    repo: &dyn CommunityRepository,
) -> Result<Community, DomainError> {
    repo.find_community(community_id)
        .await?
        .ok_or_else(|| DomainError::not_found("community", community_id))
}

/// Lists communities, optionally filtered by a core value wire name.
///
/// # Errors
///
/// Returns `DomainError::Validation` if the filter is not a known core value.
pub async fn list_communities(
    core_value: Option<&str>,
    repo: &dyn CommunityRepository,
) -> Result<Vec<Community>, DomainError> {
    let filter = core_value.map(str::parse::<CoreValue>).transpose()?;
    repo.list_communities(filter).await
}

/// Lists the roster of an existing community.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the community does not exist.
pub async fn list_members(
    community_id: Uuid,
    repo: &dyn CommunityRepository,
) -> Result<Vec<CommunityMember>, DomainError> {
    get_community(community_id, repo).await?;
    repo.list_members(community_id).await
}
