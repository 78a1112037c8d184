//! Persistence contract for the Community context.

use async_trait::async_trait;
use uuid::Uuid;
use verdant_core::core_value::CoreValue;
use verdant_core::error::DomainError;

use super::model::{Community, CommunityMember};

/// Repository for communities and their memberships.
#[async_trait]
pub trait CommunityRepository: Send + Sync {
    /// Loads a community by id.
    async fn find_community(&self, id: Uuid) -> Result<Option<Community>, DomainError>;

    /// Loads a community by its slug.
    async fn find_community_by_slug(&self, slug: &str) -> Result<Option<Community>, DomainError>;

    /// Lists communities, newest first, optionally filtered by core value.
    async fn list_communities(
        &self,
        core_value: Option<CoreValue>,
    ) -> Result<Vec<Community>, DomainError>;

    /// Inserts a community together with its founder membership.
    async fn create_community(
        &self,
        community: &Community,
        founder: &CommunityMember,
    ) -> Result<(), DomainError>;

    /// Loads one membership.
    async fn find_member(
        &self,
        community_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<CommunityMember>, DomainError>;

    /// Lists the roster, oldest membership first.
    async fn list_members(&self, community_id: Uuid) -> Result<Vec<CommunityMember>, DomainError>;

    /// Inserts a membership and increments `member_count`.
    async fn add_member(&self, member: &CommunityMember) -> Result<(), DomainError>;

    /// Deletes a membership and decrements `member_count`.
    async fn remove_member(&self, community_id: Uuid, user_id: Uuid) -> Result<(), DomainError>;
}
