//! Command handlers for the Community context.
//!
//! Each handler validates the command against current state, then persists
//! the change through the repository.

use tracing::info;
use uuid::Uuid;
use verdant_core::clock::Clock;
use verdant_core::command::Command;
use verdant_core::error::DomainError;

use crate::domain::commands::{CreateCommunity, JoinCommunity, LeaveCommunity};
use crate::domain::model::{Community, CommunityMember, MemberRole};
use crate::domain::repository::CommunityRepository;

/// Handles the `CreateCommunity` command: validates the input, rejects a
/// duplicate slug, and stores the community with its founder membership.
///
/// # Errors
///
/// Returns `DomainError::Validation` for invalid input,
/// `DomainError::Conflict` if another community already uses the slug, and
/// `DomainError::Infrastructure` if persistence fails.
pub async fn handle_create_community(
    command: &CreateCommunity,
    clock: &dyn Clock,
    repo: &dyn CommunityRepository,
) -> Result<Community, DomainError> {
    let now = clock.now();
    let community = Community::new(
        Uuid::new_v4(),
        command.founder_id,
        &command.name,
        &command.description,
        &command.core_values,
        now,
    )?;

    if repo.find_community_by_slug(&community.slug).await?.is_some() {
        return Err(DomainError::Conflict(format!(
            "Ya existe una comunidad llamada \"{}\"",
            community.name
        )));
    }

    let founder = CommunityMember {
        community_id: community.id,
        user_id: command.founder_id,
        role: MemberRole::Founder,
        joined_at: now,
    };
    repo.create_community(&community, &founder).await?;

    info!(
        command = command.command_type(),
        correlation_id = %command.correlation_id(),
        actor = ?command.actor_id(),
        community_id = %community.id,
        slug = %community.slug,
        "community created"
    );

    Ok(community)
}

/// Handles the `JoinCommunity` command.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the community does not exist and
/// `DomainError::Conflict` if the profile is already a member.
pub async fn handle_join_community(
    command: &JoinCommunity,
    clock: &dyn Clock,
    repo: &dyn CommunityRepository,
) -> Result<CommunityMember, DomainError> {
    if repo.find_community(command.community_id).await?.is_none() {
        return Err(DomainError::not_found("community", command.community_id));
    }
    if repo
        .find_member(command.community_id, command.user_id)
        .await?
        .is_some()
    {
        return Err(DomainError::Conflict(
            "Ya eres miembro de esta comunidad".to_owned(),
        ));
    }

    let member = CommunityMember {
        community_id: command.community_id,
        user_id: command.user_id,
        role: MemberRole::Member,
        joined_at: clock.now(),
    };
    repo.add_member(&member).await?;

    info!(
        command = command.command_type(),
        correlation_id = %command.correlation_id(),
        actor = ?command.actor_id(),
        community_id = %command.community_id,
        "member joined"
    );

    Ok(member)
}

/// Handles the `LeaveCommunity` command.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the profile is not a member and
/// `DomainError::Validation` if the founder tries to leave.
pub async fn handle_leave_community(
    command: &LeaveCommunity,
    repo: &dyn CommunityRepository,
) -> Result<(), DomainError> {
    let member = repo
        .find_member(command.community_id, command.user_id)
        .await?
        .ok_or_else(|| DomainError::not_found("community member", command.user_id))?;

    if member.role == MemberRole::Founder {
        return Err(DomainError::validation(
            "El fundador no puede abandonar la comunidad",
        ));
    }

    repo.remove_member(command.community_id, command.user_id)
        .await?;

    info!(
        command = command.command_type(),
        correlation_id = %command.correlation_id(),
        actor = ?command.actor_id(),
        community_id = %command.community_id,
        "member left"
    );

    Ok(())
}
