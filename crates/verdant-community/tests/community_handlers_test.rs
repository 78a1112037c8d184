//! Handler tests for the Community context, run against the in-memory store.

use chrono::{TimeZone, Utc};
use uuid::Uuid;
use verdant_community::application::command_handlers::{
    handle_create_community, handle_join_community, handle_leave_community,
};
use verdant_community::application::query_handlers::{list_communities, list_members};
use verdant_community::domain::commands::{CreateCommunity, JoinCommunity, LeaveCommunity};
use verdant_community::domain::model::{Community, MemberRole};
use verdant_core::core_value::CoreValue;
use verdant_core::error::DomainError;
use verdant_test_support::{FailingStore, FixedClock, InMemoryStore};

fn fixed_clock() -> FixedClock {
    FixedClock(Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap())
}

fn create(founder_id: Uuid, name: &str, core_values: &[&str]) -> CreateCommunity {
    CreateCommunity {
        correlation_id: Uuid::new_v4(),
        founder_id,
        name: name.to_owned(),
        description: "Vecinos que reducen residuos".to_owned(),
        core_values: core_values.iter().map(|v| (*v).to_owned()).collect(),
    }
}

async fn seeded_community(store: &InMemoryStore, founder_id: Uuid) -> Community {
    handle_create_community(
        &create(founder_id, "Barrio Sin Residuos", &["zero_waste"]),
        &fixed_clock(),
        store,
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn test_create_community_stores_founder_membership() {
    // Arrange
    let store = InMemoryStore::new();
    let founder_id = Uuid::new_v4();
    let command = create(
        founder_id,
        "  Aire Limpio Ya  ",
        &["clean_air", "clean_air", "zero_waste"],
    );

    // Act
    let community = handle_create_community(&command, &fixed_clock(), &store)
        .await
        .unwrap();

    // Assert
    assert_eq!(community.name, "Aire Limpio Ya");
    assert_eq!(community.slug, "aire-limpio-ya");
    assert_eq!(
        community.core_values,
        vec![CoreValue::CleanAir, CoreValue::ZeroWaste]
    );
    assert_eq!(community.member_count, 1);

    let members = store.memberships();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].user_id, founder_id);
    assert_eq!(members[0].role, MemberRole::Founder);
}

#[tokio::test]
async fn test_create_community_rejects_duplicate_slug() {
    // Arrange
    let store = InMemoryStore::new();
    seeded_community(&store, Uuid::new_v4()).await;
    let command = create(Uuid::new_v4(), "barrio sin residuos!", &["zero_waste"]);

    // Act
    let result = handle_create_community(&command, &fixed_clock(), &store).await;

    // Assert
    assert!(matches!(result, Err(DomainError::Conflict(_))));
    assert_eq!(store.memberships().len(), 1);
}

#[tokio::test]
async fn test_create_community_rejects_missing_core_values() {
    let store = InMemoryStore::new();
    let command = create(Uuid::new_v4(), "Huertos Urbanos", &[]);

    let result = handle_create_community(&command, &fixed_clock(), &store).await;

    assert!(matches!(result, Err(DomainError::Validation(_))));
}

#[tokio::test]
async fn test_join_then_leave_updates_member_count() {
    // Arrange
    let store = InMemoryStore::new();
    let community = seeded_community(&store, Uuid::new_v4()).await;
    let user_id = Uuid::new_v4();
    let join = JoinCommunity {
        correlation_id: Uuid::new_v4(),
        community_id: community.id,
        user_id,
    };

    // Act
    let member = handle_join_community(&join, &fixed_clock(), &store)
        .await
        .unwrap();
    let roster = list_members(community.id, &store).await.unwrap();

    // Assert
    assert_eq!(member.role, MemberRole::Member);
    assert_eq!(roster.len(), 2);
    let listed = list_communities(None, &store).await.unwrap();
    assert_eq!(listed[0].member_count, 2);

    // Act
    let leave = LeaveCommunity {
        correlation_id: Uuid::new_v4(),
        community_id: community.id,
        user_id,
    };
    handle_leave_community(&leave, &store).await.unwrap();

    // Assert
    let listed = list_communities(None, &store).await.unwrap();
    assert_eq!(listed[0].member_count, 1);
}

#[tokio::test]
async fn test_join_twice_is_a_conflict() {
    // Arrange
    let store = InMemoryStore::new();
    let community = seeded_community(&store, Uuid::new_v4()).await;
    let join = JoinCommunity {
        correlation_id: Uuid::new_v4(),
        community_id: community.id,
        user_id: Uuid::new_v4(),
    };
    handle_join_community(&join, &fixed_clock(), &store)
        .await
        .unwrap();

    // Act
    let result = handle_join_community(&join, &fixed_clock(), &store).await;

    // Assert
    assert!(matches!(result, Err(DomainError::Conflict(_))));
}

#[tokio::test]
async fn test_join_unknown_community_is_not_found() {
    let store = InMemoryStore::new();
    let join = JoinCommunity {
        correlation_id: Uuid::new_v4(),
        community_id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
    };

    let result = handle_join_community(&join, &fixed_clock(), &store).await;

    assert!(matches!(result, Err(DomainError::NotFound { .. })));
}

#[tokio::test]
async fn test_founder_cannot_leave() {
    // Arrange
    let store = InMemoryStore::new();
    let founder_id = Uuid::new_v4();
    let community = seeded_community(&store, founder_id).await;
    let leave = LeaveCommunity {
        correlation_id: Uuid::new_v4(),
        community_id: community.id,
        user_id: founder_id,
    };

    // Act
    let result = handle_leave_community(&leave, &store).await;

    // Assert
    assert!(matches!(result, Err(DomainError::Validation(_))));
    assert_eq!(store.memberships().len(), 1);
}

#[tokio::test]
async fn test_list_communities_filters_by_core_value() {
    // Arrange
    let store = InMemoryStore::new();
    seeded_community(&store, Uuid::new_v4()).await;
    handle_create_community(
        &create(Uuid::new_v4(), "Sol Para Todos", &["clean_air"]),
        &fixed_clock(),
        &store,
    )
    .await
    .unwrap();

    // Act
    let air = list_communities(Some("clean_air"), &store).await.unwrap();
    let unknown = list_communities(Some("plastic"), &store).await;

    // Assert
    assert_eq!(air.len(), 1);
    assert_eq!(air[0].slug, "sol-para-todos");
    assert!(matches!(unknown, Err(DomainError::Validation(_))));
}

#[tokio::test]
async fn test_infrastructure_failure_propagates() {
    let store = FailingStore;
    let command = create(Uuid::new_v4(), "Agua Viva", &["clean_water"]);

    let result = handle_create_community(&command, &fixed_clock(), &store).await;

    assert!(matches!(result, Err(DomainError::Infrastructure(_))));
}
