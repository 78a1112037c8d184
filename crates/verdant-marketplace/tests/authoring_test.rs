//! Module authoring and admin review, run against the in-memory store.

use chrono::{TimeZone, Utc};
use serde_json::json;
use uuid::Uuid;
use verdant_community::application::command_handlers::{
    handle_create_community, handle_join_community,
};
use verdant_community::domain::commands::{CreateCommunity, JoinCommunity};
use verdant_core::error::DomainError;
use verdant_core::profile::Profile;
use verdant_marketplace::application::command_handlers::{
    handle_add_lesson, handle_create_module, handle_review_module, handle_submit_module,
};
use verdant_marketplace::application::query_handlers::{
    get_published_module, list_pending_modules, list_published_modules,
};
use verdant_marketplace::domain::commands::{AddLesson, CreateModule, ReviewModule, SubmitModule};
use verdant_marketplace::domain::module::{MarketplaceModule, ModuleStatus, ReviewAction};
use verdant_test_support::fixtures::{learner, platform_admin};
use verdant_test_support::{FailingMailer, FixedClock, InMemoryStore, RecordingMailer};

const BASE_URL: &str = "https://verdant.test";

fn fixed_clock() -> FixedClock {
    FixedClock(Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap())
}

fn create_module(user_id: Uuid, community_id: Option<Uuid>) -> CreateModule {
    CreateModule {
        correlation_id: Uuid::new_v4(),
        user_id,
        community_id,
        title: "Compostaje en la oficina".to_owned(),
        description: "Reduce los residuos orgánicos del equipo".to_owned(),
        core_value: "zero_waste".to_owned(),
        price_cents: 15_000,
    }
}

fn add_lesson(user_id: Uuid, module_id: Uuid, title: &str) -> AddLesson {
    AddLesson {
        correlation_id: Uuid::new_v4(),
        user_id,
        module_id,
        title: title.to_owned(),
        content: "## Por qué compostar\n\nMenos metano.".to_owned(),
        xp_reward: 100,
        activity_type: "reflection".to_owned(),
        activity_config: json!({"min_words": 20}),
    }
}

fn review(
    reviewer_id: Uuid,
    module_id: Uuid,
    action: ReviewAction,
    notes: Option<&str>,
) -> ReviewModule {
    ReviewModule {
        correlation_id: Uuid::new_v4(),
        reviewer_id,
        module_id,
        action,
        notes: notes.map(str::to_owned),
    }
}

/// Seeds a community founded by `founder` and returns its id.
async fn seeded_community(store: &InMemoryStore, founder: &Profile) -> Uuid {
    let command = CreateCommunity {
        correlation_id: Uuid::new_v4(),
        founder_id: founder.id,
        name: "Oficinas Verdes".to_owned(),
        description: String::new(),
        core_values: vec!["zero_waste".to_owned()],
    };
    handle_create_community(&command, &fixed_clock(), store)
        .await
        .unwrap()
        .id
}

/// Creates a platform module with one lesson and submits it for review.
async fn module_in_review(store: &InMemoryStore, admin: &Profile) -> MarketplaceModule {
    let module = handle_create_module(
        &create_module(admin.id, None),
        &fixed_clock(),
        store,
        store,
        store,
    )
    .await
    .unwrap();
    handle_add_lesson(&add_lesson(admin.id, module.id, "Lección de inicio"), store)
        .await
        .unwrap();
    let submit = SubmitModule {
        correlation_id: Uuid::new_v4(),
        user_id: admin.id,
        module_id: module.id,
    };
    handle_submit_module(&submit, &fixed_clock(), store)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_community_founder_creates_draft_module() {
    // Arrange
    let store = InMemoryStore::new();
    let founder = learner("Ana Torres");
    store.add_profile(founder.clone());
    let community_id = seeded_community(&store, &founder).await;

    // Act
    let module = handle_create_module(
        &create_module(founder.id, Some(community_id)),
        &fixed_clock(),
        &store,
        &store,
        &store,
    )
    .await
    .unwrap();

    // Assert
    assert_eq!(module.status, ModuleStatus::Draft);
    assert_eq!(module.creator_community_id, Some(community_id));
    assert!(module.is_community_module());
    assert_eq!(store.modules().len(), 1);
}

#[tokio::test]
async fn test_plain_community_member_cannot_create_module() {
    // Arrange
    let store = InMemoryStore::new();
    let founder = learner("Ana Torres");
    let member = learner("Luis Gómez");
    store.add_profile(founder.clone());
    store.add_profile(member.clone());
    let community_id = seeded_community(&store, &founder).await;
    let join = JoinCommunity {
        correlation_id: Uuid::new_v4(),
        community_id,
        user_id: member.id,
    };
    handle_join_community(&join, &fixed_clock(), &store)
        .await
        .unwrap();

    // Act
    let result = handle_create_module(
        &create_module(member.id, Some(community_id)),
        &fixed_clock(),
        &store,
        &store,
        &store,
    )
    .await;

    // Assert
    assert!(matches!(result, Err(DomainError::Forbidden(_))));
    assert!(store.modules().is_empty());
}

#[tokio::test]
async fn test_platform_module_requires_platform_admin() {
    // Arrange
    let store = InMemoryStore::new();
    let user = learner("Luis Gómez");
    store.add_profile(user.clone());

    // Act
    let result = handle_create_module(
        &create_module(user.id, None),
        &fixed_clock(),
        &store,
        &store,
        &store,
    )
    .await;

    // Assert
    assert!(matches!(result, Err(DomainError::Forbidden(_))));
}

#[tokio::test]
async fn test_lessons_are_appended_in_order() {
    // Arrange
    let store = InMemoryStore::new();
    let admin = platform_admin("Marta Ruiz");
    store.add_profile(admin.clone());
    let module = handle_create_module(
        &create_module(admin.id, None),
        &fixed_clock(),
        &store,
        &store,
        &store,
    )
    .await
    .unwrap();

    // Act
    let first = handle_add_lesson(&add_lesson(admin.id, module.id, "Primera lección"), &store)
        .await
        .unwrap();
    let second = handle_add_lesson(&add_lesson(admin.id, module.id, "Segunda lección"), &store)
        .await
        .unwrap();

    // Assert
    assert_eq!(first.lesson_order, 1);
    assert_eq!(second.lesson_order, 2);
    assert_eq!(store.lessons().len(), 2);
}

#[tokio::test]
async fn test_only_creator_adds_lessons() {
    // Arrange
    let store = InMemoryStore::new();
    let admin = platform_admin("Marta Ruiz");
    store.add_profile(admin.clone());
    let module = handle_create_module(
        &create_module(admin.id, None),
        &fixed_clock(),
        &store,
        &store,
        &store,
    )
    .await
    .unwrap();

    // Act
    let result = handle_add_lesson(
        &add_lesson(Uuid::new_v4(), module.id, "Lección ajena"),
        &store,
    )
    .await;

    // Assert
    assert!(matches!(result, Err(DomainError::Forbidden(_))));
}

#[tokio::test]
async fn test_submit_without_lessons_is_rejected() {
    // Arrange
    let store = InMemoryStore::new();
    let admin = platform_admin("Marta Ruiz");
    store.add_profile(admin.clone());
    let module = handle_create_module(
        &create_module(admin.id, None),
        &fixed_clock(),
        &store,
        &store,
        &store,
    )
    .await
    .unwrap();
    let submit = SubmitModule {
        correlation_id: Uuid::new_v4(),
        user_id: admin.id,
        module_id: module.id,
    };

    // Act
    let result = handle_submit_module(&submit, &fixed_clock(), &store).await;

    // Assert
    assert!(matches!(result, Err(DomainError::Validation(_))));
    assert_eq!(store.modules()[0].status, ModuleStatus::Draft);
}

#[tokio::test]
async fn test_approval_publishes_and_notifies_creator() {
    // Arrange
    let store = InMemoryStore::new();
    let admin = platform_admin("Marta Ruiz");
    store.add_profile(admin.clone());
    let module = module_in_review(&store, &admin).await;
    let mailer = RecordingMailer::new();
    let pending = list_pending_modules(admin.id, &store, &store).await.unwrap();
    assert_eq!(pending.len(), 1);

    // Act
    let reviewed = handle_review_module(
        &review(admin.id, module.id, ReviewAction::Approve, None),
        &fixed_clock(),
        &store,
        &store,
        &mailer,
        BASE_URL,
    )
    .await
    .unwrap();

    // Assert
    assert_eq!(reviewed.status, ModuleStatus::Published);
    assert_eq!(reviewed.published_at, Some(fixed_clock().0));
    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, admin.email);
    assert!(sent[0].html.contains(&format!("{BASE_URL}/marketplace/{}", module.id)));

    let catalog = list_published_modules(None, &store).await.unwrap();
    assert_eq!(catalog.len(), 1);
    let detail = get_published_module(module.id, &store).await.unwrap();
    assert_eq!(detail.lessons.len(), 1);
    assert!(detail.lessons[0].content_html.contains("<h2>"));
}

#[tokio::test]
async fn test_rejection_requires_notes_and_returns_to_draft() {
    // Arrange
    let store = InMemoryStore::new();
    let admin = platform_admin("Marta Ruiz");
    store.add_profile(admin.clone());
    let module = module_in_review(&store, &admin).await;
    let mailer = RecordingMailer::new();

    // Act
    let without_notes = handle_review_module(
        &review(admin.id, module.id, ReviewAction::Reject, Some("  ")),
        &fixed_clock(),
        &store,
        &store,
        &mailer,
        BASE_URL,
    )
    .await;
    let rejected = handle_review_module(
        &review(
            admin.id,
            module.id,
            ReviewAction::Reject,
            Some("Falta bibliografía"),
        ),
        &fixed_clock(),
        &store,
        &store,
        &mailer,
        BASE_URL,
    )
    .await
    .unwrap();

    // Assert
    assert!(matches!(without_notes, Err(DomainError::Validation(_))));
    assert_eq!(rejected.status, ModuleStatus::Draft);
    assert_eq!(rejected.review_notes.as_deref(), Some("Falta bibliografía"));
    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].html.contains("Falta bibliografía"));
    assert!(get_published_module(module.id, &store).await.is_err());
}

#[tokio::test]
async fn test_review_succeeds_when_email_fails() {
    // Arrange
    let store = InMemoryStore::new();
    let admin = platform_admin("Marta Ruiz");
    store.add_profile(admin.clone());
    let module = module_in_review(&store, &admin).await;

    // Act
    let reviewed = handle_review_module(
        &review(admin.id, module.id, ReviewAction::Approve, None),
        &fixed_clock(),
        &store,
        &store,
        &FailingMailer,
        BASE_URL,
    )
    .await
    .unwrap();

    // Assert
    assert_eq!(reviewed.status, ModuleStatus::Published);
}

#[tokio::test]
async fn test_non_admin_cannot_review() {
    // Arrange
    let store = InMemoryStore::new();
    let admin = platform_admin("Marta Ruiz");
    let user = learner("Luis Gómez");
    store.add_profile(admin.clone());
    store.add_profile(user.clone());
    let module = module_in_review(&store, &admin).await;

    // Act
    let result = handle_review_module(
        &review(user.id, module.id, ReviewAction::Approve, None),
        &fixed_clock(),
        &store,
        &store,
        &RecordingMailer::new(),
        BASE_URL,
    )
    .await;

    // Assert
    assert!(matches!(result, Err(DomainError::Forbidden(_))));
    assert!(matches!(
        list_pending_modules(user.id, &store, &store).await,
        Err(DomainError::Forbidden(_))
    ));
}
