//! Integration tests for the catalog and the module review workflow.

mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::json;
use uuid::Uuid;
use verdant_test_support::fixtures::{learner, platform_admin, published_module};

#[tokio::test]
async fn test_catalog_lists_published_modules() {
    // Arrange
    let app = TestApp::new();
    let module = published_module("Compostaje", 12_000, None, Uuid::new_v4(), common::now());
    let id = module.id;
    app.store.add_module(module);

    // Act
    let (status, catalog) = common::get_json(
        app.router(),
        "/api/marketplace/modules?core_value=zero_waste",
        None,
    )
    .await;
    let (detail_status, detail) = common::get_json(
        app.router(),
        &format!("/api/marketplace/modules/{id}"),
        None,
    )
    .await;

    // Assert
    assert_eq!(status, StatusCode::OK);
    assert_eq!(catalog.as_array().unwrap().len(), 1);
    assert_eq!(catalog[0]["title"], "Compostaje");
    assert_eq!(detail_status, StatusCode::OK);
    assert_eq!(detail["id"], id.to_string());
    assert!(detail["lessons"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_catalog_module_returns_404() {
    let app = TestApp::new();

    let (status, _) = common::get_json(
        app.router(),
        &format!("/api/marketplace/modules/{}", Uuid::new_v4()),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_author_submit_and_approve_module() {
    // Arrange
    let app = TestApp::new();
    let admin = platform_admin("Marta Ruiz");
    let token = common::token(admin.id);
    app.store.add_profile(admin.clone());

    // Act
    let (status, module) = common::post_json(
        app.router(),
        "/api/modules",
        Some(&token),
        &json!({
            "title": "Movilidad sostenible",
            "description": "Planes de transporte para empleados",
            "core_value": "clean_air",
            "price_cents": 9_000
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(module["status"], "draft");
    let id = module["id"].as_str().unwrap().to_owned();

    let (status, lesson) = common::post_json(
        app.router(),
        &format!("/api/modules/{id}/lessons"),
        Some(&token),
        &json!({
            "title": "Tu huella diaria",
            "content": "## Trayectos\n\nMide tu recorrido.",
            "xp_reward": 100,
            "activity_type": "reflection"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(lesson["lesson_order"], 1);

    let (status, submitted) = common::post_empty(
        app.router(),
        &format!("/api/modules/{id}/submit"),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(submitted["status"], "review");

    let (_, pending) =
        common::get_json(app.router(), "/api/admin/modules/pending", Some(&token)).await;
    assert_eq!(pending.as_array().unwrap().len(), 1);

    let (status, reviewed) = common::post_json(
        app.router(),
        "/api/admin/modules/review",
        Some(&token),
        &json!({"module_id": id, "action": "approve"}),
    )
    .await;

    // Assert
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reviewed["status"], "published");
    let (_, catalog) = common::get_json(app.router(), "/api/marketplace/modules", None).await;
    assert_eq!(catalog.as_array().unwrap().len(), 1);
    assert_eq!(app.mailer.sent().len(), 1);
}

#[tokio::test]
async fn test_learner_cannot_list_pending_modules() {
    let app = TestApp::new();
    let user = learner("Luis Gómez");
    app.store.add_profile(user.clone());

    let (status, json) = common::get_json(
        app.router(),
        "/api/admin/modules/pending",
        Some(&common::token(user.id)),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["error"], "forbidden");
}
