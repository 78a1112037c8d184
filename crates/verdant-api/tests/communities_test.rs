//! Integration tests for the Community bounded context.

mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn test_create_join_and_list_members() {
    // Arrange
    let app = TestApp::new();
    let founder = common::token(Uuid::new_v4());
    let member = common::token(Uuid::new_v4());

    // Act
    let (status, created) = common::post_json(
        app.router(),
        "/api/communities",
        Some(&founder),
        &json!({
            "name": "Ríos Limpios",
            "description": "Limpiezas mensuales de riberas",
            "core_values": ["clean_water"]
        }),
    )
    .await;

    // Assert
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["slug"], "rios-limpios");
    let id = created["id"].as_str().unwrap().to_owned();

    let (status, joined) = common::post_empty(
        app.router(),
        &format!("/api/communities/{id}/join"),
        Some(&member),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(joined["role"], "member");

    let (status, members) =
        common::get_json(app.router(), &format!("/api/communities/{id}/members"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(members.as_array().unwrap().len(), 2);

    let (_, listed) =
        common::get_json(app.router(), "/api/communities?core_value=clean_water", None).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["member_count"], 2);
}

#[tokio::test]
async fn test_leave_returns_204() {
    // Arrange
    let app = TestApp::new();
    let founder = common::token(Uuid::new_v4());
    let member = common::token(Uuid::new_v4());
    let (_, created) = common::post_json(
        app.router(),
        "/api/communities",
        Some(&founder),
        &json!({"name": "Bici al Trabajo", "core_values": ["clean_air"]}),
    )
    .await;
    let id = created["id"].as_str().unwrap().to_owned();
    common::post_empty(
        app.router(),
        &format!("/api/communities/{id}/join"),
        Some(&member),
    )
    .await;

    // Act
    let (status, _) = common::post_empty(
        app.router(),
        &format!("/api/communities/{id}/leave"),
        Some(&member),
    )
    .await;

    // Assert
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, community) =
        common::get_json(app.router(), &format!("/api/communities/{id}"), None).await;
    assert_eq!(community["member_count"], 1);
}

#[tokio::test]
async fn test_create_without_core_values_returns_400() {
    let app = TestApp::new();
    let founder = common::token(Uuid::new_v4());

    let (status, json) = common::post_json(
        app.router(),
        "/api/communities",
        Some(&founder),
        &json!({"name": "Sin Valores"}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "validation_error");
}

#[tokio::test]
async fn test_create_requires_authentication() {
    let app = TestApp::new();

    let (status, _) = common::post_json(
        app.router(),
        "/api/communities",
        None,
        &json!({"name": "Anónimos", "core_values": ["fair_trade"]}),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unknown_community_returns_404() {
    let app = TestApp::new();

    let (status, json) = common::get_json(
        app.router(),
        &format!("/api/communities/{}", Uuid::new_v4()),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "not_found");
}
