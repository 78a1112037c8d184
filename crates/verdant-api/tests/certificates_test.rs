//! Integration tests for certificate issuance and public verification.

mod common;

use axum::http::StatusCode;
use common::TestApp;
use uuid::Uuid;
use verdant_test_support::fixtures::{enrollment, learner, published_module};

/// Seeds a learner who completed "Huella hídrica"; returns their token and
/// the enrollment id.
fn completed(app: &TestApp) -> (String, Uuid) {
    let holder = learner("Ana Torres");
    let module = published_module("Huella hídrica", 12_000, None, Uuid::new_v4(), common::now());
    let mut row = enrollment(holder.id, module.id, common::now());
    row.completed = true;
    row.xp_earned = 450;
    let enrollment_id = row.id;
    let token = common::token(holder.id);
    app.store.add_profile(holder);
    app.store.add_module(module);
    app.store.add_enrollment(row);
    (token, enrollment_id)
}

#[tokio::test]
async fn test_issue_then_verify_certificate() {
    // Arrange
    let app = TestApp::new();
    let (token, enrollment_id) = completed(&app);

    // Act
    let (status, certificate) = common::post_empty(
        app.router(),
        &format!("/api/enrollments/{enrollment_id}/certificate"),
        Some(&token),
    )
    .await;
    let (verify_status, verified) = common::get_json(
        app.router(),
        "/api/certificates/verify/vrd-abcd-efgh",
        None,
    )
    .await;

    // Assert
    assert_eq!(status, StatusCode::OK);
    assert_eq!(certificate["verification_code"], "VRD-ABCD-EFGH");
    assert_eq!(certificate["holder_name"], "Ana Torres");
    assert_eq!(app.mailer.sent().len(), 1);

    assert_eq!(verify_status, StatusCode::OK);
    assert_eq!(verified["valid"], true);
    assert_eq!(verified["certificate"]["module_title"], "Huella hídrica");
}

#[tokio::test]
async fn test_unknown_code_returns_404_with_invalid_flag() {
    let app = TestApp::new();

    let (status, json) =
        common::get_json(app.router(), "/api/certificates/verify/VRD-ZZZZ-ZZZZ", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["valid"], false);
}

#[tokio::test]
async fn test_incomplete_enrollment_returns_400() {
    // Arrange
    let app = TestApp::new();
    let holder = learner("Luis Gómez");
    let module = published_module("Compostaje", 12_000, None, Uuid::new_v4(), common::now());
    let row = enrollment(holder.id, module.id, common::now());
    let enrollment_id = row.id;
    let token = common::token(holder.id);
    app.store.add_profile(holder);
    app.store.add_module(module);
    app.store.add_enrollment(row);

    // Act
    let (status, _) = common::post_empty(
        app.router(),
        &format!("/api/enrollments/{enrollment_id}/certificate"),
        Some(&token),
    )
    .await;

    // Assert
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(app.store.certificates().is_empty());
}
