//! Provisioning service tests
//!
//! ensure_profile is exercised directly against the test database to pin
//! down its idempotence and organization-assignment rules.

use uuid::Uuid;

use crate::common::TestApp;
use orgchat::models::{organization_a_uuid, organization_b_uuid, PROFILE_ROLE};
use orgchat::services::{ensure_profile, ProvisionError};

async fn profile_count(app: &TestApp, identity_id: Uuid) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE id = ?")
        .bind(identity_id.to_string())
        .fetch_one(&app.state.db)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_ensure_profile_creates_with_default_role() {
    let app = TestApp::new().await;
    let identity_id = Uuid::new_v4();

    let profile = ensure_profile(&app.state.db, identity_id, "alice@example.com", None)
        .await
        .unwrap();

    assert_eq!(profile.id, identity_id);
    assert_eq!(profile.email, "alice@example.com");
    assert_eq!(profile.role, PROFILE_ROLE);
    assert_eq!(profile.organization_id, organization_a_uuid());
    assert_eq!(profile_count(&app, identity_id).await, 1);
}

#[tokio::test]
async fn test_ensure_profile_is_idempotent() {
    let app = TestApp::new().await;
    let identity_id = Uuid::new_v4();

    let first = ensure_profile(&app.state.db, identity_id, "alice@example.com", None)
        .await
        .unwrap();
    // The second call must return the existing row, even with a different
    // preferred organization
    let second = ensure_profile(
        &app.state.db,
        identity_id,
        "alice@example.com",
        Some(organization_b_uuid()),
    )
    .await
    .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(first.organization_id, second.organization_id);
    assert_eq!(profile_count(&app, identity_id).await, 1);
}

#[tokio::test]
async fn test_concurrent_provisioning_yields_single_row() {
    let app = TestApp::new().await;
    let identity_id = Uuid::new_v4();

    let (a, b) = tokio::join!(
        ensure_profile(&app.state.db, identity_id, "alice@example.com", None),
        ensure_profile(&app.state.db, identity_id, "alice@example.com", None),
    );

    let a = a.unwrap();
    let b = b.unwrap();
    assert_eq!(a.id, b.id);
    assert_eq!(a.organization_id, b.organization_id);
    assert_eq!(profile_count(&app, identity_id).await, 1);
}

#[tokio::test]
async fn test_preferred_organization_is_honored() {
    let app = TestApp::new().await;
    let identity_id = Uuid::new_v4();

    let profile = ensure_profile(
        &app.state.db,
        identity_id,
        "bob@example.com",
        Some(organization_b_uuid()),
    )
    .await
    .unwrap();

    assert_eq!(profile.organization_id, organization_b_uuid());
}

#[tokio::test]
async fn test_unknown_preferred_organization_falls_back() {
    let app = TestApp::new().await;
    let identity_id = Uuid::new_v4();

    let profile = ensure_profile(
        &app.state.db,
        identity_id,
        "bob@example.com",
        Some(Uuid::new_v4()),
    )
    .await
    .unwrap();

    // Unknown choice falls back to the lowest-id organization
    assert_eq!(profile.organization_id, organization_a_uuid());
}

#[tokio::test]
async fn test_empty_directory_is_an_error() {
    let app = TestApp::new().await;

    // Clear the seeded data, children first
    sqlx::query("DELETE FROM messages")
        .execute(&app.state.db)
        .await
        .unwrap();
    sqlx::query("DELETE FROM users")
        .execute(&app.state.db)
        .await
        .unwrap();
    sqlx::query("DELETE FROM organizations")
        .execute(&app.state.db)
        .await
        .unwrap();

    let result = ensure_profile(&app.state.db, Uuid::new_v4(), "alice@example.com", None).await;

    let err = result.unwrap_err();
    assert!(matches!(err, ProvisionError::NoOrganizationsAvailable));
    assert_eq!(err.to_string(), "No organizations available");
}

#[tokio::test]
async fn test_bot_profiles_are_seeded() {
    let app = TestApp::new().await;

    let bots: Vec<(String, String)> = sqlx::query_as(
        "SELECT id, organization_id FROM users WHERE email LIKE 'ai-bot-%' ORDER BY organization_id",
    )
    .fetch_all(&app.state.db)
    .await
    .unwrap();

    assert_eq!(bots.len(), 2);
    assert_eq!(bots[0].1, organization_a_uuid().to_string());
    assert_eq!(bots[1].1, organization_b_uuid().to_string());
}
