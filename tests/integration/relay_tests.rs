//! Relay endpoint tests
//!
//! The relay is the single write path for user messages: each gate is
//! checked in order, and an accepted message is followed by the canned
//! bot reply posted server-side.

use rstest::rstest;
use serde_json::json;
use uuid::Uuid;

use crate::common::{generate_test_token, signup_and_confirm, TestApp};
use orgchat::models::{
    bot_user_a_uuid, bot_user_b_uuid, organization_a_uuid, organization_b_uuid,
};

async fn message_count(app: &TestApp, organization_id: Uuid) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM messages WHERE organization_id = ?")
        .bind(organization_id.to_string())
        .fetch_one(&app.state.db)
        .await
        .unwrap()
}

async fn total_message_count(app: &TestApp) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM messages")
        .fetch_one(&app.state.db)
        .await
        .unwrap()
}

async fn profile_count(app: &TestApp, identity_id: Uuid) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE id = ?")
        .bind(identity_id.to_string())
        .fetch_one(&app.state.db)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_relay_requires_session() {
    let app = TestApp::new().await;

    app.post_json("/api/relay", json!({ "content": "hello" }))
        .await
        .assert_unauthorized()
        .assert_error_message("Unauthorized");

    assert_eq!(total_message_count(&app).await, 0);
}

#[tokio::test]
async fn test_relay_rejects_garbage_token() {
    let app = TestApp::new().await;

    app.post_json_with_auth("/api/relay", json!({ "content": "hello" }), "not-a-token")
        .await
        .assert_unauthorized()
        .assert_error_message("Unauthorized");
}

#[rstest]
#[case::missing(json!({}))]
#[case::null(json!({ "content": null }))]
#[case::empty(json!({ "content": "" }))]
#[case::blank(json!({ "content": "   " }))]
#[case::number(json!({ "content": 42 }))]
#[case::array(json!({ "content": ["hello"] }))]
#[case::object(json!({ "content": { "text": "hello" } }))]
#[tokio::test]
async fn test_relay_rejects_invalid_content(#[case] body: serde_json::Value) {
    let app = TestApp::new().await;
    let token = generate_test_token(&app.state.config, Uuid::new_v4(), "alice@example.com");

    app.post_json_with_auth("/api/relay", body, &token)
        .await
        .assert_bad_request()
        .assert_error_message("Invalid content");

    // A rejected message leaves nothing behind
    assert_eq!(total_message_count(&app).await, 0);
}

#[tokio::test]
async fn test_relay_accepts_message_and_posts_bot_reply() {
    let app = TestApp::new().await;
    let identity_id = Uuid::new_v4();
    let token = generate_test_token(&app.state.config, identity_id, "alice@example.com");

    let response = app
        .post_json_with_auth("/api/relay", json!({ "content": "hello" }), &token)
        .await;
    response.assert_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"].as_str(), Some("ok"));

    // First sight of this identity provisioned a profile in the default
    // (lowest-id) organization
    assert_eq!(profile_count(&app, identity_id).await, 1);

    // The user message and the bot reply, both in the same organization
    let rows: Vec<(String, String)> = sqlx::query_as(
        "SELECT content, user_id FROM messages WHERE organization_id = ? ORDER BY created_at ASC",
    )
    .bind(organization_a_uuid().to_string())
    .fetch_all(&app.state.db)
    .await
    .unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].0, "hello");
    assert_eq!(rows[0].1, identity_id.to_string());
    assert_eq!(rows[1].0, "AI response to: hello");
    assert_eq!(rows[1].1, bot_user_a_uuid().to_string());
}

#[tokio::test]
async fn test_relay_scopes_messages_to_chosen_organization() {
    let app = TestApp::new().await;
    let token = signup_and_confirm(&app, "bob@example.com", Some(organization_b_uuid())).await;

    app.post_json_with_auth("/api/relay", json!({ "content": "hi from b" }), &token)
        .await
        .assert_ok();

    assert_eq!(message_count(&app, organization_b_uuid()).await, 2);
    assert_eq!(message_count(&app, organization_a_uuid()).await, 0);

    // The reply comes from organization B's bot
    let bot_row: Option<(String,)> =
        sqlx::query_as("SELECT user_id FROM messages WHERE content LIKE 'AI response%'")
            .fetch_optional(&app.state.db)
            .await
            .unwrap();
    assert_eq!(bot_row.unwrap().0, bot_user_b_uuid().to_string());
}

#[tokio::test]
async fn test_relay_provisions_profile_only_once() {
    let app = TestApp::new().await;
    let identity_id = Uuid::new_v4();
    let token = generate_test_token(&app.state.config, identity_id, "alice@example.com");

    app.post_json_with_auth("/api/relay", json!({ "content": "one" }), &token)
        .await
        .assert_ok();
    app.post_json_with_auth("/api/relay", json!({ "content": "two" }), &token)
        .await
        .assert_ok();

    assert_eq!(profile_count(&app, identity_id).await, 1);
    assert_eq!(message_count(&app, organization_a_uuid()).await, 4);
}

#[tokio::test]
async fn test_relay_accepts_session_cookie() {
    let app = TestApp::new().await;
    let token = generate_test_token(&app.state.config, Uuid::new_v4(), "alice@example.com");

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/api/relay")
        .header("Content-Type", "application/json")
        .header("Cookie", format!("orgchat_session={}", token))
        .body(axum::body::Body::from(json!({ "content": "hello" }).to_string()))
        .unwrap();

    app.request(request).await.assert_ok();
}
