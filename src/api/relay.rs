//! Relay endpoint
//!
//! POST /api/relay is the single write path for user messages. Each gate
//! short-circuits: session, content, provisioning, insert. On success the
//! canned bot reply is posted server-side before the response is sent.

use axum::{extract::State, routing::post, Json, Router};
use chrono::Utc;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::{
    db::MessageRepository,
    middleware::AuthUser,
    models::{Message, RelayRequest},
    services::{bot, ensure_profile},
    utils::{AppError, AppResult},
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new().route("/", post(relay))
}

#[derive(Debug, Serialize)]
struct RelayResponse {
    status: String,
}

/// Accept a user message
///
/// POST /api/relay, body `{"content": "..."}`
async fn relay(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<RelayRequest>,
) -> AppResult<Json<RelayResponse>> {
    let content = payload
        .content_str()
        .ok_or_else(|| AppError::bad_request("Invalid content"))?;

    // Lazily provision the caller's profile; concurrent first-time calls
    // converge on one row inside ensure_profile.
    let profile = ensure_profile(&state.db, auth_user.id, &auth_user.email, None).await?;

    let message = Message {
        id: Uuid::new_v4(),
        content: content.to_string(),
        user_id: profile.id,
        organization_id: profile.organization_id,
        created_at: Utc::now(),
    };

    let repo = MessageRepository::new(&state.db);
    repo.insert(&message).await.map_err(|e| {
        tracing::error!("Failed to insert message: {}", e);
        AppError::internal("Failed to insert message")
    })?;

    info!(
        message_id = %message.id,
        organization_id = %message.organization_id,
        "Message accepted"
    );

    // The user message is committed; the bot reply must not un-accept it.
    bot::post_reply(&state.db, profile.organization_id, content).await;

    Ok(Json(RelayResponse {
        status: "ok".to_string(),
    }))
}
