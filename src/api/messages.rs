//! Message listing for the chat view

use axum::{extract::State, routing::get, Json, Router};

use crate::{
    db::{MessageRepository, OrganizationRepository},
    middleware::AuthUser,
    models::MessageListResponse,
    services::ensure_profile,
    utils::{AppError, AppResult},
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(list_messages))
}

/// Full message history for the caller's organization, oldest first
///
/// GET /api/messages
///
/// Provisions the caller on first sight, exactly like the relay path, so
/// a fresh identity loading the chat view gets a profile and an empty
/// channel instead of an error.
async fn list_messages(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<MessageListResponse>> {
    let profile = ensure_profile(&state.db, auth_user.id, &auth_user.email, None).await?;

    let orgs = OrganizationRepository::new(&state.db);
    let organization = orgs
        .get_by_id(profile.organization_id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch organization: {}", e);
            AppError::internal("Failed to fetch organization")
        })?
        .ok_or_else(|| AppError::not_found("Organization not found"))?;

    let repo = MessageRepository::new(&state.db);
    let messages = repo
        .list_for_organization(profile.organization_id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list messages: {}", e);
            AppError::internal("Failed to list messages")
        })?;

    Ok(Json(MessageListResponse {
        organization: organization.into(),
        messages,
    }))
}
