//! Organization directory endpoint
//!
//! Read-only: the directory is seeded and never mutated at runtime. The
//! listing is public because the signup form needs it before any session
//! exists.

use axum::{extract::State, routing::get, Json, Router};

use crate::{
    db::OrganizationRepository,
    models::OrganizationSummary,
    utils::{AppError, AppResult},
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(list_organizations))
}

/// GET /api/organizations
async fn list_organizations(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<OrganizationSummary>>> {
    let repo = OrganizationRepository::new(&state.db);
    let orgs = repo.list().await.map_err(|e| {
        tracing::error!("Failed to list organizations: {}", e);
        AppError::internal("Failed to list organizations")
    })?;

    Ok(Json(orgs.into_iter().map(Into::into).collect()))
}
