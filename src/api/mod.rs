//! API routes and handlers

use axum::{routing::get, Router};

use crate::AppState;

mod auth;
mod health;
mod messages;
mod organizations;
mod relay;

pub use health::*;

/// Public API routes (no authentication required)
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/detailed", get(health::health_check_detailed))
        // Authentication endpoints
        .nest("/auth", auth::public_routes())
        // Organization directory (consumed by the signup form)
        .nest("/organizations", organizations::routes())
}

/// Protected API routes (authentication required)
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::protected_routes())
        .nest("/relay", relay::routes())
        .nest("/messages", messages::routes())
}
