//! Orgchat library
//!
//! Minimal multi-tenant chat: identities sign up and log in, profiles are
//! provisioned into exactly one organization, messages are scoped to that
//! organization, and a canned bot reply follows every accepted message.

pub mod api;
pub mod config;
pub mod db;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

pub use config::AppConfig;
pub use db::DbPool;
pub use middleware::{auth_middleware, AuthUser, Claims};
pub use utils::{AppError, AppResult};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Database connection pool
    pub db: DbPool,
}
