//! Business logic services

pub mod auth;
pub mod bot;
pub mod provisioning;

pub use auth::AuthService;
pub use provisioning::{ensure_profile, ProvisionError};
