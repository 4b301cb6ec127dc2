//! User provisioning
//!
//! Guarantees a profile row exists for an authenticated identity, linked
//! to exactly one organization. The check-then-insert race between two
//! first-time requests for the same identity is resolved by treating a
//! unique-constraint violation on insert as a signal to re-read: at most
//! one profile row ever persists.
//!
//! Every authenticated entry point (relay, message listing, confirmation)
//! goes through `ensure_profile`; the logic lives nowhere else.

use chrono::Utc;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::db::{OrganizationRepository, ProfileRepository};
use crate::models::{Profile, PROFILE_ROLE};

/// Provisioning failure modes
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// The organization directory is empty; nothing to assign
    #[error("No organizations available")]
    NoOrganizationsAvailable,

    /// Profile insert failed for a reason other than a uniqueness conflict
    #[error("Failed to create user")]
    InsertFailed(#[source] sqlx::Error),

    /// The conflict-triggered re-read found no profile
    #[error("User not found")]
    ProfileNotFoundAfterInsert,

    /// A lookup against the datastore failed
    #[error("Database error")]
    Database(#[source] anyhow::Error),
}

/// Ensure a profile row exists for the identity, creating it on first
/// sight. `preferred_organization` is the caller-chosen organization
/// captured at signup; when absent or unknown, the lowest-id organization
/// in the directory is used.
///
/// Idempotent under concurrent duplicate calls: a uniqueness conflict on
/// the insert means another request won the race, and the profile it
/// created is re-read and returned.
pub async fn ensure_profile(
    pool: &SqlitePool,
    identity_id: Uuid,
    email: &str,
    preferred_organization: Option<Uuid>,
) -> Result<Profile, ProvisionError> {
    let profiles = ProfileRepository::new(pool);

    if let Some(profile) = profiles
        .get_by_id(identity_id)
        .await
        .map_err(ProvisionError::Database)?
    {
        return Ok(profile);
    }

    let organization_id = resolve_organization(pool, preferred_organization).await?;

    let profile = Profile {
        id: identity_id,
        email: email.to_string(),
        role: PROFILE_ROLE.to_string(),
        organization_id,
        created_at: Utc::now(),
    };

    match profiles.insert(&profile).await {
        Ok(()) => Ok(profile),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            // A concurrent request created the profile first; its row wins.
            debug!(identity_id = %identity_id, "Profile insert conflicted, re-reading");
            profiles
                .get_by_id(identity_id)
                .await
                .map_err(ProvisionError::Database)?
                .ok_or(ProvisionError::ProfileNotFoundAfterInsert)
        }
        Err(e) => Err(ProvisionError::InsertFailed(e)),
    }
}

/// Pick the target organization: the caller's choice when it exists in
/// the directory, otherwise the lowest-id organization.
async fn resolve_organization(
    pool: &SqlitePool,
    preferred: Option<Uuid>,
) -> Result<Uuid, ProvisionError> {
    let orgs = OrganizationRepository::new(pool);

    if let Some(id) = preferred {
        if let Some(org) = orgs.get_by_id(id).await.map_err(ProvisionError::Database)? {
            return Ok(org.id);
        }
        debug!(organization_id = %id, "Preferred organization not in directory, falling back");
    }

    orgs.first()
        .await
        .map_err(ProvisionError::Database)?
        .map(|org| org.id)
        .ok_or(ProvisionError::NoOrganizationsAvailable)
}

impl From<ProvisionError> for crate::utils::AppError {
    fn from(err: ProvisionError) -> Self {
        use crate::utils::AppError;
        match err {
            // Provisioning detail is collapsed to generic server errors at
            // the API boundary; only the post-insert miss maps to 404.
            ProvisionError::NoOrganizationsAvailable => {
                AppError::internal("No organizations available")
            }
            ProvisionError::InsertFailed(_) => AppError::internal("Failed to create user"),
            ProvisionError::ProfileNotFoundAfterInsert => AppError::not_found("User not found"),
            ProvisionError::Database(_) => AppError::internal("Database error"),
        }
    }
}
