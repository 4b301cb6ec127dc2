//! Profile repository
//!
//! Insert returns the raw sqlx error so the provisioning service can tell
//! a benign uniqueness conflict apart from a real failure.

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use uuid::Uuid;

use super::parse_db_timestamp;
use crate::models::Profile;

#[derive(Debug, sqlx::FromRow)]
struct ProfileRow {
    id: String,
    email: String,
    role: String,
    organization_id: String,
    created_at: String,
}

pub struct ProfileRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ProfileRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Profile>> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT id, email, role, organization_id, created_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(self.pool)
        .await
        .context("Failed to get profile")?;

        Ok(row.map(row_to_profile))
    }

    /// Insert a profile row. The sqlx error is returned unmapped so the
    /// caller can inspect unique-violation conflicts.
    pub async fn insert(&self, profile: &Profile) -> std::result::Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, role, organization_id, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(profile.id.to_string())
        .bind(&profile.email)
        .bind(&profile.role)
        .bind(profile.organization_id.to_string())
        .bind(profile.created_at.to_rfc3339())
        .execute(self.pool)
        .await?;

        Ok(())
    }
}

fn row_to_profile(row: ProfileRow) -> Profile {
    Profile {
        id: Uuid::parse_str(&row.id).unwrap_or_else(|_| Uuid::nil()),
        email: row.email,
        role: row.role,
        organization_id: Uuid::parse_str(&row.organization_id).unwrap_or_else(|_| Uuid::nil()),
        created_at: parse_db_timestamp(&row.created_at),
    }
}
