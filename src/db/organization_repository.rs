//! Organization (tenant) directory repository
//!
//! Read-only at runtime; rows come from the seed migration.

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use uuid::Uuid;

use super::parse_db_timestamp;
use crate::models::Organization;

#[derive(Debug, sqlx::FromRow)]
struct OrganizationRow {
    id: String,
    name: String,
    created_at: String,
}

pub struct OrganizationRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> OrganizationRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<Organization>> {
        let rows = sqlx::query_as::<_, OrganizationRow>(
            r#"
            SELECT id, name, created_at
            FROM organizations
            ORDER BY id
            "#,
        )
        .fetch_all(self.pool)
        .await
        .context("Failed to list organizations")?;

        Ok(rows.into_iter().map(row_to_org).collect())
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Organization>> {
        let row = sqlx::query_as::<_, OrganizationRow>(
            r#"
            SELECT id, name, created_at
            FROM organizations
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(self.pool)
        .await
        .context("Failed to get organization")?;

        Ok(row.map(row_to_org))
    }

    /// The deterministic "first" organization used as the provisioning
    /// fallback: lowest id wins, regardless of insertion order.
    pub async fn first(&self) -> Result<Option<Organization>> {
        let row = sqlx::query_as::<_, OrganizationRow>(
            r#"
            SELECT id, name, created_at
            FROM organizations
            ORDER BY id
            LIMIT 1
            "#,
        )
        .fetch_optional(self.pool)
        .await
        .context("Failed to get first organization")?;

        Ok(row.map(row_to_org))
    }
}

fn row_to_org(row: OrganizationRow) -> Organization {
    Organization {
        id: Uuid::parse_str(&row.id).unwrap_or_else(|_| Uuid::nil()),
        name: row.name,
        created_at: parse_db_timestamp(&row.created_at),
    }
}
