//! Message repository
//!
//! Every read is filtered by organization id; there is no unscoped query.
//! Messages are append-only.

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use uuid::Uuid;

use super::parse_db_timestamp;
use crate::models::{Message, MessageWithAuthor};
use crate::services::bot;

#[derive(Debug, sqlx::FromRow)]
struct MessageRow {
    id: String,
    content: String,
    user_id: String,
    organization_id: String,
    created_at: String,
    author_email: Option<String>,
}

pub struct MessageRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> MessageRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, message: &Message) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO messages (id, content, user_id, organization_id, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(message.id.to_string())
        .bind(&message.content)
        .bind(message.user_id.to_string())
        .bind(message.organization_id.to_string())
        .bind(message.created_at.to_rfc3339())
        .execute(self.pool)
        .await
        .context("Failed to insert message")?;

        Ok(())
    }

    /// Full message history for one organization, ascending by creation
    /// time, joined with the author's email. Bot authors get no email.
    pub async fn list_for_organization(
        &self,
        organization_id: Uuid,
    ) -> Result<Vec<MessageWithAuthor>> {
        let rows = sqlx::query_as::<_, MessageRow>(
            r#"
            SELECT m.id, m.content, m.user_id, m.organization_id, m.created_at,
                   u.email AS author_email
            FROM messages m
            LEFT JOIN users u ON u.id = m.user_id
            WHERE m.organization_id = ?
            ORDER BY m.created_at ASC
            "#,
        )
        .bind(organization_id.to_string())
        .fetch_all(self.pool)
        .await
        .context("Failed to list messages")?;

        Ok(rows.into_iter().map(row_to_message).collect())
    }
}

fn row_to_message(row: MessageRow) -> MessageWithAuthor {
    let user_id = Uuid::parse_str(&row.user_id).unwrap_or_else(|_| Uuid::nil());
    // Bot-authored messages are rendered without an author email.
    let author_email = if bot::is_bot_user(user_id) {
        None
    } else {
        row.author_email
    };

    MessageWithAuthor {
        id: Uuid::parse_str(&row.id).unwrap_or_else(|_| Uuid::nil()),
        content: row.content,
        user_id,
        organization_id: Uuid::parse_str(&row.organization_id).unwrap_or_else(|_| Uuid::nil()),
        created_at: parse_db_timestamp(&row.created_at),
        author_email,
    }
}
