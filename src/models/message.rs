//! Message model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Chat message row. Append-only: there is no update or delete path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub content: String,
    pub user_id: Uuid,
    pub organization_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Message joined with the author's email for the chat view.
/// `author_email` is None for bot authors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageWithAuthor {
    pub id: Uuid,
    pub content: String,
    pub user_id: Uuid,
    pub organization_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub author_email: Option<String>,
}

/// Body of POST /api/relay
#[derive(Debug, Clone, Deserialize)]
pub struct RelayRequest {
    pub content: Option<serde_json::Value>,
}

impl RelayRequest {
    /// Extract the content string, rejecting missing, non-string, and
    /// empty/whitespace-only values.
    pub fn content_str(&self) -> Option<&str> {
        match &self.content {
            Some(serde_json::Value::String(s)) if !s.trim().is_empty() => Some(s.as_str()),
            _ => None,
        }
    }
}

/// Response of GET /api/messages
#[derive(Debug, Clone, Serialize)]
pub struct MessageListResponse {
    pub organization: crate::models::OrganizationSummary,
    pub messages: Vec<MessageWithAuthor>,
}
