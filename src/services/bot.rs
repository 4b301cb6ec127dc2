//! Bot responder
//!
//! Maps each seeded organization to its hardcoded bot identity and posts
//! the canned reply. The reply is written server-side by the relay handler
//! right after the user message commits, so clients cannot forge or skip
//! bot messages.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::warn;
use uuid::Uuid;

use crate::db::MessageRepository;
use crate::models::{
    bot_user_a_uuid, bot_user_b_uuid, organization_a_uuid, organization_b_uuid, Message,
};

/// Pure mapping from organization id to its bot identity. Organizations
/// outside the seed set have no bot and produce no canned reply.
pub fn bot_user_id_for(organization_id: Uuid) -> Option<Uuid> {
    if organization_id == organization_a_uuid() {
        Some(bot_user_a_uuid())
    } else if organization_id == organization_b_uuid() {
        Some(bot_user_b_uuid())
    } else {
        None
    }
}

/// Whether a user id is one of the well-known bot identities
pub fn is_bot_user(user_id: Uuid) -> bool {
    user_id == bot_user_a_uuid() || user_id == bot_user_b_uuid()
}

/// Deterministic canned reply wrapping the original message text
pub fn reply_content(original: &str) -> String {
    format!("AI response to: {}", original)
}

/// Post the canned reply for an accepted user message. Returns the posted
/// message, or None when the organization has no bot. An insert failure is
/// logged and swallowed: the user message is already committed and the
/// relay call has been accepted.
pub async fn post_reply(
    pool: &SqlitePool,
    organization_id: Uuid,
    original_content: &str,
) -> Option<Message> {
    let bot_id = bot_user_id_for(organization_id)?;

    let reply = Message {
        id: Uuid::new_v4(),
        content: reply_content(original_content),
        user_id: bot_id,
        organization_id,
        created_at: Utc::now(),
    };

    let repo = MessageRepository::new(pool);
    if let Err(e) = repo.insert(&reply).await {
        warn!(
            organization_id = %organization_id,
            "Failed to post bot reply: {}",
            e
        );
        return None;
    }

    Some(reply)
}
