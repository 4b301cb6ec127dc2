//! Organization (tenant) model
//!
//! The organization directory is read-only at runtime: the two seeded
//! organizations and their bot identities are well-known constants shared
//! between the seed migration, the signup surface, and the bot responder.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const ORGANIZATION_A_ID: &str = "00000000-0000-0000-0000-0000000000a1";
pub const ORGANIZATION_B_ID: &str = "00000000-0000-0000-0000-0000000000b1";

pub const BOT_USER_A_ID: &str = "00000000-0000-0000-0000-00000000a1b0";
pub const BOT_USER_B_ID: &str = "00000000-0000-0000-0000-00000000b1b0";

pub fn organization_a_uuid() -> Uuid {
    Uuid::parse_str(ORGANIZATION_A_ID).expect("ORGANIZATION_A_ID must be a valid UUID")
}

pub fn organization_b_uuid() -> Uuid {
    Uuid::parse_str(ORGANIZATION_B_ID).expect("ORGANIZATION_B_ID must be a valid UUID")
}

pub fn bot_user_a_uuid() -> Uuid {
    Uuid::parse_str(BOT_USER_A_ID).expect("BOT_USER_A_ID must be a valid UUID")
}

pub fn bot_user_b_uuid() -> Uuid {
    Uuid::parse_str(BOT_USER_B_ID).expect("BOT_USER_B_ID must be a valid UUID")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Directory entry returned to the signup form (no timestamps).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizationSummary {
    pub id: Uuid,
    pub name: String,
}

impl From<Organization> for OrganizationSummary {
    fn from(org: Organization) -> Self {
        Self {
            id: org.id,
            name: org.name,
        }
    }
}
