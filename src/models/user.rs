//! Identity and profile models
//!
//! An `Identity` is a credential record in the auth bridge (email +
//! password hash). A `Profile` is the chat-facing user row, created lazily
//! by provisioning and pinned to exactly one organization. The profile id
//! always equals the identity id; bot profiles exist without an identity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Role assigned to every provisioned profile. The chat has no role
/// hierarchy; the column exists so the schema matches the directory shape.
pub const PROFILE_ROLE: &str = "member";

/// Credential record owned by the auth bridge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub email_confirmed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Identity {
    pub fn new(email: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email,
            password_hash,
            email_confirmed: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Chat profile row, one per identity, pinned to one organization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub role: String,
    pub organization_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Signup request: the chosen organization rides along so it can be
/// embedded in the signed confirmation token.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    pub organization_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmRequest {
    pub token: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct MagicLinkRequest {
    #[validate(email)]
    pub email: String,
}

/// One-time sign-in redemption (the link target posts the token back)
#[derive(Debug, Clone, Deserialize)]
pub struct CallbackRequest {
    pub token: String,
}

/// Session opened after login, confirmation, or one-time-link redemption
#[derive(Debug, Clone, Serialize)]
pub struct SessionResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub identity: IdentityPublic,
}

/// Identity without the password hash
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityPublic {
    pub id: Uuid,
    pub email: String,
    pub email_confirmed: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Identity> for IdentityPublic {
    fn from(identity: Identity) -> Self {
        Self {
            id: identity.id,
            email: identity.email,
            email_confirmed: identity.email_confirmed,
            created_at: identity.created_at,
        }
    }
}

/// Response for GET /api/auth/me: identity plus profile when provisioned
#[derive(Debug, Clone, Serialize)]
pub struct MeResponse {
    pub identity: IdentityPublic,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<Profile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<crate::models::OrganizationSummary>,
}
