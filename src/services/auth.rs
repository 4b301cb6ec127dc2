//! Authentication service
//!
//! Password hashing with Argon2 and identity management. Identities are
//! the credential records consumed by the session bridge; chat profiles
//! are provisioned separately (see `services::provisioning`).

use anyhow::{Context, Result};
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::db::parse_db_timestamp;
use crate::models::Identity;

/// Authentication service for identity management
pub struct AuthService {
    pool: SqlitePool,
}

impl AuthService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Hash a password using Argon2id
    pub fn hash_password(password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let password_hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?
            .to_string();
        Ok(password_hash)
    }

    /// Verify a password against a hash
    pub fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
        let parsed_hash = PasswordHash::new(password_hash)
            .map_err(|e| anyhow::anyhow!("Invalid password hash format: {}", e))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Authenticate an identity by email and password
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Option<Identity>> {
        match self.get_identity_by_email(email).await? {
            Some(identity) => {
                if Self::verify_password(password, &identity.password_hash)? {
                    Ok(Some(identity))
                } else {
                    Ok(None)
                }
            }
            None => Ok(None),
        }
    }

    pub async fn get_identity_by_id(&self, id: &Uuid) -> Result<Option<Identity>> {
        let row = sqlx::query(
            "SELECT id, email, password_hash, email_confirmed, created_at, updated_at \
             FROM identities WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch identity by ID")?;

        Ok(row.map(|r| row_to_identity(&r)))
    }

    pub async fn get_identity_by_email(&self, email: &str) -> Result<Option<Identity>> {
        let row = sqlx::query(
            "SELECT id, email, password_hash, email_confirmed, created_at, updated_at \
             FROM identities WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch identity by email")?;

        Ok(row.map(|r| row_to_identity(&r)))
    }

    /// Create a new, unconfirmed identity
    pub async fn create_identity(&self, email: &str, password: &str) -> Result<Identity> {
        if self.get_identity_by_email(email).await?.is_some() {
            anyhow::bail!("Email already exists");
        }

        let password_hash = Self::hash_password(password)?;
        let identity = Identity::new(email.to_string(), password_hash);

        sqlx::query(
            "INSERT INTO identities (id, email, password_hash, email_confirmed, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(identity.id.to_string())
        .bind(&identity.email)
        .bind(&identity.password_hash)
        .bind(identity.email_confirmed as i64)
        .bind(identity.created_at.to_rfc3339())
        .bind(identity.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to create identity")?;

        Ok(identity)
    }

    /// Mark an identity's email as confirmed
    pub async fn confirm_identity(&self, id: &Uuid) -> Result<()> {
        sqlx::query("UPDATE identities SET email_confirmed = 1, updated_at = ? WHERE id = ?")
            .bind(chrono::Utc::now().to_rfc3339())
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to confirm identity")?;
        Ok(())
    }
}

fn row_to_identity(row: &sqlx::sqlite::SqliteRow) -> Identity {
    let id: String = row.get("id");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");
    let confirmed: i64 = row.get("email_confirmed");

    Identity {
        id: Uuid::parse_str(&id).unwrap_or_else(|_| Uuid::nil()),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        email_confirmed: confirmed != 0,
        created_at: parse_db_timestamp(&created_at),
        updated_at: parse_db_timestamp(&updated_at),
    }
}
