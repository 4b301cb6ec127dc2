//! Session authentication middleware
//!
//! Sessions are stateless JWTs. The token travels either as an
//! `Authorization: Bearer` header (API clients) or in the session cookie
//! (the browser view); the middleware accepts both. Confirmation and
//! one-time sign-in links reuse the same signing machinery with dedicated
//! token types so a confirmation token can never open a session directly.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{utils::error::ErrorBody, AppState};

/// JWT claims shared by all token types
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (identity id)
    pub sub: String,
    /// Identity email
    pub email: String,
    /// Issued at timestamp
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
    /// Not before timestamp
    pub nbf: i64,
    /// JWT ID
    pub jti: String,
    /// Token purpose
    #[serde(default)]
    pub token_type: TokenType,
    /// Caller-chosen organization, carried across the confirmation
    /// boundary inside the signed token (confirmation tokens only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
}

/// Token purpose; each is only accepted by its own redemption path
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    #[default]
    Access,
    Confirm,
    MagicLink,
}

/// Authenticated identity extracted from a session token
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
}

impl TryFrom<Claims> for AuthUser {
    type Error = &'static str;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(&claims.sub).map_err(|_| "Invalid identity ID in token")?;
        Ok(Self {
            id,
            email: claims.email,
        })
    }
}

/// Extractor for AuthUser from request extensions (after auth middleware)
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorBody>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<AuthUser>().cloned().ok_or_else(|| {
            (
                StatusCode::UNAUTHORIZED,
                Json(ErrorBody {
                    error: "Unauthorized".to_string(),
                }),
            )
        })
    }
}

/// Create a session (access) token
pub fn create_access_token(
    identity_id: &Uuid,
    email: &str,
    secret: &str,
    expiry_hours: u64,
) -> Result<String, jsonwebtoken::errors::Error> {
    sign(
        identity_id,
        email,
        TokenType::Access,
        None,
        Duration::hours(expiry_hours as i64),
        secret,
    )
}

/// Create a confirmation token carrying the caller-chosen organization
pub fn create_confirmation_token(
    identity_id: &Uuid,
    email: &str,
    organization_id: Option<Uuid>,
    secret: &str,
    expiry_hours: u64,
) -> Result<String, jsonwebtoken::errors::Error> {
    sign(
        identity_id,
        email,
        TokenType::Confirm,
        organization_id,
        Duration::hours(expiry_hours as i64),
        secret,
    )
}

/// Create a one-time sign-in token
pub fn create_magic_link_token(
    identity_id: &Uuid,
    email: &str,
    secret: &str,
    expiry_minutes: u64,
) -> Result<String, jsonwebtoken::errors::Error> {
    sign(
        identity_id,
        email,
        TokenType::MagicLink,
        None,
        Duration::minutes(expiry_minutes as i64),
        secret,
    )
}

fn sign(
    identity_id: &Uuid,
    email: &str,
    token_type: TokenType,
    organization_id: Option<Uuid>,
    lifetime: Duration,
    secret: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        sub: identity_id.to_string(),
        email: email.to_string(),
        iat: now.timestamp(),
        exp: (now + lifetime).timestamp(),
        nbf: now.timestamp(),
        jti: Uuid::new_v4().to_string(),
        token_type,
        organization_id: organization_id.map(|id| id.to_string()),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Validate and decode a token, checking its purpose
pub fn validate_token(
    token: &str,
    secret: &str,
    expected_type: TokenType,
) -> Result<TokenData<Claims>, AuthError> {
    let mut validation = Validation::default();
    validation.validate_exp = true;
    validation.validate_nbf = true;

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken,
    })?;

    if data.claims.token_type != expected_type {
        return Err(AuthError::InvalidTokenType);
    }

    Ok(data)
}

/// Authentication error types
#[derive(Debug)]
pub enum AuthError {
    MissingToken,
    InvalidToken,
    TokenExpired,
    InvalidTokenType,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        // Wire contract: every auth failure is 401 {"error":"Unauthorized"}.
        let body = ErrorBody {
            error: "Unauthorized".to_string(),
        };
        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    }
}

/// Extract bearer token from Authorization header
fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .or_else(|| auth_header.strip_prefix("bearer "))
}

/// Authentication middleware
///
/// Validates the session token (Bearer header first, session cookie as
/// fallback) and injects the AuthUser into request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let bearer = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(extract_bearer_token)
        .map(str::to_owned);

    let token = match bearer {
        Some(token) => token,
        None => {
            let jar = CookieJar::from_headers(request.headers());
            jar.get(&state.config.auth.session_cookie)
                .map(|c| c.value().to_string())
                .ok_or(AuthError::MissingToken)?
        }
    };

    let token_data = validate_token(&token, &state.config.auth.jwt_secret, TokenType::Access)?;
    let auth_user: AuthUser = token_data
        .claims
        .try_into()
        .map_err(|_| AuthError::InvalidToken)?;

    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}
