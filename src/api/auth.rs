//! Authentication API endpoints
//!
//! Sign-up with organization selection, password sign-in, one-time-link
//! sign-in, sign-out, and current-identity lookup. Confirmation and
//! one-time tokens are returned in the response in debug builds; a
//! deployment would deliver them out of band (email).

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Serialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::{OrganizationRepository, ProfileRepository},
    middleware::auth::{
        create_access_token, create_confirmation_token, create_magic_link_token, validate_token,
        AuthUser, TokenType,
    },
    models::{
        CallbackRequest, ConfirmRequest, Identity, LoginRequest, MagicLinkRequest, MeResponse,
        SessionResponse, SignupRequest,
    },
    services::{ensure_profile, AuthService},
    utils::{AppError, AppResult},
    AppState,
};

/// Public authentication routes
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/confirm", post(confirm))
        .route("/login", post(login))
        .route("/magic-link", post(magic_link))
        .route("/callback", post(callback))
}

/// Protected authentication routes
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/logout", post(logout))
        .route("/me", get(me))
}

#[derive(Debug, Serialize)]
struct SignupResponse {
    message: String,
    /// Only included in debug builds for testing
    #[serde(skip_serializing_if = "Option::is_none")]
    confirmation_token: Option<String>,
}

/// Sign up a new identity
///
/// POST /api/auth/signup
///
/// The chosen organization id is embedded in the signed confirmation
/// token so it survives the confirmation boundary without client-local
/// storage.
async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> AppResult<(StatusCode, Json<SignupResponse>)> {
    payload.validate()?;

    if payload.password.len() < state.config.auth.password_min_length {
        return Err(AppError::bad_request(format!(
            "Password must be at least {} characters",
            state.config.auth.password_min_length
        )));
    }

    // Reject unknown organizations up front; the signup form only offers
    // directory entries, so anything else is a stale or forged id.
    if let Some(org_id) = payload.organization_id {
        let orgs = OrganizationRepository::new(&state.db);
        if orgs
            .get_by_id(org_id)
            .await
            .map_err(|e| {
                tracing::error!("Failed to look up organization: {}", e);
                AppError::internal("Failed to look up organization")
            })?
            .is_none()
        {
            return Err(AppError::bad_request("Unknown organization"));
        }
    }

    let auth_service = AuthService::new(state.db.clone());
    let identity = auth_service
        .create_identity(&payload.email, &payload.password)
        .await
        .map_err(|e| {
            let message = e.to_string();
            if message.contains("already exists") {
                AppError::conflict(message)
            } else {
                tracing::error!("Failed to create identity: {}", e);
                AppError::internal("Failed to create identity")
            }
        })?;

    let token = create_confirmation_token(
        &identity.id,
        &identity.email,
        payload.organization_id,
        &state.config.auth.jwt_secret,
        state.config.auth.confirmation_expiry_hours,
    )
    .map_err(|e| {
        tracing::error!("Failed to create confirmation token: {}", e);
        AppError::internal("Failed to create confirmation token")
    })?;

    #[cfg(debug_assertions)]
    let confirmation_token = Some(token);

    #[cfg(not(debug_assertions))]
    let confirmation_token: Option<String> = {
        let _ = token;
        None
    };

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            message: "Account created. Confirm your email to start chatting.".to_string(),
            confirmation_token,
        }),
    ))
}

/// Confirm a signup and open a session
///
/// POST /api/auth/confirm
async fn confirm(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<ConfirmRequest>,
) -> AppResult<(CookieJar, Json<SessionResponse>)> {
    let token_data = validate_token(
        &payload.token,
        &state.config.auth.jwt_secret,
        TokenType::Confirm,
    )
    .map_err(|_| AppError::unauthorized("Unauthorized"))?;

    let identity_id = Uuid::parse_str(&token_data.claims.sub)
        .map_err(|_| AppError::unauthorized("Unauthorized"))?;
    let chosen_org = token_data
        .claims
        .organization_id
        .as_deref()
        .and_then(|s| Uuid::parse_str(s).ok());

    let auth_service = AuthService::new(state.db.clone());
    let identity = auth_service
        .get_identity_by_id(&identity_id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch identity: {}", e);
            AppError::internal("Failed to fetch identity")
        })?
        .ok_or_else(|| AppError::unauthorized("Unauthorized"))?;

    auth_service.confirm_identity(&identity.id).await.map_err(|e| {
        tracing::error!("Failed to confirm identity: {}", e);
        AppError::internal("Failed to confirm identity")
    })?;

    // Provision the profile into the chosen organization right away so
    // the chat view finds it on first load.
    ensure_profile(&state.db, identity.id, &identity.email, chosen_org).await?;

    open_session(&state, jar, identity)
}

/// Password sign-in
///
/// POST /api/auth/login
async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> AppResult<(CookieJar, Json<SessionResponse>)> {
    let auth_service = AuthService::new(state.db.clone());

    let identity = auth_service
        .authenticate(&payload.email, &payload.password)
        .await
        .map_err(|e| {
            tracing::error!("Authentication failed: {}", e);
            AppError::internal("Authentication failed")
        })?
        .ok_or_else(|| AppError::unauthorized("Invalid email or password"))?;

    if !identity.email_confirmed {
        return Err(AppError::unauthorized("Email not confirmed"));
    }

    open_session(&state, jar, identity)
}

#[derive(Debug, Serialize)]
struct MagicLinkResponse {
    message: String,
    /// Only included in debug builds for testing
    #[serde(skip_serializing_if = "Option::is_none")]
    magic_link_token: Option<String>,
}

/// Request a one-time sign-in link
///
/// POST /api/auth/magic-link
///
/// Always answers with the same message so callers cannot probe which
/// emails exist.
async fn magic_link(
    State(state): State<AppState>,
    Json(payload): Json<MagicLinkRequest>,
) -> AppResult<Json<MagicLinkResponse>> {
    payload.validate()?;

    let auth_service = AuthService::new(state.db.clone());
    let identity = auth_service
        .get_identity_by_email(&payload.email)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch identity: {}", e);
            AppError::internal("Failed to process request")
        })?;

    let _token = match identity {
        Some(identity) => Some(
            create_magic_link_token(
                &identity.id,
                &identity.email,
                &state.config.auth.jwt_secret,
                state.config.auth.magic_link_expiry_minutes,
            )
            .map_err(|e| {
                tracing::error!("Failed to create magic link token: {}", e);
                AppError::internal("Failed to process request")
            })?,
        ),
        None => None,
    };

    #[cfg(debug_assertions)]
    let magic_link_token = _token;

    #[cfg(not(debug_assertions))]
    let magic_link_token: Option<String> = None;

    Ok(Json(MagicLinkResponse {
        message: "If an account with that email exists, a sign-in link has been sent.".to_string(),
        magic_link_token,
    }))
}

/// Redeem a one-time sign-in token and open a session
///
/// POST /api/auth/callback
async fn callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<CallbackRequest>,
) -> AppResult<(CookieJar, Json<SessionResponse>)> {
    let token_data = validate_token(
        &payload.token,
        &state.config.auth.jwt_secret,
        TokenType::MagicLink,
    )
    .map_err(|_| AppError::unauthorized("Unauthorized"))?;

    let identity_id = Uuid::parse_str(&token_data.claims.sub)
        .map_err(|_| AppError::unauthorized("Unauthorized"))?;

    let auth_service = AuthService::new(state.db.clone());
    let identity = auth_service
        .get_identity_by_id(&identity_id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch identity: {}", e);
            AppError::internal("Failed to fetch identity")
        })?
        .ok_or_else(|| AppError::unauthorized("Unauthorized"))?;

    // Proving control of the inbox confirms the email.
    if !identity.email_confirmed {
        auth_service.confirm_identity(&identity.id).await.map_err(|e| {
            tracing::error!("Failed to confirm identity: {}", e);
            AppError::internal("Failed to confirm identity")
        })?;
    }

    open_session(&state, jar, identity)
}

#[derive(Debug, Serialize)]
struct LogoutResponse {
    message: String,
}

/// Sign out: clears the session cookie. Tokens are stateless, so API
/// clients simply discard theirs.
///
/// POST /api/auth/logout
async fn logout(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    jar: CookieJar,
) -> (CookieJar, Json<LogoutResponse>) {
    let removal = Cookie::build((state.config.auth.session_cookie.clone(), ""))
        .path("/")
        .build();

    (
        jar.remove(removal),
        Json(LogoutResponse {
            message: "Successfully logged out".to_string(),
        }),
    )
}

/// Current identity, with profile and organization when provisioned
///
/// GET /api/auth/me
async fn me(State(state): State<AppState>, auth_user: AuthUser) -> AppResult<Json<MeResponse>> {
    let auth_service = AuthService::new(state.db.clone());
    let identity = auth_service
        .get_identity_by_id(&auth_user.id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch identity: {}", e);
            AppError::internal("Failed to fetch identity")
        })?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    let profiles = ProfileRepository::new(&state.db);
    let profile = profiles.get_by_id(auth_user.id).await.map_err(|e| {
        tracing::error!("Failed to fetch profile: {}", e);
        AppError::internal("Failed to fetch profile")
    })?;

    let organization = match &profile {
        Some(profile) => {
            let orgs = OrganizationRepository::new(&state.db);
            orgs.get_by_id(profile.organization_id)
                .await
                .map_err(|e| {
                    tracing::error!("Failed to fetch organization: {}", e);
                    AppError::internal("Failed to fetch organization")
                })?
                .map(Into::into)
        }
        None => None,
    };

    Ok(Json(MeResponse {
        identity: identity.into(),
        profile,
        organization,
    }))
}

/// Issue an access token and set the session cookie
fn open_session(
    state: &AppState,
    jar: CookieJar,
    identity: Identity,
) -> AppResult<(CookieJar, Json<SessionResponse>)> {
    let access_token = create_access_token(
        &identity.id,
        &identity.email,
        &state.config.auth.jwt_secret,
        state.config.auth.token_expiry_hours,
    )
    .map_err(|e| {
        tracing::error!("Failed to create access token: {}", e);
        AppError::internal("Failed to create access token")
    })?;

    let cookie = Cookie::build((
        state.config.auth.session_cookie.clone(),
        access_token.clone(),
    ))
    .path("/")
    .http_only(true)
    .same_site(SameSite::Lax)
    .build();

    Ok((
        jar.add(cookie),
        Json(SessionResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: state.config.auth.token_expiry_hours * 3600,
            identity: identity.into(),
        }),
    ))
}
