//! Test application setup utilities
//!
//! Spins up the full router against a throwaway SQLite database so tests
//! exercise the real middleware, handlers, and migrations.

use axum::{body::Body, http::Request, Router};
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use tower::ServiceExt;
use uuid::Uuid;

use orgchat::{
    api,
    config::{AppConfig, AuthConfig, DatabaseConfig, LoggingConfig, ServerConfig},
    db,
    middleware::auth::{Claims, TokenType},
    AppState,
};

/// Test application wrapper for integration testing
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

impl TestApp {
    /// Create a new test application with a throwaway SQLite database
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    /// Create a new test application with custom configuration
    pub async fn with_config(config: AppConfig) -> Self {
        let db = db::init_pool(&config.database)
            .await
            .expect("Failed to initialize test database");

        let state = AppState { config, db };

        // Same route layout as the production router, minus static files
        let router = Router::new()
            .nest("/api", api::public_routes())
            .nest(
                "/api",
                api::protected_routes().layer(axum::middleware::from_fn_with_state(
                    state.clone(),
                    orgchat::middleware::auth::auth_middleware,
                )),
            )
            .with_state(state.clone());

        Self { router, state }
    }

    /// Make a GET request to the test application
    pub async fn get(&self, uri: &str) -> TestResponse {
        self.request(
            Request::builder()
                .method("GET")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    /// Make an authenticated GET request
    pub async fn get_with_auth(&self, uri: &str, token: &str) -> TestResponse {
        self.request_with_auth(
            Request::builder()
                .method("GET")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
            token,
        )
        .await
    }

    /// Make a POST request with JSON body
    pub async fn post_json(&self, uri: &str, body: serde_json::Value) -> TestResponse {
        self.request(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    /// Make an authenticated POST request with JSON body
    pub async fn post_json_with_auth(
        &self,
        uri: &str,
        body: serde_json::Value,
        token: &str,
    ) -> TestResponse {
        self.request_with_auth(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            token,
        )
        .await
    }

    /// Make a request with authentication
    pub async fn request_with_auth(&self, request: Request<Body>, token: &str) -> TestResponse {
        let (mut parts, body) = request.into_parts();
        parts.headers.insert(
            "Authorization",
            format!("Bearer {}", token).parse().unwrap(),
        );
        self.request(Request::from_parts(parts, body)).await
    }

    /// Make an arbitrary request
    pub async fn request(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to execute request");

        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read response body");

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: axum::http::StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: bytes::Bytes,
}

impl TestResponse {
    /// Get the response body as a string
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    /// Parse the response body as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body).expect("Failed to parse response as JSON")
    }

    /// Assert the response status
    pub fn assert_status(&self, expected: axum::http::StatusCode) -> &Self {
        assert_eq!(
            self.status,
            expected,
            "Expected status {}, got {}. Body: {}",
            expected,
            self.status,
            self.text()
        );
        self
    }

    /// Assert the response status is OK (200)
    pub fn assert_ok(&self) -> &Self {
        self.assert_status(axum::http::StatusCode::OK)
    }

    /// Assert the response status is Created (201)
    pub fn assert_created(&self) -> &Self {
        self.assert_status(axum::http::StatusCode::CREATED)
    }

    /// Assert the response status is Bad Request (400)
    pub fn assert_bad_request(&self) -> &Self {
        self.assert_status(axum::http::StatusCode::BAD_REQUEST)
    }

    /// Assert the response status is Unauthorized (401)
    pub fn assert_unauthorized(&self) -> &Self {
        self.assert_status(axum::http::StatusCode::UNAUTHORIZED)
    }

    /// Assert the response status is Not Found (404)
    pub fn assert_not_found(&self) -> &Self {
        self.assert_status(axum::http::StatusCode::NOT_FOUND)
    }

    /// Assert the response status is Conflict (409)
    pub fn assert_conflict(&self) -> &Self {
        self.assert_status(axum::http::StatusCode::CONFLICT)
    }

    /// Assert the error body matches the wire contract
    pub fn assert_error_message(&self, expected: &str) -> &Self {
        let json: serde_json::Value = self.json();
        assert_eq!(
            json["error"].as_str(),
            Some(expected),
            "Unexpected error body: {}",
            self.text()
        );
        self
    }
}

/// Create a test configuration with a unique temporary SQLite database
pub fn test_config() -> AppConfig {
    let db_path = format!(
        "/tmp/orgchat_test_{}.db",
        Uuid::new_v4().to_string().replace('-', "")
    );

    AppConfig {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
            workers: 1,
            static_dir: None,
            serve_frontend: false,
        },
        database: DatabaseConfig {
            url: format!("sqlite://{}?mode=rwc", db_path),
            max_connections: 1,
            connect_timeout_secs: 30,
        },
        auth: AuthConfig {
            jwt_secret: "test_secret_key_that_is_at_least_32_bytes_long".to_string(),
            token_expiry_hours: 24,
            confirmation_expiry_hours: 48,
            magic_link_expiry_minutes: 15,
            password_min_length: 8,
            session_cookie: "orgchat_session".to_string(),
        },
        logging: LoggingConfig::default(),
    }
}

/// Generate a session token for an arbitrary identity
///
/// The session layer is stateless, so a signed token is all a test needs
/// to act as an authenticated identity.
pub fn generate_test_token(config: &AppConfig, identity_id: Uuid, email: &str) -> String {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: identity_id.to_string(),
        email: email.to_string(),
        iat: now,
        exp: now + 3600,
        nbf: now,
        jti: Uuid::new_v4().to_string(),
        token_type: TokenType::Access,
        organization_id: None,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.auth.jwt_secret.as_bytes()),
    )
    .expect("Failed to generate test token")
}

/// Drive the full signup flow and return a session token
///
/// Relies on debug builds echoing the confirmation token in the signup
/// response.
pub async fn signup_and_confirm(
    app: &TestApp,
    email: &str,
    organization_id: Option<Uuid>,
) -> String {
    let mut body = serde_json::json!({
        "email": email,
        "password": "password123",
    });
    if let Some(org) = organization_id {
        body["organization_id"] = serde_json::json!(org.to_string());
    }

    let response = app.post_json("/api/auth/signup", body).await;
    response.assert_created();
    let json: serde_json::Value = response.json();
    let confirmation_token = json["confirmation_token"]
        .as_str()
        .expect("confirmation token present in debug builds")
        .to_string();

    let response = app
        .post_json(
            "/api/auth/confirm",
            serde_json::json!({ "token": confirmation_token }),
        )
        .await;
    response.assert_ok();
    let json: serde_json::Value = response.json();
    json["access_token"]
        .as_str()
        .expect("session token in confirm response")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_app_creation() {
        let app = TestApp::new().await;
        assert_eq!(app.state.config.server.port, 3000);
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = TestApp::new().await;
        let response = app.get("/api/health").await;
        response.assert_ok();
    }

    #[tokio::test]
    async fn test_response_json_parsing() {
        let app = TestApp::new().await;
        let response = app.get("/api/health").await;
        let json: serde_json::Value = response.json();
        assert!(json.get("status").is_some());
    }
}
