//! Configuration management
//!
//! YAML-based configuration with environment variable overrides, multiple
//! file locations, and defaults for every setting.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Path to static files directory (frontend build output)
    #[serde(default)]
    pub static_dir: Option<PathBuf>,
    /// Whether to serve the frontend SPA (enables fallback to index.html)
    #[serde(default)]
    pub serve_frontend: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: default_workers(),
            static_dir: None,
            serve_frontend: false,
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5080
}

fn default_workers() -> usize {
    num_cpus::get()
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_max_connections() -> u32 {
    10
}

fn default_connect_timeout() -> u64 {
    30
}

/// Authentication configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    /// Secret used to sign session, confirmation, and one-time tokens
    pub jwt_secret: String,
    #[serde(default = "default_token_expiry")]
    pub token_expiry_hours: u64,
    #[serde(default = "default_confirmation_expiry")]
    pub confirmation_expiry_hours: u64,
    #[serde(default = "default_magic_link_expiry")]
    pub magic_link_expiry_minutes: u64,
    #[serde(default = "default_password_min_length")]
    pub password_min_length: usize,
    /// Session cookie name shared with the browser view
    #[serde(default = "default_session_cookie")]
    pub session_cookie: String,
}

fn default_token_expiry() -> u64 {
    24
}

fn default_confirmation_expiry() -> u64 {
    48
}

fn default_magic_link_expiry() -> u64 {
    15
}

fn default_password_min_length() -> usize {
    8
}

fn default_session_cookie() -> String {
    "orgchat_session".to_string()
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
    #[serde(default)]
    pub target: LogTarget,
    /// Directory for log files (used when target is "file" or "both")
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    #[serde(default = "default_log_prefix")]
    pub log_prefix: String,
    #[serde(default = "default_log_rotation")]
    pub daily_rotation: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            target: LogTarget::default(),
            log_dir: default_log_dir(),
            log_prefix: default_log_prefix(),
            daily_rotation: default_log_rotation(),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Compact,
    #[default]
    Pretty,
}

/// Log output target
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogTarget {
    #[default]
    Console,
    File,
    Both,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("/var/log/orgchat")
}

fn default_log_prefix() -> String {
    "orgchat".to_string()
}

fn default_log_rotation() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig {
                url: "sqlite://./data/orgchat.db?mode=rwc".to_string(),
                max_connections: default_max_connections(),
                connect_timeout_secs: default_connect_timeout(),
            },
            auth: AuthConfig {
                jwt_secret: String::new(),
                token_expiry_hours: default_token_expiry(),
                confirmation_expiry_hours: default_confirmation_expiry(),
                magic_link_expiry_minutes: default_magic_link_expiry(),
                password_min_length: default_password_min_length(),
                session_cookie: default_session_cookie(),
            },
            logging: LoggingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment variables
    ///
    /// Loaded in order (later overrides earlier):
    /// 1. Default values
    /// 2. Configuration file (YAML)
    /// 3. Environment variables (prefixed with ORGCHAT_)
    pub fn load() -> Result<Self> {
        // Pick up .env if present
        let _ = dotenvy::dotenv();

        let config_path = std::env::var("ORGCHAT_CONFIG")
            .map(PathBuf::from)
            .ok()
            .or_else(Self::find_config_file);

        let mut config = if let Some(ref path) = config_path {
            if path.exists() {
                let contents = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file: {:?}", path))?;
                serde_norway::from_str(&contents)
                    .with_context(|| format!("Failed to parse config file: {:?}", path))?
            } else {
                AppConfig::default()
            }
        } else {
            AppConfig::default()
        };

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Find the configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let paths = [
            PathBuf::from("config.yaml"),
            PathBuf::from("config/config.yaml"),
            PathBuf::from("/etc/orgchat/config.yaml"),
        ];
        paths.into_iter().find(|p| p.exists())
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("ORGCHAT_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("ORGCHAT_PORT") {
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }
        if let Ok(url) = std::env::var("ORGCHAT_DATABASE_URL") {
            self.database.url = url;
        }
        if let Ok(secret) = std::env::var("ORGCHAT_JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        if let Ok(level) = std::env::var("ORGCHAT_LOG_LEVEL") {
            self.logging.level = level;
        }
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if self.auth.jwt_secret.len() < 32 {
            anyhow::bail!("auth.jwt_secret must be at least 32 bytes");
        }
        if self.database.url.is_empty() {
            anyhow::bail!("database.url must be set");
        }
        Ok(())
    }
}
