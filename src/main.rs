//! Orgchat - minimal multi-tenant chat service
//!
//! Serves the chat JSON API (signup/login, organization-scoped messages,
//! canned bot replies) and optionally the static frontend build.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::Router;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, warn, Level};

use orgchat::{api, config::LogFormat, config::LogTarget, db, middleware, AppConfig, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first, before logging, so we know the log format
    let config = AppConfig::load().context("Failed to load configuration")?;

    // The guard must stay alive for the program's lifetime so file logs
    // are flushed
    let _log_guard = init_logging(&config);

    info!("Orgchat starting up");

    ensure_data_directory(&config)?;

    info!("Initializing database connection");
    let db = db::init_pool(&config.database)
        .await
        .context("Failed to initialize database")?;

    let state = AppState {
        config: config.clone(),
        db,
    };

    let app = create_router(state, &config);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address configuration")?;

    info!("Starting HTTP server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!("HTTP server is ready to accept connections");

    axum::serve(listener, app)
        .await
        .context("HTTP server error")?;

    Ok(())
}

/// Initialize the logging/tracing infrastructure
fn init_logging(config: &AppConfig) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    let log_config = &config.logging;
    let registry = tracing_subscriber::registry().with(env_filter);

    match &log_config.target {
        LogTarget::Console => {
            match log_config.format {
                LogFormat::Json => registry.with(fmt::layer().json().with_target(true)).init(),
                LogFormat::Compact => registry
                    .with(fmt::layer().compact().with_target(false))
                    .init(),
                LogFormat::Pretty => registry.with(fmt::layer().with_target(true)).init(),
            }
            None
        }
        LogTarget::File => {
            let (writer, guard) = create_file_writer(log_config);
            match log_config.format {
                LogFormat::Json => registry
                    .with(fmt::layer().json().with_target(true).with_writer(writer))
                    .init(),
                LogFormat::Compact => registry
                    .with(
                        fmt::layer()
                            .compact()
                            .with_target(false)
                            .with_writer(writer),
                    )
                    .init(),
                LogFormat::Pretty => registry
                    .with(fmt::layer().with_target(true).with_writer(writer))
                    .init(),
            }
            Some(guard)
        }
        LogTarget::Both => {
            let (writer, guard) = create_file_writer(log_config);
            match log_config.format {
                LogFormat::Json => registry
                    .with(fmt::layer().json().with_target(true))
                    .with(fmt::layer().json().with_target(true).with_writer(writer))
                    .init(),
                LogFormat::Compact => registry
                    .with(fmt::layer().compact().with_target(false))
                    .with(
                        fmt::layer()
                            .compact()
                            .with_target(false)
                            .with_writer(writer),
                    )
                    .init(),
                LogFormat::Pretty => registry
                    .with(fmt::layer().with_target(true))
                    .with(fmt::layer().with_target(true).with_writer(writer))
                    .init(),
            }
            Some(guard)
        }
    }
}

/// Create a file writer with optional daily rotation
fn create_file_writer(
    log_config: &orgchat::config::LoggingConfig,
) -> (
    tracing_appender::non_blocking::NonBlocking,
    tracing_appender::non_blocking::WorkerGuard,
) {
    if let Err(e) = std::fs::create_dir_all(&log_config.log_dir) {
        eprintln!(
            "Warning: Failed to create log directory {:?}: {}",
            log_config.log_dir, e
        );
    }

    let file_appender = if log_config.daily_rotation {
        tracing_appender::rolling::daily(&log_config.log_dir, &log_config.log_prefix)
    } else {
        tracing_appender::rolling::never(&log_config.log_dir, &log_config.log_prefix)
    };

    tracing_appender::non_blocking(file_appender)
}

/// Ensure the data directory for a file-backed SQLite database exists
fn ensure_data_directory(config: &AppConfig) -> Result<()> {
    if let Some(path) = config.database.url.strip_prefix("sqlite://") {
        let path = path.split('?').next().unwrap_or(path);
        if let Some(parent) = std::path::Path::new(path).parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).context("Failed to create data directory")?;
                info!("Created data directory: {:?}", parent);
            }
        }
    }
    Ok(())
}

/// Create the application router with all routes and middleware
fn create_router(state: AppState, config: &AppConfig) -> Router {
    // CORS is only needed when the frontend is served separately
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    // Auth middleware is applied to protected routes only; signup, login,
    // confirmation, and the organization directory stay public.
    let api_router = Router::new()
        .nest("/api", api::public_routes())
        .nest(
            "/api",
            api::protected_routes().layer(axum::middleware::from_fn_with_state(
                state.clone(),
                middleware::auth::auth_middleware,
            )),
        )
        .with_state(state);

    // Optionally serve the chat view's static files
    let router = if config.server.serve_frontend {
        if let Some(ref static_dir) = config.server.static_dir {
            if static_dir.exists() {
                info!("Serving frontend from {:?}", static_dir);
                let index_file = static_dir.join("index.html");
                if index_file.exists() {
                    let serve_dir =
                        ServeDir::new(static_dir).not_found_service(ServeFile::new(&index_file));
                    api_router.fallback_service(serve_dir)
                } else {
                    warn!(
                        "index.html not found in {:?}, SPA fallback disabled",
                        static_dir
                    );
                    api_router.fallback_service(ServeDir::new(static_dir))
                }
            } else {
                warn!(
                    "Static directory {:?} does not exist, frontend not served",
                    static_dir
                );
                api_router
            }
        } else {
            info!("No static directory configured, frontend not served");
            api_router
        }
    } else {
        api_router
    };

    router.layer(CompressionLayer::new()).layer(trace_layer).layer(cors)
}
