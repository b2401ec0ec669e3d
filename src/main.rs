//! Auth Service Server
//!
//! HTTP server exposing registration, login and health endpoints backed by the
//! identity toolkit REST API and a PostgreSQL profile store.

use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderValue;
use dotenv::dotenv;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use auth_service::{
    api::{AppState, RouterBuilder},
    config::AppConfig,
    database::run_migrations,
    service::{AuthService, IdentityToolkitStore, PgProfileRepository, TokenIssuer},
    utils::security::PasswordHasher,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file if present
    dotenv().ok();

    // Load configuration from environment
    let config = AppConfig::from_env()?;

    // Initialize logging; RUST_LOG overrides LOG_LEVEL
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.server.log_level.as_str()),
    )
    .init();

    log::info!("🚀 Starting Auth Service v{}", auth_service::VERSION);

    config.validate()?;

    log::info!("✅ Configuration loaded and validated");

    // Database connection
    let database_pool = config.database.create_pool().await?;

    // Run database migrations
    log::info!("🔄 Running database migrations...");
    run_migrations(&database_pool).await?;

    log::info!("✅ Database migrations completed");

    // Initialize services
    let credential_store = IdentityToolkitStore::new(&config.identity_provider)?;
    let profiles = PgProfileRepository::new(database_pool);
    let tokens = TokenIssuer::new(&config.jwt.secret);
    let hasher = PasswordHasher::with_cost(config.auth.bcrypt_cost)?;
    let call_timeout = Duration::from_secs(config.auth.external_call_timeout_seconds);

    let auth_service = AuthService::new(
        Arc::new(credential_store),
        Arc::new(profiles),
        Arc::new(tokens),
    )
    .with_hasher(hasher)
    .with_call_timeout(call_timeout);

    log::info!("✅ Services initialized");
    log::info!("   - Identity provider: {}", config.identity_provider.base_url);
    log::info!("   - bcrypt cost: {}", config.auth.bcrypt_cost);
    log::info!("   - External call timeout: {:?}", call_timeout);

    let app_state = AppState::new(auth_service);

    let app = RouterBuilder::with_all_routes()
        .build()
        .with_state(app_state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&config.server.cors_origins))
                .into_inner(),
        );

    // Server configuration
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    log::info!("🌐 Starting server on {}", bind_addr);

    log::info!("📋 API Endpoints:");
    log::info!("   GET  /health - Health check");
    log::info!("   POST /auth/register - Register a new account");
    log::info!("   POST /auth/login - Log in with email and password");

    // Start the server
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    log::info!("✅ Server listening and ready for requests");
    axum::serve(listener, app).await?;

    Ok(())
}

/// Permissive CORS for `*`, otherwise only the configured origins
fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                log::warn!("⚠️  Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(allowed))
}
