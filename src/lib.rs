//! Auth Service Library
//!
//! Registration and login for a user-facing application. Credentials are held
//! by an external identity provider, profiles by a local PostgreSQL store, and
//! successful calls return a short-lived HS256 token.
//!
//! # Features
//!
//! - **Registration**: identity provider account, local profile and token in one call,
//!   with compensation when the profile write fails
//! - **Login**: email/password check against the locally stored bcrypt hash
//! - **Error Translation**: identity provider error codes mapped to fixed messages
//!   and HTTP statuses
//! - **Flexible Router**: Configurable endpoints via RouterBuilder pattern
//! - **Pluggable Stores**: `CredentialStore` and `ProfileRepository` traits with
//!   REST/PostgreSQL and in-memory implementations
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use auth_service::{
//!     api::{AppState, RouterBuilder},
//!     config::AppConfig,
//!     service::{AuthService, IdentityToolkitStore, PgProfileRepository, TokenIssuer},
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::from_env()?;
//!     let pool = config.database.create_pool().await?;
//!
//!     let auth_service = AuthService::new(
//!         Arc::new(IdentityToolkitStore::new(&config.identity_provider)?),
//!         Arc::new(PgProfileRepository::new(pool)),
//!         Arc::new(TokenIssuer::new(&config.jwt.secret)),
//!     );
//!
//!     // Only expose the auth endpoints
//!     let app = RouterBuilder::with_auth_routes()
//!         .build()
//!         .with_state(AppState::new(auth_service));
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//!     axum::serve(listener, app).await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - **API Layer**: HTTP handlers and configurable route definitions
//! - **Service Layer**: registration/login orchestration, credential store,
//!   profile repository, token issuer and error translation
//! - **Models**: Data structures and type definitions
//! - **Database**: Connection management and migrations
//! - **Utils**: Shared utilities for hashing, validation, and error handling

/// HTTP API layer with handlers and configurable routing
pub mod api;

/// Configuration management for all service settings
pub mod config;

/// Database connection management and configuration
pub mod database;

/// Data models and request/response structures
pub mod models;

/// Business logic, external stores and token issuing
pub mod service;

/// Shared utilities for security, validation, and error handling
pub mod utils;

// Re-export commonly used types for convenient access
pub use api::{create_routes, AppState, RouterBuilder};
pub use models::{
    auth::{AuthToken, AuthTokenClaims},
    requests::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse},
    user::{OrphanRecord, UserProfile},
};
pub use service::{AuthService, AuthServiceError, CredentialStore, ProfileRepository, TokenIssuer};
pub use utils::error::{AppError, AppResult, ErrorResponse};

// Re-export database utilities for configuration
pub use database::{DatabaseConfig, DatabasePool};

// Re-export configuration system
pub use config::{env, AppConfig, AuthConfig, IdentityProviderConfig, JwtConfig, ServerConfig};

/// Library version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
