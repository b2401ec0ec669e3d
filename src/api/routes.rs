//! API Route Definitions
//!
//! This module defines all HTTP routes and their corresponding handlers using a flexible
//! builder pattern. The RouterBuilder allows selective enabling/disabling of API endpoints,
//! for example to run registration and login behind separate deployments.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::*;

/// Builder for creating API routes with configurable endpoints
///
/// The RouterBuilder provides a fluent interface for constructing routers with
/// only the endpoints you need. Disabled endpoints are simply not mounted and
/// answer with 404.
#[derive(Default)]
pub struct RouterBuilder {
    /// Whether to enable the health check endpoint (GET /health)
    health_check: bool,
    /// Whether to enable the registration endpoint (POST /auth/register)
    register: bool,
    /// Whether to enable the login endpoint (POST /auth/login)
    login: bool,
}

impl RouterBuilder {
    /// Creates a new router builder with all routes disabled by default
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a router builder with all routes enabled
    pub fn with_all_routes() -> Self {
        Self {
            health_check: true,
            register: true,
            login: true,
        }
    }

    /// Creates a router builder with only the auth endpoints (no health check)
    pub fn with_auth_routes() -> Self {
        Self {
            health_check: false,
            register: true,
            login: true,
        }
    }

    /// Creates a router builder with only the health check enabled
    pub fn with_minimal_routes() -> Self {
        Self {
            health_check: true,
            ..Self::default()
        }
    }

    /// Enable or disable the health check endpoint
    pub fn health_check(mut self, enabled: bool) -> Self {
        self.health_check = enabled;
        self
    }

    /// Enable or disable the registration endpoint
    pub fn register(mut self, enabled: bool) -> Self {
        self.register = enabled;
        self
    }

    /// Enable or disable the login endpoint
    pub fn login(mut self, enabled: bool) -> Self {
        self.login = enabled;
        self
    }

    /// Builds the router with the configured endpoints
    pub fn build(self) -> Router<AppState> {
        let mut router = Router::new();

        if self.health_check {
            router = router.route("/health", get(health_check));
        }

        if self.register {
            router = router.route("/auth/register", post(register));
        }

        if self.login {
            router = router.route("/auth/login", post(login));
        }

        router
    }
}

/// Creates the router with every endpoint enabled
///
/// Equivalent to `RouterBuilder::with_all_routes().build()`.
pub fn create_routes() -> Router<AppState> {
    RouterBuilder::with_all_routes().build()
}
