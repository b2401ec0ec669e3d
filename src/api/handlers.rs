//! HTTP Request Handlers
//!
//! Axum handlers for the registration, login and health endpoints.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;

use crate::{
    models::requests::{
        success, HealthCheckResponse, LoginRequest, LoginResponse, RegisterRequest,
        RegisterResponse,
    },
    service::AuthService,
    utils::error::{AppError, AppResult},
    VERSION,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
}

impl AppState {
    pub fn new(auth_service: AuthService) -> Self {
        Self {
            auth_service: Arc::new(auth_service),
        }
    }
}

/// Unwraps a JSON body, reporting unreadable payloads as a 400 error body
fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(rejection) => {
            log::debug!("Rejected request body: {}", rejection.body_text());
            Err(AppError::BadRequest(
                "Request body must be a valid JSON object.".to_string(),
            ))
        }
    }
}

/// Register a new account
///
/// Creates the identity provider account, stores the local profile and
/// returns a signed token together with the public profile.
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<RegisterResponse>)> {
    let request = json_body(payload)?;

    let registration = state.auth_service.register(request).await?;

    let response = RegisterResponse {
        message: success::REGISTERED.to_string(),
        token: registration.token.token,
        user: registration.user,
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// Log in with email and password
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<Json<LoginResponse>> {
    let request = json_body(payload)?;

    let token = state.auth_service.login(request).await?;

    Ok(Json(LoginResponse {
        message: success::LOGGED_IN.to_string(),
        token: token.token,
    }))
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> AppResult<Json<HealthCheckResponse>> {
    // Check profile store connectivity
    state.auth_service.health_check().await?;

    let response = HealthCheckResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
        version: VERSION.to_string(),
    };

    Ok(Json(response))
}
