//! Configuration Module
//!
//! Centralized configuration management for the auth service: server, database,
//! token signing, identity provider and auth flow settings, all read from the
//! environment.

use thiserror::Error;

use crate::database::DatabaseConfig;
use crate::utils::security::{DEFAULT_BCRYPT_COST, MAX_BCRYPT_COST, MIN_BCRYPT_COST};

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required environment variable is not set
    #[error("Required environment variable {0} is not set")]
    Missing(String),

    /// A value is present but unusable
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Environment variable helpers
pub mod env {
    use super::ConfigError;
    use std::env;

    /// Get environment variable as string with default
    pub fn get_string(key: &str, default: &str) -> String {
        env::var(key).unwrap_or_else(|_| default.to_string())
    }

    /// Get environment variable as u32 with default
    pub fn get_u32(key: &str, default: u32) -> u32 {
        env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Get environment variable as u16 with default
    pub fn get_u16(key: &str, default: u16) -> u16 {
        env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Get environment variable as u64 with default
    pub fn get_u64(key: &str, default: u64) -> u64 {
        env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Check if environment variable is set
    pub fn is_set(key: &str) -> bool {
        env::var(key).is_ok()
    }

    /// Get required environment variable
    pub fn get_required(key: &str) -> Result<String, ConfigError> {
        env::var(key).map_err(|_| ConfigError::Missing(key.to_string()))
    }
}

/// Application configuration combining all service configurations
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Token signing configuration
    pub jwt: JwtConfig,

    /// Identity provider configuration
    pub identity_provider: IdentityProviderConfig,

    /// Registration/login flow configuration
    pub auth: AuthConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Default log level when `RUST_LOG` is unset
    pub log_level: String,
    pub cors_origins: Vec<String>,
}

/// Token signing configuration
#[derive(Clone)]
pub struct JwtConfig {
    /// Process-wide HS256 signing secret
    pub secret: String,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Identity provider (identity toolkit REST API) configuration
#[derive(Debug, Clone)]
pub struct IdentityProviderConfig {
    pub api_key: String,
    pub base_url: String,
    pub request_timeout_seconds: u64,
}

/// Registration/login flow configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// bcrypt work factor for the local password copy
    pub bcrypt_cost: u32,
    /// Deadline for each identity provider or profile store call
    pub external_call_timeout_seconds: u64,
}

/// Minimum secret length below which a warning is logged
const RECOMMENDED_SECRET_LEN: usize = 32;

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: env::get_string("SERVER_HOST", "0.0.0.0"),
            port: env::get_u16("SERVER_PORT", 3000),
            log_level: env::get_string("LOG_LEVEL", "info"),
            cors_origins: env::get_string("CORS_ORIGINS", "*")
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            bcrypt_cost: env::get_u32("BCRYPT_COST", DEFAULT_BCRYPT_COST),
            external_call_timeout_seconds: env::get_u64("EXTERNAL_CALL_TIMEOUT_SECONDS", 10),
        }
    }
}

impl JwtConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            secret: env::get_required("JWT_SECRET")?,
        })
    }
}

impl IdentityProviderConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_key: env::get_required("IDENTITY_PROVIDER_API_KEY")?,
            base_url: env::get_string(
                "IDENTITY_PROVIDER_BASE_URL",
                "https://identitytoolkit.googleapis.com",
            ),
            request_timeout_seconds: env::get_u64("IDENTITY_PROVIDER_TIMEOUT_SECONDS", 30),
        })
    }
}

impl AppConfig {
    /// Load complete application configuration from environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::from_env()
                .map_err(|_| ConfigError::Missing("DATABASE_URL".to_string()))?,
            jwt: JwtConfig::from_env()?,
            identity_provider: IdentityProviderConfig::from_env()?,
            auth: AuthConfig::default(),
        })
    }

    /// Validate the complete configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Validate server configuration
        if self.server.port == 0 {
            return Err(ConfigError::Invalid(
                "Server port must be greater than 0".into(),
            ));
        }

        if self.server.log_level.parse::<log::LevelFilter>().is_err() {
            return Err(ConfigError::Invalid(format!(
                "LOG_LEVEL must be one of off, error, warn, info, debug, trace (got {})",
                self.server.log_level
            )));
        }

        // Validate database configuration
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "Database max_connections must be greater than 0".into(),
            ));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigError::Invalid(
                "Database min_connections cannot be greater than max_connections".into(),
            ));
        }

        // Validate signing secret
        if self.jwt.secret.trim().is_empty() {
            return Err(ConfigError::Invalid("JWT secret cannot be empty".into()));
        }

        if self.jwt.secret.len() < RECOMMENDED_SECRET_LEN {
            log::warn!(
                "JWT secret is shorter than {} bytes; use a longer random secret",
                RECOMMENDED_SECRET_LEN
            );
        }

        // Validate identity provider configuration
        if self.identity_provider.api_key.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "Identity provider API key cannot be empty".into(),
            ));
        }

        if !self.identity_provider.base_url.starts_with("http://")
            && !self.identity_provider.base_url.starts_with("https://")
        {
            return Err(ConfigError::Invalid(
                "Identity provider base URL must start with http:// or https://".into(),
            ));
        }

        // Validate auth flow configuration
        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&self.auth.bcrypt_cost) {
            return Err(ConfigError::Invalid(format!(
                "BCRYPT_COST must be between {} and {}",
                MIN_BCRYPT_COST, MAX_BCRYPT_COST
            )));
        }

        if self.auth.external_call_timeout_seconds == 0 {
            return Err(ConfigError::Invalid(
                "EXTERNAL_CALL_TIMEOUT_SECONDS must be greater than 0".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> AppConfig {
        AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
                log_level: "info".to_string(),
                cors_origins: vec!["*".to_string()],
            },
            database: DatabaseConfig::default(),
            jwt: JwtConfig {
                secret: "a-signing-secret-that-is-long-enough!".to_string(),
            },
            identity_provider: IdentityProviderConfig {
                api_key: "api-key".to_string(),
                base_url: "https://identitytoolkit.googleapis.com".to_string(),
                request_timeout_seconds: 30,
            },
            auth: AuthConfig {
                bcrypt_cost: DEFAULT_BCRYPT_COST,
                external_call_timeout_seconds: 10,
            },
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_log_level_must_be_a_level() {
        let mut config = valid_config();
        config.server.log_level = "DEBUG".to_string();
        assert!(config.validate().is_ok());

        config.server.log_level = "loud".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_empty_secret_rejected() {
        let mut config = valid_config();
        config.jwt.secret = "  ".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_bcrypt_cost_bounds() {
        let mut config = valid_config();
        config.auth.bcrypt_cost = 3;
        assert!(config.validate().is_err());
        config.auth.bcrypt_cost = 12;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = valid_config();
        config.auth.external_call_timeout_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_base_url_scheme_required() {
        let mut config = valid_config();
        config.identity_provider.base_url = "identitytoolkit.googleapis.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_jwt_config_debug_redacts_secret() {
        let rendered = format!("{:?}", valid_config().jwt);
        assert!(!rendered.contains("long-enough"));
    }

    #[test]
    fn test_env_helpers() {
        assert_eq!(env::get_u32("AUTH_SERVICE_NONEXISTENT_U32", 42), 42);
        assert_eq!(
            env::get_string("AUTH_SERVICE_NONEXISTENT_STRING", "default"),
            "default"
        );
        assert!(!env::is_set("AUTH_SERVICE_NONEXISTENT_STRING"));
        assert!(matches!(
            env::get_required("AUTH_SERVICE_NONEXISTENT_REQUIRED"),
            Err(ConfigError::Missing(_))
        ));
    }
}
