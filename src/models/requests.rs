//! Request and Response Models
//!
//! Data structures for API request and response payloads with validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use crate::models::user::UserProfile;
use crate::utils::error::FieldViolation;
use crate::utils::validation::{
    display_name_validator, email_validator, ordered_violations, password_bytes_validator,
};

/// Request payload for registering a new account
///
/// Missing fields deserialize as empty strings so that they surface as field
/// violations instead of payload decoding failures.
#[derive(Clone, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Name shown to other users (required)
    #[validate(custom(function = "display_name_validator"))]
    pub display_name: String,

    /// Optional handle; not checked for uniqueness
    pub username: Option<String>,

    /// Email address (must be well-formed)
    #[validate(custom(function = "email_validator"))]
    pub email: String,

    /// Plaintext password, at least 6 characters and at most 72 bytes
    #[validate(
        length(min = 6, message = "Password must be at least 6 characters long."),
        custom(function = "password_bytes_validator")
    )]
    pub password: String,

    /// Role assigned to the profile; defaults to `Participant`
    pub role: Option<String>,
}

impl RegisterRequest {
    const FIELDS: &'static [(&'static str, &'static str)] = &[
        ("display_name", "displayName"),
        ("email", "email"),
        ("password", "password"),
    ];

    /// Checks every field and returns all violations in field order
    pub fn violations(&self) -> Vec<FieldViolation> {
        match self.validate() {
            Ok(()) => Vec::new(),
            Err(errors) => ordered_violations(&errors, Self::FIELDS),
        }
    }
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("display_name", &self.display_name)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}

/// Request payload for logging in
#[derive(Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct LoginRequest {
    /// Email address used at registration
    #[validate(custom(function = "email_validator"))]
    pub email: String,

    /// Plaintext password (cannot be empty)
    #[validate(length(min = 1, message = "Password cannot be empty."))]
    pub password: String,
}

impl LoginRequest {
    const FIELDS: &'static [(&'static str, &'static str)] =
        &[("email", "email"), ("password", "password")];

    /// Checks every field and returns all violations in field order
    pub fn violations(&self) -> Vec<FieldViolation> {
        match self.validate() {
            Ok(()) => Vec::new(),
            Err(errors) => ordered_violations(&errors, Self::FIELDS),
        }
    }
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Response for a successful registration
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub token: String,
    pub user: UserProfile,
}

/// Response for a successful login
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
}

/// Response for health check
#[derive(Debug, Serialize)]
pub struct HealthCheckResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

/// Messages returned on successful operations
pub mod success {
    pub const REGISTERED: &str = "User registered successfully.";
    pub const LOGGED_IN: &str = "User logged in successfully.";
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::validation::messages;

    fn valid_register_request() -> RegisterRequest {
        RegisterRequest {
            display_name: "Ada Lovelace".to_string(),
            username: Some("ada".to_string()),
            email: "ada@example.com".to_string(),
            password: "analytical".to_string(),
            role: None,
        }
    }

    #[test]
    fn test_register_request_validation() {
        assert!(valid_register_request().violations().is_empty());
    }

    #[test]
    fn test_register_request_reports_all_violations_in_order() {
        let request = RegisterRequest {
            display_name: "  ".to_string(),
            username: None,
            email: "not-an-email".to_string(),
            password: "12345".to_string(),
            role: None,
        };

        let violations = request.violations();
        let fields: Vec<&str> = violations.iter().map(|v| v.field.as_str()).collect();
        assert_eq!(fields, vec!["displayName", "email", "password"]);
        assert_eq!(violations[0].message, messages::DISPLAY_NAME_REQUIRED);
        assert_eq!(violations[2].message, messages::PASSWORD_TOO_SHORT);
    }

    #[test]
    fn test_register_request_password_length_boundary() {
        let mut request = valid_register_request();
        request.password = "123456".to_string();
        assert!(request.violations().is_empty());

        request.password = "12345".to_string();
        assert_eq!(request.violations().len(), 1);

        request.password = "p".repeat(72);
        assert!(request.violations().is_empty());

        request.password = "p".repeat(73);
        let violations = request.violations();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].message, messages::PASSWORD_TOO_LONG);
    }

    #[test]
    fn test_register_request_missing_fields_deserialize_as_violations() {
        let request: RegisterRequest =
            serde_json::from_str(r#"{"displayName":"Ada","email":"ada@example.com"}"#).unwrap();

        let violations = request.violations();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "password");
    }

    #[test]
    fn test_register_request_camel_case_payload() {
        let request: RegisterRequest = serde_json::from_str(
            r#"{"displayName":"Ada","username":"ada","email":"ada@example.com","password":"secret1","role":"Organizer"}"#,
        )
        .unwrap();

        assert_eq!(request.display_name, "Ada");
        assert_eq!(request.role.as_deref(), Some("Organizer"));
    }

    #[test]
    fn test_login_request_validation() {
        let request = LoginRequest {
            email: "ada@example.com".to_string(),
            password: "x".to_string(),
        };
        assert!(request.violations().is_empty());

        let invalid = LoginRequest {
            email: "ada".to_string(),
            password: String::new(),
        };
        let violations = invalid.violations();
        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].field, "email");
        assert_eq!(violations[1].message, messages::PASSWORD_EMPTY);
    }

    #[test]
    fn test_debug_output_redacts_password() {
        let rendered = format!("{:?}", valid_register_request());
        assert!(!rendered.contains("analytical"));
        assert!(rendered.contains("<redacted>"));
    }
}
