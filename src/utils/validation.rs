//! Validation Utilities
//!
//! Input validation helpers shared by the request models.

use regex::Regex;
use std::borrow::Cow;
use std::sync::OnceLock;
use validator::{ValidationError, ValidationErrors};

use crate::utils::error::FieldViolation;
use crate::utils::security::MAX_PASSWORD_BYTES;

/// Validates email address format using a comprehensive regex pattern
pub fn validate_email(email: &str) -> bool {
    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    regex.is_match(email.trim())
}

/// Normalizes email address to lowercase and removes whitespace
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Custom validator for email fields using the validator crate
pub fn email_validator(email: &str) -> Result<(), ValidationError> {
    if validate_email(email) {
        Ok(())
    } else {
        let mut error = ValidationError::new("invalid_email");
        error.message = Some(Cow::Borrowed(messages::INVALID_EMAIL));
        Err(error)
    }
}

/// Custom validator for the display name: must not be blank
pub fn display_name_validator(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("blank");
        error.message = Some(Cow::Borrowed(messages::DISPLAY_NAME_REQUIRED));
        Err(error)
    } else {
        Ok(())
    }
}

/// Custom validator capping passwords at the bytes the hasher can use
pub fn password_bytes_validator(value: &str) -> Result<(), ValidationError> {
    if value.len() > MAX_PASSWORD_BYTES {
        let mut error = ValidationError::new("too_long");
        error.message = Some(Cow::Borrowed(messages::PASSWORD_TOO_LONG));
        Err(error)
    } else {
        Ok(())
    }
}

/// Flattens validator output into an ordered violation list
///
/// `fields` pairs the struct field name with the name used in the JSON payload;
/// violations come back in that order, so callers get a stable list regardless of
/// the map ordering inside `ValidationErrors`.
pub fn ordered_violations(
    errors: &ValidationErrors,
    fields: &[(&str, &str)],
) -> Vec<FieldViolation> {
    let field_errors = errors.field_errors();
    let mut violations = Vec::new();

    for (field, wire_name) in fields {
        if let Some(errors) = field_errors.get(*field) {
            for error in errors.iter() {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value for field '{}'", wire_name));
                violations.push(FieldViolation {
                    field: wire_name.to_string(),
                    message,
                });
            }
        }
    }

    violations
}

/// Validation error messages for user-friendly responses
pub mod messages {
    pub const INVALID_EMAIL: &str = "Please provide a valid email address.";
    pub const DISPLAY_NAME_REQUIRED: &str = "Display name is required.";
    pub const PASSWORD_TOO_SHORT: &str = "Password must be at least 6 characters long.";
    pub const PASSWORD_TOO_LONG: &str = "Password must be at most 72 bytes long.";
    pub const PASSWORD_EMPTY: &str = "Password cannot be empty.";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("user@example.com"));
        assert!(validate_email("test.user+tag@domain.co.uk"));
        assert!(validate_email("  padded@example.com "));
        assert!(!validate_email("invalid.email"));
        assert!(!validate_email("@domain.com"));
        assert!(!validate_email("user@"));
        assert!(!validate_email(""));
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  USER@EXAMPLE.COM  "), "user@example.com");
        assert_eq!(normalize_email("Test@Domain.org"), "test@domain.org");
    }

    #[test]
    fn test_email_validator_message() {
        let err = email_validator("nope").unwrap_err();
        assert_eq!(err.code, "invalid_email");
        assert_eq!(err.message.unwrap(), messages::INVALID_EMAIL);
        assert!(email_validator("a@b.io").is_ok());
    }

    #[test]
    fn test_display_name_validator() {
        assert!(display_name_validator("Ada").is_ok());
        assert!(display_name_validator("").is_err());

        let err = display_name_validator("   ").unwrap_err();
        assert_eq!(err.message.unwrap(), messages::DISPLAY_NAME_REQUIRED);
    }

    #[test]
    fn test_password_bytes_validator() {
        assert!(password_bytes_validator(&"p".repeat(MAX_PASSWORD_BYTES)).is_ok());

        let err = password_bytes_validator(&"p".repeat(MAX_PASSWORD_BYTES + 1)).unwrap_err();
        assert_eq!(err.message.unwrap(), messages::PASSWORD_TOO_LONG);

        // Multi-byte characters count by encoded length
        assert!(password_bytes_validator(&"é".repeat(37)).is_err());
    }

    #[test]
    fn test_ordered_violations_follow_field_table() {
        let mut errors = ValidationErrors::new();
        errors.add("password", ValidationError::new("length"));
        errors.add("email", email_validator("bad").unwrap_err());

        let violations = ordered_violations(&errors, &[("email", "email"), ("password", "password")]);
        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].field, "email");
        assert_eq!(violations[0].message, messages::INVALID_EMAIL);
        assert_eq!(violations[1].field, "password");
        assert_eq!(violations[1].message, "Invalid value for field 'password'");
    }
}
