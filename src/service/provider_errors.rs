//! Identity Provider Error Translation
//!
//! Fixed lookup table from identity-provider error codes to the message and HTTP
//! status reported to clients.

use axum::http::StatusCode;
use std::fmt;
use std::str::FromStr;

/// Error codes the identity provider reports for account operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderErrorCode {
    EmailAlreadyInUse,
    InvalidEmail,
    PasswordTooWeak,
    UserNotFound,
    WrongPassword,
    InvalidCredential,
    /// Anything outside the table; keeps the raw code for diagnostics
    Unrecognized(String),
}

impl ProviderErrorCode {
    /// Canonical `auth/`-prefixed form of the code
    pub fn as_code(&self) -> &str {
        match self {
            ProviderErrorCode::EmailAlreadyInUse => "auth/email-already-in-use",
            ProviderErrorCode::InvalidEmail => "auth/invalid-email",
            ProviderErrorCode::PasswordTooWeak => "auth/password-too-weak",
            ProviderErrorCode::UserNotFound => "auth/user-not-found",
            ProviderErrorCode::WrongPassword => "auth/wrong-password",
            ProviderErrorCode::InvalidCredential => "auth/invalid-credential",
            ProviderErrorCode::Unrecognized(raw) => raw,
        }
    }

    /// Parse the identity toolkit REST API's native error message
    ///
    /// Those look like `EMAIL_EXISTS` or `WEAK_PASSWORD : Password should be at
    /// least 6 characters`; only the token before the first ` : ` is significant.
    pub fn from_rest_message(message: &str) -> Self {
        let token = message.split(" : ").next().unwrap_or(message).trim();
        match token {
            "EMAIL_EXISTS" => ProviderErrorCode::EmailAlreadyInUse,
            "INVALID_EMAIL" => ProviderErrorCode::InvalidEmail,
            "WEAK_PASSWORD" => ProviderErrorCode::PasswordTooWeak,
            "EMAIL_NOT_FOUND" | "USER_NOT_FOUND" => ProviderErrorCode::UserNotFound,
            "INVALID_PASSWORD" => ProviderErrorCode::WrongPassword,
            "INVALID_LOGIN_CREDENTIALS" | "INVALID_IDP_RESPONSE" => {
                ProviderErrorCode::InvalidCredential
            }
            other => ProviderErrorCode::Unrecognized(other.to_string()),
        }
    }
}

impl FromStr for ProviderErrorCode {
    type Err = std::convert::Infallible;

    /// Accepts codes with or without the `auth/` prefix
    fn from_str(code: &str) -> Result<Self, Self::Err> {
        let bare = code.trim().strip_prefix("auth/").unwrap_or(code.trim());
        Ok(match bare {
            "email-already-in-use" => ProviderErrorCode::EmailAlreadyInUse,
            "invalid-email" => ProviderErrorCode::InvalidEmail,
            "password-too-weak" | "weak-password" | "password-does-not-meet-requirements" => {
                ProviderErrorCode::PasswordTooWeak
            }
            "user-not-found" => ProviderErrorCode::UserNotFound,
            "wrong-password" => ProviderErrorCode::WrongPassword,
            "invalid-credential" => ProviderErrorCode::InvalidCredential,
            _ => ProviderErrorCode::Unrecognized(code.to_string()),
        })
    }
}

impl fmt::Display for ProviderErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_code())
    }
}

/// Message and status a provider code translates to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranslatedError {
    /// Empty for unrecognized codes; callers fall back to the provider's message
    pub message: &'static str,
    pub status: StatusCode,
}

/// Client-facing messages of the translation table
pub mod messages {
    pub const EMAIL_ALREADY_IN_USE: &str = "The email address is already registered.";
    pub const INVALID_EMAIL: &str = "The email address format is invalid.";
    pub const PASSWORD_TOO_WEAK: &str =
        "The password is too weak or does not meet the required criteria. Please use a stronger one.";
    pub const USER_NOT_FOUND: &str = "No user found with this email.";
    pub const WRONG_PASSWORD: &str = "Incorrect password. Please try again.";
    pub const INVALID_CREDENTIAL: &str = "Invalid credentials. Please try again.";
}

/// Translate a provider error code into the client-facing message and status
pub fn translate(code: &ProviderErrorCode) -> TranslatedError {
    let (message, status) = match code {
        ProviderErrorCode::EmailAlreadyInUse => {
            (messages::EMAIL_ALREADY_IN_USE, StatusCode::CONFLICT)
        }
        ProviderErrorCode::InvalidEmail => (messages::INVALID_EMAIL, StatusCode::BAD_REQUEST),
        ProviderErrorCode::PasswordTooWeak => {
            (messages::PASSWORD_TOO_WEAK, StatusCode::BAD_REQUEST)
        }
        ProviderErrorCode::UserNotFound => (messages::USER_NOT_FOUND, StatusCode::NOT_FOUND),
        ProviderErrorCode::WrongPassword => (messages::WRONG_PASSWORD, StatusCode::UNAUTHORIZED),
        ProviderErrorCode::InvalidCredential => {
            (messages::INVALID_CREDENTIAL, StatusCode::BAD_REQUEST)
        }
        ProviderErrorCode::Unrecognized(_) => ("", StatusCode::INTERNAL_SERVER_ERROR),
    };

    TranslatedError { message, status }
}

/// Resolve the message to report, falling back to the provider's raw message
pub fn client_message(code: &ProviderErrorCode, raw_message: &str) -> (String, StatusCode) {
    let translated = translate(code);
    let message = if translated.message.is_empty() {
        raw_message.to_string()
    } else {
        translated.message.to_string()
    };
    (message, translated.status)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(s: &str) -> ProviderErrorCode {
        s.parse().unwrap()
    }

    #[test]
    fn test_translation_table() {
        let table = [
            ("auth/email-already-in-use", StatusCode::CONFLICT),
            ("auth/invalid-email", StatusCode::BAD_REQUEST),
            ("auth/password-too-weak", StatusCode::BAD_REQUEST),
            ("auth/user-not-found", StatusCode::NOT_FOUND),
            ("auth/wrong-password", StatusCode::UNAUTHORIZED),
            ("auth/invalid-credential", StatusCode::BAD_REQUEST),
        ];

        for (raw, status) in table {
            let translated = translate(&code(raw));
            assert_eq!(translated.status, status, "status for {}", raw);
            assert!(!translated.message.is_empty(), "message for {}", raw);
        }
    }

    #[test]
    fn test_unrecognized_code_falls_back_to_raw_message() {
        let unknown = code("auth/network-request-failed");
        assert_eq!(
            unknown,
            ProviderErrorCode::Unrecognized("auth/network-request-failed".to_string())
        );

        let translated = translate(&unknown);
        assert_eq!(translated.message, "");
        assert_eq!(translated.status, StatusCode::INTERNAL_SERVER_ERROR);

        let (message, status) = client_message(&unknown, "network unreachable");
        assert_eq!(message, "network unreachable");
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_codes_accepted_without_prefix() {
        assert_eq!(code("email-already-in-use"), ProviderErrorCode::EmailAlreadyInUse);
        assert_eq!(code("auth/weak-password"), ProviderErrorCode::PasswordTooWeak);
        assert_eq!(
            code("auth/password-does-not-meet-requirements"),
            ProviderErrorCode::PasswordTooWeak
        );
    }

    #[test]
    fn test_rest_messages_parse_into_codes() {
        assert_eq!(
            ProviderErrorCode::from_rest_message("EMAIL_EXISTS"),
            ProviderErrorCode::EmailAlreadyInUse
        );
        assert_eq!(
            ProviderErrorCode::from_rest_message(
                "WEAK_PASSWORD : Password should be at least 6 characters"
            ),
            ProviderErrorCode::PasswordTooWeak
        );
        assert_eq!(
            ProviderErrorCode::from_rest_message("INVALID_LOGIN_CREDENTIALS"),
            ProviderErrorCode::InvalidCredential
        );
        assert_eq!(
            ProviderErrorCode::from_rest_message("TOO_MANY_ATTEMPTS_TRY_LATER"),
            ProviderErrorCode::Unrecognized("TOO_MANY_ATTEMPTS_TRY_LATER".to_string())
        );
    }

    #[test]
    fn test_known_codes_render_canonically() {
        assert_eq!(
            ProviderErrorCode::EmailAlreadyInUse.to_string(),
            "auth/email-already-in-use"
        );
        assert_eq!(code("invalid-email").as_code(), "auth/invalid-email");
    }
}
