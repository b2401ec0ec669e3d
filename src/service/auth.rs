//! Auth Service Implementation
//!
//! Registration and login orchestration across the identity provider and the
//! local profile store.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::models::{
    requests::{LoginRequest, RegisterRequest},
    user::{NewOrphan, NewProfile, ProfileRecord, UserProfile, DEFAULT_ROLE},
    AuthToken,
};
use crate::service::credential_store::{CredentialStore, CredentialStoreError, ProviderAccount};
use crate::service::jwt::{TokenError, TokenIssuer};
use crate::service::profile_repository::{ProfileRepository, RepositoryError};
use crate::service::provider_errors::{self, ProviderErrorCode};
use crate::utils::{
    error::{AppError, FieldViolation},
    security::PasswordHasher,
    validation::normalize_email,
};

/// Default deadline for every identity provider and profile store call
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10);

/// Custom error types for the auth service
#[derive(Error, Debug)]
pub enum AuthServiceError {
    /// Input failed validation; nothing was written
    #[error("Validation failed: {} field violation(s)", .0.len())]
    Validation(Vec<FieldViolation>),

    /// Identity provider refused or failed the account operation
    #[error("Credential store error: {0}")]
    CredentialStore(#[from] CredentialStoreError),

    /// The profile store already holds this email
    #[error("Email already registered")]
    EmailAlreadyRegistered,

    /// No profile exists for the email
    #[error("User not found")]
    UserNotFound,

    /// Password did not match the stored hash
    #[error("Incorrect password")]
    IncorrectPassword,

    /// Profile store operation failed
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing operation failed
    #[error("Password hashing error: {0}")]
    Hashing(#[from] bcrypt::BcryptError),

    /// Token could not be minted
    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    /// An external call exceeded its deadline
    #[error("{0} timed out after {1:?}")]
    Timeout(&'static str, Duration),
}

impl From<AuthServiceError> for AppError {
    fn from(err: AuthServiceError) -> Self {
        match err {
            AuthServiceError::Validation(violations) => AppError::Validation(violations),
            AuthServiceError::CredentialStore(e) => {
                let code = e.code();
                let (message, status) = provider_errors::client_message(&code, &e.raw_message());
                AppError::IdentityProvider {
                    status,
                    message,
                    error_code: code.to_string(),
                }
            }
            AuthServiceError::EmailAlreadyRegistered => {
                let code = ProviderErrorCode::EmailAlreadyInUse;
                let translated = provider_errors::translate(&code);
                AppError::IdentityProvider {
                    status: translated.status,
                    message: translated.message.to_string(),
                    error_code: code.to_string(),
                }
            }
            AuthServiceError::UserNotFound => {
                AppError::NotFound(provider_errors::messages::USER_NOT_FOUND.to_string())
            }
            AuthServiceError::IncorrectPassword => {
                AppError::Authentication(provider_errors::messages::WRONG_PASSWORD.to_string())
            }
            AuthServiceError::Repository(RepositoryError::Database(e)) => AppError::Database(e),
            AuthServiceError::Repository(e) => AppError::Internal(e.to_string()),
            AuthServiceError::Hashing(e) => AppError::HashingError(e),
            AuthServiceError::Token(e) => AppError::Internal(e.to_string()),
            AuthServiceError::Timeout(operation, after) => {
                AppError::Internal(format!("{} timed out after {:?}", operation, after))
            }
        }
    }
}

/// Result type for auth service operations
pub type AuthServiceResult<T> = Result<T, AuthServiceError>;

/// Result of a successful registration
#[derive(Debug, Clone)]
pub struct Registration {
    pub token: AuthToken,
    pub user: UserProfile,
}

/// What happened to an identity provider account left without a profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompensationOutcome {
    /// The account was deleted again
    Deleted,
    /// Deletion failed; an orphan marker was stored
    OrphanRecorded,
    /// Deletion failed and the marker could not be stored; only the log has it
    OrphanLogged,
}

/// Core auth service coordinating credential store, profile store and tokens
#[derive(Clone)]
pub struct AuthService {
    credential_store: Arc<dyn CredentialStore>,
    profiles: Arc<dyn ProfileRepository>,
    tokens: Arc<TokenIssuer>,
    hasher: PasswordHasher,
    call_timeout: Duration,
}

impl AuthService {
    /// Creates a new AuthService with the default hasher and call deadline
    pub fn new(
        credential_store: Arc<dyn CredentialStore>,
        profiles: Arc<dyn ProfileRepository>,
        tokens: Arc<TokenIssuer>,
    ) -> Self {
        Self {
            credential_store,
            profiles,
            tokens,
            hasher: PasswordHasher::default(),
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    /// Replace the password hasher (work factor)
    pub fn with_hasher(mut self, hasher: PasswordHasher) -> Self {
        self.hasher = hasher;
        self
    }

    /// Replace the deadline applied to each external call
    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    pub fn token_issuer(&self) -> &TokenIssuer {
        &self.tokens
    }

    /// Registers an account with the identity provider and stores the local profile
    ///
    /// No profile is written unless the provider accepted the account. If the
    /// profile write fails afterwards, the provider account is compensated. A
    /// write that misses its deadline is looked up before anything is deleted.
    pub async fn register(&self, request: RegisterRequest) -> AuthServiceResult<Registration> {
        let violations = request.violations();
        if !violations.is_empty() {
            return Err(AuthServiceError::Validation(violations));
        }

        let email = normalize_email(&request.email);
        let password_hash = self.hasher.hash_blocking(&request.password).await?;

        let created = self
            .bounded("identity provider account creation", async {
                self.credential_store
                    .create_account(&email, &request.password)
                    .await
                    .map_err(AuthServiceError::from)
            })
            .await;

        let account = match created {
            Ok(account) => account,
            Err(e) if creation_outcome_unknown(&e) => {
                // The provider may hold an account we never learned the id of
                let reason = format!("account creation outcome unknown: {}", e);
                self.record_orphan_marker(None, &email, &reason).await;
                return Err(e);
            }
            Err(e) => {
                log::info!("Registration for {} rejected by identity provider: {}", email, e);
                return Err(e);
            }
        };

        let token = self.tokens.issue(&account.uid)?;

        let new_profile = NewProfile {
            display_name: request.display_name.trim().to_string(),
            username: request.username,
            email: email.clone(),
            role: request.role.unwrap_or_else(|| DEFAULT_ROLE.to_string()),
            password_hash,
            identity_provider_id: account.uid.clone(),
        };

        let stored = self
            .bounded("profile write", async {
                self.profiles
                    .insert(new_profile)
                    .await
                    .map_err(AuthServiceError::from)
            })
            .await;

        let record = match stored {
            Ok(record) => record,
            Err(e @ AuthServiceError::Timeout(..)) => self.settle_unknown_write(&account, e).await?,
            Err(e) => {
                log::warn!(
                    "Profile write for {} failed after provider account {} was created: {}",
                    email,
                    account.uid,
                    e
                );
                self.compensate(&account, &e.to_string()).await;

                return Err(match e {
                    AuthServiceError::Repository(RepositoryError::DuplicateEmail) => {
                        AuthServiceError::EmailAlreadyRegistered
                    }
                    other => other,
                });
            }
        };

        log::info!("Registered {} as {}", record.email, record.identity_provider_id);
        Ok(Registration {
            token,
            user: record.into(),
        })
    }

    /// Logs in against the locally stored password hash
    ///
    /// The identity provider is not consulted here; only the profile store is.
    pub async fn login(&self, request: LoginRequest) -> AuthServiceResult<AuthToken> {
        let violations = request.violations();
        if !violations.is_empty() {
            return Err(AuthServiceError::Validation(violations));
        }

        let email = normalize_email(&request.email);

        let profile = self
            .bounded("profile lookup", async {
                self.profiles
                    .find_by_email(&email)
                    .await
                    .map_err(AuthServiceError::from)
            })
            .await?
            .ok_or(AuthServiceError::UserNotFound)?;

        let matches = self
            .hasher
            .verify_blocking(&request.password, &profile.password_hash)
            .await?;
        if !matches {
            log::info!("Rejected login for {}: incorrect password", email);
            return Err(AuthServiceError::IncorrectPassword);
        }

        let token = self.tokens.issue(&profile.identity_provider_id)?;
        log::debug!("Issued token for {}", profile.identity_provider_id);
        Ok(token)
    }

    /// Remove a provider account that ended up without a profile
    ///
    /// Tries to delete the account; if that fails, stores an unresolved-orphan
    /// marker, and if even that fails, leaves the marker in the error log.
    pub async fn compensate(&self, account: &ProviderAccount, reason: &str) -> CompensationOutcome {
        let deleted = self
            .bounded("identity provider account deletion", async {
                self.credential_store
                    .delete_account(account)
                    .await
                    .map_err(AuthServiceError::from)
            })
            .await;

        match deleted {
            Ok(()) => {
                log::info!("Deleted provider account {} after failed profile write", account.uid);
                CompensationOutcome::Deleted
            }
            Err(delete_error) => {
                let reason = format!("{}; cleanup failed: {}", reason, delete_error);
                self.record_orphan_marker(Some(&account.uid), &account.email, &reason)
                    .await
            }
        }
    }

    /// Resolve a profile write that missed its deadline
    ///
    /// The insert may still have committed, so the provider account is only
    /// deleted once the profile is known to be absent. A committed row means the
    /// registration succeeded.
    async fn settle_unknown_write(
        &self,
        account: &ProviderAccount,
        write_error: AuthServiceError,
    ) -> AuthServiceResult<ProfileRecord> {
        let lookup = self
            .bounded("profile lookup after write timeout", async {
                self.profiles
                    .find_by_identity_provider_id(&account.uid)
                    .await
                    .map_err(AuthServiceError::from)
            })
            .await;

        match lookup {
            Ok(Some(record)) => {
                log::warn!(
                    "Profile write for {} missed its deadline but was committed",
                    account.uid
                );
                Ok(record)
            }
            Ok(None) => {
                log::warn!(
                    "Profile write for provider account {} left no row: {}",
                    account.uid,
                    write_error
                );
                self.compensate(account, &write_error.to_string()).await;
                Err(write_error)
            }
            Err(lookup_error) => {
                let reason = format!("{}; profile state unknown: {}", write_error, lookup_error);
                self.record_orphan_marker(Some(&account.uid), &account.email, &reason)
                    .await;
                Err(write_error)
            }
        }
    }

    /// Store an unresolved-orphan marker, falling back to the error log
    async fn record_orphan_marker(
        &self,
        identity_provider_id: Option<&str>,
        email: &str,
        reason: &str,
    ) -> CompensationOutcome {
        let subject = match identity_provider_id {
            Some(uid) => format!("provider account {}", uid),
            None => "provider account with unknown id".to_string(),
        };

        let orphan = NewOrphan {
            identity_provider_id: identity_provider_id.map(str::to_string),
            email: email.to_string(),
            reason: reason.to_string(),
        };

        let recorded = self
            .bounded("orphan marker write", async {
                self.profiles
                    .record_orphan(orphan)
                    .await
                    .map_err(AuthServiceError::from)
            })
            .await;

        match recorded {
            Ok(record) => {
                log::error!(
                    "UNRESOLVED ORPHAN: {} ({}) has no profile; marker {} stored: {}",
                    subject,
                    email,
                    record.id,
                    reason
                );
                CompensationOutcome::OrphanRecorded
            }
            Err(e) => {
                log::error!(
                    "UNRESOLVED ORPHAN: {} ({}) has no profile and no marker could be stored: {}; {}",
                    subject,
                    email,
                    reason,
                    e
                );
                CompensationOutcome::OrphanLogged
            }
        }
    }

    /// Checks the profile store is reachable
    pub async fn health_check(&self) -> AuthServiceResult<()> {
        self.bounded("profile store health check", async {
            self.profiles.health_check().await.map_err(AuthServiceError::from)
        })
        .await
    }

    /// Run an external call under the configured deadline
    async fn bounded<T, F>(&self, operation: &'static str, call: F) -> AuthServiceResult<T>
    where
        F: Future<Output = AuthServiceResult<T>>,
    {
        tokio::time::timeout(self.call_timeout, call)
            .await
            .map_err(|_| AuthServiceError::Timeout(operation, self.call_timeout))?
    }
}

/// Whether a failed account creation may still have created the account
///
/// A deadline miss or an unreadable success response leaves the provider side
/// unknown; outright rejections and connection failures do not.
fn creation_outcome_unknown(error: &AuthServiceError) -> bool {
    matches!(
        error,
        AuthServiceError::Timeout(..)
            | AuthServiceError::CredentialStore(CredentialStoreError::UnexpectedResponse(_))
    )
}
