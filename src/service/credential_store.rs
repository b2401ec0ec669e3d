//! Credential Store
//!
//! Client side of the external identity provider that owns email/password
//! accounts and hands out the subject identifier for each of them.

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::config::IdentityProviderConfig;
use crate::service::provider_errors::ProviderErrorCode;
use crate::utils::validation::validate_email;

/// Rejection reported by the identity provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    pub code: ProviderErrorCode,
    /// Provider's own wording, used when the code is outside the translation table
    pub message: String,
}

impl ProviderError {
    pub fn new(code: ProviderErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Credential store specific errors
#[derive(Error, Debug)]
pub enum CredentialStoreError {
    /// The provider answered and refused the operation
    #[error("Identity provider rejected the request: {} ({})", .0.code, .0.message)]
    Rejected(ProviderError),

    /// The request never produced a provider answer
    #[error("Identity provider request failed: {0}")]
    Transport(String),

    /// The provider answered with something we could not interpret
    #[error("Unexpected identity provider response: {0}")]
    UnexpectedResponse(String),

    /// The account cannot be deleted without the credential issued at creation
    #[error("No deletion credential available for account {0}")]
    MissingDeletionCredential(String),
}

impl CredentialStoreError {
    /// Provider code for this failure, unrecognized for non-provider failures
    pub fn code(&self) -> ProviderErrorCode {
        match self {
            CredentialStoreError::Rejected(err) => err.code.clone(),
            CredentialStoreError::Transport(_) => {
                ProviderErrorCode::Unrecognized("auth/network-request-failed".to_string())
            }
            CredentialStoreError::UnexpectedResponse(_) => {
                ProviderErrorCode::Unrecognized("auth/internal-error".to_string())
            }
            CredentialStoreError::MissingDeletionCredential(_) => {
                ProviderErrorCode::Unrecognized("auth/missing-credential".to_string())
            }
        }
    }

    /// Raw diagnostic message for this failure
    pub fn raw_message(&self) -> String {
        match self {
            CredentialStoreError::Rejected(err) => err.message.clone(),
            other => other.to_string(),
        }
    }
}

/// Result type for credential store operations
pub type CredentialStoreResult<T> = Result<T, CredentialStoreError>;

/// Account created in the identity provider
#[derive(Clone)]
pub struct ProviderAccount {
    /// Stable subject identifier assigned by the provider
    pub uid: String,

    /// Email as recorded by the provider
    pub email: String,

    /// Short-lived credential returned at creation; needed to delete the account again
    pub id_token: Option<String>,
}

impl fmt::Debug for ProviderAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderAccount")
            .field("uid", &self.uid)
            .field("email", &self.email)
            .field("id_token", &self.id_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Operations the auth service needs from the identity provider
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Create an email/password account and return its subject identifier
    async fn create_account(
        &self,
        email: &str,
        password: &str,
    ) -> CredentialStoreResult<ProviderAccount>;

    /// Delete an account created by `create_account`
    async fn delete_account(&self, account: &ProviderAccount) -> CredentialStoreResult<()>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignUpBody<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignUpResponse {
    local_id: String,
    email: Option<String>,
    id_token: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DeleteBody<'a> {
    id_token: &'a str,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Identity toolkit REST client
///
/// Talks to the `accounts:signUp` and `accounts:delete` endpoints using the
/// project's web API key.
pub struct IdentityToolkitStore {
    http_client: HttpClient,
    base_url: String,
    api_key: String,
}

impl IdentityToolkitStore {
    /// Creates a new client from the identity provider configuration
    pub fn new(config: &IdentityProviderConfig) -> CredentialStoreResult<Self> {
        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| {
                CredentialStoreError::Transport(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/v1/accounts:{}", self.base_url, method)
    }

    /// Turn a non-success response into a provider rejection
    async fn rejection(response: reqwest::Response) -> CredentialStoreError {
        let status = response.status();
        match response.json::<ErrorEnvelope>().await {
            Ok(envelope) => CredentialStoreError::Rejected(ProviderError::new(
                ProviderErrorCode::from_rest_message(&envelope.error.message),
                envelope.error.message,
            )),
            Err(e) => CredentialStoreError::UnexpectedResponse(format!(
                "status {} with unreadable error body: {}",
                status, e
            )),
        }
    }
}

#[async_trait]
impl CredentialStore for IdentityToolkitStore {
    async fn create_account(
        &self,
        email: &str,
        password: &str,
    ) -> CredentialStoreResult<ProviderAccount> {
        let response = self
            .http_client
            .post(self.endpoint("signUp"))
            .query(&[("key", self.api_key.as_str())])
            .json(&SignUpBody {
                email,
                password,
                return_secure_token: true,
            })
            .send()
            .await
            .map_err(|e| CredentialStoreError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        let body: SignUpResponse = response.json().await.map_err(|e| {
            CredentialStoreError::UnexpectedResponse(format!("Failed to parse sign-up: {}", e))
        })?;

        log::debug!("Identity provider created account {}", body.local_id);

        Ok(ProviderAccount {
            uid: body.local_id,
            email: body.email.unwrap_or_else(|| email.to_string()),
            id_token: body.id_token,
        })
    }

    async fn delete_account(&self, account: &ProviderAccount) -> CredentialStoreResult<()> {
        let id_token = account
            .id_token
            .as_deref()
            .ok_or_else(|| CredentialStoreError::MissingDeletionCredential(account.uid.clone()))?;

        let response = self
            .http_client
            .post(self.endpoint("delete"))
            .query(&[("key", self.api_key.as_str())])
            .json(&DeleteBody { id_token })
            .send()
            .await
            .map_err(|e| CredentialStoreError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        log::debug!("Identity provider deleted account {}", account.uid);
        Ok(())
    }
}

#[derive(Default)]
struct InMemoryAccounts {
    uid_by_email: HashMap<String, String>,
    create_calls: usize,
    delete_calls: usize,
}

/// Process-local credential store for tests and single-process use
///
/// Mirrors the provider rules the auth flow depends on: unique emails, well-formed
/// addresses and a six character password minimum.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    accounts: Mutex<InMemoryAccounts>,
    fail_deletes: bool,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store whose deletions always fail, leaving accounts orphaned
    pub fn with_failing_deletes() -> Self {
        Self {
            fail_deletes: true,
            ..Self::default()
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, InMemoryAccounts> {
        self.accounts.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn account_count(&self) -> usize {
        self.lock().uid_by_email.len()
    }

    pub fn uid_for(&self, email: &str) -> Option<String> {
        self.lock().uid_by_email.get(email).cloned()
    }

    /// Number of `create_account` calls received, successful or not
    pub fn create_calls(&self) -> usize {
        self.lock().create_calls
    }

    /// Number of `delete_account` calls received, successful or not
    pub fn delete_calls(&self) -> usize {
        self.lock().delete_calls
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn create_account(
        &self,
        email: &str,
        password: &str,
    ) -> CredentialStoreResult<ProviderAccount> {
        let mut accounts = self.lock();
        accounts.create_calls += 1;

        if !validate_email(email) {
            return Err(CredentialStoreError::Rejected(ProviderError::new(
                ProviderErrorCode::InvalidEmail,
                "INVALID_EMAIL",
            )));
        }
        if password.chars().count() < 6 {
            return Err(CredentialStoreError::Rejected(ProviderError::new(
                ProviderErrorCode::PasswordTooWeak,
                "WEAK_PASSWORD : Password should be at least 6 characters",
            )));
        }

        let email = email.to_lowercase();
        if accounts.uid_by_email.contains_key(&email) {
            return Err(CredentialStoreError::Rejected(ProviderError::new(
                ProviderErrorCode::EmailAlreadyInUse,
                "EMAIL_EXISTS",
            )));
        }

        let uid = Uuid::new_v4().simple().to_string();
        accounts.uid_by_email.insert(email.clone(), uid.clone());

        Ok(ProviderAccount {
            uid: uid.clone(),
            email,
            id_token: Some(format!("test-id-token-{}", uid)),
        })
    }

    async fn delete_account(&self, account: &ProviderAccount) -> CredentialStoreResult<()> {
        let mut accounts = self.lock();
        accounts.delete_calls += 1;

        if self.fail_deletes {
            return Err(CredentialStoreError::Transport(
                "simulated identity provider outage".to_string(),
            ));
        }

        let before = accounts.uid_by_email.len();
        accounts.uid_by_email.retain(|_, uid| uid != &account.uid);
        if accounts.uid_by_email.len() == before {
            return Err(CredentialStoreError::Rejected(ProviderError::new(
                ProviderErrorCode::UserNotFound,
                "USER_NOT_FOUND",
            )));
        }
        Ok(())
    }
}
