//! Service Layer
//!
//! Business logic and the seams to the identity provider and profile store.

pub mod auth;
pub mod credential_store;
pub mod jwt;
pub mod profile_repository;
pub mod provider_errors;

// Re-export services
pub use auth::{AuthService, AuthServiceError, CompensationOutcome, Registration};
pub use credential_store::{
    CredentialStore, CredentialStoreError, IdentityToolkitStore, InMemoryCredentialStore,
    ProviderAccount,
};
pub use jwt::TokenIssuer;
pub use profile_repository::{
    InMemoryProfileRepository, PgProfileRepository, ProfileRepository, RepositoryError,
};
