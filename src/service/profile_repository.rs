//! Profile Repository
//!
//! Local storage for user profiles and unresolved-orphan markers.

use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;
use uuid::Uuid;

use crate::models::user::{NewOrphan, NewProfile, OrphanRecord, ProfileRecord};

/// Repository specific errors
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// A profile with this email already exists
    #[error("Email already exists")]
    DuplicateEmail,

    /// A profile is already linked to this identity provider account
    #[error("Identity provider id already linked")]
    DuplicateIdentityProviderId,

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Storage could not be reached
    #[error("Repository unavailable: {0}")]
    Unavailable(String),
}

/// Result type for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Storage operations used by the auth service and the admin tooling
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Persist a new profile; email and identity provider id must both be unused
    async fn insert(&self, profile: NewProfile) -> RepositoryResult<ProfileRecord>;

    /// Look up a profile by normalized email
    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<ProfileRecord>>;

    /// Look up a profile by identity provider subject identifier
    async fn find_by_identity_provider_id(
        &self,
        identity_provider_id: &str,
    ) -> RepositoryResult<Option<ProfileRecord>>;

    /// Persist an unresolved-orphan marker
    async fn record_orphan(&self, orphan: NewOrphan) -> RepositoryResult<OrphanRecord>;

    /// Orphan markers not yet resolved, oldest first
    async fn unresolved_orphans(&self) -> RepositoryResult<Vec<OrphanRecord>>;

    /// Mark an orphan as resolved; false when it was unknown or already resolved
    async fn resolve_orphan(&self, id: Uuid) -> RepositoryResult<bool>;

    /// Check that storage is reachable
    async fn health_check(&self) -> RepositoryResult<()>;
}

const PROFILE_COLUMNS: &str =
    "id, display_name, username, email, role, password_hash, identity_provider_id, created_at";

const ORPHAN_COLUMNS: &str = "id, identity_provider_id, email, reason, created_at, resolved_at";

/// PostgreSQL-backed repository
#[derive(Clone)]
pub struct PgProfileRepository {
    db_pool: PgPool,
}

impl PgProfileRepository {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    fn map_insert_error(e: sqlx::Error) -> RepositoryError {
        match e {
            sqlx::Error::Database(db_err) => match db_err.constraint() {
                Some("user_profiles_email_key") => RepositoryError::DuplicateEmail,
                Some("user_profiles_identity_provider_id_key") => {
                    RepositoryError::DuplicateIdentityProviderId
                }
                _ => RepositoryError::Database(sqlx::Error::Database(db_err)),
            },
            _ => RepositoryError::Database(e),
        }
    }
}

#[async_trait]
impl ProfileRepository for PgProfileRepository {
    async fn insert(&self, profile: NewProfile) -> RepositoryResult<ProfileRecord> {
        let record = profile.into_record();

        let sql = format!(
            r#"
            INSERT INTO user_profiles ({PROFILE_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {PROFILE_COLUMNS}
            "#
        );

        sqlx::query_as::<_, ProfileRecord>(&sql)
            .bind(record.id)
            .bind(&record.display_name)
            .bind(&record.username)
            .bind(&record.email)
            .bind(&record.role)
            .bind(&record.password_hash)
            .bind(&record.identity_provider_id)
            .bind(record.created_at)
            .fetch_one(&self.db_pool)
            .await
            .map_err(Self::map_insert_error)
    }

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<ProfileRecord>> {
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM user_profiles WHERE email = $1");

        let record = sqlx::query_as::<_, ProfileRecord>(&sql)
            .bind(email)
            .fetch_optional(&self.db_pool)
            .await?;

        Ok(record)
    }

    async fn find_by_identity_provider_id(
        &self,
        identity_provider_id: &str,
    ) -> RepositoryResult<Option<ProfileRecord>> {
        let sql =
            format!("SELECT {PROFILE_COLUMNS} FROM user_profiles WHERE identity_provider_id = $1");

        let record = sqlx::query_as::<_, ProfileRecord>(&sql)
            .bind(identity_provider_id)
            .fetch_optional(&self.db_pool)
            .await?;

        Ok(record)
    }

    async fn record_orphan(&self, orphan: NewOrphan) -> RepositoryResult<OrphanRecord> {
        let record = orphan.into_record();

        let sql = format!(
            r#"
            INSERT INTO orphaned_accounts ({ORPHAN_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {ORPHAN_COLUMNS}
            "#
        );

        let stored = sqlx::query_as::<_, OrphanRecord>(&sql)
            .bind(record.id)
            .bind(&record.identity_provider_id)
            .bind(&record.email)
            .bind(&record.reason)
            .bind(record.created_at)
            .bind(record.resolved_at)
            .fetch_one(&self.db_pool)
            .await?;

        Ok(stored)
    }

    async fn unresolved_orphans(&self) -> RepositoryResult<Vec<OrphanRecord>> {
        let sql = format!(
            "SELECT {ORPHAN_COLUMNS} FROM orphaned_accounts WHERE resolved_at IS NULL ORDER BY created_at"
        );

        let orphans = sqlx::query_as::<_, OrphanRecord>(&sql)
            .fetch_all(&self.db_pool)
            .await?;

        Ok(orphans)
    }

    async fn resolve_orphan(&self, id: Uuid) -> RepositoryResult<bool> {
        let result = sqlx::query(
            "UPDATE orphaned_accounts SET resolved_at = NOW() WHERE id = $1 AND resolved_at IS NULL",
        )
        .bind(id)
        .execute(&self.db_pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn health_check(&self) -> RepositoryResult<()> {
        sqlx::query("SELECT 1").execute(&self.db_pool).await?;
        Ok(())
    }
}

#[derive(Default)]
struct InMemoryProfiles {
    by_email: HashMap<String, ProfileRecord>,
    orphans: Vec<OrphanRecord>,
    calls: usize,
}

/// Process-local repository for tests and single-process use
///
/// Enforces the same uniqueness rules as the `user_profiles` table.
#[derive(Default)]
pub struct InMemoryProfileRepository {
    state: Mutex<InMemoryProfiles>,
    fail_inserts: bool,
    fail_orphan_writes: bool,
}

impl InMemoryProfileRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository whose profile inserts always fail
    pub fn with_failing_inserts() -> Self {
        Self {
            fail_inserts: true,
            ..Self::default()
        }
    }

    /// Repository where both profile inserts and orphan markers fail
    pub fn unavailable() -> Self {
        Self {
            fail_inserts: true,
            fail_orphan_writes: true,
            ..Self::default()
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, InMemoryProfiles> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn profile_count(&self) -> usize {
        self.lock().by_email.len()
    }

    /// Number of repository calls received, of any kind
    pub fn call_count(&self) -> usize {
        self.lock().calls
    }

    /// Seed a record directly, bypassing the call counter
    pub fn seed(&self, profile: NewProfile) -> ProfileRecord {
        let record = profile.into_record();
        self.lock()
            .by_email
            .insert(record.email.clone(), record.clone());
        record
    }
}

#[async_trait]
impl ProfileRepository for InMemoryProfileRepository {
    async fn insert(&self, profile: NewProfile) -> RepositoryResult<ProfileRecord> {
        let mut state = self.lock();
        state.calls += 1;

        if self.fail_inserts {
            return Err(RepositoryError::Unavailable(
                "simulated profile store outage".to_string(),
            ));
        }
        if state.by_email.contains_key(&profile.email) {
            return Err(RepositoryError::DuplicateEmail);
        }
        if state
            .by_email
            .values()
            .any(|p| p.identity_provider_id == profile.identity_provider_id)
        {
            return Err(RepositoryError::DuplicateIdentityProviderId);
        }

        let record = profile.into_record();
        state.by_email.insert(record.email.clone(), record.clone());
        Ok(record)
    }

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<ProfileRecord>> {
        let mut state = self.lock();
        state.calls += 1;
        Ok(state.by_email.get(email).cloned())
    }

    async fn find_by_identity_provider_id(
        &self,
        identity_provider_id: &str,
    ) -> RepositoryResult<Option<ProfileRecord>> {
        let mut state = self.lock();
        state.calls += 1;
        Ok(state
            .by_email
            .values()
            .find(|p| p.identity_provider_id == identity_provider_id)
            .cloned())
    }

    async fn record_orphan(&self, orphan: NewOrphan) -> RepositoryResult<OrphanRecord> {
        let mut state = self.lock();
        state.calls += 1;

        if self.fail_orphan_writes {
            return Err(RepositoryError::Unavailable(
                "simulated profile store outage".to_string(),
            ));
        }

        let record = orphan.into_record();
        state.orphans.push(record.clone());
        Ok(record)
    }

    async fn unresolved_orphans(&self) -> RepositoryResult<Vec<OrphanRecord>> {
        let mut state = self.lock();
        state.calls += 1;
        Ok(state
            .orphans
            .iter()
            .filter(|o| o.resolved_at.is_none())
            .cloned()
            .collect())
    }

    async fn resolve_orphan(&self, id: Uuid) -> RepositoryResult<bool> {
        let mut state = self.lock();
        state.calls += 1;
        match state
            .orphans
            .iter_mut()
            .find(|o| o.id == id && o.resolved_at.is_none())
        {
            Some(orphan) => {
                orphan.resolved_at = Some(chrono::Utc::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn health_check(&self) -> RepositoryResult<()> {
        if self.fail_inserts {
            return Err(RepositoryError::Unavailable(
                "simulated profile store outage".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::DEFAULT_ROLE;

    fn new_profile(email: &str, uid: &str) -> NewProfile {
        NewProfile {
            display_name: "Ada Lovelace".to_string(),
            username: Some("ada".to_string()),
            email: email.to_string(),
            role: DEFAULT_ROLE.to_string(),
            password_hash: "$2b$04$placeholder".to_string(),
            identity_provider_id: uid.to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let repo = InMemoryProfileRepository::new();
        let stored = repo
            .insert(new_profile("ada@example.com", "uid-1"))
            .await
            .unwrap();

        let by_email = repo.find_by_email("ada@example.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, stored.id);

        let by_uid = repo
            .find_by_identity_provider_id("uid-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_uid.email, "ada@example.com");

        assert!(repo.find_by_email("bob@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unique_email_constraint() {
        let repo = InMemoryProfileRepository::new();
        repo.insert(new_profile("ada@example.com", "uid-1"))
            .await
            .unwrap();

        let err = repo
            .insert(new_profile("ada@example.com", "uid-2"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::DuplicateEmail));
        assert_eq!(repo.profile_count(), 1);
    }

    #[tokio::test]
    async fn test_unique_identity_provider_id_constraint() {
        let repo = InMemoryProfileRepository::new();
        repo.insert(new_profile("ada@example.com", "uid-1"))
            .await
            .unwrap();

        let err = repo
            .insert(new_profile("other@example.com", "uid-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::DuplicateIdentityProviderId));
    }

    #[tokio::test]
    async fn test_orphan_lifecycle() {
        let repo = InMemoryProfileRepository::new();
        let orphan = repo
            .record_orphan(NewOrphan {
                identity_provider_id: Some("uid-7".to_string()),
                email: "ghost@example.com".to_string(),
                reason: "profile write failed".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(repo.unresolved_orphans().await.unwrap().len(), 1);
        assert!(repo.resolve_orphan(orphan.id).await.unwrap());
        assert!(!repo.resolve_orphan(orphan.id).await.unwrap());
        assert!(repo.unresolved_orphans().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failing_repository() {
        let repo = InMemoryProfileRepository::unavailable();
        assert!(repo
            .insert(new_profile("ada@example.com", "uid-1"))
            .await
            .is_err());
        assert!(repo.health_check().await.is_err());
        assert_eq!(repo.profile_count(), 0);
    }
}
