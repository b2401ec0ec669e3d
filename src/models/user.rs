//! Profile Model
//!
//! Local user profile data structures and the orphaned-account marker.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role given to profiles registered without an explicit role
pub const DEFAULT_ROLE: &str = "Participant";

/// Profile representation for external API responses
///
/// This struct never carries the password hash. All datetime fields use UTC.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Local identifier of the profile
    pub id: Uuid,

    /// Name shown to other users
    pub display_name: String,

    /// Optional handle (not unique)
    pub username: Option<String>,

    /// Email address (unique, normalized)
    pub email: String,

    /// Role of the user within the application
    pub role: String,

    /// Subject identifier assigned by the identity provider
    pub identity_provider_id: String,

    /// Timestamp when the profile was created
    pub created_at: DateTime<Utc>,
}

/// Stored profile including the password hash
///
/// Used for repository operations that need the hash (login). It's never
/// serialized into API responses.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProfileRecord {
    pub id: Uuid,
    pub display_name: String,
    pub username: Option<String>,
    pub email: String,
    pub role: String,
    /// bcrypt hash of the password copy kept locally
    pub password_hash: String,
    pub identity_provider_id: String,
    pub created_at: DateTime<Utc>,
}

impl From<ProfileRecord> for UserProfile {
    /// Strips the password hash from the stored record
    fn from(record: ProfileRecord) -> Self {
        UserProfile {
            id: record.id,
            display_name: record.display_name,
            username: record.username,
            email: record.email,
            role: record.role,
            identity_provider_id: record.identity_provider_id,
            created_at: record.created_at,
        }
    }
}

/// Profile fields supplied by the auth service when persisting a registration
#[derive(Debug, Clone)]
pub struct NewProfile {
    pub display_name: String,
    pub username: Option<String>,
    /// Already normalized email
    pub email: String,
    pub role: String,
    pub password_hash: String,
    pub identity_provider_id: String,
}

impl NewProfile {
    /// Materialize the stored record with a fresh id and creation time
    pub fn into_record(self) -> ProfileRecord {
        ProfileRecord {
            id: Uuid::new_v4(),
            display_name: self.display_name,
            username: self.username,
            email: self.email,
            role: self.role,
            password_hash: self.password_hash,
            identity_provider_id: self.identity_provider_id,
            created_at: Utc::now(),
        }
    }
}

/// Unresolved-orphan marker
///
/// Written when an identity-provider account was created but neither a profile
/// could be stored nor the account deleted again. The provider id is absent when
/// the provider call ended without a readable answer, so only the email is known.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrphanRecord {
    pub id: Uuid,
    pub identity_provider_id: Option<String>,
    pub email: String,
    /// Why the profile write and the cleanup failed
    pub reason: String,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

/// Orphan marker fields supplied by the auth service
#[derive(Debug, Clone)]
pub struct NewOrphan {
    pub identity_provider_id: Option<String>,
    pub email: String,
    pub reason: String,
}

impl NewOrphan {
    pub fn into_record(self) -> OrphanRecord {
        OrphanRecord {
            id: Uuid::new_v4(),
            identity_provider_id: self.identity_provider_id,
            email: self.email,
            reason: self.reason,
            created_at: Utc::now(),
            resolved_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_new_profile() -> NewProfile {
        NewProfile {
            display_name: "Ada Lovelace".to_string(),
            username: None,
            email: "ada@example.com".to_string(),
            role: DEFAULT_ROLE.to_string(),
            password_hash: "$2b$04$hash".to_string(),
            identity_provider_id: "uid-123".to_string(),
        }
    }

    #[test]
    fn test_profile_record_conversion_drops_hash() {
        let record = sample_new_profile().into_record();
        let id = record.id;
        let profile: UserProfile = record.into();

        assert_eq!(profile.id, id);
        assert_eq!(profile.identity_provider_id, "uid-123");
        assert_eq!(profile.role, "Participant");

        let json = serde_json::to_value(&profile).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["displayName"], "Ada Lovelace");
        assert_eq!(json["identityProviderId"], "uid-123");
    }

    #[test]
    fn test_new_orphan_starts_unresolved() {
        let orphan = NewOrphan {
            identity_provider_id: Some("uid-9".to_string()),
            email: "x@example.com".to_string(),
            reason: "profile write failed".to_string(),
        }
        .into_record();

        assert!(orphan.resolved_at.is_none());
        assert_eq!(orphan.identity_provider_id.as_deref(), Some("uid-9"));
    }
}
