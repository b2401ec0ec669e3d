//! Security Utilities
//!
//! Password hashing for the locally stored password copy.

use bcrypt::{hash, verify, BcryptError};

/// Default bcrypt cost for password hashing
pub const DEFAULT_BCRYPT_COST: u32 = 10;

/// Lowest cost bcrypt accepts
pub const MIN_BCRYPT_COST: u32 = 4;

/// Highest cost bcrypt accepts
pub const MAX_BCRYPT_COST: u32 = 31;

/// bcrypt only reads this many bytes of input; longer passwords are refused
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Salted, slow one-way hasher for the password copy kept in the profile store
///
/// This is independent of whatever hashing the identity provider performs on its
/// side. bcrypt embeds a fresh salt in every hash and compares digests in constant
/// time.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self {
            cost: DEFAULT_BCRYPT_COST,
        }
    }
}

impl PasswordHasher {
    /// Create a hasher with a custom work factor
    pub fn with_cost(cost: u32) -> Result<Self, BcryptError> {
        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&cost) {
            return Err(BcryptError::CostNotAllowed(cost));
        }
        Ok(Self { cost })
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash a plaintext password
    ///
    /// Passwords over `MAX_PASSWORD_BYTES` are refused rather than truncated.
    pub fn hash(&self, plaintext: &str) -> Result<String, BcryptError> {
        if plaintext.len() > MAX_PASSWORD_BYTES {
            return Err(BcryptError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("password exceeds {} bytes", MAX_PASSWORD_BYTES),
            )));
        }
        hash(plaintext, self.cost)
    }

    /// Verify a plaintext password against a stored hash
    ///
    /// Nothing longer than `MAX_PASSWORD_BYTES` is ever hashed, so such input
    /// never matches.
    pub fn verify(&self, plaintext: &str, password_hash: &str) -> Result<bool, BcryptError> {
        if plaintext.len() > MAX_PASSWORD_BYTES {
            return Ok(false);
        }
        verify(plaintext, password_hash)
    }

    /// Hash on the blocking pool so the async executor is not stalled
    pub async fn hash_blocking(&self, plaintext: &str) -> Result<String, BcryptError> {
        let hasher = *self;
        let plaintext = plaintext.to_string();
        tokio::task::spawn_blocking(move || hasher.hash(&plaintext))
            .await
            .unwrap_or_else(|e| Err(BcryptError::Io(std::io::Error::other(e))))
    }

    /// Verify on the blocking pool so the async executor is not stalled
    pub async fn verify_blocking(
        &self,
        plaintext: &str,
        password_hash: &str,
    ) -> Result<bool, BcryptError> {
        let hasher = *self;
        let plaintext = plaintext.to_string();
        let password_hash = password_hash.to_string();
        tokio::task::spawn_blocking(move || hasher.verify(&plaintext, &password_hash))
            .await
            .unwrap_or_else(|e| Err(BcryptError::Io(std::io::Error::other(e))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_hasher() -> PasswordHasher {
        PasswordHasher::with_cost(MIN_BCRYPT_COST).unwrap()
    }

    #[test]
    fn test_bcrypt_cost_validation() {
        assert!(PasswordHasher::with_cost(3).is_err());
        assert!(PasswordHasher::with_cost(32).is_err());
        assert_eq!(PasswordHasher::with_cost(12).unwrap().cost(), 12);
        assert_eq!(PasswordHasher::default().cost(), DEFAULT_BCRYPT_COST);
    }

    #[test]
    fn test_password_hashing() {
        let hasher = fast_hasher();
        let password = "secret1";
        let hash = hasher.hash(password).unwrap();

        assert_ne!(hash, password);
        assert!(hasher.verify(password, &hash).unwrap());
        assert!(!hasher.verify("secret2", &hash).unwrap());
        assert!(!hasher.verify("", &hash).unwrap());
    }

    #[test]
    fn test_same_password_gets_distinct_salts() {
        let hasher = fast_hasher();
        let first = hasher.hash("samepassword").unwrap();
        let second = hasher.hash("samepassword").unwrap();

        assert_ne!(first, second);
        assert!(hasher.verify("samepassword", &first).unwrap());
        assert!(hasher.verify("samepassword", &second).unwrap());
    }

    #[test]
    fn test_password_byte_limit_boundary() {
        let hasher = fast_hasher();
        let at_limit = "a".repeat(MAX_PASSWORD_BYTES);
        let hash = hasher.hash(&at_limit).unwrap();
        assert!(hasher.verify(&at_limit, &hash).unwrap());

        let over_limit = format!("{}b", at_limit);
        assert!(hasher.hash(&over_limit).is_err());
        assert!(!hasher.verify(&over_limit, &hash).unwrap());
    }

    #[test]
    fn test_shared_prefix_passwords_do_not_cross_verify() {
        let hasher = fast_hasher();
        let prefix = "a".repeat(MAX_PASSWORD_BYTES - 1);
        let stored = format!("{}x", prefix);
        let hash = hasher.hash(&stored).unwrap();

        assert!(!hasher.verify(&format!("{}y", prefix), &hash).unwrap());
        assert!(!hasher.verify(&format!("{}x-suffix", prefix), &hash).unwrap());
    }

    #[test]
    fn test_verify_rejects_malformed_hash() {
        let hasher = fast_hasher();
        assert!(hasher.verify("password", "not-a-bcrypt-hash").is_err());
    }

    #[tokio::test]
    async fn test_blocking_variants_round_trip() {
        let hasher = fast_hasher();
        let hash = hasher.hash_blocking("longenough").await.unwrap();
        assert!(hasher.verify_blocking("longenough", &hash).await.unwrap());
        assert!(!hasher.verify_blocking("longenougH", &hash).await.unwrap());
    }
}
