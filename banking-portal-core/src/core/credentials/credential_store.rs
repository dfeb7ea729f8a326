use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::{PasswordConfig, PasswordPolicy, PortalPasswordHasher};
use crate::shared::PortalResult;

/// Stored password hash. Never displayed or logged.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Wraps a hash read from storage.
    pub fn from_encoded(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(<redacted>)")
    }
}

/// Hashes and verifies account passwords.
///
/// Hashing is CPU bound and runs on the blocking pool.
#[derive(Clone)]
pub struct CredentialStore {
    hasher: Arc<PortalPasswordHasher>,
    policy: PasswordPolicy,
    dummy_hash: Arc<PasswordHash>,
}

impl CredentialStore {
    pub fn new(config: PasswordConfig, policy: PasswordPolicy) -> PortalResult<Self> {
        let hasher = PortalPasswordHasher::new(config);
        let dummy_hash = PasswordHash(hasher.hash_password("dummy-password-for-timing")?);
        Ok(Self {
            hasher: Arc::new(hasher),
            policy,
            dummy_hash: Arc::new(dummy_hash),
        })
    }

    pub fn policy(&self) -> &PasswordPolicy {
        &self.policy
    }

    pub async fn hash_new_password(&self, password: &str) -> PortalResult<PasswordHash> {
        let hasher = Arc::clone(&self.hasher);
        let password = Zeroizing::new(password.to_string());
        let encoded =
            tokio::task::spawn_blocking(move || hasher.hash_password(password.as_str())).await??;
        Ok(PasswordHash(encoded))
    }

    /// Checks `password` against `stored`.
    ///
    /// With no stored hash (unknown account) a dummy hash is still verified
    /// so the caller's response time does not depend on whether the account
    /// exists; the result is then always `false`.
    pub async fn verify(&self, password: &str, stored: Option<&PasswordHash>) -> PortalResult<bool> {
        let hasher = Arc::clone(&self.hasher);
        let password = Zeroizing::new(password.to_string());
        let (target, known) = match stored {
            Some(hash) => (hash.clone(), true),
            None => (self.dummy_hash.as_ref().clone(), false),
        };

        let verified = tokio::task::spawn_blocking(move || {
            hasher.verify_password(password.as_str(), target.as_str())
        })
        .await??;
        Ok(known && verified)
    }
}

impl fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialStore")
            .field("algorithm", &self.hasher.config().algorithm)
            .field("policy", &self.policy)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> CredentialStore {
        CredentialStore::new(PasswordConfig::fast_for_tests(), PasswordPolicy::default()).unwrap()
    }

    #[tokio::test]
    async fn test_hash_and_verify() {
        let store = store();
        let hash = store.hash_new_password("violet-Harbour-91").await.unwrap();

        assert!(store.verify("violet-Harbour-91", Some(&hash)).await.unwrap());
        assert!(!store.verify("violet-harbour-91", Some(&hash)).await.unwrap());
    }

    #[tokio::test]
    async fn test_unknown_account_never_verifies() {
        let store = store();
        assert!(!store.verify("dummy-password-for-timing", None).await.unwrap());
    }

    #[tokio::test]
    async fn test_malformed_stored_hash() {
        let store = store();
        let hash = PasswordHash::from_encoded("not-a-hash");
        assert!(!store.verify("anything", Some(&hash)).await.unwrap());
    }

    #[test]
    fn test_debug_is_redacted() {
        let hash = PasswordHash::from_encoded("$argon2id$v=19$secret");
        assert_eq!(format!("{hash:?}"), "PasswordHash(<redacted>)");
    }
}
