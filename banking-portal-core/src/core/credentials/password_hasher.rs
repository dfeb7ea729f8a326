use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use base64::Engine;
use pbkdf2::pbkdf2_hmac;
use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use rand::{Rng, RngCore};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use super::{PasswordAlgorithm, PasswordConfig};
use crate::shared::PortalResult;

const PBKDF2_PREFIX: &str = "pbkdf2_sha256";
const PBKDF2_KEY_LENGTH: usize = 32;

/// One-way password hasher.
///
/// New hashes use the configured algorithm. Verification dispatches on the
/// stored format, so records written with either algorithm keep working.
pub struct PortalPasswordHasher {
    config: PasswordConfig,
}

impl PortalPasswordHasher {
    pub fn new(config: PasswordConfig) -> Self {
        Self { config }
    }

    pub fn new_default() -> Self {
        Self::new(PasswordConfig::default())
    }

    pub fn config(&self) -> &PasswordConfig {
        &self.config
    }

    /// Hash a password with a fresh random salt
    pub fn hash_password(&self, password: &str) -> PortalResult<String> {
        match self.config.algorithm {
            PasswordAlgorithm::Argon2 => self.hash_argon2(password),
            PasswordAlgorithm::Pbkdf2Sha256 => self.hash_pbkdf2(password),
        }
    }

    /// Verify a password against a stored hash.
    ///
    /// A malformed or unrecognised hash never matches.
    pub fn verify_password(&self, password: &str, encoded: &str) -> PortalResult<bool> {
        match PasswordAlgorithm::detect(encoded) {
            Some(PasswordAlgorithm::Argon2) => Ok(Self::verify_argon2(password, encoded)),
            Some(PasswordAlgorithm::Pbkdf2Sha256) => Self::verify_pbkdf2(password, encoded),
            None => Ok(false),
        }
    }

    fn argon2(&self) -> PortalResult<Argon2<'static>> {
        let params = argon2::Params::new(
            self.config.memory_cost,
            self.config.iterations,
            self.config.parallelism,
            None,
        )?;
        Ok(Argon2::new(
            argon2::Algorithm::Argon2id,
            argon2::Version::V0x13,
            params,
        ))
    }

    fn hash_argon2(&self, password: &str) -> PortalResult<String> {
        let mut salt = vec![0u8; self.config.salt_length];
        OsRng.fill_bytes(&mut salt);
        let salt_string = SaltString::encode_b64(&salt)?;

        let password_hash = self.argon2()?.hash_password(password.as_bytes(), &salt_string)?;
        Ok(password_hash.to_string())
    }

    fn verify_argon2(password: &str, encoded: &str) -> bool {
        // Cost parameters come from the PHC string itself.
        match PasswordHash::new(encoded) {
            Ok(parsed) => Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }

    /// `pbkdf2_sha256$<iterations>$<salt>$<base64(key)>`
    fn hash_pbkdf2(&self, password: &str) -> PortalResult<String> {
        let salt: String = OsRng
            .sample_iter(&Alphanumeric)
            .take(self.config.salt_length)
            .map(char::from)
            .collect();

        let mut key = [0u8; PBKDF2_KEY_LENGTH];
        pbkdf2_hmac::<Sha256>(
            password.as_bytes(),
            salt.as_bytes(),
            self.config.iterations,
            &mut key,
        );
        let encoded = format!(
            "{PBKDF2_PREFIX}${}${salt}${}",
            self.config.iterations,
            base64::engine::general_purpose::STANDARD.encode(key)
        );
        key.zeroize();
        Ok(encoded)
    }

    fn verify_pbkdf2(password: &str, encoded: &str) -> PortalResult<bool> {
        let parts: Vec<&str> = encoded.split('$').collect();
        if parts.len() != 4 || parts[0] != PBKDF2_PREFIX {
            return Ok(false);
        }
        let iterations: u32 = match parts[1].parse() {
            Ok(n) if n > 0 => n,
            _ => return Ok(false),
        };
        if parts[2].is_empty() {
            return Ok(false);
        }
        let stored_key = match base64::engine::general_purpose::STANDARD.decode(parts[3]) {
            Ok(key) if !key.is_empty() => key,
            _ => return Ok(false),
        };

        let mut computed_key = vec![0u8; stored_key.len()];
        pbkdf2_hmac::<Sha256>(
            password.as_bytes(),
            parts[2].as_bytes(),
            iterations,
            &mut computed_key,
        );
        let matches = constant_time_eq(&computed_key, &stored_key);
        computed_key.zeroize();
        Ok(matches)
    }
}

impl Default for PortalPasswordHasher {
    fn default() -> Self {
        Self::new_default()
    }
}

/// Byte comparison whose timing does not depend on where inputs differ.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_hasher() -> PortalPasswordHasher {
        PortalPasswordHasher::new(PasswordConfig::fast_for_tests())
    }

    fn fast_pbkdf2() -> PortalPasswordHasher {
        PortalPasswordHasher::new(PasswordConfig {
            iterations: 1_000,
            ..PasswordConfig::pbkdf2()
        })
    }

    #[test]
    fn test_hash_password() {
        let hasher = fast_hasher();
        let password = "correct horse battery";

        let hash = hasher.hash_password(password).unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(!hash.contains(password));
    }

    #[test]
    fn test_verify_password() {
        let hasher = fast_hasher();
        let hash = hasher.hash_password("correct horse battery").unwrap();

        assert!(hasher.verify_password("correct horse battery", &hash).unwrap());
        assert!(!hasher.verify_password("wrong horse battery", &hash).unwrap());
    }

    #[test]
    fn test_different_salts_produce_different_hashes() {
        let hasher = fast_hasher();
        let hash1 = hasher.hash_password("same password").unwrap();
        let hash2 = hasher.hash_password("same password").unwrap();
        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_pbkdf2_format() {
        let hasher = fast_pbkdf2();
        let hash = hasher.hash_password("s3cure-Passw0rd").unwrap();

        let parts: Vec<&str> = hash.split('$').collect();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0], "pbkdf2_sha256");
        assert_eq!(parts[1], "1000");
        assert_eq!(parts[2].len(), 22);
        assert!(parts[2].chars().all(|c| c.is_ascii_alphanumeric()));

        assert!(hasher.verify_password("s3cure-Passw0rd", &hash).unwrap());
        assert!(!hasher.verify_password("s3cure-passw0rd", &hash).unwrap());
    }

    #[test]
    fn test_verification_dispatches_on_stored_format() {
        let argon = fast_hasher();
        let pbkdf2 = fast_pbkdf2();
        let legacy = pbkdf2.hash_password("legacy-password").unwrap();

        assert!(argon.verify_password("legacy-password", &legacy).unwrap());
        assert!(!argon.verify_password("Legacy-password", &legacy).unwrap());
    }

    #[test]
    fn test_known_pbkdf2_vector() {
        // pbkdf2_sha256, 1 iteration, salt "salt", password "password"
        let encoded = "pbkdf2_sha256$1$salt$Eg+2z/z4syxD5yJSVsT4N6hlSMkszDVICAWYfLcL4Xs=";
        let hasher = fast_hasher();
        assert!(hasher.verify_password("password", encoded).unwrap());
        assert!(!hasher.verify_password("Password", encoded).unwrap());
    }

    #[test]
    fn test_malformed_hash_never_matches() {
        let hasher = fast_hasher();
        for encoded in [
            "",
            "plaintext",
            "$argon2id$garbage",
            "pbkdf2_sha256$abc$salt$hash",
            "pbkdf2_sha256$0$salt$Eg+2z/z4syxD5yJSVsT4N6hlSMkszDVICAWYfLcL4Xs=",
            "pbkdf2_sha256$1$salt$not base64!",
            "pbkdf2_sha256$1$$Eg+2z/z4syxD5yJSVsT4N6hlSMkszDVICAWYfLcL4Xs=",
        ] {
            assert!(!hasher.verify_password("password", encoded).unwrap(), "{encoded}");
        }
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
    }
}
