/// Hash formats understood by [`super::PortalPasswordHasher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordAlgorithm {
    /// Argon2id PHC string, `$argon2id$v=19$...`
    Argon2,
    /// `pbkdf2_sha256$<iterations>$<salt>$<base64 hash>`, Django's default
    /// hasher format.
    Pbkdf2Sha256,
}

impl PasswordAlgorithm {
    /// Detects the algorithm from a stored hash.
    pub fn detect(encoded: &str) -> Option<Self> {
        if encoded.starts_with("$argon2") {
            Some(Self::Argon2)
        } else if encoded.starts_with("pbkdf2_sha256$") {
            Some(Self::Pbkdf2Sha256)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect() {
        assert_eq!(
            PasswordAlgorithm::detect("$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA"),
            Some(PasswordAlgorithm::Argon2)
        );
        assert_eq!(
            PasswordAlgorithm::detect("pbkdf2_sha256$600000$salt$hash"),
            Some(PasswordAlgorithm::Pbkdf2Sha256)
        );
        assert_eq!(PasswordAlgorithm::detect("md5$abc"), None);
        assert_eq!(PasswordAlgorithm::detect(""), None);
    }
}
