use super::PasswordAlgorithm;

/// Password hashing configuration
#[derive(Debug, Clone)]
pub struct PasswordConfig {
    pub algorithm: PasswordAlgorithm,
    pub salt_length: usize,
    /// Argon2 time cost, or PBKDF2 rounds when `algorithm` is PBKDF2.
    pub iterations: u32,
    /// Argon2 memory cost in KiB.
    pub memory_cost: u32,
    pub parallelism: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            algorithm: PasswordAlgorithm::Argon2,
            salt_length: 16,
            iterations: 2,
            memory_cost: 19456, // 19 MiB
            parallelism: 1,
        }
    }
}

impl PasswordConfig {
    /// PBKDF2 settings at Django's default round count.
    pub fn pbkdf2() -> Self {
        Self {
            algorithm: PasswordAlgorithm::Pbkdf2Sha256,
            salt_length: 22,
            iterations: 600_000,
            memory_cost: 0,
            parallelism: 1,
        }
    }

    /// Cheap parameters for unit tests.
    pub fn fast_for_tests() -> Self {
        Self {
            algorithm: PasswordAlgorithm::Argon2,
            salt_length: 16,
            iterations: 1,
            memory_cost: 1024,
            parallelism: 1,
        }
    }
}
