//! Credential handling for account passwords
//!
//! Hashing, verification and the password policy applied at registration.

pub mod credential_store;
pub mod password_algorithm;
pub mod password_config;
pub mod password_hasher;
pub mod password_policy;

pub use credential_store::*;
pub use password_algorithm::*;
pub use password_config::*;
pub use password_hasher::*;
pub use password_policy::*;
