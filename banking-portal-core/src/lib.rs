//! Banking Portal Core
//!
//! Account records, credentials and form validation for the banking portal.
//! Nothing in this crate speaks HTTP.
//!
//! ## Architecture
//!
//! - **Core**: credential store (password hashing and policy) and account
//!   storage backends
//! - **Domain**: the account record entity and the repository trait
//! - **Validators**: registration and login forms with field-level errors
//! - **Shared**: value types, constants and the error type
//!
//! ## Usage
//!
//! ```rust,no_run
//! use banking_portal_core::{
//!     AccountRepository, CredentialStore, MemoryAccountRepository, NewAccount,
//!     PasswordConfig, PasswordPolicy, RegistrationForm,
//! };
//!
//! # async fn run() -> banking_portal_core::PortalResult<()> {
//! let credentials = CredentialStore::new(PasswordConfig::default(), PasswordPolicy::default())?;
//! let accounts = MemoryAccountRepository::new();
//!
//! let form = RegistrationForm {
//!     username: "alice".into(),
//!     password1: "violet-Harbour-91".into(),
//!     password2: "violet-Harbour-91".into(),
//!     ..Default::default()
//! };
//! let valid = form.validate(credentials.policy(), false)?;
//! let password_hash = credentials.hash_new_password(&valid.password).await?;
//! let record = accounts
//!     .create(NewAccount { username: valid.username, email: valid.email, password_hash })
//!     .await?;
//! assert_eq!(record.summary().account_number, "Not set");
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod domain;
pub mod shared;
pub mod validators;

pub use crate::core::credentials;
pub use crate::core::credentials::{
    CredentialStore, PasswordAlgorithm, PasswordConfig, PasswordHash, PasswordPolicy,
    PortalPasswordHasher, UserAttributes,
};
pub use crate::core::storage::{FileAccountRepository, MemoryAccountRepository};

pub use domain::{AccountRecord, AccountRepository, AccountSummary, NewAccount};

pub use shared::error::{PortalError, PortalResult};
pub use shared::types::{AccountNumber, Balance, Email, Username};

pub use validators::{FieldErrors, LoginForm, RegistrationForm, ValidLogin, ValidRegistration};

/// Crate version, reported by the health endpoint
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
