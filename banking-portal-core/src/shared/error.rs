//! Error handling for the banking portal core
//!
//! This module defines the error types used throughout the core crate.

use thiserror::Error;

use crate::validators::FieldErrors;

/// Result alias used across the core crate
pub type PortalResult<T> = Result<T, PortalError>;

/// Portal error type
#[derive(Error, Debug, Clone)]
pub enum PortalError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Cryptographic error: {0}")]
    Crypto(String),

    #[error("Validation error: {0}")]
    Validation(FieldErrors),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Username already exists: {0}")]
    DuplicateUsername(String),

    #[error("Account number already assigned: {0}")]
    DuplicateAccountNumber(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PortalError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a cryptographic error
    pub fn crypto(message: impl Into<String>) -> Self {
        Self::Crypto(message.into())
    }

    /// Create an invalid value error
    pub fn invalid_value(message: impl Into<String>) -> Self {
        Self::InvalidValue(message.into())
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    pub fn account_not_found(username: impl Into<String>) -> Self {
        Self::AccountNotFound(username.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// True when the error is a uniqueness conflict reported by a store.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::DuplicateUsername(_) | Self::DuplicateAccountNumber(_)
        )
    }
}

impl From<FieldErrors> for PortalError {
    fn from(errors: FieldErrors) -> Self {
        Self::Validation(errors)
    }
}

// Standard library error conversions
impl From<std::io::Error> for PortalError {
    fn from(err: std::io::Error) -> Self {
        Self::storage(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for PortalError {
    fn from(err: serde_json::Error) -> Self {
        Self::storage(format!("JSON error: {}", err))
    }
}

impl From<tokio::task::JoinError> for PortalError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::internal(format!("Task join error: {}", err))
    }
}

// Cryptographic error conversions
impl From<argon2::password_hash::Error> for PortalError {
    fn from(err: argon2::password_hash::Error) -> Self {
        Self::crypto(format!("Password hash error: {}", err))
    }
}

impl From<argon2::Error> for PortalError {
    fn from(err: argon2::Error) -> Self {
        Self::crypto(format!("Argon2 error: {}", err))
    }
}

impl From<rust_decimal::Error> for PortalError {
    fn from(err: rust_decimal::Error) -> Self {
        Self::invalid_value(format!("Decimal error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_portal_error_creation() {
        let config_error = PortalError::config("Invalid configuration");
        let crypto_error = PortalError::crypto("Hashing failed");
        let storage_error = PortalError::storage("Disk full");

        assert!(matches!(config_error, PortalError::Config(_)));
        assert!(matches!(crypto_error, PortalError::Crypto(_)));
        assert!(matches!(storage_error, PortalError::Storage(_)));
    }

    #[test]
    fn test_error_conversions() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let portal_error: PortalError = io_error.into();

        assert!(matches!(portal_error, PortalError::Storage(_)));
    }

    #[test]
    fn test_conflicts() {
        assert!(PortalError::DuplicateUsername("alice".into()).is_conflict());
        assert!(PortalError::DuplicateAccountNumber("0012".into()).is_conflict());
        assert!(!PortalError::account_not_found("alice").is_conflict());
    }

    #[test]
    fn test_error_display() {
        let error = PortalError::crypto("Test error");
        let display = format!("{}", error);

        assert!(display.contains("Cryptographic error"));
        assert!(display.contains("Test error"));
    }
}
