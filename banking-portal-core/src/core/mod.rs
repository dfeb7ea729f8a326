//! Core portal functionality
//!
//! Credential handling and account storage backends.

pub mod credentials;
pub mod storage;
