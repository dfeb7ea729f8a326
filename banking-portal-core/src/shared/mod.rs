//! Shared types, constants and errors
//!
//! Value types for the account record, the portal error type and the
//! limits and messages shared by validators and stores.

pub mod types;
pub mod constants;
pub mod error;

// Re-export shared components
pub use types::*;
pub use constants::*;
pub use error::*;
