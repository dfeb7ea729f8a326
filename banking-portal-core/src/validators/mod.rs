//! Form validation returning field-level messages

pub mod field_errors;
pub mod login;
pub mod registration;

pub use field_errors::FieldErrors;
pub use login::{LoginForm, ValidLogin};
pub use registration::{RegistrationForm, ValidRegistration};
