pub mod account_admin;
pub mod session_service;

pub use account_admin::assign_account_number;
pub use session_service::{Established, SessionLifecycleController, Terminated};
