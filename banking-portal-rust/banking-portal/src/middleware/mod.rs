pub mod access_guard;
pub mod csrf;
pub mod security;
pub mod session;

pub use access_guard::LoginRequired;
pub use security::{SecurityConfig, SecurityMiddleware};
pub use session::SessionMiddleware;
