pub mod handlers;
pub mod templates;

#[cfg(test)]
mod tests;

use actix_web::web;

use crate::middleware::LoginRequired;
use handlers::{health, profile, users};

pub use templates::Templates;

/// Registers every route. `login_url` is where the access guard sends
/// anonymous callers.
pub fn configure(cfg: &mut web::ServiceConfig, login_url: &str) {
    cfg.service(health::health)
        .service(profile::me)
        .service(
            web::resource(["/users/register/", "/register/"])
                .route(web::get().to(users::register_form))
                .route(web::post().to(users::register_submit)),
        )
        .service(
            web::resource("/users/login/")
                .route(web::get().to(users::login_form))
                .route(web::post().to(users::login_submit)),
        )
        .service(
            web::resource("/users/logout/")
                .wrap(LoginRequired::new(login_url))
                .to(users::logout),
        )
        .service(
            web::resource("/")
                .wrap(LoginRequired::new(login_url))
                .route(web::get().to(users::home)),
        );
}
