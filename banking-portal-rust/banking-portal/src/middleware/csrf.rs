//! Double-submit CSRF protection for form posts.
//!
//! Rendering a form sets the `csrftoken` cookie; an unsafe request must echo
//! that token in the `csrfmiddlewaretoken` field or the `X-CSRFToken`
//! header. The check runs inside the handlers because the token travels in
//! the request body.

use actix_web::cookie::{Cookie, SameSite};
use actix_web::http::Method;
use actix_web::HttpRequest;
use banking_portal_core::credentials::constant_time_eq;
use rand::distr::Alphanumeric;
use rand::Rng;

use crate::domain::error::AppError;
use crate::infrastructure::logger::Logger;

pub const CSRF_COOKIE_NAME: &str = "csrftoken";
pub const CSRF_HEADER_NAME: &str = "X-CSRFToken";
pub const CSRF_FIELD_NAME: &str = "csrfmiddlewaretoken";
pub const CSRF_TOKEN_LENGTH: usize = 32;

/// Token to embed in a rendered form.
///
/// `cookie` is set only when the request carried no usable token.
#[derive(Debug, Clone)]
pub struct CsrfToken {
    pub value: String,
    pub cookie: Option<Cookie<'static>>,
}

pub fn generate_token() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(CSRF_TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

fn is_well_formed(token: &str) -> bool {
    token.len() == CSRF_TOKEN_LENGTH && token.chars().all(|c| c.is_ascii_alphanumeric())
}

pub fn csrf_cookie(token: &str, secure: bool) -> Cookie<'static> {
    Cookie::build(CSRF_COOKIE_NAME, token.to_string())
        .path("/")
        .same_site(SameSite::Lax)
        .secure(secure)
        .finish()
}

fn cookie_token(req: &HttpRequest) -> Option<String> {
    req.cookie(CSRF_COOKIE_NAME)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| is_well_formed(token))
}

/// Reuses the caller's token or issues a fresh one.
pub fn ensure_token(req: &HttpRequest, secure: bool) -> CsrfToken {
    match cookie_token(req) {
        Some(value) => CsrfToken { value, cookie: None },
        None => {
            let value = generate_token();
            let cookie = csrf_cookie(&value, secure);
            CsrfToken {
                value,
                cookie: Some(cookie),
            }
        }
    }
}

/// A new token after login, so a token seen before authentication is not
/// reused afterwards.
pub fn rotate_token(secure: bool) -> Cookie<'static> {
    csrf_cookie(&generate_token(), secure)
}

pub fn is_safe_method(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE)
}

/// Checks an unsafe request against the `csrftoken` cookie.
///
/// `submitted` is the form field value, if the handler parsed one; the
/// `X-CSRFToken` header is used when it is empty.
pub fn verify(req: &HttpRequest, submitted: Option<&str>) -> Result<(), AppError> {
    if is_safe_method(req.method()) {
        return Ok(());
    }

    let result = match cookie_token(req) {
        None => Err(AppError::csrf("CSRF cookie not set.")),
        Some(expected) => {
            let header = req
                .headers()
                .get(CSRF_HEADER_NAME)
                .and_then(|value| value.to_str().ok());
            let candidate = submitted.filter(|token| !token.is_empty()).or(header);

            match candidate {
                None => Err(AppError::csrf("CSRF token missing.")),
                Some(token) if constant_time_eq(token.trim().as_bytes(), expected.as_bytes()) => Ok(()),
                Some(_) => Err(AppError::csrf("CSRF token incorrect.")),
            }
        }
    };

    if let Err(err) = &result {
        let client_ip = req
            .connection_info()
            .realip_remote_addr()
            .unwrap_or("unknown")
            .to_string();
        Logger::security_violation(&client_ip, &err.to_string());
    }
    result
}
