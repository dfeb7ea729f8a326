use std::sync::Arc;

use actix_web::cookie::Cookie;
use actix_web::http::header;
use actix_web::web::{Data, Form};
use actix_web::{HttpRequest, HttpResponse, HttpResponseBuilder};
use banking_portal_core::{FieldErrors, LoginForm, RegistrationForm};
use serde::Deserialize;

use crate::api::templates::{FormValues, Templates};
use crate::app::{Established, SessionLifecycleController};
use crate::domain::error::AppError;
use crate::domain::session::SessionContext;
use crate::infrastructure::config::Config;
use crate::middleware::csrf;

/// Body of a logout form post.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LogoutForm {
    #[serde(rename = "csrfmiddlewaretoken")]
    pub csrf_token: String,
}

fn redirect(location: &str) -> HttpResponseBuilder {
    let mut builder = HttpResponse::Found();
    builder.insert_header((header::LOCATION, location));
    builder
}

fn html(body: String, csrf_cookie: Option<Cookie<'static>>) -> HttpResponse {
    let mut builder = HttpResponse::Ok();
    builder.content_type("text/html; charset=utf-8");
    if let Some(cookie) = csrf_cookie {
        builder.cookie(cookie);
    }
    builder.body(body)
}

/// Redirect that carries the new session cookie and a fresh CSRF token.
fn session_redirect(
    controller: &SessionLifecycleController,
    config: &Config,
    established: &Established,
) -> HttpResponse {
    redirect(&established.redirect_to)
        .cookie(controller.sessions().session_cookie(&established.session.token))
        .cookie(csrf::rotate_token(config.session.cookie_secure))
        .finish()
}

pub async fn register_form(
    req: HttpRequest,
    templates: Data<Arc<Templates>>,
    config: Data<Arc<Config>>,
) -> Result<HttpResponse, AppError> {
    let token = csrf::ensure_token(&req, config.session.cookie_secure);
    let body = templates.register_page(&FormValues::default(), &FieldErrors::new(), &token.value)?;
    Ok(html(body, token.cookie))
}

pub async fn register_submit(
    req: HttpRequest,
    context: SessionContext,
    form: Form<RegistrationForm>,
    controller: Data<Arc<SessionLifecycleController>>,
    templates: Data<Arc<Templates>>,
    config: Data<Arc<Config>>,
) -> Result<HttpResponse, AppError> {
    csrf::verify(&req, Some(form.csrf_token.as_str()))?;

    match controller.register(&context, &form).await {
        Ok(established) => Ok(session_redirect(&controller, &config, &established)),
        Err(AppError::Validation(errors)) => {
            let values = FormValues {
                username: form.username_input().to_string(),
                email: form.email_input().to_string(),
            };
            let token = csrf::ensure_token(&req, config.session.cookie_secure);
            let body = templates.register_page(&values, &errors, &token.value)?;
            Ok(html(body, token.cookie))
        }
        Err(err) => Err(err),
    }
}

pub async fn login_form(
    req: HttpRequest,
    templates: Data<Arc<Templates>>,
    config: Data<Arc<Config>>,
) -> Result<HttpResponse, AppError> {
    let token = csrf::ensure_token(&req, config.session.cookie_secure);
    let body = templates.login_page(&FormValues::default(), &FieldErrors::new(), &token.value)?;
    Ok(html(body, token.cookie))
}

pub async fn login_submit(
    req: HttpRequest,
    context: SessionContext,
    form: Form<LoginForm>,
    controller: Data<Arc<SessionLifecycleController>>,
    templates: Data<Arc<Templates>>,
    config: Data<Arc<Config>>,
) -> Result<HttpResponse, AppError> {
    csrf::verify(&req, Some(form.csrf_token.as_str()))?;

    let errors = match controller.login(&context, &form).await {
        Ok(established) => return Ok(session_redirect(&controller, &config, &established)),
        Err(AppError::Validation(errors)) => errors,
        Err(AppError::Authentication(message)) => {
            let mut errors = FieldErrors::new();
            errors.add_non_field(message);
            errors
        }
        Err(err) => return Err(err),
    };

    let values = FormValues {
        username: form.username_input().to_string(),
        email: String::new(),
    };
    let token = csrf::ensure_token(&req, config.session.cookie_secure);
    let body = templates.login_page(&values, &errors, &token.value)?;
    Ok(html(body, token.cookie))
}

/// Accepts any method. Unsafe methods must carry the CSRF token.
pub async fn logout(
    req: HttpRequest,
    context: SessionContext,
    form: Option<Form<LogoutForm>>,
    controller: Data<Arc<SessionLifecycleController>>,
    config: Data<Arc<Config>>,
) -> Result<HttpResponse, AppError> {
    csrf::verify(&req, form.as_ref().map(|form| form.csrf_token.as_str()))?;

    let location = match controller.logout(&context).await {
        Ok(terminated) => terminated.redirect_to,
        Err(AppError::Authorization(_)) => config.login_url.clone(),
        Err(err) => return Err(err),
    };
    Ok(redirect(&location)
        .cookie(controller.sessions().removal_cookie())
        .finish())
}

pub async fn home(
    req: HttpRequest,
    context: SessionContext,
    controller: Data<Arc<SessionLifecycleController>>,
    templates: Data<Arc<Templates>>,
    config: Data<Arc<Config>>,
) -> Result<HttpResponse, AppError> {
    match controller.view_home(&context).await {
        Ok(summary) => {
            let token = csrf::ensure_token(&req, config.session.cookie_secure);
            let body = templates.home_page(&summary, &token.value)?;
            Ok(html(body, token.cookie))
        }
        Err(AppError::Authorization(_)) => Ok(redirect(&config.login_url)
            .cookie(controller.sessions().removal_cookie())
            .finish()),
        Err(err) => Err(err),
    }
}
