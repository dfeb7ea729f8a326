use banking_portal_core::{AccountSummary, FieldErrors};
use serde::Serialize;
use tera::{Context, Tera};

use crate::domain::error::AppError;

pub const BASE_TEMPLATE: &str = "users/base.html";
pub const REGISTER_TEMPLATE: &str = "users/register.html";
pub const LOGIN_TEMPLATE: &str = "users/login.html";
pub const HOME_TEMPLATE: &str = "users/home.html";

/// Values echoed back into a re-rendered form. Passwords never are.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FormValues {
    pub username: String,
    pub email: String,
}

/// The HTML pages, compiled into the binary.
pub struct Templates {
    tera: Tera,
}

impl Templates {
    pub fn new() -> Result<Self, tera::Error> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            (BASE_TEMPLATE, include_str!("../../templates/users/base.html")),
            (REGISTER_TEMPLATE, include_str!("../../templates/users/register.html")),
            (LOGIN_TEMPLATE, include_str!("../../templates/users/login.html")),
            (HOME_TEMPLATE, include_str!("../../templates/users/home.html")),
        ])?;
        Ok(Self { tera })
    }

    fn render(&self, template: &str, context: &Context) -> Result<String, AppError> {
        Ok(self.tera.render(template, context)?)
    }

    fn form_context(values: &FormValues, errors: &FieldErrors, csrf_token: &str) -> Context {
        let mut context = Context::new();
        context.insert("values", values);
        context.insert("errors", errors);
        context.insert("csrf_token", csrf_token);
        context
    }

    pub fn register_page(
        &self,
        values: &FormValues,
        errors: &FieldErrors,
        csrf_token: &str,
    ) -> Result<String, AppError> {
        self.render(REGISTER_TEMPLATE, &Self::form_context(values, errors, csrf_token))
    }

    pub fn login_page(
        &self,
        values: &FormValues,
        errors: &FieldErrors,
        csrf_token: &str,
    ) -> Result<String, AppError> {
        self.render(LOGIN_TEMPLATE, &Self::form_context(values, errors, csrf_token))
    }

    pub fn home_page(&self, summary: &AccountSummary, csrf_token: &str) -> Result<String, AppError> {
        let mut context = Context::new();
        context.insert("username", &summary.username);
        context.insert("account_number", &summary.account_number);
        context.insert("balance", &summary.balance);
        context.insert("csrf_token", csrf_token);
        self.render(HOME_TEMPLATE, &context)
    }
}
