use std::fmt;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use banking_portal_core::shared::constants::MSG_DUPLICATE_USERNAME;
use banking_portal_core::{FieldErrors, PortalError};

/// Main error type for the banking portal service
#[derive(Debug, Clone)]
pub enum AppError {
    /// Bad or duplicate form input; carries field-level messages.
    Validation(FieldErrors),
    /// Credentials did not match an active account.
    Authentication(String),
    /// The request needs a logged-in session.
    Authorization(String),
    Csrf(String),
    Storage(String),
    Config(String),
    Internal(String),
}

impl AppError {
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication(message.into())
    }

    pub fn authorization(message: impl Into<String>) -> Self {
        Self::Authorization(message.into())
    }

    pub fn csrf(message: impl Into<String>) -> Self {
        Self::Csrf(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn to_http_response(&self) -> (StatusCode, serde_json::Value) {
        let (status_code, error_type) = match self {
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AppError::Authentication(_) => (StatusCode::UNAUTHORIZED, "AUTHENTICATION_ERROR"),
            AppError::Authorization(_) => (StatusCode::UNAUTHORIZED, "NOT_AUTHENTICATED"),
            AppError::Csrf(_) => (StatusCode::FORBIDDEN, "CSRF_FAILED"),
            AppError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let mut body = serde_json::json!({
            "error": error_type,
            "message": self.public_message(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });
        if let AppError::Validation(errors) = self {
            body["fields"] = serde_json::to_value(errors).unwrap_or_default();
        }

        (status_code, body)
    }

    /// Message safe to show a client. Server-side failures are not detailed.
    fn public_message(&self) -> String {
        match self {
            AppError::Storage(_) | AppError::Config(_) | AppError::Internal(_) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(errors) => write!(f, "Validation error: {errors}"),
            AppError::Authentication(msg) => write!(f, "{msg}"),
            AppError::Authorization(msg) => write!(f, "Authentication required: {msg}"),
            AppError::Csrf(msg) => write!(f, "CSRF verification failed: {msg}"),
            AppError::Storage(msg) => write!(f, "Storage error: {msg}"),
            AppError::Config(msg) => write!(f, "Configuration error: {msg}"),
            AppError::Internal(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        self.to_http_response().0
    }

    fn error_response(&self) -> HttpResponse {
        let (status_code, body) = self.to_http_response();
        if status_code.is_server_error() {
            tracing::error!("{self}");
        }
        HttpResponse::build(status_code).json(body)
    }
}

impl From<PortalError> for AppError {
    fn from(err: PortalError) -> Self {
        match err {
            PortalError::Validation(errors) => AppError::Validation(errors),
            PortalError::DuplicateUsername(_) => {
                AppError::Validation(FieldErrors::single("username", MSG_DUPLICATE_USERNAME))
            }
            PortalError::DuplicateAccountNumber(number) => AppError::Validation(
                FieldErrors::single("account_number", format!("Account number {number} is already assigned.")),
            ),
            PortalError::InvalidValue(msg) => {
                let mut errors = FieldErrors::new();
                errors.add_non_field(msg);
                AppError::Validation(errors)
            }
            PortalError::Storage(msg) => AppError::Storage(msg),
            PortalError::AccountNotFound(username) => {
                AppError::Storage(format!("Account not found: {username}"))
            }
            PortalError::Config(msg) => AppError::Config(msg),
            PortalError::Crypto(msg) | PortalError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<tera::Error> for AppError {
    fn from(err: tera::Error) -> Self {
        AppError::Internal(format!("Template error: {err}"))
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        AppError::Internal(format!("Token error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (AppError::Validation(FieldErrors::new()), StatusCode::BAD_REQUEST),
            (AppError::authentication("bad"), StatusCode::UNAUTHORIZED),
            (AppError::authorization("login"), StatusCode::UNAUTHORIZED),
            (AppError::csrf("missing"), StatusCode::FORBIDDEN),
            (AppError::Storage("down".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (AppError::Config("bad".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (AppError::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (error, expected) in cases {
            assert_eq!(error.status_code(), expected, "{error}");
        }
    }

    #[test]
    fn test_validation_body_carries_fields() {
        let error = AppError::Validation(FieldErrors::single("username", "taken"));
        let (_, body) = error.to_http_response();
        assert_eq!(body["error"], "VALIDATION_ERROR");
        assert_eq!(body["fields"]["username"][0], "taken");
    }

    #[test]
    fn test_server_errors_hide_details() {
        let (_, body) = AppError::Storage("connection refused to 10.0.0.5".into()).to_http_response();
        assert_eq!(body["message"], "Internal server error");
    }

    #[test]
    fn test_duplicate_username_becomes_field_error() {
        let error = AppError::from(PortalError::DuplicateUsername("alice".into()));
        match error {
            AppError::Validation(errors) => {
                assert_eq!(errors.get("username"), [MSG_DUPLICATE_USERNAME]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
