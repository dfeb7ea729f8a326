use serde::Deserialize;

use super::FieldErrors;
use crate::shared::constants::MSG_REQUIRED;
use crate::shared::types::Username;

/// Submitted login form. Missing fields deserialize as empty.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    #[serde(rename = "csrfmiddlewaretoken")]
    pub csrf_token: String,
}

#[derive(Debug, Clone)]
pub struct ValidLogin {
    pub username: String,
    pub password: String,
}

impl LoginForm {
    pub fn username_input(&self) -> &str {
        self.username.trim()
    }

    pub fn validate(&self) -> Result<ValidLogin, FieldErrors> {
        let mut errors = FieldErrors::new();
        if self.username_input().is_empty() {
            errors.add("username", MSG_REQUIRED);
        }
        if self.password.is_empty() {
            errors.add("password", MSG_REQUIRED);
        }
        errors.into_result(ValidLogin {
            username: Username::normalize(self.username_input()),
            password: self.password.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_fields() {
        let errors = LoginForm::default().validate().unwrap_err();
        assert_eq!(errors.get("username"), [MSG_REQUIRED]);
        assert_eq!(errors.get("password"), [MSG_REQUIRED]);
    }

    #[test]
    fn test_username_is_trimmed_password_is_not() {
        let form = LoginForm {
            username: " alice ".into(),
            password: " pw ".into(),
            csrf_token: String::new(),
        };
        let valid = form.validate().unwrap();
        assert_eq!(valid.username, "alice");
        assert_eq!(valid.password, " pw ");
    }

    #[test]
    fn test_username_is_nfkc_normalized() {
        let form = LoginForm {
            username: "\u{FB01}ona".into(),
            password: "pw".into(),
            csrf_token: String::new(),
        };
        assert_eq!(form.validate().unwrap().username, "fiona");
    }
}
