use serde::Deserialize;

use super::FieldErrors;
use crate::core::credentials::{PasswordPolicy, UserAttributes};
use crate::shared::constants::{
    MSG_DUPLICATE_USERNAME, MSG_INVALID_EMAIL, MSG_PASSWORD_MISMATCH, MSG_REQUIRED,
};
use crate::shared::types::{Email, Username};

/// Submitted registration form. Missing fields deserialize as empty.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegistrationForm {
    pub username: String,
    pub email: String,
    pub password1: String,
    pub password2: String,
    #[serde(rename = "csrfmiddlewaretoken")]
    pub csrf_token: String,
}

/// Registration input that passed every field rule.
#[derive(Debug, Clone)]
pub struct ValidRegistration {
    pub username: Username,
    pub email: Option<Email>,
    pub password: String,
}

impl RegistrationForm {
    pub fn username_input(&self) -> &str {
        self.username.trim()
    }

    pub fn email_input(&self) -> &str {
        self.email.trim()
    }

    /// The username, when it is syntactically valid.
    pub fn clean_username(&self) -> Option<Username> {
        Username::try_new(self.username_input()).ok()
    }

    /// Applies field rules and the password policy.
    ///
    /// `username_taken` reports whether an account with the cleaned username
    /// already exists; it is only consulted for a valid username.
    pub fn validate(
        &self,
        policy: &PasswordPolicy,
        username_taken: bool,
    ) -> Result<ValidRegistration, FieldErrors> {
        let mut errors = FieldErrors::new();

        let username = match self.username_input() {
            "" => {
                errors.add("username", MSG_REQUIRED);
                None
            }
            raw => match Username::check(raw) {
                Ok(()) if username_taken => {
                    errors.add("username", MSG_DUPLICATE_USERNAME);
                    None
                }
                Ok(()) => Username::try_new(raw).ok(),
                Err(message) => {
                    errors.add("username", message);
                    None
                }
            },
        };

        let email = match self.email_input() {
            "" => None,
            raw => match Email::try_new(raw) {
                Ok(email) => Some(email),
                Err(_) => {
                    errors.add("email", MSG_INVALID_EMAIL);
                    None
                }
            },
        };

        if self.password1.is_empty() {
            errors.add("password1", MSG_REQUIRED);
        }
        if self.password2.is_empty() {
            errors.add("password2", MSG_REQUIRED);
        } else if !self.password1.is_empty() && self.password1 != self.password2 {
            errors.add("password2", MSG_PASSWORD_MISMATCH);
        } else if !self.password1.is_empty() {
            let attributes = UserAttributes {
                username: self.username_input(),
                email: email.as_ref().map(Email::as_str),
            };
            for message in policy.validate(&self.password2, attributes) {
                errors.add("password2", message);
            }
        }

        match (username, errors.is_empty()) {
            (Some(username), true) => Ok(ValidRegistration {
                username,
                email,
                password: self.password2.clone(),
            }),
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(username: &str, email: &str, password1: &str, password2: &str) -> RegistrationForm {
        RegistrationForm {
            username: username.to_string(),
            email: email.to_string(),
            password1: password1.to_string(),
            password2: password2.to_string(),
            csrf_token: String::new(),
        }
    }

    #[test]
    fn test_valid_registration() {
        let valid = form("alice", "alice@example.com", "violet-Harbour-91", "violet-Harbour-91")
            .validate(&PasswordPolicy::default(), false)
            .unwrap();
        assert_eq!(valid.username.as_str(), "alice");
        assert_eq!(valid.email.unwrap().as_str(), "alice@example.com");
        assert_eq!(valid.password, "violet-Harbour-91");
    }

    #[test]
    fn test_email_is_optional_and_trimmed() {
        let valid = form("  bob ", "   ", "violet-Harbour-91", "violet-Harbour-91")
            .validate(&PasswordPolicy::default(), false)
            .unwrap();
        assert_eq!(valid.username.as_str(), "bob");
        assert!(valid.email.is_none());
    }

    #[test]
    fn test_missing_fields() {
        let errors = RegistrationForm::default()
            .validate(&PasswordPolicy::default(), false)
            .unwrap_err();
        for field in ["username", "password1", "password2"] {
            assert_eq!(errors.get(field), [MSG_REQUIRED], "{field}");
        }
        assert!(!errors.has("email"));
    }

    #[test]
    fn test_password_mismatch_skips_policy() {
        let errors = form("alice", "", "short", "different")
            .validate(&PasswordPolicy::default(), false)
            .unwrap_err();
        assert_eq!(errors.get("password2"), [MSG_PASSWORD_MISMATCH]);
    }

    #[test]
    fn test_policy_messages_land_on_password2() {
        let errors = form("alice", "", "12345", "12345")
            .validate(&PasswordPolicy::default(), false)
            .unwrap_err();
        assert_eq!(errors.get("password2").len(), 3);
        assert!(!errors.has("password1"));
    }

    #[test]
    fn test_invalid_username_and_email() {
        let errors = form("bad name", "not-an-email", "violet-Harbour-91", "violet-Harbour-91")
            .validate(&PasswordPolicy::default(), false)
            .unwrap_err();
        assert_eq!(
            errors.get("username"),
            [crate::shared::constants::MSG_INVALID_USERNAME]
        );
        assert_eq!(errors.get("email"), ["Enter a valid email address."]);
    }

    #[test]
    fn test_taken_username() {
        let errors = form("alice", "", "violet-Harbour-91", "violet-Harbour-91")
            .validate(&PasswordPolicy::default(), true)
            .unwrap_err();
        assert_eq!(errors.get("username"), [MSG_DUPLICATE_USERNAME]);
    }

    #[test]
    fn test_deserializes_with_missing_fields() {
        let form: RegistrationForm =
            serde_json::from_str(r#"{"username": "alice", "csrfmiddlewaretoken": "t"}"#).unwrap();
        assert_eq!(form.username, "alice");
        assert_eq!(form.csrf_token, "t");
        assert!(form.password1.is_empty());
    }
}
