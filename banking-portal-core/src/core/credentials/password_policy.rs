use std::collections::{HashMap, HashSet};

use lazy_static::lazy_static;
use regex::Regex;

use crate::shared::constants::{PASSWORD_MAX_SIMILARITY, PASSWORD_MIN_LENGTH};

lazy_static! {
    static ref NON_WORD: Regex = Regex::new(r"\W+").expect("non-word pattern is a valid regex");
    static ref COMMON_PASSWORDS: HashSet<&'static str> = include_str!("common_passwords.txt")
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
}

/// Account attributes a password must not resemble.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserAttributes<'a> {
    pub username: &'a str,
    pub email: Option<&'a str>,
}

/// Rules applied to a new password before it is hashed.
///
/// Every failing rule contributes one message; an empty list means the
/// password is acceptable.
#[derive(Debug, Clone)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub max_similarity: f64,
    pub reject_common: bool,
    pub reject_numeric: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: PASSWORD_MIN_LENGTH,
            max_similarity: PASSWORD_MAX_SIMILARITY,
            reject_common: true,
            reject_numeric: true,
        }
    }
}

impl PasswordPolicy {
    pub fn validate(&self, password: &str, attributes: UserAttributes<'_>) -> Vec<String> {
        let mut messages = Vec::new();

        if let Some(message) = self.check_length(password) {
            messages.push(message);
        }
        if let Some(message) = self.check_similarity(password, attributes) {
            messages.push(message);
        }
        if self.reject_common && is_common(password) {
            messages.push("This password is too common.".to_string());
        }
        if self.reject_numeric && !password.is_empty() && password.chars().all(char::is_numeric) {
            messages.push("This password is entirely numeric.".to_string());
        }

        messages
    }

    fn check_length(&self, password: &str) -> Option<String> {
        if password.chars().count() >= self.min_length {
            return None;
        }
        let unit = if self.min_length == 1 { "character" } else { "characters" };
        Some(format!(
            "This password is too short. It must contain at least {} {unit}.",
            self.min_length
        ))
    }

    fn check_similarity(&self, password: &str, attributes: UserAttributes<'_>) -> Option<String> {
        let password = password.to_lowercase();
        let candidates = [
            (Some(attributes.username), "username"),
            (attributes.email, "email address"),
        ];

        for (value, verbose_name) in candidates {
            let Some(value) = value.filter(|v| !v.is_empty()) else {
                continue;
            };
            let value = value.to_lowercase();
            let parts = NON_WORD
                .split(&value)
                .chain(std::iter::once(value.as_str()));

            for part in parts {
                if exceeds_maximum_length_ratio(&password, self.max_similarity, part) {
                    continue;
                }
                if quick_ratio(&password, part) >= self.max_similarity {
                    return Some(format!("The password is too similar to the {verbose_name}."));
                }
            }
        }
        None
    }
}

fn is_common(password: &str) -> bool {
    COMMON_PASSWORDS.contains(password.trim().to_lowercase().as_str())
}

/// Upper bound on sequence similarity: shared characters (as multisets)
/// relative to the combined length.
fn quick_ratio(a: &str, b: &str) -> f64 {
    let total = a.chars().count() + b.chars().count();
    if total == 0 {
        return 1.0;
    }

    let mut available: HashMap<char, usize> = HashMap::new();
    for c in b.chars() {
        *available.entry(c).or_default() += 1;
    }
    let mut matches = 0usize;
    for c in a.chars() {
        if let Some(count) = available.get_mut(&c) {
            if *count > 0 {
                *count -= 1;
                matches += 1;
            }
        }
    }

    2.0 * matches as f64 / total as f64
}

/// A password ten times longer than a short attribute cannot be similar
/// enough to matter, so the comparison is skipped.
fn exceeds_maximum_length_ratio(password: &str, max_similarity: f64, value: &str) -> bool {
    let password_length = password.chars().count();
    let value_length = value.chars().count();
    let length_bound = max_similarity / 2.0 * password_length as f64;
    password_length >= 10 * value_length && (value_length as f64) < length_bound
}
