use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use super::constants::{
    ACCOUNT_NUMBER_MAX_LENGTH, BALANCE_DECIMAL_PLACES, BALANCE_MAX_INTEGER_DIGITS,
    EMAIL_MAX_LENGTH, MSG_INVALID_EMAIL, MSG_INVALID_USERNAME, USERNAME_MAX_LENGTH,
};
use super::error::{PortalError, PortalResult};

lazy_static! {
    static ref USERNAME_REGEX: Regex =
        Regex::new(r"^[\w.@+-]+\z").expect("username pattern is a valid regex");
    static ref EMAIL_REGEX: Regex =
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+\z").expect("email pattern is a valid regex");
}

/// Login identity of an account record.
///
/// Letters (any script), digits and `@ . + - _`, at most 150 characters.
/// Stored in NFKC form, so compatibility variants such as `ﬁ` or full-width
/// letters collapse onto their plain spelling. Comparison for uniqueness
/// goes through [`Username::normalized`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    pub fn try_new(value: impl Into<String>) -> PortalResult<Self> {
        let value = Self::normalize(&value.into());
        Self::check(&value).map_err(PortalError::InvalidValue)?;
        Ok(Self(value))
    }

    /// NFKC form of raw input, the spelling a username is stored under.
    pub fn normalize(value: &str) -> String {
        value.nfkc().collect()
    }

    /// Uniqueness key for raw input: NFKC, then lowercased.
    pub fn lookup_key(value: &str) -> String {
        Self::normalize(value).to_lowercase()
    }

    /// Returns the user-facing message describing why `value` is not a username.
    pub fn check(value: &str) -> Result<(), String> {
        let length = value.chars().count();
        if length > USERNAME_MAX_LENGTH {
            return Err(format!(
                "Ensure this value has at most {USERNAME_MAX_LENGTH} characters (it has {length})."
            ));
        }
        if !USERNAME_REGEX.is_match(value) {
            return Err(MSG_INVALID_USERNAME.to_string());
        }
        Ok(())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-folded key used to enforce uniqueness.
    pub fn normalized(&self) -> String {
        Self::lookup_key(&self.0)
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Username {
    type Error = PortalError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_new(value)
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    pub fn try_new(value: impl Into<String>) -> PortalResult<Self> {
        let value = value.into();
        if value.chars().count() > EMAIL_MAX_LENGTH || !EMAIL_REGEX.is_match(&value) {
            return Err(PortalError::invalid_value(MSG_INVALID_EMAIL));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Part before the `@`, used by the password similarity check.
    pub fn local_part(&self) -> &str {
        self.0.split('@').next().unwrap_or_default()
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Email {
    type Error = PortalError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_new(value)
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}

/// Bank account number, unique across records when assigned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountNumber(String);

impl AccountNumber {
    pub fn try_new(value: impl Into<String>) -> PortalResult<Self> {
        let value = value.into();
        if value.is_empty() || value.len() > ACCOUNT_NUMBER_MAX_LENGTH {
            return Err(PortalError::invalid_value(format!(
                "Account number must be 1 to {ACCOUNT_NUMBER_MAX_LENGTH} characters"
            )));
        }
        if !value.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(PortalError::invalid_value(
                "Account number may contain only ASCII letters and digits",
            ));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for AccountNumber {
    type Error = PortalError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_new(value)
    }
}

impl From<AccountNumber> for String {
    fn from(value: AccountNumber) -> Self {
        value.0
    }
}

/// Account balance stored as numeric(12, 2).
///
/// Always carries exactly two fractional digits. Extra fractional digits are
/// rounded half away from zero; more than ten integer digits is an error.
/// Negative values are representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Balance(Decimal);

impl Balance {
    pub fn zero() -> Self {
        Self(Decimal::new(0, BALANCE_DECIMAL_PLACES))
    }

    pub fn try_new(value: Decimal) -> PortalResult<Self> {
        let mut rounded =
            value.round_dp_with_strategy(BALANCE_DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero);
        rounded.rescale(BALANCE_DECIMAL_PLACES);

        let limit = Decimal::from(10u64.pow(BALANCE_MAX_INTEGER_DIGITS));
        if rounded.abs() >= limit {
            return Err(PortalError::invalid_value(format!(
                "Balance {value} exceeds {BALANCE_MAX_INTEGER_DIGITS} integer digits"
            )));
        }
        Ok(Self(rounded))
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }
}

impl Default for Balance {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Balance {
    type Err = PortalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str(s.trim())
            .map_err(|e| PortalError::invalid_value(format!("Invalid balance '{s}': {e}")))?;
        Self::try_new(value)
    }
}

impl TryFrom<Decimal> for Balance {
    type Error = PortalError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::try_new(value)
    }
}

impl From<Balance> for Decimal {
    fn from(value: Balance) -> Self {
        value.0
    }
}
