//! Account record entity
//!
//! A login identity extended with banking attributes. The password hash
//! stays inside the record and is never serialized into summaries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::credentials::PasswordHash;
use crate::shared::constants::{ACCOUNT_NUMBER_NOT_SET, BALANCE_NOT_SET};
use crate::shared::types::{AccountNumber, Balance, Email, Username};

/// Persisted account record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub id: Uuid,
    pub username: Username,
    pub email: Option<Email>,
    pub account_number: Option<AccountNumber>,
    #[serde(default)]
    pub balance: Balance,
    pub password_hash: PasswordHash,
    pub is_active: bool,
    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl AccountRecord {
    /// A freshly registered record: zero balance, no account number.
    pub fn from_new(new: NewAccount) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: new.username,
            email: new.email,
            account_number: None,
            balance: Balance::zero(),
            password_hash: new.password_hash,
            is_active: true,
            date_joined: Utc::now(),
            last_login: None,
        }
    }

    pub fn summary(&self) -> AccountSummary {
        AccountSummary::new(
            &self.username,
            self.account_number.as_ref(),
            Some(self.balance),
        )
    }
}

/// Input for creating an account record.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: Username,
    pub email: Option<Email>,
    pub password_hash: PasswordHash,
}

/// What the home view shows for the logged-in account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSummary {
    pub username: String,
    pub account_number: String,
    pub balance: String,
}

impl AccountSummary {
    pub fn new(
        username: &Username,
        account_number: Option<&AccountNumber>,
        balance: Option<Balance>,
    ) -> Self {
        Self {
            username: username.to_string(),
            account_number: account_number
                .map(AccountNumber::to_string)
                .unwrap_or_else(|| ACCOUNT_NUMBER_NOT_SET.to_string()),
            balance: balance
                .map(|b| b.to_string())
                .unwrap_or_else(|| BALANCE_NOT_SET.to_string()),
        }
    }
}

impl From<&AccountRecord> for AccountSummary {
    fn from(record: &AccountRecord) -> Self {
        record.summary()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_record() -> AccountRecord {
        AccountRecord::from_new(NewAccount {
            username: Username::try_new("alice").unwrap(),
            email: None,
            password_hash: PasswordHash::from_encoded("$argon2id$v=19$x"),
        })
    }

    #[test]
    fn test_new_record_defaults() {
        let record = new_record();
        assert_eq!(record.balance, Balance::zero());
        assert!(record.account_number.is_none());
        assert!(record.is_active);
        assert!(record.last_login.is_none());
    }

    #[test]
    fn test_summary_fallbacks() {
        let summary = new_record().summary();
        assert_eq!(summary.username, "alice");
        assert_eq!(summary.account_number, "Not set");
        assert_eq!(summary.balance, "0.00");

        let username = Username::try_new("bob").unwrap();
        let summary = AccountSummary::new(&username, None, None);
        assert_eq!(summary.balance, "0.00");
    }

    #[test]
    fn test_summary_with_values() {
        let mut record = new_record();
        record.account_number = Some(AccountNumber::try_new("0012345678").unwrap());
        record.balance = "1520.5".parse().unwrap();

        let summary = AccountSummary::from(&record);
        assert_eq!(summary.account_number, "0012345678");
        assert_eq!(summary.balance, "1520.50");
    }

    #[test]
    fn test_debug_hides_password_hash() {
        let rendered = format!("{:?}", new_record());
        assert!(!rendered.contains("argon2id"));
    }
}
