use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::domain::entities::{AccountRecord, NewAccount};
use crate::shared::error::PortalError;
use crate::shared::types::{AccountNumber, Balance, Username};
use crate::shared::PortalResult;

/// Account records keyed by the NFKC, case-folded username.
///
/// Not synchronized; the repositories wrap it in a lock so that every
/// check-and-write happens under one guard.
#[derive(Debug, Default, Clone)]
pub struct AccountTable {
    records: BTreeMap<String, AccountRecord>,
}

impl AccountTable {
    pub fn from_records(records: Vec<AccountRecord>) -> PortalResult<Self> {
        let mut table = Self::default();
        for record in records {
            table.ensure_account_number_free(record.account_number.as_ref(), &record.username)?;
            let key = record.username.normalized();
            if table.records.contains_key(&key) {
                return Err(PortalError::DuplicateUsername(record.username.to_string()));
            }
            table.records.insert(key, record);
        }
        Ok(table)
    }

    pub fn records(&self) -> Vec<AccountRecord> {
        self.records.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn insert(&mut self, account: NewAccount) -> PortalResult<AccountRecord> {
        let key = account.username.normalized();
        if self.records.contains_key(&key) {
            return Err(PortalError::DuplicateUsername(account.username.to_string()));
        }
        let record = AccountRecord::from_new(account);
        self.records.insert(key, record.clone());
        Ok(record)
    }

    pub fn find_by_username(&self, username: &str) -> Option<AccountRecord> {
        self.records.get(&Username::lookup_key(username)).cloned()
    }

    pub fn find_by_account_number(&self, account_number: &AccountNumber) -> Option<AccountRecord> {
        self.records
            .values()
            .find(|r| r.account_number.as_ref() == Some(account_number))
            .cloned()
    }

    pub fn assign_account_number(
        &mut self,
        username: &Username,
        account_number: Option<AccountNumber>,
    ) -> PortalResult<AccountRecord> {
        self.ensure_account_number_free(account_number.as_ref(), username)?;
        self.update(username, |record| record.account_number = account_number)
    }

    pub fn set_balance(&mut self, username: &Username, balance: Balance) -> PortalResult<AccountRecord> {
        self.update(username, |record| record.balance = balance)
    }

    pub fn set_active(&mut self, username: &Username, active: bool) -> PortalResult<AccountRecord> {
        self.update(username, |record| record.is_active = active)
    }

    pub fn record_login(&mut self, username: &Username, at: DateTime<Utc>) -> PortalResult<()> {
        self.update(username, |record| record.last_login = Some(at))
            .map(|_| ())
    }

    fn update(
        &mut self,
        username: &Username,
        apply: impl FnOnce(&mut AccountRecord),
    ) -> PortalResult<AccountRecord> {
        let record = self
            .records
            .get_mut(&username.normalized())
            .ok_or_else(|| PortalError::account_not_found(username.as_str()))?;
        apply(record);
        Ok(record.clone())
    }

    fn ensure_account_number_free(
        &self,
        account_number: Option<&AccountNumber>,
        owner: &Username,
    ) -> PortalResult<()> {
        let Some(account_number) = account_number else {
            return Ok(());
        };
        let owner_key = owner.normalized();
        let taken = self.records.iter().any(|(key, record)| {
            *key != owner_key && record.account_number.as_ref() == Some(account_number)
        });
        if taken {
            return Err(PortalError::DuplicateAccountNumber(account_number.to_string()));
        }
        Ok(())
    }
}
