//! Account repository for data access

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::entities::{AccountRecord, NewAccount};
use crate::shared::types::{AccountNumber, Balance, Username};
use crate::shared::PortalResult;

/// Account record store.
///
/// Implementations enforce both uniqueness rules atomically: a losing
/// concurrent insert or assignment fails with
/// [`PortalError::DuplicateUsername`](crate::shared::PortalError::DuplicateUsername)
/// or [`PortalError::DuplicateAccountNumber`](crate::shared::PortalError::DuplicateAccountNumber)
/// and never overwrites the existing record.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Insert a new record with zero balance and no account number.
    async fn create(&self, account: NewAccount) -> PortalResult<AccountRecord>;

    /// Case-insensitive username lookup.
    async fn find_by_username(&self, username: &str) -> PortalResult<Option<AccountRecord>>;

    async fn find_by_account_number(
        &self,
        account_number: &AccountNumber,
    ) -> PortalResult<Option<AccountRecord>>;

    /// Set or clear the account number.
    async fn assign_account_number(
        &self,
        username: &Username,
        account_number: Option<AccountNumber>,
    ) -> PortalResult<AccountRecord>;

    async fn set_balance(&self, username: &Username, balance: Balance) -> PortalResult<AccountRecord>;

    async fn set_active(&self, username: &Username, active: bool) -> PortalResult<AccountRecord>;

    async fn record_login(&self, username: &Username, at: DateTime<Utc>) -> PortalResult<()>;

    /// All records ordered by username.
    async fn list(&self) -> PortalResult<Vec<AccountRecord>>;
}
