use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::AccountTable;
use crate::domain::entities::{AccountRecord, NewAccount};
use crate::domain::repositories::AccountRepository;
use crate::shared::types::{AccountNumber, Balance, Username};
use crate::shared::PortalResult;

pub const ACCOUNTS_FILE: &str = "accounts.json";

/// Account store persisted as one JSON document in `data_dir`.
///
/// Every mutation is applied to a copy of the table, written to disk and
/// only then published, all while holding the write lock.
#[derive(Debug)]
pub struct FileAccountRepository {
    path: PathBuf,
    table: RwLock<AccountTable>,
}

impl FileAccountRepository {
    pub async fn open(data_dir: impl AsRef<Path>) -> PortalResult<Self> {
        let data_dir = data_dir.as_ref();
        tokio::fs::create_dir_all(data_dir).await?;
        let path = data_dir.join(ACCOUNTS_FILE);

        let table = match tokio::fs::read_to_string(&path).await {
            Ok(data) => {
                let records: Vec<AccountRecord> = serde_json::from_str(&data)?;
                AccountTable::from_records(records)?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => AccountTable::default(),
            Err(e) => return Err(e.into()),
        };
        log::info!("Loaded {} account(s) from {}", table.len(), path.display());

        Ok(Self {
            path,
            table: RwLock::new(table),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn mutate<T>(
        &self,
        apply: impl FnOnce(&mut AccountTable) -> PortalResult<T>,
    ) -> PortalResult<T> {
        let mut guard = self.table.write().await;
        let mut next = guard.clone();
        let result = apply(&mut next)?;
        self.persist(&next).await?;
        *guard = next;
        Ok(result)
    }

    async fn persist(&self, table: &AccountTable) -> PortalResult<()> {
        let data = serde_json::to_string_pretty(&table.records())?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, data).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl AccountRepository for FileAccountRepository {
    async fn create(&self, account: NewAccount) -> PortalResult<AccountRecord> {
        self.mutate(|table| table.insert(account)).await
    }

    async fn find_by_username(&self, username: &str) -> PortalResult<Option<AccountRecord>> {
        Ok(self.table.read().await.find_by_username(username))
    }

    async fn find_by_account_number(
        &self,
        account_number: &AccountNumber,
    ) -> PortalResult<Option<AccountRecord>> {
        Ok(self.table.read().await.find_by_account_number(account_number))
    }

    async fn assign_account_number(
        &self,
        username: &Username,
        account_number: Option<AccountNumber>,
    ) -> PortalResult<AccountRecord> {
        self.mutate(|table| table.assign_account_number(username, account_number))
            .await
    }

    async fn set_balance(&self, username: &Username, balance: Balance) -> PortalResult<AccountRecord> {
        self.mutate(|table| table.set_balance(username, balance)).await
    }

    async fn set_active(&self, username: &Username, active: bool) -> PortalResult<AccountRecord> {
        self.mutate(|table| table.set_active(username, active)).await
    }

    async fn record_login(&self, username: &Username, at: DateTime<Utc>) -> PortalResult<()> {
        self.mutate(|table| table.record_login(username, at)).await
    }

    async fn list(&self) -> PortalResult<Vec<AccountRecord>> {
        let mut records = self.table.read().await.records();
        records.sort_by(|a, b| a.username.as_str().cmp(b.username.as_str()));
        Ok(records)
    }
}
