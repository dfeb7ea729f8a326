use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::AccountTable;
use crate::domain::entities::{AccountRecord, NewAccount};
use crate::domain::repositories::AccountRepository;
use crate::shared::types::{AccountNumber, Balance, Username};
use crate::shared::PortalResult;

/// Process-local account store. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryAccountRepository {
    table: RwLock<AccountTable>,
}

impl MemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountRepository for MemoryAccountRepository {
    async fn create(&self, account: NewAccount) -> PortalResult<AccountRecord> {
        self.table.write().await.insert(account)
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
        self.table
            .write()
            .await
            .assign_account_number(username, account_number)
    }

    async fn set_balance(&self, username: &Username, balance: Balance) -> PortalResult<AccountRecord> {
        self.table.write().await.set_balance(username, balance)
    }

    async fn set_active(&self, username: &Username, active: bool) -> PortalResult<AccountRecord> {
        self.table.write().await.set_active(username, active)
    }

    async fn record_login(&self, username: &Username, at: DateTime<Utc>) -> PortalResult<()> {
        self.table.write().await.record_login(username, at)
    }

    async fn list(&self) -> PortalResult<Vec<AccountRecord>> {
        let mut records = self.table.read().await.records();
        records.sort_by(|a, b| a.username.as_str().cmp(b.username.as_str()));
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::core::credentials::PasswordHash;
    use crate::shared::PortalError;

    fn new_account(username: &str) -> NewAccount {
        NewAccount {
            username: Username::try_new(username).unwrap(),
            email: None,
            password_hash: PasswordHash::from_encoded("hash"),
        }
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let repo = MemoryAccountRepository::new();
        let created = repo.create(new_account("alice")).await.unwrap();
        assert_eq!(created.balance.to_string(), "0.00");

        let found = repo.find_by_username("Alice").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert!(repo.find_by_username("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_duplicate_registration() {
        let repo = Arc::new(MemoryAccountRepository::new());
        let mut handles = Vec::new();
        for name in ["dave", "Dave", "DAVE", "dAve"] {
            let repo = Arc::clone(&repo);
            handles.push(tokio::spawn(async move { repo.create(new_account(name)).await }));
        }

        let mut created = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => created += 1,
                Err(err) => assert!(matches!(err, PortalError::DuplicateUsername(_))),
            }
        }
        assert_eq!(created, 1);
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_record_login_and_balance() {
        let repo = MemoryAccountRepository::new();
        let username = repo.create(new_account("erin")).await.unwrap().username;

        let now = Utc::now();
        repo.record_login(&username, now).await.unwrap();
        repo.set_balance(&username, "99.999".parse().unwrap()).await.unwrap();

        let record = repo.find_by_username("erin").await.unwrap().unwrap();
        assert_eq!(record.last_login, Some(now));
        assert_eq!(record.balance.to_string(), "100.00");
    }

    #[tokio::test]
    async fn test_list_is_sorted() {
        let repo = MemoryAccountRepository::new();
        for name in ["mallory", "bob", "trent"] {
            repo.create(new_account(name)).await.unwrap();
        }
        let names: Vec<String> = repo
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.username.to_string())
            .collect();
        assert_eq!(names, ["bob", "mallory", "trent"]);
    }
}
