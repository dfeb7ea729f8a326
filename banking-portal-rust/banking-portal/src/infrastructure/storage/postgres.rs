use async_trait::async_trait;
use banking_portal_core::{
    AccountNumber, AccountRecord, AccountRepository, Balance, Email, NewAccount, PasswordHash,
    PortalError, PortalResult, Username,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgArguments, PgPool, PgPoolOptions, PgRow};
use sqlx::{Postgres, Row};
use uuid::Uuid;

use crate::infrastructure::config::DatabaseConfig;

type PgQuery<'q> = sqlx::query::Query<'q, Postgres, PgArguments>;

const ACCOUNT_COLUMNS: &str = "id, username, email, account_number, balance, password_hash, \
                               is_active, date_joined, last_login";
const USERNAME_INDEX: &str = "accounts_username_lower_key";
const ACCOUNT_NUMBER_CONSTRAINT: &str = "accounts_account_number_key";

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS accounts (
    id UUID PRIMARY KEY,
    username VARCHAR(150) NOT NULL,
    email VARCHAR(254),
    account_number VARCHAR(20) CONSTRAINT accounts_account_number_key UNIQUE,
    balance NUMERIC(12, 2) NOT NULL DEFAULT 0.00,
    password_hash TEXT NOT NULL,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    date_joined TIMESTAMPTZ NOT NULL,
    last_login TIMESTAMPTZ
)"#;
const CREATE_USERNAME_INDEX: &str =
    "CREATE UNIQUE INDEX IF NOT EXISTS accounts_username_lower_key ON accounts (lower(username))";

/// Account store backed by the `accounts` table.
///
/// Uniqueness is enforced by the database: a unique index on
/// `lower(username)` and a unique constraint on `account_number`.
#[derive(Clone)]
pub struct PgAccountRepository {
    pool: PgPool,
}

impl PgAccountRepository {
    pub async fn connect(config: &DatabaseConfig) -> PortalResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(config.postgres.connect_options())
            .await
            .map_err(|e| PortalError::storage(format!("Database connection error: {e}")))?;

        let repository = Self { pool };
        repository.ensure_schema().await?;
        Ok(repository)
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn ensure_schema(&self) -> PortalResult<()> {
        for statement in [CREATE_TABLE, CREATE_USERNAME_INDEX] {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| PortalError::storage(format!("Schema setup failed: {e}")))?;
        }
        Ok(())
    }

    async fn fetch_updated(&self, query: PgQuery<'_>, username: &Username) -> PortalResult<AccountRecord> {
        let row = query
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_write_error(e, username.as_str()))?
            .ok_or_else(|| PortalError::account_not_found(username.as_str()))?;
        account_from_row(&row)
    }
}

fn account_from_row(row: &PgRow) -> PortalResult<AccountRecord> {
    let email: Option<String> = row.try_get("email").map_err(read_error)?;
    let account_number: Option<String> = row.try_get("account_number").map_err(read_error)?;
    let balance: Decimal = row.try_get("balance").map_err(read_error)?;

    Ok(AccountRecord {
        id: row.try_get::<Uuid, _>("id").map_err(read_error)?,
        username: Username::try_new(row.try_get::<String, _>("username").map_err(read_error)?)?,
        email: email.map(Email::try_new).transpose()?,
        account_number: account_number.map(AccountNumber::try_new).transpose()?,
        balance: Balance::try_new(balance)?,
        password_hash: PasswordHash::from_encoded(
            row.try_get::<String, _>("password_hash").map_err(read_error)?,
        ),
        is_active: row.try_get("is_active").map_err(read_error)?,
        date_joined: row.try_get::<DateTime<Utc>, _>("date_joined").map_err(read_error)?,
        last_login: row.try_get::<Option<DateTime<Utc>>, _>("last_login").map_err(read_error)?,
    })
}

fn read_error(err: sqlx::Error) -> PortalError {
    PortalError::storage(format!("Malformed account row: {err}"))
}

fn map_write_error(err: sqlx::Error, subject: &str) -> PortalError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return match db.constraint() {
                Some(ACCOUNT_NUMBER_CONSTRAINT) => PortalError::DuplicateAccountNumber(subject.to_string()),
                Some(USERNAME_INDEX) | None => PortalError::DuplicateUsername(subject.to_string()),
                Some(other) => PortalError::storage(format!("Unique constraint {other} violated")),
            };
        }
    }
    PortalError::storage(format!("Database error: {err}"))
}

fn map_read_error(err: sqlx::Error) -> PortalError {
    PortalError::storage(format!("Database error: {err}"))
}

#[async_trait]
impl AccountRepository for PgAccountRepository {
    async fn create(&self, account: NewAccount) -> PortalResult<AccountRecord> {
        let record = AccountRecord::from_new(account);
        sqlx::query(
            "INSERT INTO accounts (id, username, email, account_number, balance, password_hash, \
             is_active, date_joined, last_login) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(record.id)
        .bind(record.username.as_str())
        .bind(record.email.as_ref().map(Email::as_str))
        .bind(record.account_number.as_ref().map(AccountNumber::as_str))
        .bind(record.balance.amount())
        .bind(record.password_hash.as_str())
        .bind(record.is_active)
        .bind(record.date_joined)
        .bind(record.last_login)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, record.username.as_str()))?;

        Ok(record)
    }

    async fn find_by_username(&self, username: &str) -> PortalResult<Option<AccountRecord>> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE lower(username) = lower($1)");
        let row = sqlx::query(&sql)
            .bind(Username::normalize(username))
            .fetch_optional(&self.pool)
            .await
            .map_err(map_read_error)?;
        row.as_ref().map(account_from_row).transpose()
    }

    async fn find_by_account_number(
        &self,
        account_number: &AccountNumber,
    ) -> PortalResult<Option<AccountRecord>> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE account_number = $1");
        let row = sqlx::query(&sql)
            .bind(account_number.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_read_error)?;
        row.as_ref().map(account_from_row).transpose()
    }

    async fn assign_account_number(
        &self,
        username: &Username,
        account_number: Option<AccountNumber>,
    ) -> PortalResult<AccountRecord> {
        let sql = format!(
            "UPDATE accounts SET account_number = $2 WHERE lower(username) = lower($1) \
             RETURNING {ACCOUNT_COLUMNS}"
        );
        let subject = account_number
            .as_ref()
            .map(AccountNumber::to_string)
            .unwrap_or_default();
        let row = sqlx::query(&sql)
            .bind(username.as_str())
            .bind(account_number.as_ref().map(AccountNumber::as_str))
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_write_error(e, &subject))?
            .ok_or_else(|| PortalError::account_not_found(username.as_str()))?;
        account_from_row(&row)
    }

    async fn set_balance(&self, username: &Username, balance: Balance) -> PortalResult<AccountRecord> {
        let sql = format!(
            "UPDATE accounts SET balance = $2 WHERE lower(username) = lower($1) \
             RETURNING {ACCOUNT_COLUMNS}"
        );
        let query = sqlx::query(&sql).bind(username.as_str()).bind(balance.amount());
        self.fetch_updated(query, username).await
    }

    async fn set_active(&self, username: &Username, active: bool) -> PortalResult<AccountRecord> {
        let sql = format!(
            "UPDATE accounts SET is_active = $2 WHERE lower(username) = lower($1) \
             RETURNING {ACCOUNT_COLUMNS}"
        );
        let query = sqlx::query(&sql).bind(username.as_str()).bind(active);
        self.fetch_updated(query, username).await
    }

    async fn record_login(&self, username: &Username, at: DateTime<Utc>) -> PortalResult<()> {
        let result = sqlx::query("UPDATE accounts SET last_login = $2 WHERE lower(username) = lower($1)")
            .bind(username.as_str())
            .bind(at)
            .execute(&self.pool)
            .await
            .map_err(map_read_error)?;
        if result.rows_affected() == 0 {
            return Err(PortalError::account_not_found(username.as_str()));
        }
        Ok(())
    }

    async fn list(&self) -> PortalResult<Vec<AccountRecord>> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY lower(username)");
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(map_read_error)?;
        rows.iter().map(account_from_row).collect()
    }
}
