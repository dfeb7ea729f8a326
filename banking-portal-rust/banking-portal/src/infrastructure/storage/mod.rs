//! Account store selection.
//!
//! The memory and file backends live in the core crate; PostgreSQL is
//! implemented here next to the connection settings.

pub mod postgres;

use std::sync::Arc;

use anyhow::Context;
use banking_portal_core::{AccountRepository, FileAccountRepository, MemoryAccountRepository};

use crate::infrastructure::config::{DatabaseBackend, DatabaseConfig};
pub use postgres::PgAccountRepository;

/// Opens the configured account store.
pub async fn build_repository(config: &DatabaseConfig) -> anyhow::Result<Arc<dyn AccountRepository>> {
    let repository: Arc<dyn AccountRepository> = match config.backend {
        DatabaseBackend::Memory => {
            tracing::warn!("Using the in-memory account store; accounts are lost on restart");
            Arc::new(MemoryAccountRepository::new())
        }
        DatabaseBackend::File => {
            let repository = FileAccountRepository::open(&config.data_dir)
                .await
                .with_context(|| format!("Failed to open account file in {}", config.data_dir.display()))?;
            tracing::info!(path = %repository.path().display(), "Using the file account store");
            Arc::new(repository)
        }
        DatabaseBackend::Postgres => {
            let repository = PgAccountRepository::connect(config)
                .await
                .with_context(|| {
                    format!(
                        "Failed to connect to PostgreSQL at {}:{}",
                        config.postgres.host, config.postgres.port
                    )
                })?;
            tracing::info!(database = %config.postgres.database, "Using the PostgreSQL account store");
            Arc::new(repository)
        }
    };
    Ok(repository)
}

#[cfg(test)]
mod tests {
    use super::*;
    use banking_portal_core::core::storage::ACCOUNTS_FILE;

    use crate::infrastructure::config::PostgresConfig;

    fn config(backend: DatabaseBackend, data_dir: std::path::PathBuf) -> DatabaseConfig {
        DatabaseConfig {
            backend,
            data_dir,
            postgres: PostgresConfig {
                database: String::new(),
                user: String::new(),
                password: String::new(),
                host: "localhost".to_string(),
                port: 5432,
            },
            max_connections: 1,
        }
    }

    #[tokio::test]
    async fn test_memory_backend() {
        let repository = build_repository(&config(DatabaseBackend::Memory, "unused".into()))
            .await
            .unwrap();
        assert!(repository.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_file_backend_creates_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("data");
        let repository = build_repository(&config(DatabaseBackend::File, data_dir.clone()))
            .await
            .unwrap();
        assert!(repository.list().await.unwrap().is_empty());
        assert!(data_dir.is_dir());
        assert!(!data_dir.join(ACCOUNTS_FILE).exists());
    }
}
