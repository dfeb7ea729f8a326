//! Account record storage backends
//!
//! In-memory and JSON-file implementations of
//! [`AccountRepository`](crate::domain::repositories::AccountRepository).

pub mod account_table;
pub mod file_storage;
pub mod memory;

pub use account_table::AccountTable;
pub use file_storage::{FileAccountRepository, ACCOUNTS_FILE};
pub use memory::MemoryAccountRepository;
