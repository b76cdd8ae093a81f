//! bank-service Library
//!
//! Re-exports modules for the server binary and integration testing.

pub mod api;
pub mod bank;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod store;

pub use bank::{Bank, BankResult, BankService};
pub use config::{Config, ConfigError, StorageBackend};
pub use domain::{Account, BankError, NewAccount, RequestContext, TransactionDetails};
pub use error::{ApiError, ApiResult, Code};
pub use store::{AccountProvider, BalanceProvider, InMemoryStore, PgBankStore, StoreError};
