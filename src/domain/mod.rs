//! Domain module
//!
//! Account types, request context and the engine's error vocabulary.

pub mod account;
pub mod context;
pub mod error;

pub use account::{Account, NewAccount, TransactionDetails};
pub use context::{CancelToken, Canceller, Interrupted, RequestContext};
pub use error::BankError;
