//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `account`: Account identity records and ledger views
//! - `transaction`: Ledger transaction types and identifiers
//! - `withdrawal`: Withdrawal requests and their state machine
//! - `money`: Monetary amount validation and formatting
//! - `error`: Error types for the wallet

pub mod account;
pub mod error;
pub mod money;
pub mod transaction;
pub mod withdrawal;

pub use account::{Account, AccountId, LedgerSnapshot, Reconciliation, Role};
pub use error::{ErrorCategory, WalletError};
pub use money::{format_amount, validate_amount, Amount};
pub use transaction::{Transaction, TransactionId, TransactionType};
pub use withdrawal::{Decision, PaymentMethod, WithdrawalId, WithdrawalRequest, WithdrawalStatus};
