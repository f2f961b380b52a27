//! Reward Wallet Library
//!
//! # Overview
//!
//! A ledger-backed reward wallet: users earn credits for watching ads and for
//! referring new users, and cash credits out through an admin-reviewed
//! withdrawal workflow. Every balance change is a transaction in an
//! append-only per-account log, and the balance always equals the signed sum
//! of that log.
//!
//! # Architecture
//!
//! - [`types`] - Core data types (accounts, transactions, withdrawals, amounts, errors)
//! - [`config`] - Wallet configuration loaded from TOML
//! - [`core`] - Business logic components:
//!   - [`core::ledger_store`] - Balances and transaction logs
//!   - [`core::reward_engine`] - Ad-view rewards
//!   - [`core::referral_engine`] - Referral bonuses
//!   - [`core::withdrawal_workflow`] - Withdrawal holds, approval and reversal
//!   - [`core::account_directory`] - Identity records and credentials
//!   - [`core::session`] - Signed session tokens
//! - [`api`] - `WalletService` and its JSON request/response envelope
//! - [`io`] - Replay script readers and the report writer
//! - [`replay`] - Step execution and concurrent batch replay
//! - [`strategy`] - Sequential and concurrent replay pipelines
//! - [`cli`] - CLI argument parsing
//!
//! # Transaction Types
//!
//! - **AdReward**: credit for a completed ad view
//! - **ReferralBonus**: credit to a referrer when a referred user signs up
//! - **WithdrawalHold**: debit when a withdrawal is requested
//! - **WithdrawalReversal**: credit returning a rejected withdrawal's hold

pub mod api;
pub mod cli;
pub mod config;
pub mod core;
pub mod io;
pub mod replay;
pub mod strategy;
pub mod types;

pub use api::{ApiRequest, ApiResponse, WalletService};
pub use config::WalletConfig;
pub use core::{AccountDirectory, LedgerStore, ReferralEngine, RewardEngine, WithdrawalWorkflow};
pub use io::write_report_csv;
pub use types::{
    Account, AccountId, Amount, Transaction, TransactionId, TransactionType, WalletError,
    WithdrawalId, WithdrawalRequest, WithdrawalStatus,
};
