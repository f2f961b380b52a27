//! Core wallet logic
//!
//! - `traits` - Ledger and ad-view guard abstractions
//! - `ledger_store` - Balances and append-only transaction logs
//! - `reward_engine` - Ad-view rewards
//! - `referral_engine` - Referral bonuses at signup
//! - `withdrawal_workflow` - Withdrawal holds, approval and reversal
//! - `account_directory` - Identity records and credentials
//! - `session` - Signed session tokens

pub mod account_directory;
pub mod ledger_store;
pub mod referral_engine;
pub mod reward_engine;
pub mod session;
pub mod traits;
pub mod withdrawal_workflow;

pub use account_directory::AccountDirectory;
pub use ledger_store::LedgerStore;
pub use referral_engine::ReferralEngine;
pub use reward_engine::{AdViewReceipt, MinIntervalGuard, RewardEngine, TrustCaller};
pub use session::SessionIssuer;
pub use traits::{AdViewGuard, Ledger};
pub use withdrawal_workflow::{WithdrawalCounts, WithdrawalWorkflow};
