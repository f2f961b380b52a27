//! Core traits for the ledger and the ad-view hook
//!
//! These trait abstractions let the engines run against any ledger
//! implementation (the in-memory [`LedgerStore`](super::LedgerStore), or a
//! test double that injects storage faults) and let deployments plug an
//! anti-replay policy into the reward engine.

use crate::types::{
    AccountId, Amount, LedgerSnapshot, Reconciliation, Transaction, TransactionType, WalletError,
};
use chrono::{DateTime, Utc};

/// Trait for the balance ledger
///
/// Every method is atomic with respect to the account it touches: the balance
/// check, the appended transaction and the balance update either all happen
/// or none do. Implementations must serialize operations on the same account
/// and may run operations on different accounts in parallel.
pub trait Ledger: Send + Sync {
    /// Create an empty entry for a new account (no-op if it exists)
    fn open_account(&self, account: AccountId);

    /// Add `amount` (positive) to the balance
    ///
    /// `total_earned` grows as well when `tx_type` is an earning type.
    fn credit(
        &self,
        account: AccountId,
        amount: Amount,
        tx_type: TransactionType,
        description: &str,
    ) -> Result<Transaction, WalletError>;

    /// Remove `amount` (positive) from the balance
    ///
    /// Fails with `InsufficientFunds` and leaves the account untouched when
    /// the balance is lower than `amount`.
    fn debit(
        &self,
        account: AccountId,
        amount: Amount,
        tx_type: TransactionType,
        description: &str,
    ) -> Result<Transaction, WalletError>;

    /// Credit an ad reward and count the view in one atomic unit
    fn credit_ad_view(
        &self,
        account: AccountId,
        amount: Amount,
        description: &str,
    ) -> Result<Transaction, WalletError>;

    fn snapshot(&self, account: AccountId) -> Result<LedgerSnapshot, WalletError>;

    /// Up to `limit` transactions of the account, newest first
    fn history(&self, account: AccountId, limit: usize) -> Result<Vec<Transaction>, WalletError>;

    /// Compare the stored balance with the sum of the account's log
    fn reconcile(&self, account: AccountId) -> Result<Reconciliation, WalletError>;

    /// Rewarded ad views across all accounts
    fn total_ads_watched(&self) -> u64;
}

/// Hook consulted by the reward engine before an ad view is credited
///
/// Ad completion is reported by the caller and not verified by the core;
/// a guard is where replay protection (cool-downs, minimum watch time, ...)
/// plugs in.
pub trait AdViewGuard: Send + Sync {
    /// Accept or refuse a view reported at `now`
    ///
    /// Returning `Err` prevents the credit; the error is passed to the caller.
    fn check(&self, account: AccountId, ad_type: &str, now: DateTime<Utc>)
        -> Result<(), WalletError>;

    /// Undo the view accepted by `check` at `now` when its credit failed
    fn release(&self, _account: AccountId, _ad_type: &str, _now: DateTime<Utc>) {}
}
