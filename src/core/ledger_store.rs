//! Thread-safe ledger store
//!
//! This module provides the `LedgerStore` struct, the single source of truth
//! for account balances and the append-only transaction log.
//!
//! # Design
//!
//! The `LedgerStore` uses `DashMap` (a concurrent HashMap) keyed by account.
//! Each entry holds the account's balance counters together with its
//! transaction log, so one entry guard covers the whole read-validate-append-
//! update sequence of a credit or debit. Operations on the same account are
//! serialized by that guard; operations on different accounts proceed in
//! parallel.
//!
//! # Invariants
//!
//! - `balance == sum(transactions.amount)` after every operation
//! - `balance >= 0`
//! - `total_earned` only grows, by ad rewards and referral bonuses

use crate::core::traits::Ledger;
use crate::types::{
    validate_amount, AccountId, Amount, LedgerSnapshot, Reconciliation, Transaction,
    TransactionType, WalletError,
};
use chrono::Utc;
use dashmap::DashMap;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;
use uuid::Uuid;

/// Balance counters and log of a single account
#[derive(Debug, Clone, Default)]
struct LedgerEntry {
    balance: Amount,
    total_earned: Amount,
    ads_watched: u64,
    transactions: Vec<Transaction>,
}

/// Concurrent in-memory ledger
#[derive(Debug, Default)]
pub struct LedgerStore {
    entries: DashMap<AccountId, LedgerEntry>,

    /// Next ledger-wide sequence number
    sequence: AtomicU64,
}

/// Balance change computed before anything is written
struct Movement {
    signed_amount: Amount,
    earned: Amount,
    ad_view: bool,
}

impl LedgerStore {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a movement to an account as one atomic unit
    ///
    /// New counters are computed with checked arithmetic before the entry
    /// and its log are written. The entry guard is held throughout.
    fn apply(
        &self,
        account: AccountId,
        movement: Movement,
        tx_type: TransactionType,
        description: &str,
    ) -> Result<Transaction, WalletError> {
        let mut entry = self
            .entries
            .get_mut(&account)
            .ok_or_else(|| WalletError::account_not_found(account))?;

        let operation = tx_type.as_str();

        if movement.signed_amount < Decimal::ZERO && entry.balance < -movement.signed_amount {
            return Err(WalletError::insufficient_funds(
                account,
                entry.balance,
                -movement.signed_amount,
            ));
        }

        let new_balance = entry
            .balance
            .checked_add(movement.signed_amount)
            .ok_or_else(|| WalletError::arithmetic_overflow(operation, account))?;

        let new_total_earned = entry
            .total_earned
            .checked_add(movement.earned)
            .ok_or_else(|| WalletError::arithmetic_overflow(operation, account))?;

        let new_ads_watched = if movement.ad_view {
            entry
                .ads_watched
                .checked_add(1)
                .ok_or_else(|| WalletError::arithmetic_overflow(operation, account))?
        } else {
            entry.ads_watched
        };

        let transaction = Transaction {
            id: Uuid::new_v4(),
            account,
            amount: movement.signed_amount,
            balance_after: new_balance,
            tx_type,
            description: description.to_string(),
            created_at: Utc::now(),
            sequence: self.sequence.fetch_add(1, Ordering::SeqCst),
        };

        entry.balance = new_balance;
        entry.total_earned = new_total_earned;
        entry.ads_watched = new_ads_watched;
        entry.transactions.push(transaction.clone());

        debug!(
            %account,
            tx_type = operation,
            amount = %transaction.amount,
            balance = %new_balance,
            "ledger updated"
        );

        Ok(transaction)
    }

    /// Number of accounts with a ledger entry
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Ledger for LedgerStore {
    fn open_account(&self, account: AccountId) {
        self.entries.entry(account).or_default();
    }

    fn credit(
        &self,
        account: AccountId,
        amount: Amount,
        tx_type: TransactionType,
        description: &str,
    ) -> Result<Transaction, WalletError> {
        let amount = validate_amount(amount)?;
        let earned = if tx_type.is_earning() {
            amount
        } else {
            Decimal::ZERO
        };

        self.apply(
            account,
            Movement {
                signed_amount: amount,
                earned,
                ad_view: false,
            },
            tx_type,
            description,
        )
    }

    fn debit(
        &self,
        account: AccountId,
        amount: Amount,
        tx_type: TransactionType,
        description: &str,
    ) -> Result<Transaction, WalletError> {
        let amount = validate_amount(amount)?;

        self.apply(
            account,
            Movement {
                signed_amount: -amount,
                earned: Decimal::ZERO,
                ad_view: false,
            },
            tx_type,
            description,
        )
    }

    fn credit_ad_view(
        &self,
        account: AccountId,
        amount: Amount,
        description: &str,
    ) -> Result<Transaction, WalletError> {
        let amount = validate_amount(amount)?;

        self.apply(
            account,
            Movement {
                signed_amount: amount,
                earned: amount,
                ad_view: true,
            },
            TransactionType::AdReward,
            description,
        )
    }

    fn snapshot(&self, account: AccountId) -> Result<LedgerSnapshot, WalletError> {
        let entry = self
            .entries
            .get(&account)
            .ok_or_else(|| WalletError::account_not_found(account))?;

        Ok(LedgerSnapshot {
            account,
            balance: entry.balance,
            total_earned: entry.total_earned,
            ads_watched: entry.ads_watched,
            transactions: entry.transactions.len(),
        })
    }

    fn history(&self, account: AccountId, limit: usize) -> Result<Vec<Transaction>, WalletError> {
        let entry = self
            .entries
            .get(&account)
            .ok_or_else(|| WalletError::account_not_found(account))?;

        Ok(entry
            .transactions
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect())
    }

    fn reconcile(&self, account: AccountId) -> Result<Reconciliation, WalletError> {
        let entry = self
            .entries
            .get(&account)
            .ok_or_else(|| WalletError::account_not_found(account))?;

        let sum_of_transactions = entry
            .transactions
            .iter()
            .map(|tx| tx.amount)
            .sum::<Decimal>();

        Ok(Reconciliation {
            account,
            balance: entry.balance,
            sum_of_transactions,
        })
    }

    fn total_ads_watched(&self) -> u64 {
        self.entries
            .iter()
            .map(|entry| entry.value().ads_watched)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::sync::Arc;
    use std::thread;

    fn ledger_with_account() -> (LedgerStore, AccountId) {
        let ledger = LedgerStore::new();
        let account = Uuid::new_v4();
        ledger.open_account(account);
        (ledger, account)
    }

    #[test]
    fn test_open_account_starts_empty() {
        let (ledger, account) = ledger_with_account();

        let snapshot = ledger.snapshot(account).unwrap();
        assert_eq!(snapshot, LedgerSnapshot::empty(account));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_open_account_is_idempotent() {
        let (ledger, account) = ledger_with_account();
        ledger
            .credit(account, Decimal::new(5, 0), TransactionType::ReferralBonus, "bonus")
            .unwrap();

        ledger.open_account(account);

        assert_eq!(ledger.snapshot(account).unwrap().balance, Decimal::new(5, 0));
    }

    #[test]
    fn test_credit_earning_type_updates_total_earned() {
        let (ledger, account) = ledger_with_account();

        let tx = ledger
            .credit(account, Decimal::new(500, 2), TransactionType::ReferralBonus, "bonus")
            .unwrap();

        assert_eq!(tx.amount, Decimal::new(500, 2));
        assert_eq!(tx.tx_type, TransactionType::ReferralBonus);
        let snapshot = ledger.snapshot(account).unwrap();
        assert_eq!(snapshot.balance, Decimal::new(500, 2));
        assert_eq!(snapshot.total_earned, Decimal::new(500, 2));
        assert_eq!(snapshot.ads_watched, 0);
    }

    #[test]
    fn test_credit_reversal_does_not_count_as_earned() {
        let (ledger, account) = ledger_with_account();

        ledger
            .credit(account, Decimal::new(20, 0), TransactionType::WithdrawalReversal, "reversal")
            .unwrap();

        let snapshot = ledger.snapshot(account).unwrap();
        assert_eq!(snapshot.balance, Decimal::new(20, 0));
        assert_eq!(snapshot.total_earned, Decimal::ZERO);
    }

    #[test]
    fn test_debit_records_negative_amount() {
        let (ledger, account) = ledger_with_account();
        ledger
            .credit(account, Decimal::new(30, 0), TransactionType::ReferralBonus, "bonus")
            .unwrap();

        let tx = ledger
            .debit(account, Decimal::new(20, 0), TransactionType::WithdrawalHold, "hold")
            .unwrap();

        assert_eq!(tx.amount, Decimal::new(-20, 0));
        assert_eq!(tx.balance_after, Decimal::new(10, 0));
        let snapshot = ledger.snapshot(account).unwrap();
        assert_eq!(snapshot.balance, Decimal::new(10, 0));
        assert_eq!(snapshot.total_earned, Decimal::new(30, 0));
    }

    #[rstest]
    #[case::empty_balance(Decimal::ZERO, Decimal::new(1, 2))]
    #[case::one_cent_short(Decimal::new(1999, 2), Decimal::new(20, 0))]
    #[case::far_short(Decimal::new(5, 1), Decimal::new(100, 0))]
    fn test_debit_over_balance_fails_without_change(
        #[case] balance: Decimal,
        #[case] amount: Decimal,
    ) {
        let (ledger, account) = ledger_with_account();
        if balance > Decimal::ZERO {
            ledger
                .credit(account, balance, TransactionType::ReferralBonus, "seed")
                .unwrap();
        }
        let before = ledger.snapshot(account).unwrap();

        let result = ledger.debit(account, amount, TransactionType::WithdrawalHold, "hold");

        assert_eq!(
            result,
            Err(WalletError::insufficient_funds(account, balance, amount))
        );
        assert_eq!(ledger.snapshot(account).unwrap(), before);
    }

    #[test]
    fn test_debit_exact_balance_leaves_zero() {
        let (ledger, account) = ledger_with_account();
        ledger
            .credit(account, Decimal::new(10, 0), TransactionType::ReferralBonus, "seed")
            .unwrap();

        ledger
            .debit(account, Decimal::new(10, 0), TransactionType::WithdrawalHold, "hold")
            .unwrap();

        assert_eq!(ledger.snapshot(account).unwrap().balance, Decimal::ZERO);
    }

    #[rstest]
    #[case::zero(Decimal::ZERO)]
    #[case::negative(Decimal::new(-5, 0))]
    #[case::sub_cent(Decimal::new(1, 3))]
    fn test_non_positive_or_sub_cent_amounts_rejected(#[case] amount: Decimal) {
        let (ledger, account) = ledger_with_account();

        let credit = ledger.credit(account, amount, TransactionType::AdReward, "x");
        let debit = ledger.debit(account, amount, TransactionType::WithdrawalHold, "x");

        assert!(matches!(credit, Err(WalletError::InvalidAmount { .. })));
        assert!(matches!(debit, Err(WalletError::InvalidAmount { .. })));
        assert_eq!(ledger.snapshot(account).unwrap().transactions, 0);
    }

    #[test]
    fn test_unknown_account_is_not_created_implicitly() {
        let ledger = LedgerStore::new();
        let account = Uuid::new_v4();

        let result = ledger.credit(account, Decimal::ONE, TransactionType::AdReward, "x");

        assert_eq!(result, Err(WalletError::account_not_found(account)));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_credit_overflow_leaves_account_untouched() {
        let (ledger, account) = ledger_with_account();
        ledger
            .credit(account, Decimal::MAX, TransactionType::WithdrawalReversal, "max")
            .unwrap();

        let result = ledger.credit(account, Decimal::ONE, TransactionType::WithdrawalReversal, "x");

        assert!(matches!(result, Err(WalletError::ArithmeticOverflow { .. })));
        let snapshot = ledger.snapshot(account).unwrap();
        assert_eq!(snapshot.balance, Decimal::MAX);
        assert_eq!(snapshot.transactions, 1);
    }

    #[test]
    fn test_credit_ad_view_counts_view() {
        let (ledger, account) = ledger_with_account();

        let tx = ledger
            .credit_ad_view(account, Decimal::new(50, 2), "Reward for watching video ad")
            .unwrap();

        assert_eq!(tx.tx_type, TransactionType::AdReward);
        let snapshot = ledger.snapshot(account).unwrap();
        assert_eq!(snapshot.balance, Decimal::new(50, 2));
        assert_eq!(snapshot.total_earned, Decimal::new(50, 2));
        assert_eq!(snapshot.ads_watched, 1);
        assert_eq!(ledger.total_ads_watched(), 1);
    }

    #[test]
    fn test_history_is_newest_first_and_limited() {
        let (ledger, account) = ledger_with_account();
        for _ in 0..5 {
            ledger
                .credit_ad_view(account, Decimal::new(50, 2), "view")
                .unwrap();
        }

        let history = ledger.history(account, 3).unwrap();

        assert_eq!(history.len(), 3);
        assert!(history[0].sequence > history[1].sequence);
        assert!(history[1].sequence > history[2].sequence);
    }

    #[test]
    fn test_reconcile_matches_log() {
        let (ledger, account) = ledger_with_account();
        ledger
            .credit(account, Decimal::new(25, 0), TransactionType::ReferralBonus, "a")
            .unwrap();
        ledger
            .debit(account, Decimal::new(10, 0), TransactionType::WithdrawalHold, "b")
            .unwrap();
        ledger
            .credit(account, Decimal::new(10, 0), TransactionType::WithdrawalReversal, "c")
            .unwrap();

        let reconciliation = ledger.reconcile(account).unwrap();

        assert!(reconciliation.is_consistent());
        assert_eq!(reconciliation.balance, Decimal::new(25, 0));
    }

    #[test]
    fn test_concurrent_operations_on_one_account_keep_invariants() {
        let ledger = Arc::new(LedgerStore::new());
        let account = Uuid::new_v4();
        ledger.open_account(account);
        ledger
            .credit(account, Decimal::new(100, 0), TransactionType::ReferralBonus, "seed")
            .unwrap();

        // 8 threads each try to hold 20 ten times while others credit views
        let mut handles = vec![];
        for worker in 0..8 {
            let ledger = Arc::clone(&ledger);
            handles.push(thread::spawn(move || {
                for _ in 0..10 {
                    if worker % 2 == 0 {
                        let _ = ledger.debit(
                            account,
                            Decimal::new(20, 0),
                            TransactionType::WithdrawalHold,
                            "hold",
                        );
                    } else {
                        ledger
                            .credit_ad_view(account, Decimal::new(50, 2), "view")
                            .unwrap();
                    }
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = ledger.snapshot(account).unwrap();
        assert!(snapshot.balance >= Decimal::ZERO);
        assert_eq!(snapshot.ads_watched, 40);
        assert!(ledger.reconcile(account).unwrap().is_consistent());

        // Each record carries the balance produced by its own update
        let mut log = ledger.history(account, usize::MAX).unwrap();
        log.reverse();
        let mut running = Decimal::ZERO;
        for tx in &log {
            running += tx.amount;
            assert_eq!(tx.balance_after, running);
        }
        assert_eq!(running, snapshot.balance);
    }

    #[test]
    fn test_different_accounts_are_independent() {
        let ledger = Arc::new(LedgerStore::new());
        let accounts: Vec<AccountId> = (0..4).map(|_| Uuid::new_v4()).collect();
        for account in &accounts {
            ledger.open_account(*account);
        }

        let handles: Vec<_> = accounts
            .iter()
            .map(|account| {
                let ledger = Arc::clone(&ledger);
                let account = *account;
                thread::spawn(move || {
                    for _ in 0..25 {
                        ledger
                            .credit_ad_view(account, Decimal::new(50, 2), "view")
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        for account in accounts {
            let snapshot = ledger.snapshot(account).unwrap();
            assert_eq!(snapshot.balance, Decimal::new(1250, 2));
            assert_eq!(snapshot.ads_watched, 25);
        }
        assert_eq!(ledger.total_ads_watched(), 100);
    }
}
