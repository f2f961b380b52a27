//! Account-related types for the reward wallet
//!
//! This module defines the identity record kept by the account directory and
//! the balance views produced by the ledger store.

use super::money::Amount;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account identifier
pub type AccountId = Uuid;

/// Account role
///
/// Admins may list and resolve every withdrawal request and read platform stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Standard,
    Admin,
}

/// Identity record for a single user
///
/// Created on signup and never deleted. Balances are not stored here; they
/// belong to the ledger store and are read through [`LedgerSnapshot`].
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    /// Unique account identifier
    pub id: AccountId,

    /// Login email, trimmed and lowercased
    pub email: String,

    /// Display name
    pub full_name: String,

    /// Argon2 PHC string; the plain password is never stored
    pub password_hash: String,

    /// Code other users present at signup to credit this account
    pub referral_code: String,

    /// Account whose referral code was used at signup
    ///
    /// Set at most once, during account creation.
    pub referred_by: Option<AccountId>,

    pub role: Role,

    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Point-in-time view of an account's ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerSnapshot {
    pub account: AccountId,

    /// Spendable funds; never negative
    pub balance: Amount,

    /// Sum of every ad reward and referral bonus ever credited
    pub total_earned: Amount,

    /// Number of rewarded ad views
    pub ads_watched: u64,

    /// Number of transactions in the account's log
    pub transactions: usize,
}

impl LedgerSnapshot {
    pub fn empty(account: AccountId) -> Self {
        Self {
            account,
            balance: Decimal::ZERO,
            total_earned: Decimal::ZERO,
            ads_watched: 0,
            transactions: 0,
        }
    }
}

/// Result of auditing an account's balance against its transaction log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconciliation {
    pub account: AccountId,
    pub balance: Amount,
    pub sum_of_transactions: Amount,
}

impl Reconciliation {
    /// Whether the stored balance equals the sum of the log
    pub fn is_consistent(&self) -> bool {
        self.balance == self.sum_of_transactions
    }
}
