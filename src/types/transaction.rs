//! Ledger transaction types for the reward wallet
//!
//! Every balance movement is recorded as an immutable [`Transaction`]. The log
//! is append-only and the balance of an account is, at all times, the sum of
//! its transactions' signed amounts.

use super::account::AccountId;
use super::money::{fixed2, Amount};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Transaction identifier
pub type TransactionId = Uuid;

/// Kinds of balance movement recorded by the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Credit for one completed ad view
    AdReward,

    /// One-time credit to the owner of a referral code used at signup
    ReferralBonus,

    /// Debit reserving funds when a withdrawal is requested
    WithdrawalHold,

    /// Credit returning held funds when a withdrawal is rejected
    WithdrawalReversal,
}

impl TransactionType {
    /// Whether a credit of this type counts toward `total_earned`
    pub fn is_earning(self) -> bool {
        matches!(self, TransactionType::AdReward | TransactionType::ReferralBonus)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TransactionType::AdReward => "ad_reward",
            TransactionType::ReferralBonus => "referral_bonus",
            TransactionType::WithdrawalHold => "withdrawal_hold",
            TransactionType::WithdrawalReversal => "withdrawal_reversal",
        }
    }
}

/// Immutable ledger record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,

    /// Owning account
    #[serde(rename = "user_id")]
    pub account: AccountId,

    /// Signed amount: positive for credits, negative for debits
    #[serde(with = "fixed2")]
    pub amount: Amount,

    /// Account balance once this transaction was applied
    #[serde(with = "fixed2")]
    pub balance_after: Amount,

    #[serde(rename = "type")]
    pub tx_type: TransactionType,

    pub description: String,

    pub created_at: DateTime<Utc>,

    /// Ledger-wide append order
    pub sequence: u64,
}
