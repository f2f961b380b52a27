//! Response bodies returned by the wallet service
//!
//! Amounts are written as fixed 2-decimal strings and timestamps as RFC 3339
//! UTC, matching the wire format of the stored records.

use crate::types::money::fixed2;
use crate::types::{
    Account, AccountId, Amount, LedgerSnapshot, Reconciliation, Role, WithdrawalRequest,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Owner name/email shown when a request's account cannot be resolved
pub const UNKNOWN_OWNER: &str = "Unknown";

/// Public view of an account joined with its ledger counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountView {
    pub id: AccountId,
    pub email: String,
    pub full_name: String,

    #[serde(with = "fixed2")]
    pub wallet_balance: Amount,

    #[serde(with = "fixed2")]
    pub total_earned: Amount,

    pub ads_watched: u64,
    pub referral_code: String,
    pub referred_by: Option<AccountId>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl AccountView {
    pub fn new(account: &Account, ledger: &LedgerSnapshot) -> Self {
        Self {
            id: account.id,
            email: account.email.clone(),
            full_name: account.full_name.clone(),
            wallet_balance: ledger.balance,
            total_earned: ledger.total_earned,
            ads_watched: ledger.ads_watched,
            referral_code: account.referral_code.clone(),
            referred_by: account.referred_by,
            role: account.role,
            created_at: account.created_at,
        }
    }
}

/// Signup and login result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: AccountView,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceView {
    #[serde(with = "fixed2")]
    pub balance: Amount,

    #[serde(with = "fixed2")]
    pub total_earned: Amount,

    pub ads_watched: u64,
}

impl From<LedgerSnapshot> for BalanceView {
    fn from(snapshot: LedgerSnapshot) -> Self {
        Self {
            balance: snapshot.balance,
            total_earned: snapshot.total_earned,
            ads_watched: snapshot.ads_watched,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchAdResponse {
    pub message: String,
    pub ad_type: String,

    #[serde(with = "fixed2")]
    pub reward: Amount,

    #[serde(with = "fixed2")]
    pub new_balance: Amount,
}

/// Withdrawal request joined with its owner, for admins
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdminWithdrawalView {
    #[serde(flatten)]
    pub request: WithdrawalRequest,

    pub user_name: String,
    pub user_email: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsView {
    pub total_users: usize,
    pub total_withdrawals: usize,
    pub pending_withdrawals: usize,
    pub total_ads_watched: u64,
}

/// One row of the end-of-run account report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountReport {
    pub email: String,
    pub full_name: String,
    pub role: Role,

    #[serde(with = "fixed2")]
    pub balance: Amount,

    #[serde(with = "fixed2")]
    pub total_earned: Amount,

    pub ads_watched: u64,
    pub transactions: usize,

    /// Whether the balance equals the sum of the account's transactions
    pub reconciled: bool,
}

impl AccountReport {
    pub fn new(account: &Account, ledger: &LedgerSnapshot, audit: &Reconciliation) -> Self {
        Self {
            email: account.email.clone(),
            full_name: account.full_name.clone(),
            role: account.role,
            balance: ledger.balance,
            total_earned: ledger.total_earned,
            ads_watched: ledger.ads_watched,
            transactions: ledger.transactions,
            reconciled: audit.is_consistent(),
        }
    }
}
