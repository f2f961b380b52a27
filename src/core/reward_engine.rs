//! Ad-view reward crediting
//!
//! The `RewardEngine` turns an ad-view signal into an `ad_reward` credit.
//! Each call is one genuine view: completion is reported by the caller and is
//! not verified here. Before crediting, the engine asks its [`AdViewGuard`];
//! the default [`TrustCaller`] guard accepts everything, and
//! [`MinIntervalGuard`] enforces a per-account cool-down when configured.

use crate::config::WalletConfig;
use crate::core::traits::{AdViewGuard, Ledger};
use crate::types::{AccountId, Amount, Transaction, WalletError};
use chrono::{DateTime, Duration, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Guard that accepts every reported view
#[derive(Debug, Clone, Copy, Default)]
pub struct TrustCaller;

impl AdViewGuard for TrustCaller {
    fn check(&self, _account: AccountId, _ad_type: &str, _now: DateTime<Utc>) -> Result<(), WalletError> {
        Ok(())
    }
}

/// Guard requiring a minimum interval between two rewarded views of one account
///
/// The check and the recording of the accepted view happen under the
/// account's entry guard, so two concurrent reports cannot both pass.
#[derive(Debug)]
pub struct MinIntervalGuard {
    interval: Duration,
    last_view: DashMap<AccountId, ViewSlot>,
}

#[derive(Debug, Clone, Copy)]
struct ViewSlot {
    last: DateTime<Utc>,
    previous: Option<DateTime<Utc>>,
}

impl MinIntervalGuard {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_view: DashMap::new(),
        }
    }
}

impl AdViewGuard for MinIntervalGuard {
    fn check(&self, account: AccountId, _ad_type: &str, now: DateTime<Utc>) -> Result<(), WalletError> {
        match self.last_view.entry(account) {
            Entry::Occupied(mut entry) => {
                let slot = entry.get_mut();
                let elapsed = now.signed_duration_since(slot.last);
                if elapsed < self.interval {
                    return Err(WalletError::ad_view_rejected(
                        account,
                        &format!(
                            "next rewarded view allowed in {}s",
                            (self.interval - elapsed).num_seconds().max(1)
                        ),
                    ));
                }
                *slot = ViewSlot {
                    last: now,
                    previous: Some(slot.last),
                };
            }
            Entry::Vacant(entry) => {
                entry.insert(ViewSlot {
                    last: now,
                    previous: None,
                });
            }
        }
        Ok(())
    }

    fn release(&self, account: AccountId, _ad_type: &str, now: DateTime<Utc>) {
        // A later accepted view owns the slot; leave it alone
        self.last_view.remove_if_mut(&account, |_, slot| {
            if slot.last != now {
                return false;
            }
            match slot.previous.take() {
                Some(previous) => {
                    slot.last = previous;
                    false
                }
                None => true,
            }
        });
    }
}

/// Outcome of a credited ad view
#[derive(Debug, Clone, PartialEq)]
pub struct AdViewReceipt {
    pub ad_type: String,
    pub reward: Amount,

    /// Balance right after the credit, taken from the same ledger update
    pub new_balance: Amount,

    pub watched_at: DateTime<Utc>,
    pub transaction: Transaction,
}

/// Credits fixed rewards for reported ad views
pub struct RewardEngine {
    ledger: Arc<dyn Ledger>,

    /// Reward per ad type
    rewards: BTreeMap<String, Amount>,

    guard: Box<dyn AdViewGuard>,
}

impl std::fmt::Debug for RewardEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RewardEngine")
            .field("rewards", &self.rewards)
            .finish_non_exhaustive()
    }
}

impl RewardEngine {
    /// Create an engine with an explicit reward table and guard
    pub fn new(
        ledger: Arc<dyn Ledger>,
        rewards: BTreeMap<String, Amount>,
        guard: Box<dyn AdViewGuard>,
    ) -> Self {
        Self {
            ledger,
            rewards,
            guard,
        }
    }

    /// Create an engine from configuration
    ///
    /// Uses [`MinIntervalGuard`] when `ad_view_min_interval_secs` is set and
    /// [`TrustCaller`] otherwise.
    pub fn from_config(ledger: Arc<dyn Ledger>, config: &WalletConfig) -> Self {
        let guard: Box<dyn AdViewGuard> = match config.ad_view_min_interval_secs {
            Some(secs) => Box::new(MinIntervalGuard::new(
                i64::try_from(secs)
                    .ok()
                    .and_then(Duration::try_seconds)
                    .unwrap_or(Duration::MAX),
            )),
            None => Box::new(TrustCaller),
        };
        Self::new(ledger, config.ad_rewards.clone(), guard)
    }

    /// Configured reward for an ad type
    pub fn reward_for(&self, ad_type: &str) -> Result<Amount, WalletError> {
        self.rewards
            .get(ad_type)
            .copied()
            .ok_or_else(|| WalletError::unknown_ad_type(ad_type))
    }

    /// Credit one completed ad view
    ///
    /// # Errors
    ///
    /// - `UnknownAdType` if no reward is configured for `ad_type`
    /// - `AdViewRejected` if the guard refuses the view
    /// - `AccountNotFound` / `ArithmeticOverflow` from the ledger
    ///
    /// Nothing is credited on error, and a view the ledger refused does not
    /// count against the guard.
    pub fn record_ad_view(
        &self,
        account: AccountId,
        ad_type: &str,
    ) -> Result<AdViewReceipt, WalletError> {
        let reward = self.reward_for(ad_type)?;
        let now = Utc::now();

        if let Err(e) = self.guard.check(account, ad_type, now) {
            warn!(%account, ad_type, "ad view refused: {}", e);
            return Err(e);
        }

        let transaction = match self.ledger.credit_ad_view(
            account,
            reward,
            &format!("Reward for watching {} ad", ad_type),
        ) {
            Ok(transaction) => transaction,
            Err(e) => {
                self.guard.release(account, ad_type, now);
                return Err(e);
            }
        };

        debug!(%account, ad_type, reward = %reward, "ad view rewarded");

        Ok(AdViewReceipt {
            ad_type: ad_type.to_string(),
            reward,
            new_balance: transaction.balance_after,
            watched_at: transaction.created_at,
            transaction,
        })
    }
}
