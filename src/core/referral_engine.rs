//! Referral bonus crediting
//!
//! Invoked once by the account directory right after a new account exists.
//! A valid referral code links the new account to its referrer and credits
//! the referrer with the configured bonus. Unknown or empty codes are ignored
//! so that signup succeeds even with a mistyped code.

use crate::core::account_directory::AccountDirectory;
use crate::core::traits::Ledger;
use crate::types::{AccountId, Amount, Transaction, TransactionType, WalletError};
use std::sync::Arc;
use tracing::{debug, info};

pub struct ReferralEngine {
    ledger: Arc<dyn Ledger>,
    bonus: Amount,
}

impl std::fmt::Debug for ReferralEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReferralEngine")
            .field("bonus", &self.bonus)
            .finish_non_exhaustive()
    }
}

impl ReferralEngine {
    pub fn new(ledger: Arc<dyn Ledger>, bonus: Amount) -> Self {
        Self { ledger, bonus }
    }

    /// Link `new_account` to the owner of `referral_code` and pay the bonus
    ///
    /// Returns the referrer's bonus transaction, or `None` when nothing was
    /// credited (no code, unknown code, self-referral, or the account already
    /// has a referrer).
    ///
    /// The referrer reference is written and the bonus credited while the new
    /// account's directory entry is locked: either both happen or neither does.
    pub fn apply_referral(
        &self,
        directory: &AccountDirectory,
        new_account: AccountId,
        referral_code: Option<&str>,
    ) -> Result<Option<Transaction>, WalletError> {
        let code = match referral_code.map(str::trim).filter(|code| !code.is_empty()) {
            Some(code) => code,
            None => return Ok(None),
        };

        let referrer = match directory.find_by_referral_code(code) {
            Some(referrer) => referrer,
            None => {
                debug!(%new_account, code, "ignoring unknown referral code");
                return Ok(None);
            }
        };

        if referrer.id == new_account {
            return Ok(None);
        }

        let bonus = directory.update(new_account, |account| {
            if account.referred_by.is_some() {
                return Ok(None);
            }

            let tx = self.ledger.credit(
                referrer.id,
                self.bonus,
                TransactionType::ReferralBonus,
                &format!("Referral bonus for inviting {}", account.full_name),
            )?;
            account.referred_by = Some(referrer.id);
            Ok(Some(tx))
        })?;

        if bonus.is_some() {
            info!(referrer = %referrer.id, %new_account, bonus = %self.bonus, "referral bonus credited");
        }

        Ok(bonus)
    }
}
