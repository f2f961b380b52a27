//! Withdrawal request lifecycle
//!
//! Creating a request debits (holds) the requested amount immediately, so a
//! user can never have more pending withdrawals than their balance covers.
//! An admin then approves the request (the hold becomes final) or rejects it
//! (the hold is reversed with a `withdrawal_reversal` credit).
//!
//! # Thread Safety
//!
//! Resolution runs under the request's entry guard, which makes the
//! pending -> terminal transition happen at most once. The only nested lock is
//! request -> ledger entry; the ledger never takes request locks.

use crate::core::traits::Ledger;
use crate::types::{
    validate_amount, AccountId, Amount, Decision, PaymentMethod, TransactionType, WalletError,
    WithdrawalId, WithdrawalRequest, WithdrawalStatus,
};
use chrono::Utc;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Request totals for the admin dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WithdrawalCounts {
    pub total: usize,
    pub pending: usize,
}

pub struct WithdrawalWorkflow {
    ledger: Arc<dyn Ledger>,
    minimum: Amount,
    requests: DashMap<WithdrawalId, WithdrawalRequest>,
    sequence: AtomicU64,
}

impl std::fmt::Debug for WithdrawalWorkflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WithdrawalWorkflow")
            .field("minimum", &self.minimum)
            .field("requests", &self.requests.len())
            .finish_non_exhaustive()
    }
}

impl WithdrawalWorkflow {
    pub fn new(ledger: Arc<dyn Ledger>, minimum: Amount) -> Self {
        Self {
            ledger,
            minimum,
            requests: DashMap::new(),
            sequence: AtomicU64::new(0),
        }
    }

    /// Create a pending request and hold its amount
    ///
    /// Checks run in this order: amount shape, minimum, payment details,
    /// balance. The first failing check decides the error and nothing is
    /// stored or debited.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` for a non-positive amount or more than 2 decimals
    /// - `BelowMinimum` when `amount` is under the configured minimum
    /// - `InvalidPaymentDetails` for an empty payment id
    /// - `InsufficientFunds` when the balance does not cover `amount`
    pub fn request_withdrawal(
        &self,
        account: AccountId,
        amount: Amount,
        payment_method: PaymentMethod,
        payment_id: &str,
    ) -> Result<WithdrawalRequest, WalletError> {
        let amount = self.check_amount(amount)?;

        let payment_id = payment_id.trim();
        if payment_id.is_empty() {
            return Err(WalletError::invalid_payment_details(
                "payment_id must not be empty",
            ));
        }

        let id = Uuid::new_v4();
        self.ledger.debit(
            account,
            amount,
            TransactionType::WithdrawalHold,
            &format!("Withdrawal hold for request {} via {}", id, payment_method),
        )?;

        let request = WithdrawalRequest {
            id,
            account,
            amount,
            payment_method,
            payment_id: payment_id.to_string(),
            status: WithdrawalStatus::Pending,
            admin_notes: None,
            requested_at: Utc::now(),
            resolved_at: None,
            sequence: self.sequence.fetch_add(1, Ordering::Relaxed),
        };
        self.requests.insert(id, request.clone());

        info!(request = %id, %account, amount = %amount, method = %payment_method, "withdrawal requested");
        Ok(request)
    }

    /// Check amount shape and the configured minimum
    ///
    /// Returns the normalized amount.
    pub fn check_amount(&self, amount: Amount) -> Result<Amount, WalletError> {
        let amount = validate_amount(amount)?;
        if amount < self.minimum {
            return Err(WalletError::below_minimum(self.minimum, amount));
        }
        Ok(amount)
    }

    /// Approve or reject a pending request
    ///
    /// Rejection credits the held amount back before the status changes; if
    /// that credit fails the request stays pending and the error is returned.
    ///
    /// # Errors
    ///
    /// - `WithdrawalNotFound` for an unknown id
    /// - `AlreadyResolved` when the request is not pending
    pub fn resolve_withdrawal(
        &self,
        id: WithdrawalId,
        decision: Decision,
        admin_notes: Option<&str>,
    ) -> Result<WithdrawalRequest, WalletError> {
        let mut request = self
            .requests
            .get_mut(&id)
            .ok_or_else(|| WalletError::withdrawal_not_found(id))?;

        if request.status.is_terminal() {
            return Err(WalletError::already_resolved(id, request.status));
        }

        if decision == Decision::Reject {
            self.ledger.credit(
                request.account,
                request.amount,
                TransactionType::WithdrawalReversal,
                &format!("Reversal of rejected withdrawal {}", id),
            )?;
        }

        request.status = decision.target_status();
        request.resolved_at = Some(Utc::now());
        if let Some(notes) = admin_notes.map(str::trim).filter(|notes| !notes.is_empty()) {
            request.admin_notes = Some(notes.to_string());
        }

        info!(request = %id, status = %request.status, "withdrawal resolved");
        Ok(request.clone())
    }

    pub fn get(&self, id: WithdrawalId) -> Result<WithdrawalRequest, WalletError> {
        self.requests
            .get(&id)
            .map(|request| request.value().clone())
            .ok_or_else(|| WalletError::withdrawal_not_found(id))
    }

    /// Up to `limit` requests of one account, newest first
    pub fn list_for_account(&self, account: AccountId, limit: usize) -> Vec<WithdrawalRequest> {
        self.collect_newest_first(limit, |request| request.account == account)
    }

    /// Up to `limit` requests across all accounts, newest first
    pub fn list_all(&self, limit: usize) -> Vec<WithdrawalRequest> {
        self.collect_newest_first(limit, |_| true)
    }

    pub fn counts(&self) -> WithdrawalCounts {
        self.requests
            .iter()
            .fold(WithdrawalCounts::default(), |mut counts, request| {
                counts.total += 1;
                if request.status == WithdrawalStatus::Pending {
                    counts.pending += 1;
                }
                counts
            })
    }

    fn collect_newest_first<F>(&self, limit: usize, keep: F) -> Vec<WithdrawalRequest>
    where
        F: Fn(&WithdrawalRequest) -> bool,
    {
        let mut requests: Vec<WithdrawalRequest> = self
            .requests
            .iter()
            .filter(|entry| keep(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        requests.sort_by(|a, b| b.sequence.cmp(&a.sequence));
        requests.truncate(limit);
        requests
    }
}
