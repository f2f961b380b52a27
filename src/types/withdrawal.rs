//! Withdrawal request types
//!
//! A withdrawal request moves through a small one-way state machine:
//!
//! ```text
//! pending ──approve──▶ approved
//!    │
//!    └────reject────▶ rejected   (held funds reversed)
//! ```

use super::account::AccountId;
use super::error::WalletError;
use super::money::{fixed2, Amount};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Withdrawal request identifier
pub type WithdrawalId = Uuid;

/// Payment rails a withdrawal can be sent to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Esewa,
    Khalti,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::Esewa => "esewa",
            PaymentMethod::Khalti => "khalti",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = WalletError;

    /// Case-insensitive; unknown rails are invalid payment details
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "esewa" => Ok(PaymentMethod::Esewa),
            "khalti" => Ok(PaymentMethod::Khalti),
            other => Err(WalletError::invalid_payment_details(&format!(
                "unsupported payment method '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Withdrawal request status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WithdrawalStatus {
    Pending,
    Approved,
    Rejected,
}

impl WithdrawalStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, WithdrawalStatus::Pending)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WithdrawalStatus::Pending => "pending",
            WithdrawalStatus::Approved => "approved",
            WithdrawalStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for WithdrawalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Admin decision on a pending request
///
/// `approved` / `rejected` are accepted as aliases on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    #[serde(alias = "approved")]
    Approve,
    #[serde(alias = "rejected")]
    Reject,
}

impl Decision {
    /// Status a pending request moves to under this decision
    pub fn target_status(self) -> WithdrawalStatus {
        match self {
            Decision::Approve => WithdrawalStatus::Approved,
            Decision::Reject => WithdrawalStatus::Rejected,
        }
    }
}

/// A user's request to cash out part of their balance
///
/// The requested amount is debited from the balance (a hold) when the request
/// is created. Rejection credits it back; approval leaves the hold in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalRequest {
    pub id: WithdrawalId,

    #[serde(rename = "user_id")]
    pub account: AccountId,

    #[serde(with = "fixed2")]
    pub amount: Amount,

    pub payment_method: PaymentMethod,

    /// Destination identifier on the payment rail
    pub payment_id: String,

    pub status: WithdrawalStatus,

    pub admin_notes: Option<String>,

    pub requested_at: DateTime<Utc>,

    /// Set when the request leaves `pending`
    pub resolved_at: Option<DateTime<Utc>>,

    /// Creation order across all requests
    pub sequence: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("\"approve\"", Decision::Approve)]
    #[case("\"approved\"", Decision::Approve)]
    #[case("\"reject\"", Decision::Reject)]
    #[case("\"rejected\"", Decision::Reject)]
    fn test_decision_accepts_aliases(#[case] json: &str, #[case] expected: Decision) {
        let decision: Decision = serde_json::from_str(json).unwrap();
        assert_eq!(decision, expected);
    }

    #[rstest]
    #[case(WithdrawalStatus::Pending, false)]
    #[case(WithdrawalStatus::Approved, true)]
    #[case(WithdrawalStatus::Rejected, true)]
    fn test_is_terminal(#[case] status: WithdrawalStatus, #[case] expected: bool) {
        assert_eq!(status.is_terminal(), expected);
    }

    #[rstest]
    #[case("esewa", PaymentMethod::Esewa)]
    #[case(" Khalti ", PaymentMethod::Khalti)]
    fn test_payment_method_from_str(#[case] input: &str, #[case] expected: PaymentMethod) {
        assert_eq!(input.parse::<PaymentMethod>(), Ok(expected));
    }

    #[test]
    fn test_payment_method_from_str_rejects_unknown_rail() {
        let result = "paypal".parse::<PaymentMethod>();
        assert!(matches!(result, Err(WalletError::InvalidPaymentDetails { .. })));
    }

    #[test]
    fn test_unknown_payment_method_fails_to_parse() {
        let result: Result<PaymentMethod, _> = serde_json::from_str("\"paypal\"");
        assert!(result.is_err());
    }
}
