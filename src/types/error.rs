//! Error types for the reward wallet
//!
//! This module defines all error types the wallet core and its API layer can
//! report. Every variant carries enough context to be logged on its own and
//! maps to a stable machine-readable code and an HTTP-like status.
//!
//! # Error Categories
//!
//! - **Validation**: expected, recoverable, user-facing (below minimum,
//!   insufficient funds, unknown ad type, already resolved, ...)
//! - **Authorization**: fatal to the request (missing/invalid session, non-admin caller)
//! - **Internal**: arithmetic overflow, configuration, I/O and hashing faults

use super::account::AccountId;
use super::withdrawal::{WithdrawalId, WithdrawalStatus};
use rust_decimal::Decimal;
use thiserror::Error;

/// Broad class of a [`WalletError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Authorization,
    Internal,
}

/// Main error type for the reward wallet
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WalletError {
    /// Amount is zero, negative or has more than two decimal places
    #[error("Invalid amount {amount}: {reason}")]
    InvalidAmount {
        amount: Decimal,
        reason: String,
    },

    /// Withdrawal amount is under the configured minimum
    #[error("Minimum withdrawal amount is {minimum:.2}, requested {requested:.2}")]
    BelowMinimum {
        minimum: Decimal,
        requested: Decimal,
    },

    /// Debit would drive the balance negative
    ///
    /// The account state is unchanged.
    #[error(
        "Insufficient funds for account {account}: balance {available:.2}, requested {requested:.2}"
    )]
    InsufficientFunds {
        account: AccountId,
        available: Decimal,
        requested: Decimal,
    },

    /// Payment method or destination identifier is unusable
    #[error("Invalid payment details: {reason}")]
    InvalidPaymentDetails {
        reason: String,
    },

    /// No reward is configured for the ad type
    #[error("Unknown ad type '{ad_type}'")]
    UnknownAdType {
        ad_type: String,
    },

    /// The ad-view guard refused to credit this view
    #[error("Ad view rejected for account {account}: {reason}")]
    AdViewRejected {
        account: AccountId,
        reason: String,
    },

    /// Withdrawal request already left the pending state
    #[error("Withdrawal {request} is already {status}")]
    AlreadyResolved {
        request: WithdrawalId,
        status: WithdrawalStatus,
    },

    #[error("Email {email} is already registered")]
    EmailTaken {
        email: String,
    },

    /// Malformed or incomplete request input
    #[error("Invalid request: {message}")]
    InvalidRequest {
        message: String,
    },

    /// Unknown email or wrong password (deliberately indistinguishable)
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Session token missing, malformed, expired, or for an unknown account
    #[error("Unauthorized: {reason}")]
    Unauthorized {
        reason: String,
    },

    /// Caller lacks the admin role
    #[error("Admin access required for {operation}")]
    Forbidden {
        operation: String,
    },

    #[error("Account {account} not found")]
    AccountNotFound {
        account: AccountId,
    },

    #[error("Withdrawal request {request} not found")]
    WithdrawalNotFound {
        request: WithdrawalId,
    },

    /// Arithmetic overflow would occur
    ///
    /// The operation is rejected to keep the ledger intact.
    #[error("Arithmetic overflow in {operation} for account {account}")]
    ArithmeticOverflow {
        operation: String,
        account: AccountId,
    },

    #[error("Configuration error: {message}")]
    Config {
        message: String,
    },

    #[error("I/O error: {message}")]
    Io {
        message: String,
    },

    /// Password hashing backend failure
    #[error("Password hashing error: {message}")]
    Hashing {
        message: String,
    },
}

impl From<std::io::Error> for WalletError {
    fn from(error: std::io::Error) -> Self {
        WalletError::Io {
            message: error.to_string(),
        }
    }
}

impl From<serde_json::Error> for WalletError {
    fn from(error: serde_json::Error) -> Self {
        WalletError::InvalidRequest {
            message: error.to_string(),
        }
    }
}

impl From<csv::Error> for WalletError {
    fn from(error: csv::Error) -> Self {
        WalletError::Io {
            message: error.to_string(),
        }
    }
}

impl From<toml::de::Error> for WalletError {
    fn from(error: toml::de::Error) -> Self {
        WalletError::Config {
            message: error.to_string(),
        }
    }
}

impl WalletError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            WalletError::InvalidAmount { .. } => "invalid_amount",
            WalletError::BelowMinimum { .. } => "below_minimum",
            WalletError::InsufficientFunds { .. } => "insufficient_funds",
            WalletError::InvalidPaymentDetails { .. } => "invalid_payment_details",
            WalletError::UnknownAdType { .. } => "unknown_ad_type",
            WalletError::AdViewRejected { .. } => "ad_view_rejected",
            WalletError::AlreadyResolved { .. } => "already_resolved",
            WalletError::EmailTaken { .. } => "email_taken",
            WalletError::InvalidRequest { .. } => "invalid_request",
            WalletError::InvalidCredentials => "invalid_credentials",
            WalletError::Unauthorized { .. } => "unauthorized",
            WalletError::Forbidden { .. } => "forbidden",
            WalletError::AccountNotFound { .. } => "account_not_found",
            WalletError::WithdrawalNotFound { .. } => "withdrawal_not_found",
            WalletError::ArithmeticOverflow { .. } => "arithmetic_overflow",
            WalletError::Config { .. } => "config_error",
            WalletError::Io { .. } => "io_error",
            WalletError::Hashing { .. } => "hashing_error",
        }
    }

    /// HTTP-like status code for the API envelope
    pub fn status(&self) -> u16 {
        match self {
            WalletError::InvalidAmount { .. }
            | WalletError::BelowMinimum { .. }
            | WalletError::InsufficientFunds { .. }
            | WalletError::InvalidPaymentDetails { .. }
            | WalletError::UnknownAdType { .. }
            | WalletError::EmailTaken { .. }
            | WalletError::InvalidRequest { .. } => 400,
            WalletError::InvalidCredentials | WalletError::Unauthorized { .. } => 401,
            WalletError::Forbidden { .. } => 403,
            WalletError::AccountNotFound { .. } | WalletError::WithdrawalNotFound { .. } => 404,
            WalletError::AlreadyResolved { .. } => 409,
            WalletError::AdViewRejected { .. } => 429,
            WalletError::ArithmeticOverflow { .. }
            | WalletError::Config { .. }
            | WalletError::Io { .. }
            | WalletError::Hashing { .. } => 500,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            WalletError::Unauthorized { .. } | WalletError::Forbidden { .. } => {
                ErrorCategory::Authorization
            }
            WalletError::ArithmeticOverflow { .. }
            | WalletError::Config { .. }
            | WalletError::Io { .. }
            | WalletError::Hashing { .. } => ErrorCategory::Internal,
            _ => ErrorCategory::Validation,
        }
    }
}

// Helper functions for creating common errors

impl WalletError {
    /// Create an InvalidAmount error
    pub fn invalid_amount(amount: Decimal, reason: &str) -> Self {
        WalletError::InvalidAmount {
            amount,
            reason: reason.to_string(),
        }
    }

    /// Create a BelowMinimum error
    pub fn below_minimum(minimum: Decimal, requested: Decimal) -> Self {
        WalletError::BelowMinimum { minimum, requested }
    }

    /// Create an InsufficientFunds error
    pub fn insufficient_funds(account: AccountId, available: Decimal, requested: Decimal) -> Self {
        WalletError::InsufficientFunds {
            account,
            available,
            requested,
        }
    }

    /// Create an InvalidPaymentDetails error
    pub fn invalid_payment_details(reason: &str) -> Self {
        WalletError::InvalidPaymentDetails {
            reason: reason.to_string(),
        }
    }

    /// Create an UnknownAdType error
    pub fn unknown_ad_type(ad_type: &str) -> Self {
        WalletError::UnknownAdType {
            ad_type: ad_type.to_string(),
        }
    }

    /// Create an AdViewRejected error
    pub fn ad_view_rejected(account: AccountId, reason: &str) -> Self {
        WalletError::AdViewRejected {
            account,
            reason: reason.to_string(),
        }
    }

    /// Create an AlreadyResolved error
    pub fn already_resolved(request: WithdrawalId, status: WithdrawalStatus) -> Self {
        WalletError::AlreadyResolved { request, status }
    }

    /// Create an EmailTaken error
    pub fn email_taken(email: &str) -> Self {
        WalletError::EmailTaken {
            email: email.to_string(),
        }
    }

    /// Create an InvalidRequest error
    pub fn invalid_request(message: &str) -> Self {
        WalletError::InvalidRequest {
            message: message.to_string(),
        }
    }

    /// Create an Unauthorized error
    pub fn unauthorized(reason: &str) -> Self {
        WalletError::Unauthorized {
            reason: reason.to_string(),
        }
    }

    /// Create a Forbidden error
    pub fn forbidden(operation: &str) -> Self {
        WalletError::Forbidden {
            operation: operation.to_string(),
        }
    }

    /// Create an AccountNotFound error
    pub fn account_not_found(account: AccountId) -> Self {
        WalletError::AccountNotFound { account }
    }

    /// Create a WithdrawalNotFound error
    pub fn withdrawal_not_found(request: WithdrawalId) -> Self {
        WalletError::WithdrawalNotFound { request }
    }

    /// Create an ArithmeticOverflow error
    pub fn arithmetic_overflow(operation: &str, account: AccountId) -> Self {
        WalletError::ArithmeticOverflow {
            operation: operation.to_string(),
            account,
        }
    }

    /// Create a Config error
    pub fn config(message: &str) -> Self {
        WalletError::Config {
            message: message.to_string(),
        }
    }

    /// Create a Hashing error
    pub fn hashing(message: &str) -> Self {
        WalletError::Hashing {
            message: message.to_string(),
        }
    }
}
