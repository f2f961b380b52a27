//! JSON request/response envelope
//!
//! Requests are JSON objects tagged by `op`:
//!
//! ```json
//! {"op": "watch_ad", "token": "...", "ad_type": "video"}
//! ```
//!
//! Responses carry an HTTP-like `status` and either a `body` or an
//! `error {code, message}`.

use crate::types::money::fixed2;
use crate::types::{Amount, Decision, WalletError, WithdrawalId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Every operation exposed by the wallet service
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case", deny_unknown_fields)]
pub enum ApiRequest {
    Signup {
        email: String,
        password: String,
        full_name: String,
        #[serde(default)]
        referral_code: Option<String>,
    },
    Login {
        email: String,
        password: String,
    },
    Me {
        token: String,
    },
    Balance {
        token: String,
    },
    Transactions {
        token: String,
        #[serde(default)]
        limit: Option<usize>,
    },
    WatchAd {
        token: String,
        #[serde(default)]
        ad_type: Option<String>,
    },
    RequestWithdrawal {
        token: String,
        #[serde(deserialize_with = "fixed2::deserialize")]
        amount: Amount,
        payment_method: String,
        payment_id: String,
    },
    MyWithdrawals {
        token: String,
    },
    AdminStats {
        token: String,
    },
    AdminWithdrawals {
        token: String,
    },
    AdminResolveWithdrawal {
        token: String,
        request_id: WithdrawalId,
        decision: Decision,
        #[serde(default)]
        admin_notes: Option<String>,
    },
}

impl ApiRequest {
    /// Wire name of the operation
    pub fn op(&self) -> &'static str {
        match self {
            ApiRequest::Signup { .. } => "signup",
            ApiRequest::Login { .. } => "login",
            ApiRequest::Me { .. } => "me",
            ApiRequest::Balance { .. } => "balance",
            ApiRequest::Transactions { .. } => "transactions",
            ApiRequest::WatchAd { .. } => "watch_ad",
            ApiRequest::RequestWithdrawal { .. } => "request_withdrawal",
            ApiRequest::MyWithdrawals { .. } => "my_withdrawals",
            ApiRequest::AdminStats { .. } => "admin_stats",
            ApiRequest::AdminWithdrawals { .. } => "admin_withdrawals",
            ApiRequest::AdminResolveWithdrawal { .. } => "admin_resolve_withdrawal",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: u16,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

impl ApiResponse {
    /// Successful response; a body that fails to serialize becomes a 500
    pub fn success<T: Serialize>(status: u16, body: &T) -> Self {
        match serde_json::to_value(body) {
            Ok(body) => Self {
                status,
                body: Some(body),
                error: None,
            },
            Err(e) => Self::failure(&WalletError::Io {
                message: format!("cannot encode response: {}", e),
            }),
        }
    }

    pub fn failure(error: &WalletError) -> Self {
        Self {
            status: error.status(),
            body: None,
            error: Some(ApiError {
                code: error.code().to_string(),
                message: error.to_string(),
            }),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Error code, if this is a failure
    pub fn error_code(&self) -> Option<&str> {
        self.error.as_ref().map(|error| error.code.as_str())
    }
}
