//! Request/response surface of the wallet
//!
//! - `service` - `WalletService`, the authenticated operations
//! - `envelope` - JSON `ApiRequest`/`ApiResponse` envelope
//! - `dto` - Response bodies

pub mod dto;
pub mod envelope;
pub mod service;

pub use dto::{
    AccountReport, AccountView, AdminWithdrawalView, AuthResponse, BalanceView, StatsView,
    WatchAdResponse,
};
pub use envelope::{ApiError, ApiRequest, ApiResponse};
pub use service::{WalletService, DEFAULT_TRANSACTION_LIMIT, DEFAULT_WITHDRAWAL_LIMIT};
