//! Wallet service
//!
//! `WalletService` wires the core components together and implements the
//! request/response contract: every operation except signup and login takes
//! a session token, resolves it to an account and then calls into the core.

use crate::api::dto::{
    AccountReport, AccountView, AdminWithdrawalView, AuthResponse, BalanceView, StatsView,
    WatchAdResponse, UNKNOWN_OWNER,
};
use crate::api::envelope::{ApiRequest, ApiResponse};
use crate::config::{WalletConfig, DEFAULT_AD_TYPE};
use crate::core::{
    AccountDirectory, Ledger, LedgerStore, RewardEngine, SessionIssuer, WithdrawalWorkflow,
};
use crate::types::{
    Account, Amount, Decision, PaymentMethod, Transaction, WalletError, WithdrawalId,
    WithdrawalRequest,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Transactions returned when the caller gives no limit
pub const DEFAULT_TRANSACTION_LIMIT: usize = 100;

/// Withdrawal requests returned by the listing operations
pub const DEFAULT_WITHDRAWAL_LIMIT: usize = 100;

const STATUS_OK: u16 = 200;
const STATUS_CREATED: u16 = 201;

pub struct WalletService {
    ledger: Arc<dyn Ledger>,
    directory: AccountDirectory,
    rewards: RewardEngine,
    withdrawals: WithdrawalWorkflow,
    sessions: SessionIssuer,
}

impl std::fmt::Debug for WalletService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletService")
            .field("directory", &self.directory)
            .field("rewards", &self.rewards)
            .field("withdrawals", &self.withdrawals)
            .finish_non_exhaustive()
    }
}

impl WalletService {
    /// Build a service backed by an in-memory [`LedgerStore`]
    pub fn new(config: &WalletConfig) -> Result<Self, WalletError> {
        Self::with_ledger(Arc::new(LedgerStore::new()), config)
    }

    /// Build a service on top of an existing ledger
    pub fn with_ledger(ledger: Arc<dyn Ledger>, config: &WalletConfig) -> Result<Self, WalletError> {
        config.validate()?;

        Ok(Self {
            directory: AccountDirectory::new(ledger.clone(), config)?,
            rewards: RewardEngine::from_config(ledger.clone(), config),
            withdrawals: WithdrawalWorkflow::new(ledger.clone(), config.minimum_withdrawal),
            sessions: SessionIssuer::from_config(&config.session),
            ledger,
        })
    }

    pub fn signup(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
        referral_code: Option<&str>,
    ) -> Result<AuthResponse, WalletError> {
        let account = self
            .directory
            .create_account(email, password, full_name, referral_code)?;
        self.auth_response(&account)
    }

    pub fn login(&self, email: &str, password: &str) -> Result<AuthResponse, WalletError> {
        let account = self.directory.authenticate(email, password)?;
        self.auth_response(&account)
    }

    pub fn me(&self, token: &str) -> Result<AccountView, WalletError> {
        let account = self.authenticate(token)?;
        self.account_view(&account)
    }

    pub fn balance(&self, token: &str) -> Result<BalanceView, WalletError> {
        let account = self.authenticate(token)?;
        Ok(self.ledger.snapshot(account.id)?.into())
    }

    /// Own transactions, newest first
    pub fn transactions(
        &self,
        token: &str,
        limit: Option<usize>,
    ) -> Result<Vec<Transaction>, WalletError> {
        let account = self.authenticate(token)?;
        self.ledger
            .history(account.id, limit.unwrap_or(DEFAULT_TRANSACTION_LIMIT))
    }

    pub fn watch_ad(&self, token: &str, ad_type: Option<&str>) -> Result<WatchAdResponse, WalletError> {
        let account = self.authenticate(token)?;
        let receipt = self
            .rewards
            .record_ad_view(account.id, ad_type.unwrap_or(DEFAULT_AD_TYPE))?;

        Ok(WatchAdResponse {
            message: "Ad watched successfully!".to_string(),
            ad_type: receipt.ad_type,
            reward: receipt.reward,
            new_balance: receipt.new_balance,
        })
    }

    /// Request a withdrawal to `payment_method`
    ///
    /// The amount is checked before the payment method so that the reported
    /// error follows the workflow's validation order.
    pub fn request_withdrawal(
        &self,
        token: &str,
        amount: Amount,
        payment_method: &str,
        payment_id: &str,
    ) -> Result<WithdrawalRequest, WalletError> {
        let account = self.authenticate(token)?;
        let amount = self.withdrawals.check_amount(amount)?;
        let method: PaymentMethod = payment_method.parse()?;

        self.withdrawals
            .request_withdrawal(account.id, amount, method, payment_id)
    }

    pub fn my_withdrawals(&self, token: &str) -> Result<Vec<WithdrawalRequest>, WalletError> {
        let account = self.authenticate(token)?;
        Ok(self
            .withdrawals
            .list_for_account(account.id, DEFAULT_WITHDRAWAL_LIMIT))
    }

    pub fn admin_stats(&self, token: &str) -> Result<StatsView, WalletError> {
        self.require_admin(token, "admin_stats")?;
        let counts = self.withdrawals.counts();

        Ok(StatsView {
            total_users: self.directory.count(),
            total_withdrawals: counts.total,
            pending_withdrawals: counts.pending,
            total_ads_watched: self.ledger.total_ads_watched(),
        })
    }

    /// The newest withdrawal requests with their owners' names and emails
    pub fn admin_withdrawals(&self, token: &str) -> Result<Vec<AdminWithdrawalView>, WalletError> {
        self.require_admin(token, "admin_withdrawals")?;

        Ok(self
            .withdrawals
            .list_all(DEFAULT_WITHDRAWAL_LIMIT)
            .into_iter()
            .map(|request| {
                let (user_name, user_email) = match self.directory.get(request.account) {
                    Ok(owner) => (owner.full_name, owner.email),
                    Err(_) => (UNKNOWN_OWNER.to_string(), UNKNOWN_OWNER.to_string()),
                };
                AdminWithdrawalView {
                    request,
                    user_name,
                    user_email,
                }
            })
            .collect())
    }

    pub fn admin_resolve_withdrawal(
        &self,
        token: &str,
        request: WithdrawalId,
        decision: Decision,
        admin_notes: Option<&str>,
    ) -> Result<WithdrawalRequest, WalletError> {
        let admin = self.require_admin(token, "admin_resolve_withdrawal")?;
        debug!(admin = %admin.id, %request, ?decision, "resolving withdrawal");
        self.withdrawals
            .resolve_withdrawal(request, decision, admin_notes)
    }

    /// Per-account balances and audit result, sorted by email
    pub fn account_report(&self) -> Result<Vec<AccountReport>, WalletError> {
        self.directory
            .all()
            .iter()
            .map(|account| {
                let snapshot = self.ledger.snapshot(account.id)?;
                let audit = self.ledger.reconcile(account.id)?;
                Ok(AccountReport::new(account, &snapshot, &audit))
            })
            .collect()
    }

    /// Dispatch one enveloped request
    pub fn handle(&self, request: ApiRequest) -> ApiResponse {
        let op = request.op();

        let response = match request {
            ApiRequest::Signup {
                email,
                password,
                full_name,
                referral_code,
            } => respond(
                STATUS_CREATED,
                self.signup(&email, &password, &full_name, referral_code.as_deref()),
            ),
            ApiRequest::Login { email, password } => respond(STATUS_OK, self.login(&email, &password)),
            ApiRequest::Me { token } => respond(STATUS_OK, self.me(&token)),
            ApiRequest::Balance { token } => respond(STATUS_OK, self.balance(&token)),
            ApiRequest::Transactions { token, limit } => {
                respond(STATUS_OK, self.transactions(&token, limit))
            }
            ApiRequest::WatchAd { token, ad_type } => {
                respond(STATUS_OK, self.watch_ad(&token, ad_type.as_deref()))
            }
            ApiRequest::RequestWithdrawal {
                token,
                amount,
                payment_method,
                payment_id,
            } => respond(
                STATUS_CREATED,
                self.request_withdrawal(&token, amount, &payment_method, &payment_id),
            ),
            ApiRequest::MyWithdrawals { token } => respond(STATUS_OK, self.my_withdrawals(&token)),
            ApiRequest::AdminStats { token } => respond(STATUS_OK, self.admin_stats(&token)),
            ApiRequest::AdminWithdrawals { token } => {
                respond(STATUS_OK, self.admin_withdrawals(&token))
            }
            ApiRequest::AdminResolveWithdrawal {
                token,
                request_id,
                decision,
                admin_notes,
            } => respond(
                STATUS_OK,
                self.admin_resolve_withdrawal(&token, request_id, decision, admin_notes.as_deref()),
            ),
        };

        if let Some(code) = response.error_code() {
            warn!(op, code, status = response.status, "request failed");
        }
        response
    }

    /// Parse and dispatch a JSON request; malformed input is a 400
    pub fn handle_json(&self, raw: &str) -> ApiResponse {
        match serde_json::from_str::<ApiRequest>(raw) {
            Ok(request) => self.handle(request),
            Err(e) => ApiResponse::failure(&WalletError::from(e)),
        }
    }

    fn authenticate(&self, token: &str) -> Result<Account, WalletError> {
        let id = self.sessions.verify(token)?;
        self.directory
            .get(id)
            .map_err(|_| WalletError::unauthorized("account no longer exists"))
    }

    fn require_admin(&self, token: &str, operation: &str) -> Result<Account, WalletError> {
        let account = self.authenticate(token)?;
        if !account.is_admin() {
            return Err(WalletError::forbidden(operation));
        }
        Ok(account)
    }

    fn auth_response(&self, account: &Account) -> Result<AuthResponse, WalletError> {
        Ok(AuthResponse {
            token: self.sessions.issue(account)?,
            user: self.account_view(account)?,
        })
    }

    fn account_view(&self, account: &Account) -> Result<AccountView, WalletError> {
        let snapshot = self.ledger.snapshot(account.id)?;
        Ok(AccountView::new(account, &snapshot))
    }
}

fn respond<T: serde::Serialize>(status: u16, result: Result<T, WalletError>) -> ApiResponse {
    match result {
        Ok(body) => ApiResponse::success(status, &body),
        Err(e) => ApiResponse::failure(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HashingConfig;
    use crate::types::{Role, TransactionType, WithdrawalStatus};
    use rstest::rstest;
    use rust_decimal::Decimal;
    use serde_json::json;
    use uuid::Uuid;

    fn service() -> WalletService {
        let config = WalletConfig {
            password_hashing: HashingConfig::minimal(),
            admin_emails: vec!["admin@example.com".to_string()],
            ..WalletConfig::default()
        };
        WalletService::new(&config).unwrap()
    }

    fn signup(service: &WalletService, email: &str, referral: Option<&str>) -> AuthResponse {
        service.signup(email, "password", "Test User", referral).unwrap()
    }

    fn watch(service: &WalletService, token: &str, times: usize) {
        for _ in 0..times {
            service.watch_ad(token, None).unwrap();
        }
    }

    #[test]
    fn test_signup_returns_working_token() {
        let service = service();

        let auth = signup(&service, "alice@example.com", None);
        let me = service.me(&auth.token).unwrap();

        assert_eq!(me, auth.user);
        assert_eq!(me.wallet_balance, Decimal::ZERO);
        assert_eq!(me.role, Role::Standard);
    }

    #[test]
    fn test_login_after_signup() {
        let service = service();
        let created = signup(&service, "alice@example.com", None);

        let auth = service.login("alice@example.com", "password").unwrap();

        assert_eq!(auth.user.id, created.user.id);
        assert_eq!(service.me(&auth.token).unwrap().id, created.user.id);
    }

    #[test]
    fn test_watch_ad_reports_new_balance() {
        let service = service();
        let auth = signup(&service, "alice@example.com", None);
        watch(&service, &auth.token, 2);

        let response = service.watch_ad(&auth.token, Some("video")).unwrap();

        assert_eq!(response.reward, Decimal::new(50, 2));
        assert_eq!(response.new_balance, Decimal::new(150, 2));
        assert_eq!(
            service.balance(&auth.token).unwrap(),
            BalanceView {
                balance: Decimal::new(150, 2),
                total_earned: Decimal::new(150, 2),
                ads_watched: 3,
            }
        );
    }

    #[test]
    fn test_transactions_respect_limit() {
        let service = service();
        let auth = signup(&service, "alice@example.com", None);
        watch(&service, &auth.token, 5);

        let limited = service.transactions(&auth.token, Some(2)).unwrap();
        let all = service.transactions(&auth.token, None).unwrap();

        assert_eq!(limited.len(), 2);
        assert_eq!(all.len(), 5);
        assert!(all.windows(2).all(|pair| pair[0].sequence > pair[1].sequence));
    }

    #[test]
    fn test_referral_and_withdrawal_flow() {
        let service = service();
        let alice = signup(&service, "alice@example.com", None);
        signup(&service, "bob@example.com", Some(&alice.user.referral_code));
        signup(&service, "carol@example.com", Some(&alice.user.referral_code));
        let admin = signup(&service, "admin@example.com", None);

        let request = service
            .request_withdrawal(&alice.token, Decimal::new(10, 0), "Esewa", "9800")
            .unwrap();
        assert_eq!(service.balance(&alice.token).unwrap().balance, Decimal::ZERO);

        let resolved = service
            .admin_resolve_withdrawal(&admin.token, request.id, Decision::Reject, Some("wrong id"))
            .unwrap();

        assert_eq!(resolved.status, WithdrawalStatus::Rejected);
        assert_eq!(service.balance(&alice.token).unwrap().balance, Decimal::new(10, 0));
        let types: Vec<TransactionType> = service
            .transactions(&alice.token, None)
            .unwrap()
            .into_iter()
            .map(|tx| tx.tx_type)
            .collect();
        assert_eq!(
            types,
            vec![
                TransactionType::WithdrawalReversal,
                TransactionType::WithdrawalHold,
                TransactionType::ReferralBonus,
                TransactionType::ReferralBonus,
            ]
        );
    }

    #[rstest]
    #[case::invalid_amount(Decimal::new(-5, 0), "paypal", "invalid_amount")]
    #[case::below_minimum(Decimal::new(5, 0), "paypal", "below_minimum")]
    #[case::unknown_method(Decimal::new(10, 0), "paypal", "invalid_payment_details")]
    #[case::insufficient(Decimal::new(10, 0), "khalti", "insufficient_funds")]
    fn test_withdrawal_validation_order(
        #[case] amount: Decimal,
        #[case] method: &str,
        #[case] expected: &str,
    ) {
        let service = service();
        let auth = signup(&service, "alice@example.com", None);

        let err = service
            .request_withdrawal(&auth.token, amount, method, "9800")
            .unwrap_err();

        assert_eq!(err.code(), expected);
        assert!(service.my_withdrawals(&auth.token).unwrap().is_empty());
    }

    #[rstest]
    #[case::stats("admin_stats")]
    #[case::list("admin_withdrawals")]
    #[case::resolve("admin_resolve_withdrawal")]
    fn test_admin_operations_forbidden_for_users(#[case] op: &str) {
        let service = service();
        let auth = signup(&service, "alice@example.com", None);

        let result = match op {
            "admin_stats" => service.admin_stats(&auth.token).map(|_| ()),
            "admin_withdrawals" => service.admin_withdrawals(&auth.token).map(|_| ()),
            _ => service
                .admin_resolve_withdrawal(&auth.token, Uuid::new_v4(), Decision::Approve, None)
                .map(|_| ()),
        };

        assert_eq!(result, Err(WalletError::forbidden(op)));
    }

    #[test]
    fn test_admin_views() {
        let service = service();
        let alice = signup(&service, "alice@example.com", None);
        let admin = signup(&service, "admin@example.com", None);
        for _ in 0..20 {
            service.watch_ad(&alice.token, None).unwrap();
        }
        service
            .request_withdrawal(&alice.token, Decimal::new(10, 0), "khalti", "98")
            .unwrap();

        let stats = service.admin_stats(&admin.token).unwrap();
        let listed = service.admin_withdrawals(&admin.token).unwrap();

        assert_eq!(
            stats,
            StatsView {
                total_users: 2,
                total_withdrawals: 1,
                pending_withdrawals: 1,
                total_ads_watched: 20,
            }
        );
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].user_email, "alice@example.com");
        assert_eq!(listed[0].user_name, "Test User");
    }

    #[test]
    fn test_withdrawal_listings_are_capped() {
        let mut config = WalletConfig {
            password_hashing: HashingConfig::minimal(),
            admin_emails: vec!["admin@example.com".to_string()],
            ..WalletConfig::default()
        };
        config.ad_rewards.insert("video".to_string(), Decimal::new(10, 0));
        let service = WalletService::new(&config).unwrap();
        let alice = signup(&service, "alice@example.com", None);
        let admin = signup(&service, "admin@example.com", None);
        watch(&service, &alice.token, DEFAULT_WITHDRAWAL_LIMIT + 5);
        for _ in 0..DEFAULT_WITHDRAWAL_LIMIT + 5 {
            service
                .request_withdrawal(&alice.token, Decimal::new(10, 0), "esewa", "98")
                .unwrap();
        }

        let mine = service.my_withdrawals(&alice.token).unwrap();
        let listed = service.admin_withdrawals(&admin.token).unwrap();
        let stats = service.admin_stats(&admin.token).unwrap();

        assert_eq!(mine.len(), DEFAULT_WITHDRAWAL_LIMIT);
        assert_eq!(listed.len(), DEFAULT_WITHDRAWAL_LIMIT);
        assert_eq!(stats.total_withdrawals, DEFAULT_WITHDRAWAL_LIMIT + 5);
        assert_eq!(listed[0].request.id, mine[0].id);
    }

    #[rstest]
    #[case::garbage("not-a-token")]
    #[case::empty("")]
    fn test_bad_tokens_are_unauthorized(#[case] token: &str) {
        let service = service();

        assert!(matches!(service.balance(token), Err(WalletError::Unauthorized { .. })));
    }

    #[test]
    fn test_handle_json_round_trip() {
        let service = service();

        let signup = service.handle_json(
            &json!({
                "op": "signup",
                "email": "alice@example.com",
                "password": "pw",
                "full_name": "Alice"
            })
            .to_string(),
        );
        assert_eq!(signup.status, 201);
        let token = signup.body.as_ref().unwrap()["token"].as_str().unwrap().to_string();

        let watched = service.handle_json(&json!({"op": "watch_ad", "token": token}).to_string());
        assert_eq!(watched.status, 200);
        assert_eq!(watched.body.as_ref().unwrap()["new_balance"], "0.50");

        let balance = service.handle_json(&json!({"op": "balance", "token": token}).to_string());
        assert_eq!(balance.body.unwrap()["balance"], "0.50");
    }

    #[rstest]
    #[case::not_json("{", 400, "invalid_request")]
    #[case::unknown_op(r#"{"op":"nope"}"#, 400, "invalid_request")]
    #[case::bad_token(r#"{"op":"me","token":"x"}"#, 401, "unauthorized")]
    #[case::bad_login(r#"{"op":"login","email":"a@b.co","password":"x"}"#, 401, "invalid_credentials")]
    fn test_handle_json_errors(#[case] raw: &str, #[case] status: u16, #[case] code: &str) {
        let service = service();

        let response = service.handle_json(raw);

        assert_eq!(response.status, status);
        assert_eq!(response.error_code(), Some(code));
    }

    #[test]
    fn test_account_report_is_sorted_and_reconciled() {
        let service = service();
        let bob = signup(&service, "bob@example.com", None);
        signup(&service, "alice@example.com", None);
        watch(&service, &bob.token, 3);

        let report = service.account_report().unwrap();

        assert_eq!(report.len(), 2);
        assert_eq!(report[0].email, "alice@example.com");
        assert_eq!(report[1].balance, Decimal::new(150, 2));
        assert_eq!(report[1].transactions, 3);
        assert!(report.iter().all(|row| row.reconciled));
    }
}
