//! Replay step execution
//!
//! The `ScriptRunner` turns script steps into [`ApiRequest`]s and dispatches
//! them through a [`WalletService`]. It plays the part of the clients: it
//! remembers the session token and referral code each user received at
//! signup/login and the ids of the withdrawal requests each user created, so
//! later steps can refer to them by email.

use crate::api::{ApiRequest, ApiResponse, WalletService};
use crate::io::script_format::ScriptStep;
use crate::types::{WalletError, WithdrawalId};
use dashmap::DashMap;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, warn};

/// Step counts of a finished replay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReplaySummary {
    pub succeeded: usize,
    pub failed: usize,
}

/// Outcome of a single step
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub line: usize,
    pub op: String,
    pub response: ApiResponse,
}

#[derive(Debug)]
pub struct ScriptRunner {
    service: WalletService,

    /// Email -> latest session token
    sessions: DashMap<String, String>,

    /// Email -> referral code
    referral_codes: DashMap<String, String>,

    /// Owner email -> withdrawal ids in creation order
    withdrawals: DashMap<String, Vec<WithdrawalId>>,

    succeeded: AtomicUsize,
    failed: AtomicUsize,
}

impl ScriptRunner {
    pub fn new(service: WalletService) -> Self {
        Self {
            service,
            sessions: DashMap::new(),
            referral_codes: DashMap::new(),
            withdrawals: DashMap::new(),
            succeeded: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
        }
    }

    pub fn service(&self) -> &WalletService {
        &self.service
    }

    /// Execute one step
    ///
    /// Failures are recorded and logged; they never stop the replay.
    pub fn run_step(&self, step: &ScriptStep) -> StepOutcome {
        let response = match self.build_request(step) {
            Ok(request) => self.service.handle(request),
            Err(e) => ApiResponse::failure(&e),
        };

        if response.is_success() {
            self.succeeded.fetch_add(1, Ordering::Relaxed);
            self.remember(step, &response);
            debug!(line = step.line, op = %step.op, status = response.status, "step applied");
        } else {
            self.failed.fetch_add(1, Ordering::Relaxed);
            if let Some(error) = &response.error {
                warn!(
                    line = step.line,
                    op = %step.op,
                    code = %error.code,
                    "step failed: {}",
                    error.message
                );
            }
        }

        StepOutcome {
            line: step.line,
            op: step.op.clone(),
            response,
        }
    }

    pub fn summary(&self) -> ReplaySummary {
        ReplaySummary {
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }

    /// Record a step that could not be parsed
    pub fn record_unparsable(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    fn build_request(&self, step: &ScriptStep) -> Result<ApiRequest, WalletError> {
        let mut fields = step.fields.clone();

        if let Some(actor) = &step.actor {
            let token = self
                .sessions
                .get(actor)
                .map(|token| token.value().clone())
                .ok_or_else(|| {
                    WalletError::unauthorized(&format!("no session for '{}'", actor))
                })?;
            fields.insert("token".to_string(), Value::String(token));
        }

        if let Some(referrer) = &step.referrer {
            let code = self
                .referral_codes
                .get(referrer)
                .map(|code| code.value().clone())
                .ok_or_else(|| {
                    WalletError::invalid_request(&format!("'{}' has no referral code", referrer))
                })?;
            fields.insert("referral_code".to_string(), Value::String(code));
        }

        if let Some(reference) = &step.withdrawal {
            let id = self
                .withdrawals
                .get(&reference.owner)
                .and_then(|ids| ids.get(reference.index).copied())
                .ok_or_else(|| {
                    WalletError::invalid_request(&format!(
                        "'{}' has no withdrawal #{}",
                        reference.owner, reference.index
                    ))
                })?;
            fields.insert("request_id".to_string(), Value::String(id.to_string()));
        }

        Ok(serde_json::from_value(Value::Object(fields))?)
    }

    fn remember(&self, step: &ScriptStep, response: &ApiResponse) {
        let body = match &response.body {
            Some(body) => body,
            None => return,
        };

        match step.op.as_str() {
            "signup" | "login" => {
                let email = body["user"]["email"].as_str();
                let token = body["token"].as_str();
                let code = body["user"]["referral_code"].as_str();
                if let (Some(email), Some(token)) = (email, token) {
                    self.sessions.insert(email.to_string(), token.to_string());
                    if let Some(code) = code {
                        self.referral_codes.insert(email.to_string(), code.to_string());
                    }
                }
            }
            "request_withdrawal" => {
                let id = body["id"]
                    .as_str()
                    .and_then(|id| id.parse::<WithdrawalId>().ok());
                if let (Some(owner), Some(id)) = (&step.actor, id) {
                    self.withdrawals.entry(owner.clone()).or_default().push(id);
                }
            }
            _ => {}
        }
    }
}
