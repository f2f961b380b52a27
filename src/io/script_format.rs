//! Replay script format
//!
//! A replay script is a JSON-lines file. Each non-blank line that does not
//! start with `#` is one step: a wallet request (see [`ApiRequest`]) without
//! its session token, plus two replay-only keys:
//!
//! - `as` - email of the acting user; the driver injects that user's token
//! - `withdrawal` - `{"owner": email, "index": n}`, resolved to the id of the
//!   owner's n-th withdrawal request (0-based, in script order)
//! - `referrer` - email of an existing user; on signup the driver fills in
//!   that user's referral code
//!
//! ```text
//! {"op": "signup", "email": "alice@example.com", "password": "pw", "full_name": "Alice"}
//! {"as": "alice@example.com", "op": "watch_ad"}
//! {"as": "admin@example.com", "op": "admin_resolve_withdrawal",
//!  "withdrawal": {"owner": "alice@example.com", "index": 0}, "decision": "reject"}
//! ```
//!
//! All functions are pure (no I/O).
//!
//! [`ApiRequest`]: crate::api::ApiRequest

use serde::Deserialize;
use serde_json::{Map, Value};

/// Reference to a withdrawal created earlier in the script
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WithdrawalRef {
    pub owner: String,
    pub index: usize,
}

/// One parsed replay step
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptStep {
    /// 1-based line number in the script
    pub line: usize,

    /// Operation name (`op`)
    pub op: String,

    /// Acting user's email, lowercased
    pub actor: Option<String>,

    pub withdrawal: Option<WithdrawalRef>,

    /// Email of the user whose referral code a signup uses, lowercased
    pub referrer: Option<String>,

    /// Remaining request fields, `op` included
    pub fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct RawStep {
    #[serde(rename = "as", default)]
    actor: Option<String>,

    #[serde(default)]
    withdrawal: Option<WithdrawalRef>,

    #[serde(default)]
    referrer: Option<String>,

    #[serde(flatten)]
    fields: Map<String, Value>,
}

/// How a step may be scheduled by the concurrent replay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepScope<'a> {
    /// Touches only the acting user's own state
    Actor(&'a str),

    /// Creates identities, resolves other users' requests or reads global
    /// state; runs alone, after everything before it
    Global,
}

impl ScriptStep {
    /// Scheduling scope of this step
    pub fn scope(&self) -> StepScope<'_> {
        let global = matches!(self.op.as_str(), "signup" | "login") || self.op.starts_with("admin_");

        match (&self.actor, global) {
            (Some(actor), false) => StepScope::Actor(actor),
            _ => StepScope::Global,
        }
    }
}

/// Parse one script line
///
/// # Returns
///
/// * `Ok(None)` for blank lines and `#` comments
/// * `Ok(Some(step))` for a well-formed step
/// * `Err(String)` describing why the line is not a step
pub fn parse_step(line: usize, text: &str) -> Result<Option<ScriptStep>, String> {
    let text = text.trim();
    if text.is_empty() || text.starts_with('#') {
        return Ok(None);
    }

    let raw: RawStep =
        serde_json::from_str(text).map_err(|e| format!("Line {}: invalid step: {}", line, e))?;

    let op = match raw.fields.get("op") {
        Some(Value::String(op)) if !op.is_empty() => op.clone(),
        _ => return Err(format!("Line {}: step has no \"op\"", line)),
    };

    Ok(Some(ScriptStep {
        line,
        op,
        actor: raw.actor.map(|actor| actor.trim().to_lowercase()),
        withdrawal: raw.withdrawal.map(|reference| WithdrawalRef {
            owner: reference.owner.trim().to_lowercase(),
            index: reference.index,
        }),
        referrer: raw.referrer.map(|referrer| referrer.trim().to_lowercase()),
        fields: raw.fields,
    }))
}
