//! Wallet configuration
//!
//! Every tunable the core depends on (reward table, referral bonus, minimum
//! withdrawal, session and hashing parameters) lives in [`WalletConfig`] and is
//! handed to the components when they are constructed. Nothing is read from
//! process-wide state.
//!
//! Configuration is loaded from an optional TOML file; missing keys fall back
//! to the defaults below.
//!
//! ```toml
//! referral_bonus = "5.00"
//! minimum_withdrawal = "10.00"
//! admin_emails = ["admin@example.com"]
//!
//! [ad_rewards]
//! video = "0.50"
//!
//! [session]
//! ttl_secs = 86400
//! ```

use crate::types::{validate_amount, Amount, WalletError};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Ad type credited when the caller does not name one
pub const DEFAULT_AD_TYPE: &str = "video";

/// Top-level wallet configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WalletConfig {
    /// Reward credited per completed view, by ad type
    pub ad_rewards: BTreeMap<String, Amount>,

    /// Credited to the referring account when a referred account signs up
    pub referral_bonus: Amount,

    /// Smallest amount a withdrawal may request
    pub minimum_withdrawal: Amount,

    /// Minimum seconds between two rewarded views of one account
    ///
    /// Unset by default: ad views are trusted as reported by the caller.
    pub ad_view_min_interval_secs: Option<u64>,

    /// Emails that receive the admin role at signup
    pub admin_emails: Vec<String>,

    pub session: SessionConfig,

    pub password_hashing: HashingConfig,
}

/// Session token settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// HMAC signing secret; a random one is generated per process when unset
    pub secret: Option<String>,

    /// Token lifetime in seconds
    pub ttl_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secret: None,
            ttl_secs: 24 * 60 * 60,
        }
    }
}

/// Argon2 cost parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HashingConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self {
            memory_kib: argon2::Params::DEFAULT_M_COST,
            iterations: argon2::Params::DEFAULT_T_COST,
            parallelism: argon2::Params::DEFAULT_P_COST,
        }
    }
}

impl HashingConfig {
    /// Smallest cost Argon2 accepts; for fixtures and benchmarks only
    pub fn minimal() -> Self {
        Self {
            memory_kib: argon2::Params::MIN_M_COST,
            iterations: argon2::Params::MIN_T_COST,
            parallelism: argon2::Params::MIN_P_COST,
        }
    }
}

impl Default for WalletConfig {
    fn default() -> Self {
        let mut ad_rewards = BTreeMap::new();
        ad_rewards.insert(DEFAULT_AD_TYPE.to_string(), Decimal::new(50, 2));

        Self {
            ad_rewards,
            referral_bonus: Decimal::new(500, 2),
            minimum_withdrawal: Decimal::new(1000, 2),
            ad_view_min_interval_secs: None,
            admin_emails: Vec::new(),
            session: SessionConfig::default(),
            password_hashing: HashingConfig::default(),
        }
    }
}

impl WalletConfig {
    /// Load and validate a configuration file
    ///
    /// # Errors
    ///
    /// Returns `WalletError::Io` if the file cannot be read and
    /// `WalletError::Config` if it does not parse or fails validation.
    pub fn load(path: &Path) -> Result<Self, WalletError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            WalletError::config(&format!("cannot read '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, WalletError> {
        let config: WalletConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every amount is a positive 2-decimal value and the
    /// reward table is usable
    pub fn validate(&self) -> Result<(), WalletError> {
        if self.ad_rewards.is_empty() {
            return Err(WalletError::config("ad_rewards must name at least one ad type"));
        }

        for (ad_type, reward) in &self.ad_rewards {
            if ad_type.trim().is_empty() {
                return Err(WalletError::config("ad type names must not be empty"));
            }
            validate_amount(*reward).map_err(|e| {
                WalletError::config(&format!("reward for ad type '{}': {}", ad_type, e))
            })?;
        }

        validate_amount(self.referral_bonus)
            .map_err(|e| WalletError::config(&format!("referral_bonus: {}", e)))?;
        validate_amount(self.minimum_withdrawal)
            .map_err(|e| WalletError::config(&format!("minimum_withdrawal: {}", e)))?;

        if self.session.ttl_secs == 0 {
            return Err(WalletError::config("session.ttl_secs must be positive"));
        }

        argon2::Params::new(
            self.password_hashing.memory_kib,
            self.password_hashing.iterations,
            self.password_hashing.parallelism,
            None,
        )
        .map_err(|e| WalletError::config(&format!("password_hashing: {}", e)))?;

        Ok(())
    }

    /// Whether `email` (already normalized) is configured as an admin
    pub fn is_admin_email(&self, email: &str) -> bool {
        self.admin_emails
            .iter()
            .any(|admin| admin.trim().eq_ignore_ascii_case(email))
    }
}
