//! Account directory
//!
//! This module provides the `AccountDirectory` struct, which owns the identity
//! records of every user: email, display name, password credential, referral
//! code and role.
//!
//! The directory is responsible for:
//! - Enforcing email uniqueness and generating unique referral codes
//! - Hashing password credentials with Argon2 (plain passwords are never kept)
//! - Opening the ledger entry of each new account
//! - Invoking the referral engine exactly once per account creation
//!
//! # Thread Safety
//!
//! Records and both uniqueness indexes live in `DashMap`s. Email and referral
//! code reservations go through the map's entry API, so two concurrent signups
//! for the same email cannot both succeed.

use crate::config::WalletConfig;
use crate::core::referral_engine::ReferralEngine;
use crate::core::traits::Ledger;
use crate::types::{Account, AccountId, Role, WalletError};
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rand_core::OsRng;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Length of generated referral codes
const REFERRAL_CODE_LEN: usize = 8;

pub struct AccountDirectory {
    accounts: DashMap<AccountId, Account>,

    /// Normalized email -> account
    by_email: DashMap<String, AccountId>,

    /// Uppercase referral code -> account
    by_referral_code: DashMap<String, AccountId>,

    ledger: Arc<dyn Ledger>,
    referrals: ReferralEngine,
    hasher: Argon2<'static>,
    config: WalletConfig,
}

impl std::fmt::Debug for AccountDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountDirectory")
            .field("accounts", &self.accounts.len())
            .field("referrals", &self.referrals)
            .finish_non_exhaustive()
    }
}

/// Trim and lowercase an email for storage and lookup
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Minimal structural email check: `local@domain.tld`, no whitespace
fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }

    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

impl AccountDirectory {
    /// Create an empty directory
    ///
    /// # Errors
    ///
    /// Returns `WalletError::Config` if the configured Argon2 parameters are invalid.
    pub fn new(ledger: Arc<dyn Ledger>, config: &WalletConfig) -> Result<Self, WalletError> {
        let hashing = config.password_hashing;
        let params = Params::new(
            hashing.memory_kib,
            hashing.iterations,
            hashing.parallelism,
            None,
        )
        .map_err(|e| WalletError::config(&format!("password_hashing: {}", e)))?;

        Ok(Self {
            accounts: DashMap::new(),
            by_email: DashMap::new(),
            by_referral_code: DashMap::new(),
            referrals: ReferralEngine::new(ledger.clone(), config.referral_bonus),
            ledger,
            hasher: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            config: config.clone(),
        })
    }

    /// Register a new account
    ///
    /// Validates the input, reserves the email, hashes the password, assigns a
    /// fresh referral code, opens the ledger entry and finally applies the
    /// referral code (if any) exactly once.
    ///
    /// # Errors
    ///
    /// - `InvalidRequest` for a malformed email or an empty password/name
    /// - `EmailTaken` if the email is already registered
    /// - `Hashing` if the password could not be hashed
    ///
    /// A failing referral never fails the signup.
    pub fn create_account(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
        referral_code: Option<&str>,
    ) -> Result<Account, WalletError> {
        let email = normalize_email(email);
        let full_name = full_name.trim();

        if !is_valid_email(&email) {
            return Err(WalletError::invalid_request("email address is not valid"));
        }
        if password.is_empty() {
            return Err(WalletError::invalid_request("password must not be empty"));
        }
        if full_name.is_empty() {
            return Err(WalletError::invalid_request("full_name must not be empty"));
        }

        if self.by_email.contains_key(&email) {
            return Err(WalletError::email_taken(&email));
        }

        let password_hash = self.hash_password(password)?;
        let id = Uuid::new_v4();

        match self.by_email.entry(email.clone()) {
            Entry::Occupied(_) => return Err(WalletError::email_taken(&email)),
            Entry::Vacant(slot) => {
                slot.insert(id);
            }
        }

        let role = if self.config.is_admin_email(&email) {
            Role::Admin
        } else {
            Role::Standard
        };

        let account = Account {
            id,
            email,
            full_name: full_name.to_string(),
            password_hash,
            referral_code: self.reserve_referral_code(id),
            referred_by: None,
            role,
            created_at: Utc::now(),
        };

        self.ledger.open_account(id);
        self.accounts.insert(id, account);
        info!(account = %id, ?role, "account created");

        if let Err(e) = self.referrals.apply_referral(self, id, referral_code) {
            warn!(account = %id, "referral not applied: {}", e);
        }

        self.get(id)
    }

    /// Check an email/password pair
    ///
    /// Unknown emails and wrong passwords both yield `InvalidCredentials`.
    pub fn authenticate(&self, email: &str, password: &str) -> Result<Account, WalletError> {
        let email = normalize_email(email);

        let account = self
            .by_email
            .get(&email)
            .map(|id| *id.value())
            .and_then(|id| self.accounts.get(&id).map(|account| account.value().clone()))
            .ok_or(WalletError::InvalidCredentials)?;

        let parsed = PasswordHash::new(&account.password_hash)
            .map_err(|e| WalletError::hashing(&e.to_string()))?;

        self.hasher
            .verify_password(password.as_bytes(), &parsed)
            .map_err(|_| WalletError::InvalidCredentials)?;

        Ok(account)
    }

    pub fn get(&self, id: AccountId) -> Result<Account, WalletError> {
        self.accounts
            .get(&id)
            .map(|account| account.value().clone())
            .ok_or_else(|| WalletError::account_not_found(id))
    }

    /// Look up the owner of a referral code (case-insensitive)
    pub fn find_by_referral_code(&self, code: &str) -> Option<Account> {
        let code = code.trim().to_uppercase();
        let id = self.by_referral_code.get(&code).map(|id| *id.value())?;
        self.accounts.get(&id).map(|account| account.value().clone())
    }

    /// Update an account record using a closure
    ///
    /// The closure runs while the record's entry guard is held, so it sees and
    /// leaves the record in a consistent state with respect to other updates.
    pub fn update<F, T>(&self, id: AccountId, f: F) -> Result<T, WalletError>
    where
        F: FnOnce(&mut Account) -> Result<T, WalletError>,
    {
        let mut entry = self
            .accounts
            .get_mut(&id)
            .ok_or_else(|| WalletError::account_not_found(id))?;
        f(entry.value_mut())
    }

    /// Number of registered accounts
    pub fn count(&self) -> usize {
        self.accounts.len()
    }

    /// All accounts, sorted by email
    pub fn all(&self) -> Vec<Account> {
        let mut accounts: Vec<Account> = self
            .accounts
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        accounts.sort_by(|a, b| a.email.cmp(&b.email));
        accounts
    }

    fn hash_password(&self, password: &str) -> Result<String, WalletError> {
        let salt = SaltString::generate(&mut OsRng);
        self.hasher
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| WalletError::hashing(&e.to_string()))
    }

    fn reserve_referral_code(&self, id: AccountId) -> String {
        loop {
            let candidate = Uuid::new_v4().simple().to_string()[..REFERRAL_CODE_LEN].to_uppercase();
            if let Entry::Vacant(slot) = self.by_referral_code.entry(candidate.clone()) {
                slot.insert(id);
                return candidate;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HashingConfig;
    use crate::core::LedgerStore;
    use rstest::rstest;
    use std::collections::HashSet;
    use std::thread;

    fn test_config() -> WalletConfig {
        WalletConfig {
            password_hashing: HashingConfig::minimal(),
            admin_emails: vec!["Admin@Example.com".to_string()],
            ..WalletConfig::default()
        }
    }

    fn directory() -> (AccountDirectory, Arc<LedgerStore>) {
        let ledger = Arc::new(LedgerStore::new());
        let directory = AccountDirectory::new(ledger.clone(), &test_config()).unwrap();
        (directory, ledger)
    }

    #[test]
    fn test_create_account_populates_record() {
        let (directory, ledger) = directory();

        let account = directory
            .create_account("  Alice@Example.com ", "secret", " Alice ", None)
            .unwrap();

        assert_eq!(account.email, "alice@example.com");
        assert_eq!(account.full_name, "Alice");
        assert_eq!(account.role, Role::Standard);
        assert_eq!(account.referred_by, None);
        assert_eq!(account.referral_code.len(), REFERRAL_CODE_LEN);
        assert!(account
            .referral_code
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
        assert!(ledger.snapshot(account.id).is_ok());
        assert_eq!(directory.count(), 1);
    }

    #[test]
    fn test_password_is_never_stored_in_plain_form() {
        let (directory, _ledger) = directory();

        let account = directory
            .create_account("alice@example.com", "secret", "Alice", None)
            .unwrap();

        assert_ne!(account.password_hash, "secret");
        assert!(account.password_hash.starts_with("$argon2id$"));
    }

    #[test]
    fn test_duplicate_email_is_rejected_case_insensitively() {
        let (directory, _ledger) = directory();
        directory
            .create_account("alice@example.com", "secret", "Alice", None)
            .unwrap();

        let result = directory.create_account("ALICE@example.com", "other", "Alice 2", None);

        assert_eq!(result, Err(WalletError::email_taken("alice@example.com")));
        assert_eq!(directory.count(), 1);
    }

    #[rstest]
    #[case::no_at("alice.example.com", "pw", "Alice")]
    #[case::no_domain_dot("alice@example", "pw", "Alice")]
    #[case::empty_local("@example.com", "pw", "Alice")]
    #[case::inner_space("al ice@example.com", "pw", "Alice")]
    #[case::empty_password("alice@example.com", "", "Alice")]
    #[case::blank_name("alice@example.com", "pw", "   ")]
    fn test_invalid_signup_input(#[case] email: &str, #[case] password: &str, #[case] name: &str) {
        let (directory, ledger) = directory();

        let result = directory.create_account(email, password, name, None);

        assert!(matches!(result, Err(WalletError::InvalidRequest { .. })));
        assert_eq!(directory.count(), 0);
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_admin_role_from_config() {
        let (directory, _ledger) = directory();

        let admin = directory
            .create_account("admin@example.com", "pw", "Admin", None)
            .unwrap();

        assert!(admin.is_admin());
    }

    #[test]
    fn test_authenticate_accepts_correct_password() {
        let (directory, _ledger) = directory();
        let created = directory
            .create_account("alice@example.com", "secret", "Alice", None)
            .unwrap();

        let account = directory.authenticate("Alice@Example.com", "secret").unwrap();

        assert_eq!(account.id, created.id);
    }

    #[rstest]
    #[case::wrong_password("alice@example.com", "wrong")]
    #[case::unknown_email("nobody@example.com", "secret")]
    fn test_authenticate_rejects(#[case] email: &str, #[case] password: &str) {
        let (directory, _ledger) = directory();
        directory
            .create_account("alice@example.com", "secret", "Alice", None)
            .unwrap();

        let result = directory.authenticate(email, password);

        assert_eq!(result, Err(WalletError::InvalidCredentials));
    }

    #[test]
    fn test_referral_codes_are_unique() {
        let (directory, _ledger) = directory();

        let codes: HashSet<String> = (0..20)
            .map(|i| {
                directory
                    .create_account(&format!("user{}@example.com", i), "pw", "User", None)
                    .unwrap()
                    .referral_code
            })
            .collect();

        assert_eq!(codes.len(), 20);
    }

    #[test]
    fn test_concurrent_signups_for_one_email_create_one_account() {
        let (directory, _ledger) = directory();
        let directory = Arc::new(directory);

        let handles: Vec<_> = (0..6)
            .map(|_| {
                let directory = Arc::clone(&directory);
                thread::spawn(move || {
                    directory
                        .create_account("race@example.com", "pw", "Racer", None)
                        .is_ok()
                })
            })
            .collect();
        let successes = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(|ok| *ok)
            .count();

        assert_eq!(successes, 1);
        assert_eq!(directory.count(), 1);
    }

    #[test]
    fn test_all_is_sorted_by_email() {
        let (directory, _ledger) = directory();
        for email in ["carol@example.com", "alice@example.com", "bob@example.com"] {
            directory.create_account(email, "pw", "User", None).unwrap();
        }

        let emails: Vec<String> = directory.all().into_iter().map(|a| a.email).collect();

        assert_eq!(
            emails,
            vec!["alice@example.com", "bob@example.com", "carol@example.com"]
        );
    }

    #[test]
    fn test_update_unknown_account() {
        let (directory, _ledger) = directory();
        let id = Uuid::new_v4();

        let result = directory.update(id, |_| Ok(()));

        assert_eq!(result, Err(WalletError::account_not_found(id)));
    }
}
