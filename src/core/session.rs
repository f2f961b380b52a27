//! Signed session tokens
//!
//! A token is `base64url(claims) "." base64url(hmac_sha256(claims_b64))`.
//! Claims carry the account id, its email and an expiry in Unix seconds.
//! Tokens are stateless: verification only needs the signing key.

use crate::config::SessionConfig;
use crate::types::{Account, AccountId, WalletError};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::warn;

type HmacSha256 = Hmac<Sha256>;

/// Size of a generated signing key in bytes
const GENERATED_KEY_LEN: usize = 32;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: AccountId,
    email: String,
    exp: i64,
}

/// Issues and verifies session tokens
pub struct SessionIssuer {
    key: Vec<u8>,
    ttl: Duration,
}

impl std::fmt::Debug for SessionIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionIssuer")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl SessionIssuer {
    /// Build an issuer from configuration
    ///
    /// Without a configured secret a random key is generated, so tokens do
    /// not survive a restart.
    pub fn from_config(config: &SessionConfig) -> Self {
        let key = match &config.secret {
            Some(secret) if !secret.is_empty() => secret.as_bytes().to_vec(),
            _ => {
                warn!("no session secret configured, using a random per-process key");
                let mut key = vec![0u8; GENERATED_KEY_LEN];
                OsRng.fill_bytes(&mut key);
                key
            }
        };

        Self {
            key,
            ttl: i64::try_from(config.ttl_secs)
                .ok()
                .and_then(Duration::try_seconds)
                .unwrap_or(Duration::MAX),
        }
    }

    pub fn issue(&self, account: &Account) -> Result<String, WalletError> {
        self.issue_at(account, Utc::now())
    }

    /// Issue a token as if the current time were `now`
    pub fn issue_at(&self, account: &Account, now: DateTime<Utc>) -> Result<String, WalletError> {
        let expires = now
            .checked_add_signed(self.ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let claims = Claims {
            sub: account.id,
            email: account.email.clone(),
            exp: expires.timestamp(),
        };

        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?);
        let signature = URL_SAFE_NO_PAD.encode(self.sign(payload.as_bytes())?.finalize().into_bytes());
        Ok(format!("{}.{}", payload, signature))
    }

    pub fn verify(&self, token: &str) -> Result<AccountId, WalletError> {
        self.verify_at(token, Utc::now())
    }

    /// Check signature and expiry, returning the token's account
    ///
    /// # Errors
    ///
    /// `Unauthorized` for malformed, tampered or expired tokens.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<AccountId, WalletError> {
        let (payload, signature) = token
            .trim()
            .split_once('.')
            .ok_or_else(|| WalletError::unauthorized("malformed token"))?;

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| WalletError::unauthorized("malformed token"))?;
        self.sign(payload.as_bytes())?
            .verify_slice(&signature)
            .map_err(|_| WalletError::unauthorized("invalid token signature"))?;

        let claims: Claims = URL_SAFE_NO_PAD
            .decode(payload)
            .ok()
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())
            .ok_or_else(|| WalletError::unauthorized("malformed token"))?;

        if claims.exp <= now.timestamp() {
            return Err(WalletError::unauthorized("token expired"));
        }

        Ok(claims.sub)
    }

    fn sign(&self, payload: &[u8]) -> Result<HmacSha256, WalletError> {
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| WalletError::config(&format!("session key: {}", e)))?;
        mac.update(payload);
        Ok(mac)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;
    use uuid::Uuid;

    fn issuer(secret: &str) -> SessionIssuer {
        SessionIssuer::from_config(&SessionConfig {
            secret: Some(secret.to_string()),
            ttl_secs: 3600,
        })
    }

    fn account() -> Account {
        Account {
            id: Uuid::new_v4(),
            email: "alice@example.com".to_string(),
            full_name: "Alice".to_string(),
            password_hash: String::new(),
            referral_code: "ABCDEF12".to_string(),
            referred_by: None,
            role: Role::Standard,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_issued_token_verifies() {
        let issuer = issuer("secret");
        let account = account();

        let token = issuer.issue(&account).unwrap();

        assert_eq!(issuer.verify(&token), Ok(account.id));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let issuer = issuer("secret");
        let now = Utc::now();
        let token = issuer.issue_at(&account(), now).unwrap();

        let result = issuer.verify_at(&token, now + Duration::seconds(3600));

        assert_eq!(result, Err(WalletError::unauthorized("token expired")));
    }

    #[test]
    fn test_token_from_other_key_is_rejected() {
        let token = issuer("one").issue(&account()).unwrap();

        let result = issuer("two").verify(&token);

        assert_eq!(result, Err(WalletError::unauthorized("invalid token signature")));
    }

    #[test]
    fn test_tampered_payload_is_rejected() {
        let issuer = issuer("secret");
        let token = issuer.issue(&account()).unwrap();
        let (_, signature) = token.split_once('.').unwrap();
        let forged_claims = Claims {
            sub: Uuid::new_v4(),
            email: "mallory@example.com".to_string(),
            exp: i64::MAX,
        };
        let forged = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged_claims).unwrap()),
            signature
        );

        assert!(matches!(issuer.verify(&forged), Err(WalletError::Unauthorized { .. })));
    }

    #[test]
    fn test_garbage_is_rejected() {
        let issuer = issuer("secret");

        for token in ["", "abc", "abc.def", "..."] {
            assert!(matches!(issuer.verify(token), Err(WalletError::Unauthorized { .. })));
        }
    }

    #[test]
    fn test_generated_key_still_round_trips() {
        let issuer = SessionIssuer::from_config(&SessionConfig::default());
        let account = account();

        let token = issuer.issue(&account).unwrap();

        assert_eq!(issuer.verify(&token), Ok(account.id));
    }
}
