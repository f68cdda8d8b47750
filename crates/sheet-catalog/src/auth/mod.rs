//! Bearer token verification
//!
//! Tokens have the form `v1.<payload>.<signature>`: the payload is base64url
//! JSON claims, the signature is HMAC-SHA256 over the encoded payload.
//! Issuing tokens is an operator task (`sheet-catalog issue-token`).

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

#[cfg(test)]
use mockall::automock;

type HmacSha256 = Hmac<Sha256>;

const TOKEN_VERSION_V1: &str = "v1";
const MAX_TOKEN_LEN: usize = 2048;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Missing bearer token")]
    MissingToken,

    #[error("Malformed token: {0}")]
    Malformed(String),

    #[error("Unsupported token version '{0}'")]
    UnsupportedVersion(String),

    #[error("Token signature mismatch")]
    InvalidSignature,

    #[error("Token expired at {0}")]
    Expired(DateTime<Utc>),

    #[error("Signing key error: {0}")]
    Key(String),
}

/// Who a verified token was issued to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub subject: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: i64,
}

/// Checks bearer tokens on mutating requests
#[cfg_attr(test, automock)]
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<Identity, AuthError>;
}

/// HMAC-SHA256 signed tokens with an expiry claim
#[derive(Clone)]
pub struct HmacTokenVerifier {
    secret: Vec<u8>,
    ttl: Duration,
}

impl std::fmt::Debug for HmacTokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacTokenVerifier")
            .field("secret", &"<redacted>")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl HmacTokenVerifier {
    pub fn new(secret: impl Into<Vec<u8>>, ttl: Duration) -> Result<Self, AuthError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(AuthError::Key("token secret cannot be empty".to_string()));
        }
        Ok(Self { secret, ttl })
    }

    fn mac(&self) -> Result<HmacSha256, AuthError> {
        HmacSha256::new_from_slice(&self.secret).map_err(|e| AuthError::Key(e.to_string()))
    }

    /// Issue a token for `subject` valid for the configured TTL
    pub fn issue(&self, subject: &str) -> Result<String, AuthError> {
        self.issue_at(subject, Utc::now())
    }

    pub fn issue_at(&self, subject: &str, now: DateTime<Utc>) -> Result<String, AuthError> {
        let ttl = chrono::Duration::from_std(self.ttl)
            .map_err(|e| AuthError::Key(format!("token ttl out of range: {e}")))?;
        let claims = Claims {
            sub: subject.to_string(),
            exp: (now + ttl).timestamp(),
        };
        let payload_bytes =
            serde_json::to_vec(&claims).map_err(|e| AuthError::Malformed(e.to_string()))?;
        let payload_part = URL_SAFE_NO_PAD.encode(payload_bytes);

        let mut mac = self.mac()?;
        mac.update(payload_part.as_bytes());
        let sig_part = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{TOKEN_VERSION_V1}.{payload_part}.{sig_part}"))
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Identity, AuthError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }
        if token.len() > MAX_TOKEN_LEN {
            return Err(AuthError::Malformed("token exceeds max length".to_string()));
        }

        let mut parts = token.split('.');
        let (Some(version), Some(payload_part), Some(sig_part), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(AuthError::Malformed(
                "expected version.payload.signature".to_string(),
            ));
        };
        if version != TOKEN_VERSION_V1 {
            return Err(AuthError::UnsupportedVersion(version.to_string()));
        }

        let signature = URL_SAFE_NO_PAD
            .decode(sig_part)
            .map_err(|e| AuthError::Malformed(e.to_string()))?;
        let mut mac = self.mac()?;
        mac.update(payload_part.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| AuthError::InvalidSignature)?;

        let payload_bytes = URL_SAFE_NO_PAD
            .decode(payload_part)
            .map_err(|e| AuthError::Malformed(e.to_string()))?;
        let claims: Claims = serde_json::from_slice(&payload_bytes)
            .map_err(|e| AuthError::Malformed(e.to_string()))?;

        let expires_at = DateTime::<Utc>::from_timestamp(claims.exp, 0)
            .ok_or_else(|| AuthError::Malformed("expiry out of range".to_string()))?;
        if expires_at <= now {
            return Err(AuthError::Expired(expires_at));
        }

        Ok(Identity {
            subject: claims.sub,
            expires_at,
        })
    }
}

impl TokenVerifier for HmacTokenVerifier {
    fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        self.verify_at(token, Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn verifier(secret: &str) -> HmacTokenVerifier {
        HmacTokenVerifier::new(secret.as_bytes(), Duration::from_secs(3600)).unwrap()
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_issued_token_verifies() {
        let verifier = verifier("s3cret");
        let token = verifier.issue_at("librarian", noon()).unwrap();
        assert!(token.starts_with("v1."));

        let identity = verifier
            .verify_at(&token, noon() + chrono::Duration::minutes(59))
            .unwrap();
        assert_eq!(identity.subject, "librarian");
        assert_eq!(identity.expires_at, noon() + chrono::Duration::hours(1));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let verifier = verifier("s3cret");
        let token = verifier.issue_at("librarian", noon()).unwrap();
        assert!(matches!(
            verifier.verify_at(&token, noon() + chrono::Duration::hours(2)),
            Err(AuthError::Expired(_))
        ));
    }

    #[test]
    fn test_foreign_signature_is_rejected() {
        let token = verifier("other").issue_at("mallory", noon()).unwrap();
        assert_eq!(
            verifier("s3cret").verify_at(&token, noon()),
            Err(AuthError::InvalidSignature)
        );
    }

    #[test]
    fn test_tampered_payload_is_rejected() {
        let verifier = verifier("s3cret");
        let token = verifier.issue_at("librarian", noon()).unwrap();
        let parts: Vec<&str> = token.split('.').collect();
        let forged_payload = URL_SAFE_NO_PAD.encode(br#"{"sub":"admin","exp":99999999999}"#);
        let forged = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);

        assert_eq!(
            verifier.verify_at(&forged, noon()),
            Err(AuthError::InvalidSignature)
        );
    }

    #[test]
    fn test_malformed_tokens() {
        let verifier = verifier("s3cret");
        assert_eq!(verifier.verify_at("", noon()), Err(AuthError::MissingToken));
        assert!(matches!(
            verifier.verify_at("not-a-token", noon()),
            Err(AuthError::Malformed(_))
        ));
        assert!(matches!(
            verifier.verify_at("v2.a.b", noon()),
            Err(AuthError::UnsupportedVersion(_))
        ));
        assert!(matches!(
            verifier.verify_at("v1.a.b.c", noon()),
            Err(AuthError::Malformed(_))
        ));
    }

    #[test]
    fn test_empty_secret_is_refused() {
        assert!(HmacTokenVerifier::new(Vec::<u8>::new(), Duration::from_secs(60)).is_err());
    }
}
