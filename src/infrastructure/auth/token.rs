//! Signed bearer tokens
//!
//! Tokens are HS256 JWTs carrying a kind, the subject (user id), the issue
//! time and an optional expiry. A token without `exp` never expires.

use std::fmt::Debug;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::DomainError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,

    #[error("token signature is invalid")]
    InvalidSignature,

    #[error("failed to sign token: {0}")]
    Signing(String),
}

impl From<TokenError> for DomainError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => DomainError::TokenExpired,
            TokenError::InvalidSignature => DomainError::InvalidSignature,
            TokenError::Signing(message) => DomainError::internal(message),
        }
    }
}

/// What a token may be used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    /// Short lived token handed out by login and refresh
    #[serde(rename = "sess")]
    Session,
    /// Personal access token without expiry
    #[serde(rename = "user")]
    User,
}

/// JWT claims structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub kind: TokenKind,
    /// Subject (user ID)
    pub sub: String,
    /// Issued at timestamp (Unix epoch)
    pub iat: i64,
    /// Expiration timestamp (Unix epoch), absent for unlimited tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

impl Claims {
    pub fn subject(&self) -> &str {
        &self.sub
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|exp| Utc.timestamp_opt(exp, 0).single())
    }

    /// Expired once `now` is past `exp`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.exp.is_some_and(|exp| now.timestamp() > exp)
    }
}

/// A freshly signed token as handed to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssuedToken {
    pub token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Issues and verifies tokens with one shared secret
#[derive(Clone)]
pub struct TokenService {
    session_ttl: Duration,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("session_ttl", &self.session_ttl)
            .field("encoding_key", &"[hidden]")
            .field("decoding_key", &"[hidden]")
            .finish()
    }
}

impl TokenService {
    /// `secret` is used as raw bytes; a zero `session_ttl` makes sessions unlimited
    pub fn new(secret: impl AsRef<[u8]>, session_ttl: Duration) -> Self {
        let secret = secret.as_ref();

        // Expiry is optional, so the library's exp handling is replaced by our own check
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        Self {
            session_ttl,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    /// Sign a token for `subject`; a zero `ttl` never expires
    pub fn issue(
        &self,
        kind: TokenKind,
        subject: &str,
        ttl: Duration,
    ) -> Result<IssuedToken, TokenError> {
        self.issue_at(kind, subject, ttl, Utc::now())
    }

    pub fn issue_session(&self, subject: &str) -> Result<IssuedToken, TokenError> {
        self.issue(TokenKind::Session, subject, self.session_ttl)
    }

    pub fn issue_unlimited(&self, subject: &str) -> Result<IssuedToken, TokenError> {
        self.issue(TokenKind::User, subject, Duration::ZERO)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify the signature, then the expiry relative to `now`
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|_| TokenError::InvalidSignature)?
            .claims;

        if claims.is_expired_at(now) {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    fn issue_at(
        &self,
        kind: TokenKind,
        subject: &str,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, TokenError> {
        let iat = now.timestamp();
        let exp = (!ttl.is_zero()).then(|| iat.saturating_add(ttl.as_secs().max(1) as i64));

        let claims = Claims {
            kind,
            sub: subject.to_string(),
            iat,
            exp,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))?;

        Ok(IssuedToken {
            token,
            expires_at: claims.expires_at(),
        })
    }
}
