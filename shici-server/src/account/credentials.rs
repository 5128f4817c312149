//! Session credentials: HS256-signed JWTs
//!
//! Tokens carry the user id and name, a random `jti` so two tokens issued in
//! the same second still differ, and `iat`/`nbf`/`exp`.

use super::types::IssuedCredential;
use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shici_common::{Error, Result};
use uuid::Uuid;

/// Payload stored in a token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub username: String,
    pub jti: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
}

impl Claims {
    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

/// Opaque issue/validate capability used by the account service
pub trait CredentialIssuer: Send + Sync {
    fn issue(&self, user_id: i64, username: &str) -> Result<IssuedCredential>;

    /// Signature, format and expiry check
    fn validate(&self, token: &str) -> Result<Claims>;

    /// Trailing interval before expiry in which a refresh is allowed
    fn refresh_window(&self) -> Duration;
}

#[derive(Clone)]
pub struct JwtIssuer {
    secret: String,
    ttl: Duration,
    refresh_window: Duration,
}

impl JwtIssuer {
    pub fn new(secret: impl Into<String>, ttl: Duration, refresh_window: Duration) -> Result<Self> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(Error::Config("JWT secret must not be empty".into()));
        }
        if ttl <= Duration::zero() || refresh_window < Duration::zero() {
            return Err(Error::Config("token lifetimes must be positive".into()));
        }
        Ok(Self {
            secret,
            ttl,
            refresh_window,
        })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token as if at `issued_at`
    pub fn issue_at(&self, user_id: i64, username: &str, issued_at: DateTime<Utc>) -> Result<IssuedCredential> {
        let expires_at = issued_at + self.ttl;
        let claims = Claims {
            user_id,
            username: username.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: issued_at.timestamp(),
            nbf: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| Error::Internal(format!("Failed to generate token: {}", e)))?;

        Ok(IssuedCredential { token, expires_at })
    }
}

impl CredentialIssuer for JwtIssuer {
    fn issue(&self, user_id: i64, username: &str) -> Result<IssuedCredential> {
        self.issue_at(user_id, username, Utc::now())
    }

    fn validate(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_nbf = true;

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|err| {
            let reason = match err.kind() {
                ErrorKind::ExpiredSignature => "token expired",
                ErrorKind::ImmatureSignature => "token not yet valid",
                ErrorKind::InvalidSignature => "invalid signature",
                ErrorKind::InvalidToken => "malformed token",
                _ => "token validation failed",
            };
            Error::InvalidToken(reason.into())
        })
    }

    fn refresh_window(&self) -> Duration {
        self.refresh_window
    }
}

/// Token from an `Authorization` header value ("Bearer <token>")
pub fn extract_bearer(header: Option<&str>) -> Option<&str> {
    let token = header?.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}
