//! Token issuer — HS256 JWT signing and verification.
//!
//! Access tokens embed the session claims (`session_id`, `uid`, `email`,
//! `name`); a fresh `session_id` is minted per issuance so that revoking one
//! session never touches another login of the same user. When refresh tokens
//! are enabled, a second long-lived token with a `sub` claim is issued
//! alongside.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::store::User;
use crate::{Error, Result};

/// Clock-skew tolerance applied during verification, in seconds.
///
/// A token stays verifiable until `exp + LEEWAY_SECS`, so revocation TTLs
/// must cover the same window: a blacklist entry that died at `exp` would
/// let a logged-out token come back to life for the leeway's duration.
pub const LEEWAY_SECS: u64 = 60;

/// Decoded access-token claims — the session identity attached to every
/// authenticated request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Revocation key, unique per issuance
    pub session_id: String,
    /// Subject user's opaque identifier
    pub uid: String,
    /// Subject user's email
    pub email: String,
    /// Subject user's display name
    pub name: String,
    /// Issued-at (Unix epoch seconds)
    pub iat: u64,
    /// Expires-at (Unix epoch seconds)
    pub exp: u64,
}

impl Session {
    /// Seconds until this session stops verifying, leeway included.
    ///
    /// Verification accepts the token until `exp + LEEWAY_SECS`, so a
    /// revocation entry must live that long too. Negative once the leeway
    /// window has also elapsed.
    #[allow(clippy::cast_possible_wrap)]
    #[must_use]
    pub fn remaining_ttl(&self) -> i64 {
        (self.exp + LEEWAY_SECS) as i64 - now_epoch() as i64
    }
}

/// Refresh-token claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    /// Subject user's opaque identifier
    pub sub: String,
    /// Session this refresh token belongs to
    pub session_id: String,
    /// Issued-at (Unix epoch seconds)
    pub iat: u64,
    /// Expires-at (Unix epoch seconds)
    pub exp: u64,
}

/// Tokens minted for one session.
#[derive(Debug, Clone)]
pub struct IssuedTokens {
    /// The session id embedded in both tokens
    pub session_id: String,
    /// Signed access token
    pub access_token: String,
    /// Signed refresh token, when the refresh variant is enabled
    pub refresh_token: Option<String>,
}

/// Signs and verifies session tokens with a shared HS256 secret.
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
    refresh_enabled: bool,
}

impl TokenIssuer {
    /// Create an issuer from the resolved signing secret and TTLs.
    #[must_use]
    pub fn new(
        secret: &str,
        access_ttl: Duration,
        refresh_ttl: Duration,
        refresh_enabled: bool,
    ) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl,
            refresh_ttl,
            refresh_enabled,
        }
    }

    /// Mint tokens for `user` with a fresh `session_id`.
    ///
    /// Pure beyond signing: no store or cache is touched.
    pub fn issue(&self, user: &User) -> Result<IssuedTokens> {
        let session_id = uuid::Uuid::new_v4().to_string();
        let now = now_epoch();

        let claims = Session {
            session_id: session_id.clone(),
            uid: user.uid.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            iat: now,
            exp: now + self.access_ttl.as_secs(),
        };
        let access_token = jsonwebtoken::encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| Error::Internal(format!("token signing failed: {e}")))?;

        let refresh_token = if self.refresh_enabled {
            let refresh = RefreshClaims {
                sub: user.uid.clone(),
                session_id: session_id.clone(),
                iat: now,
                exp: now + self.refresh_ttl.as_secs(),
            };
            Some(
                jsonwebtoken::encode(&Header::default(), &refresh, &self.encoding)
                    .map_err(|e| Error::Internal(format!("token signing failed: {e}")))?,
            )
        } else {
            None
        };

        Ok(IssuedTokens {
            session_id,
            access_token,
            refresh_token,
        })
    }

    /// Verify signature and expiry of an access token; returns the decoded
    /// session.
    ///
    /// Malformed, expired, and bad-signature tokens all collapse to
    /// `Unauthenticated` — the caller never learns which.
    pub fn verify(&self, token: &str) -> Result<Session> {
        let validation = build_validation();
        jsonwebtoken::decode::<Session>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|_| Error::Unauthenticated("Invalid or expired token".to_string()))
    }

    /// `true` when the refresh variant is enabled.
    #[must_use]
    pub fn refresh_enabled(&self) -> bool {
        self.refresh_enabled
    }

    /// Verify a refresh token.
    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims> {
        let validation = build_validation();
        jsonwebtoken::decode::<RefreshClaims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|_| Error::Unauthenticated("Invalid or expired token".to_string()))
    }
}

fn build_validation() -> Validation {
    let mut v = Validation::new(Algorithm::HS256);
    v.leeway = LEEWAY_SECS;
    v
}

/// Current Unix time in seconds.
#[must_use]
pub fn now_epoch() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs()
}
