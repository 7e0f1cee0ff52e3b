//! Session authority — the authentication core.
//!
//! Orchestrates login, signup, logout, and the per-request revocation check
//! by composing four collaborators, each passed in explicitly at
//! construction:
//!
//! 1. the credential store ([`UserService`] over a `UserStore`),
//! 2. the password hasher ([`password`]),
//! 3. the token issuer ([`TokenIssuer`]),
//! 4. the revocation cache ([`RevocationCache`]).
//!
//! Ordering guarantee: tokens are only minted after credential verification
//! succeeds, and logout's blacklist write completes before success is
//! reported — a client told "logged out" holds a dead token, with no race
//! window.

pub mod blacklist;
pub mod gate;
pub mod handler;
pub mod password;
pub mod token;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::store::{Gender, PublicUser};
use crate::users::UserService;
use crate::{Error, Result};

pub use blacklist::{RevocationCache, spawn_reaper};
pub use gate::session_gate;
pub use token::{IssuedTokens, Session, TokenIssuer};

/// Successful login/signup payload: the identity (password stripped) plus
/// the signed token(s).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    /// The authenticated identity, public view
    pub user: PublicUser,
    /// Signed access token (1 day)
    pub access_token: String,
    /// Signed refresh token (30 days), present only in the refresh variant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

/// The authentication core: credential verification, token issuance, and
/// session revocation.
pub struct SessionAuthority {
    users: UserService,
    tokens: TokenIssuer,
    blacklist: Arc<RevocationCache>,
}

impl SessionAuthority {
    /// Compose the authority from its collaborators.
    #[must_use]
    pub fn new(users: UserService, tokens: TokenIssuer, blacklist: Arc<RevocationCache>) -> Self {
        Self {
            users,
            tokens,
            blacklist,
        }
    }

    /// Verify credentials and mint a fresh session.
    ///
    /// Unknown email and wrong password return the same `Unauthenticated`
    /// error; the response never reveals which emails are registered.
    pub async fn login(&self, email: &str, plaintext_password: &str) -> Result<AuthResponse> {
        let Some(user) = self.users.find_by_email(email).await? else {
            return Err(Error::bad_credentials());
        };
        if !password::verify(&user.password, plaintext_password) {
            return Err(Error::bad_credentials());
        }

        // Issuance strictly follows verification; tokens are never minted
        // speculatively.
        let issued = self.tokens.issue(&user)?;
        info!(uid = %user.uid, session_id = %issued.session_id, "Login");

        Ok(AuthResponse {
            user: PublicUser::from(&user),
            access_token: issued.access_token,
            refresh_token: issued.refresh_token,
        })
    }

    /// Register a new user and mint their first session.
    ///
    /// Fails with `Conflict` when the email is taken.
    pub async fn sign_up(
        &self,
        name: String,
        email: String,
        gender: Gender,
        plaintext_password: &str,
    ) -> Result<AuthResponse> {
        let user = self
            .users
            .create(name, email, gender, plaintext_password)
            .await?;

        let issued = self.tokens.issue(&user)?;
        info!(uid = %user.uid, session_id = %issued.session_id, "Signup");

        Ok(AuthResponse {
            user: PublicUser::from(&user),
            access_token: issued.access_token,
            refresh_token: issued.refresh_token,
        })
    }

    /// Exchange a refresh token for a fresh session.
    ///
    /// Only available in the refresh variant. The presented token's
    /// `session_id` is checked against the blacklist, so a logged-out
    /// session cannot refresh itself back to life; success mints a new
    /// session with its own `session_id`.
    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthResponse> {
        if !self.tokens.refresh_enabled() {
            return Err(Error::Unauthenticated(
                "Refresh tokens are not enabled".to_string(),
            ));
        }
        let claims = self.tokens.verify_refresh(refresh_token)?;
        if self.is_blacklisted(&claims.session_id) {
            return Err(Error::Unauthenticated(
                "Session has been logged out".to_string(),
            ));
        }
        let user = self
            .users
            .find_by_uid(&claims.sub)
            .await?
            .ok_or_else(Error::bad_credentials)?;

        let issued = self.tokens.issue(&user)?;
        info!(uid = %user.uid, session_id = %issued.session_id, "Session refreshed");

        Ok(AuthResponse {
            user: PublicUser::from(&user),
            access_token: issued.access_token,
            refresh_token: issued.refresh_token,
        })
    }

    /// Terminate a session: blacklist its id for the token's remaining
    /// lifetime.
    ///
    /// The cache write is awaited before returning, so a successful logout
    /// means the token is already dead. The TTL covers the verification
    /// leeway; only a session past expiry plus leeway writes nothing, and
    /// verification rejects that token on its own.
    pub async fn logout(&self, session: &Session) {
        let ttl = session.remaining_ttl();
        self.add_to_blacklist(&session.session_id, ttl);
        info!(uid = %session.uid, session_id = %session.session_id, "Logout");
    }

    /// Blacklist `session_id` for `ttl_seconds`; non-positive TTLs are
    /// dropped.
    pub fn add_to_blacklist(&self, session_id: &str, ttl_seconds: i64) {
        self.blacklist.insert(session_id, ttl_seconds);
    }

    /// `true` if the session has been explicitly revoked.
    #[must_use]
    pub fn is_blacklisted(&self, session_id: &str) -> bool {
        self.blacklist.is_revoked(session_id)
    }

    /// Handle to the revocation cache, for the background reaper.
    #[must_use]
    pub fn blacklist(&self) -> Arc<RevocationCache> {
        Arc::clone(&self.blacklist)
    }

    /// Verify an access token's signature and expiry, then check the
    /// blacklist. Returns the decoded session on success.
    pub fn verify_session(&self, token: &str) -> Result<Session> {
        let session = self.tokens.verify(token)?;
        if self.is_blacklisted(&session.session_id) {
            return Err(Error::Unauthenticated(
                "Session has been logged out".to_string(),
            ));
        }
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryUserStore;
    use std::time::Duration;

    fn make_authority() -> SessionAuthority {
        let users = UserService::new(Arc::new(InMemoryUserStore::new()));
        let tokens = TokenIssuer::new(
            "test-secret",
            Duration::from_secs(86_400),
            Duration::from_secs(2_592_000),
            false,
        );
        SessionAuthority::new(users, tokens, Arc::new(RevocationCache::new()))
    }

    async fn signed_up(authority: &SessionAuthority, email: &str) -> AuthResponse {
        authority
            .sign_up(
                "Alice".to_string(),
                email.to_string(),
                Gender::Female,
                "Asd123@",
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn signup_returns_token_for_the_new_user() {
        // GIVEN: a fresh email
        let authority = make_authority();

        // WHEN: signing up
        let response = signed_up(&authority, "alice@x.com").await;

        // THEN: the token decodes to the created user, password absent
        let session = authority.verify_session(&response.access_token).unwrap();
        assert_eq!(session.uid, response.user.uid);
        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("password"));
    }

    #[tokio::test]
    async fn login_with_correct_credentials_succeeds() {
        let authority = make_authority();
        let signup = signed_up(&authority, "alice@x.com").await;

        let login = authority.login("alice@x.com", "Asd123@").await.unwrap();
        let session = authority.verify_session(&login.access_token).unwrap();
        assert_eq!(session.uid, signup.user.uid);
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_are_indistinguishable() {
        // GIVEN: one registered user
        let authority = make_authority();
        signed_up(&authority, "alice@x.com").await;

        // WHEN: wrong password vs nonexistent email
        let wrong_pw = authority.login("alice@x.com", "nope").await.unwrap_err();
        let no_user = authority.login("ghost@x.com", "Asd123@").await.unwrap_err();

        // THEN: same kind, same message — no enumeration signal
        assert_eq!(wrong_pw.kind(), "unauthenticated");
        assert_eq!(wrong_pw.to_string(), no_user.to_string());
    }

    #[tokio::test]
    async fn logout_revokes_exactly_one_session() {
        // GIVEN: two concurrent sessions for the same user
        let authority = make_authority();
        signed_up(&authority, "alice@x.com").await;
        let a = authority.login("alice@x.com", "Asd123@").await.unwrap();
        let b = authority.login("alice@x.com", "Asd123@").await.unwrap();

        let session_a = authority.verify_session(&a.access_token).unwrap();
        let session_b = authority.verify_session(&b.access_token).unwrap();
        assert_ne!(session_a.session_id, session_b.session_id);

        // WHEN: session A logs out
        authority.logout(&session_a).await;

        // THEN: A is rejected, B still valid
        assert!(authority.verify_session(&a.access_token).is_err());
        assert!(authority.verify_session(&b.access_token).is_ok());
    }

    fn make_refresh_authority() -> SessionAuthority {
        let users = UserService::new(Arc::new(InMemoryUserStore::new()));
        let tokens = TokenIssuer::new(
            "test-secret",
            Duration::from_secs(86_400),
            Duration::from_secs(2_592_000),
            true,
        );
        SessionAuthority::new(users, tokens, Arc::new(RevocationCache::new()))
    }

    #[tokio::test]
    async fn refresh_mints_a_new_session() {
        // GIVEN: a signup in the refresh variant
        let authority = make_refresh_authority();
        let signup = signed_up(&authority, "alice@x.com").await;
        let refresh_token = signup.refresh_token.clone().unwrap();

        // WHEN: exchanging the refresh token
        let refreshed = authority.refresh(&refresh_token).await.unwrap();

        // THEN: a new, distinct session for the same user
        let old = authority.verify_session(&signup.access_token).unwrap();
        let new = authority.verify_session(&refreshed.access_token).unwrap();
        assert_eq!(new.uid, old.uid);
        assert_ne!(new.session_id, old.session_id);
        assert!(refreshed.refresh_token.is_some());
    }

    #[tokio::test]
    async fn logged_out_session_cannot_refresh() {
        // GIVEN: a session that has logged out
        let authority = make_refresh_authority();
        let signup = signed_up(&authority, "alice@x.com").await;
        let refresh_token = signup.refresh_token.clone().unwrap();
        let session = authority.verify_session(&signup.access_token).unwrap();
        authority.logout(&session).await;

        // WHEN: its refresh token is presented
        let result = authority.refresh(&refresh_token).await;

        // THEN: rejected; revocation covers the whole session, not just the
        // access token
        assert!(matches!(result, Err(Error::Unauthenticated(_))));
    }

    #[tokio::test]
    async fn refresh_is_rejected_when_disabled() {
        let authority = make_authority();
        let result = authority.refresh("any-token").await;
        assert!(matches!(result, Err(Error::Unauthenticated(_))));
    }

    #[tokio::test]
    async fn logout_inside_leeway_window_still_revokes() {
        // GIVEN: an issuer whose tokens expire immediately, leaving only the
        // clock-skew leeway as their verifiable lifetime
        let users = UserService::new(Arc::new(InMemoryUserStore::new()));
        let tokens = TokenIssuer::new(
            "test-secret",
            Duration::ZERO,
            Duration::ZERO,
            false,
        );
        let authority = SessionAuthority::new(users, tokens, Arc::new(RevocationCache::new()));
        let response = signed_up(&authority, "alice@x.com").await;

        // Sanity: the token verifies via leeway despite exp == iat
        let session = authority.verify_session(&response.access_token).unwrap();

        // WHEN: logging out while only the leeway window remains
        authority.logout(&session).await;

        // THEN: the blacklist entry covers the leeway and the token is dead
        assert!(authority.is_blacklisted(&session.session_id));
        assert!(authority.verify_session(&response.access_token).is_err());
    }

    #[tokio::test]
    async fn blacklist_round_trip_and_idempotence() {
        let authority = make_authority();

        assert!(!authority.is_blacklisted("sess-1"));
        authority.add_to_blacklist("sess-1", 60);
        assert!(authority.is_blacklisted("sess-1"));
        authority.add_to_blacklist("sess-1", 60);
        assert!(authority.is_blacklisted("sess-1"));
    }
}
