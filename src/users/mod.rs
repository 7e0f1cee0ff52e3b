//! User service — lookups, listing, and the pre-save transformation that
//! assigns a `uid` and hashes the password before a row ever reaches the
//! store. The store itself performs no lifecycle magic.

pub mod handler;

use std::sync::Arc;

use crate::auth::password;
use crate::store::{Gender, NewUser, PublicUser, User, UserStore};
use crate::{Error, Result};

/// Explicit pre-save transformation for new users.
///
/// Assigns a fresh opaque `uid` and replaces the plaintext password with its
/// argon2 hash. Invoked by the creation path, never implicitly by storage.
pub fn prepare_for_insert(
    name: String,
    email: String,
    gender: Gender,
    plaintext_password: &str,
) -> Result<NewUser> {
    Ok(NewUser {
        uid: uuid::Uuid::new_v4().to_string(),
        name,
        email,
        password: password::hash(plaintext_password)?,
        gender,
    })
}

/// User lookups and creation over a [`UserStore`].
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
}

impl UserService {
    /// Create a service over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    /// Create a new user.
    ///
    /// Fails with `Conflict` if the email is already registered.
    pub async fn create(
        &self,
        name: String,
        email: String,
        gender: Gender,
        plaintext_password: &str,
    ) -> Result<User> {
        if self.store.find_by_email(&email).await?.is_some() {
            return Err(Error::Conflict("User already exists".to_string()));
        }
        let new_user = prepare_for_insert(name, email, gender, plaintext_password)?;
        let user = self.store.insert(new_user).await?;
        tracing::info!(uid = %user.uid, "User created");
        Ok(user)
    }

    /// Look up a user by email. `None` when absent or soft-deleted.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        self.store.find_by_email(email).await
    }

    /// Look up a user by external `uid`. `None` when absent or soft-deleted.
    pub async fn find_by_uid(&self, uid: &str) -> Result<Option<User>> {
        self.store.find_by_uid(uid).await
    }

    /// The acting identity's profile, password stripped.
    ///
    /// A verified session whose user row has vanished reads as `NotFound`.
    pub async fn profile(&self, uid: &str) -> Result<PublicUser> {
        let user = self
            .store
            .find_by_uid(uid)
            .await?
            .ok_or_else(|| Error::NotFound("The requested user was not found".to_string()))?;
        Ok(PublicUser::from(&user))
    }

    /// List all live users as public views.
    pub async fn list(&self) -> Result<Vec<PublicUser>> {
        let users = self.store.find_all().await?;
        Ok(users.iter().map(PublicUser::from).collect())
    }
}
