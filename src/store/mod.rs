//! Persistence layer — records and repository traits.
//!
//! The service treats storage as a set of narrow repository interfaces
//! ([`UserStore`], [`NoteStore`], [`ShareStore`]); the only current
//! implementation is the `DashMap`-backed [`memory`] module. Deletes are
//! soft: rows get a `deleted_at` timestamp and every lookup skips them.
//!
//! Record creation side effects (assigning a `uid`, hashing a password) are
//! performed by explicit pre-save transformations in the service layer, never
//! by the store itself.

pub mod memory;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Result;

pub use memory::{InMemoryNoteStore, InMemoryShareStore, InMemoryUserStore};

/// User gender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    /// Male
    Male,
    /// Female
    Female,
    /// Not specified
    #[default]
    Unspecified,
}

/// A persisted user row.
///
/// `password` holds the argon2 PHC hash, never plaintext. The hash must not
/// leave the auth boundary; outward representations go through
/// [`PublicUser`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Internal row id
    pub id: u64,
    /// Opaque external identifier (UUID v4), used in URLs and token claims
    pub uid: String,
    /// Display name
    pub name: String,
    /// Unique email
    pub email: String,
    /// Argon2 PHC password hash
    pub password: String,
    /// Gender
    pub gender: Gender,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker; `Some` means the row is deleted
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Outward-facing user representation.
///
/// Built by a dedicated constructor that never reads the password field —
/// there is no generic "strip sensitive keys" filter anywhere on the wire
/// path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublicUser {
    /// Opaque external identifier
    pub uid: String,
    /// Display name
    pub name: String,
    /// Email
    pub email: String,
    /// Gender
    pub gender: Gender,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            uid: user.uid.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            gender: user.gender,
            created_at: user.created_at,
        }
    }
}

/// Fields of a user about to be inserted.
///
/// Produced by the service layer's pre-save transformation: `uid` already
/// assigned, `password` already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Pre-assigned opaque identifier
    pub uid: String,
    /// Display name
    pub name: String,
    /// Unique email
    pub email: String,
    /// Argon2 PHC password hash
    pub password: String,
    /// Gender
    pub gender: Gender,
}

/// A persisted note row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    /// Internal row id
    pub id: u64,
    /// Opaque external identifier (UUID v4)
    pub uid: String,
    /// Note body
    pub note: String,
    /// Internal id of the owning user
    pub user_id: u64,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker
    pub deleted_at: Option<DateTime<Utc>>,
}

/// A persisted share row — note `note_id` shared by `from_user_id` with
/// `to_user_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Share {
    /// Internal row id
    pub id: u64,
    /// Sender's internal user id
    pub from_user_id: u64,
    /// Recipient's internal user id
    pub to_user_id: u64,
    /// Shared note's internal id
    pub note_id: u64,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Soft-delete marker
    pub deleted_at: Option<DateTime<Utc>>,
}

/// User repository.
///
/// Implementations must be `Send + Sync` because stores are shared across
/// async tasks. All lookups exclude soft-deleted rows.
#[async_trait::async_trait]
pub trait UserStore: Send + Sync + 'static {
    /// Insert a new user and return the stored row.
    ///
    /// Email uniqueness is checked by the caller before insertion.
    async fn insert(&self, user: NewUser) -> Result<User>;

    /// Look up a user by email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Look up a user by external `uid`.
    async fn find_by_uid(&self, uid: &str) -> Result<Option<User>>;

    /// List all live users.
    async fn find_all(&self) -> Result<Vec<User>>;
}

/// Note repository.
#[async_trait::async_trait]
pub trait NoteStore: Send + Sync + 'static {
    /// Insert a new note owned by `user_id` and return the stored row.
    async fn insert(&self, uid: String, note: String, user_id: u64) -> Result<Note>;

    /// Look up a note by external `uid`.
    async fn find_by_uid(&self, uid: &str) -> Result<Option<Note>>;

    /// List a user's live notes, optionally filtered by a substring of the
    /// note body.
    async fn find_by_owner(&self, user_id: u64, search: Option<&str>) -> Result<Vec<Note>>;

    /// Replace the body of the note with the given `uid`.
    async fn update(&self, uid: &str, note: String) -> Result<Option<Note>>;

    /// Soft-delete the note with the given `uid`.
    ///
    /// Returns the number of affected rows (0 or 1).
    async fn soft_delete(&self, uid: &str) -> Result<u64>;
}

/// Share repository.
#[async_trait::async_trait]
pub trait ShareStore: Send + Sync + 'static {
    /// Record a share and return the stored row.
    async fn insert(&self, from_user_id: u64, to_user_id: u64, note_id: u64) -> Result<Share>;
}
