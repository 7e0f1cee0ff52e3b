//! Note CRUD and sharing.
//!
//! Every operation resolves the acting identity's `uid` to a persisted
//! user before touching a note; a missing owner is `NotFound`. Sharing
//! resolves both ends and rejects sharing a note back to its own owner.

pub mod handler;

use std::sync::Arc;

use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::store::{Note, NoteStore, ShareStore, User};
use crate::users::UserService;
use crate::{Error, Result};

/// Result body for a delete.
#[derive(Debug, Serialize)]
pub struct DeleteOutcome {
    /// Number of rows marked deleted (0 or 1)
    pub affected: u64,
}

/// Result body for a share.
#[derive(Debug, Serialize)]
pub struct ShareOutcome {
    /// Human-readable confirmation
    pub message: String,
}

/// Orchestrates note persistence with ownership checks.
#[derive(Clone)]
pub struct NoteService {
    notes: Arc<dyn NoteStore>,
    shares: Arc<dyn ShareStore>,
    users: UserService,
}

impl NoteService {
    /// Wire the service to its repositories.
    pub fn new(notes: Arc<dyn NoteStore>, shares: Arc<dyn ShareStore>, users: UserService) -> Self {
        Self {
            notes,
            shares,
            users,
        }
    }

    async fn resolve_owner(&self, owner_uid: &str) -> Result<User> {
        self.users
            .find_by_uid(owner_uid)
            .await?
            .ok_or_else(|| Error::NotFound("The requested user was not found".to_string()))
    }

    /// Create a note owned by `owner_uid`, returning the stored row.
    pub async fn create(&self, owner_uid: &str, note: String) -> Result<Note> {
        if note.trim().is_empty() {
            return Err(Error::Validation("Note body must not be empty".to_string()));
        }
        let owner = self.resolve_owner(owner_uid).await?;
        let uid = Uuid::new_v4().to_string();
        let stored = self.notes.insert(uid, note, owner.id).await?;
        info!(note_uid = %stored.uid, owner_uid = %owner.uid, "Note created");
        Ok(stored)
    }

    /// List `owner_uid`'s live notes, optionally filtered by `search`.
    pub async fn find_all(&self, owner_uid: &str, search: Option<&str>) -> Result<Vec<Note>> {
        let owner = self.resolve_owner(owner_uid).await?;
        self.notes.find_by_owner(owner.id, search).await
    }

    /// Fetch a single note by its `uid`.
    pub async fn find_one(&self, uid: &str) -> Result<Note> {
        self.notes
            .find_by_uid(uid)
            .await?
            .ok_or_else(|| Error::NotFound("The requested note was not found".to_string()))
    }

    /// Replace the body of the note with the given `uid`.
    pub async fn update(&self, uid: &str, note: String) -> Result<Note> {
        if note.trim().is_empty() {
            return Err(Error::Validation("Note body must not be empty".to_string()));
        }
        self.notes
            .update(uid, note)
            .await?
            .ok_or_else(|| Error::NotFound("The requested note was not found".to_string()))
    }

    /// Soft-delete the note with the given `uid`.
    pub async fn remove(&self, uid: &str) -> Result<DeleteOutcome> {
        let affected = self.notes.soft_delete(uid).await?;
        if affected == 0 {
            return Err(Error::NotFound("The requested note was not found".to_string()));
        }
        info!(note_uid = %uid, "Note deleted");
        Ok(DeleteOutcome { affected })
    }

    /// Share the note `note_uid` from `from_uid` to `to_user_uid`.
    ///
    /// All three lookups run concurrently. Sharing a note back to its own
    /// owner is rejected as `NotAcceptable`, distinct from the `NotFound`
    /// raised for a missing note or user.
    pub async fn share(
        &self,
        from_uid: &str,
        note_uid: &str,
        to_user_uid: &str,
    ) -> Result<ShareOutcome> {
        let (note, to_user, from_user) = tokio::join!(
            self.notes.find_by_uid(note_uid),
            self.users.find_by_uid(to_user_uid),
            self.users.find_by_uid(from_uid),
        );

        let note =
            note?.ok_or_else(|| Error::NotFound("The requested note was not found".to_string()))?;
        let to_user = to_user?
            .ok_or_else(|| Error::NotFound("The requested user was not found".to_string()))?;
        let from_user = from_user?
            .ok_or_else(|| Error::NotFound("The requested user was not found".to_string()))?;

        if to_user.id == note.user_id {
            return Err(Error::NotAcceptable(
                "Cannot share a note with its owner".to_string(),
            ));
        }

        self.shares
            .insert(from_user.id, to_user.id, note.id)
            .await?;
        info!(
            note_uid = %note.uid,
            from_uid = %from_user.uid,
            to_uid = %to_user.uid,
            "Note shared"
        );

        Ok(ShareOutcome {
            message: format!("Note shared with {} successfully.", to_user.name),
        })
    }
}
