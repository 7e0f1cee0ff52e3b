//! In-memory store implementations backed by `DashMap`.
//!
//! Rows are keyed by internal id; secondary lookups (email, `uid`) scan the
//! map, which is fine at this scale. Ids are handed out by per-store atomic
//! counters. Soft-deleted rows stay in the map and are filtered out of every
//! read path.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use dashmap::DashMap;

use super::{NewUser, Note, NoteStore, Share, ShareStore, User, UserStore};
use crate::Result;

/// In-memory user repository.
#[derive(Default)]
pub struct InMemoryUserStore {
    rows: DashMap<u64, User>,
    next_id: AtomicU64,
}

impl InMemoryUserStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl UserStore for InMemoryUserStore {
    async fn insert(&self, user: NewUser) -> Result<User> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let now = Utc::now();
        let row = User {
            id,
            uid: user.uid,
            name: user.name,
            email: user.email,
            password: user.password,
            gender: user.gender,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        self.rows.insert(id, row.clone());
        Ok(row)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .rows
            .iter()
            .find(|e| e.value().deleted_at.is_none() && e.value().email == email)
            .map(|e| e.value().clone()))
    }

    async fn find_by_uid(&self, uid: &str) -> Result<Option<User>> {
        Ok(self
            .rows
            .iter()
            .find(|e| e.value().deleted_at.is_none() && e.value().uid == uid)
            .map(|e| e.value().clone()))
    }

    async fn find_all(&self) -> Result<Vec<User>> {
        let mut users: Vec<User> = self
            .rows
            .iter()
            .filter(|e| e.value().deleted_at.is_none())
            .map(|e| e.value().clone())
            .collect();
        users.sort_by_key(|u| u.id);
        Ok(users)
    }
}

/// In-memory note repository.
#[derive(Default)]
pub struct InMemoryNoteStore {
    rows: DashMap<u64, Note>,
    next_id: AtomicU64,
}

impl InMemoryNoteStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl NoteStore for InMemoryNoteStore {
    async fn insert(&self, uid: String, note: String, user_id: u64) -> Result<Note> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let now = Utc::now();
        let row = Note {
            id,
            uid,
            note,
            user_id,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        self.rows.insert(id, row.clone());
        Ok(row)
    }

    async fn find_by_uid(&self, uid: &str) -> Result<Option<Note>> {
        Ok(self
            .rows
            .iter()
            .find(|e| e.value().deleted_at.is_none() && e.value().uid == uid)
            .map(|e| e.value().clone()))
    }

    async fn find_by_owner(&self, user_id: u64, search: Option<&str>) -> Result<Vec<Note>> {
        let mut notes: Vec<Note> = self
            .rows
            .iter()
            .filter(|e| {
                let n = e.value();
                n.deleted_at.is_none()
                    && n.user_id == user_id
                    && search.is_none_or(|s| n.note.contains(s))
            })
            .map(|e| e.value().clone())
            .collect();
        notes.sort_by_key(|n| n.id);
        Ok(notes)
    }

    async fn update(&self, uid: &str, note: String) -> Result<Option<Note>> {
        let id = self
            .rows
            .iter()
            .find(|e| e.value().deleted_at.is_none() && e.value().uid == uid)
            .map(|e| *e.key());

        let Some(id) = id else {
            return Ok(None);
        };

        let updated = self.rows.get_mut(&id).map(|mut e| {
            e.note = note;
            e.updated_at = Utc::now();
            e.clone()
        });
        Ok(updated)
    }

    async fn soft_delete(&self, uid: &str) -> Result<u64> {
        let id = self
            .rows
            .iter()
            .find(|e| e.value().deleted_at.is_none() && e.value().uid == uid)
            .map(|e| *e.key());

        let Some(id) = id else {
            return Ok(0);
        };

        if let Some(mut e) = self.rows.get_mut(&id) {
            e.deleted_at = Some(Utc::now());
            return Ok(1);
        }
        Ok(0)
    }
}

/// In-memory share repository.
#[derive(Default)]
pub struct InMemoryShareStore {
    rows: DashMap<u64, Share>,
    next_id: AtomicU64,
}

impl InMemoryShareStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded shares. Used by tests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// `true` when no shares have been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[async_trait::async_trait]
impl ShareStore for InMemoryShareStore {
    async fn insert(&self, from_user_id: u64, to_user_id: u64, note_id: u64) -> Result<Share> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let row = Share {
            id,
            from_user_id,
            to_user_id,
            note_id,
            created_at: Utc::now(),
            deleted_at: None,
        };
        self.rows.insert(id, row.clone());
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Gender;

    fn make_new_user(email: &str) -> NewUser {
        NewUser {
            uid: uuid::Uuid::new_v4().to_string(),
            name: "Test".to_string(),
            email: email.to_string(),
            password: "$argon2id$test".to_string(),
            gender: Gender::Unspecified,
        }
    }

    #[tokio::test]
    async fn insert_assigns_sequential_ids() {
        // GIVEN: an empty user store
        let store = InMemoryUserStore::new();

        // WHEN: two users are inserted
        let a = store.insert(make_new_user("a@x.com")).await.unwrap();
        let b = store.insert(make_new_user("b@x.com")).await.unwrap();

        // THEN: ids are sequential and both rows are live
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(store.find_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn find_by_email_matches_exactly() {
        let store = InMemoryUserStore::new();
        store.insert(make_new_user("a@x.com")).await.unwrap();

        assert!(store.find_by_email("a@x.com").await.unwrap().is_some());
        assert!(store.find_by_email("A@x.com").await.unwrap().is_none());
        assert!(store.find_by_email("b@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn soft_deleted_notes_disappear_from_lookups() {
        // GIVEN: one stored note
        let store = InMemoryNoteStore::new();
        let note = store
            .insert("n-1".to_string(), "hello".to_string(), 1)
            .await
            .unwrap();

        // WHEN: it is soft-deleted
        let affected = store.soft_delete(&note.uid).await.unwrap();

        // THEN: one row affected, and no lookup sees it anymore
        assert_eq!(affected, 1);
        assert!(store.find_by_uid(&note.uid).await.unwrap().is_none());
        assert!(store.find_by_owner(1, None).await.unwrap().is_empty());

        // Deleting again affects nothing
        assert_eq!(store.soft_delete(&note.uid).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn find_by_owner_filters_by_substring() {
        let store = InMemoryNoteStore::new();
        store
            .insert("n-1".to_string(), "grocery list".to_string(), 1)
            .await
            .unwrap();
        store
            .insert("n-2".to_string(), "meeting notes".to_string(), 1)
            .await
            .unwrap();
        store
            .insert("n-3".to_string(), "other user".to_string(), 2)
            .await
            .unwrap();

        let all = store.find_by_owner(1, None).await.unwrap();
        assert_eq!(all.len(), 2);

        let filtered = store.find_by_owner(1, Some("grocery")).await.unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].uid, "n-1");
    }

    #[tokio::test]
    async fn update_replaces_body_and_bumps_timestamp() {
        let store = InMemoryNoteStore::new();
        let note = store
            .insert("n-1".to_string(), "v1".to_string(), 1)
            .await
            .unwrap();

        let updated = store
            .update(&note.uid, "v2".to_string())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.note, "v2");
        assert!(updated.updated_at >= note.updated_at);

        assert!(store.update("missing", "x".to_string()).await.unwrap().is_none());
    }
}
