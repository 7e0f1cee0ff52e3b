//! Revocation cache — TTL-keyed blacklist of logged-out session ids.
//!
//! Logout inserts the token's `session_id` with a TTL equal to the token's
//! remaining verifiable lifetime (expiry plus the verification leeway), so
//! an entry lives exactly as long as the token it blacklists can still pass
//! signature checks.
//! Entries are evicted lazily on lookup and swept by a background reaper.
//! The cache is best-effort and in-memory; it is not a durable audit log and
//! does not survive restart.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::debug;

/// A blacklist entry with TTL metadata.
struct RevokedEntry {
    revoked_at: Instant,
    ttl: Duration,
}

impl RevokedEntry {
    fn is_expired(&self) -> bool {
        self.revoked_at.elapsed() > self.ttl
    }
}

/// Thread-safe session blacklist with per-entry TTL.
///
/// Concurrent inserts of the same key are idempotent (a revoked session
/// stays revoked); different keys never conflict.
#[derive(Default)]
pub struct RevocationCache {
    entries: DashMap<String, RevokedEntry>,
    evictions: AtomicU64,
}

impl RevocationCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Blacklist `session_id` for `ttl_seconds`.
    ///
    /// A non-positive TTL is a no-op: the token is already past its natural
    /// expiry and signature verification rejects it without our help.
    pub fn insert(&self, session_id: &str, ttl_seconds: i64) {
        if ttl_seconds <= 0 {
            debug!(session_id = %session_id, "Token already expired, skipping blacklist");
            return;
        }
        #[allow(clippy::cast_sign_loss)]
        let ttl = Duration::from_secs(ttl_seconds as u64);
        self.entries.insert(
            session_id.to_string(),
            RevokedEntry {
                revoked_at: Instant::now(),
                ttl,
            },
        );
        debug!(session_id = %session_id, ttl_secs = ttl_seconds, "Session blacklisted");
    }

    /// `true` if `session_id` is currently revoked.
    ///
    /// A miss or an expired entry reads as not revoked; expired entries are
    /// evicted on access.
    pub fn is_revoked(&self, session_id: &str) -> bool {
        if let Some(entry) = self.entries.get(session_id) {
            if entry.is_expired() {
                drop(entry);
                self.entries.remove(session_id);
                self.evictions.fetch_add(1, Ordering::Relaxed);
                false
            } else {
                true
            }
        } else {
            false
        }
    }

    /// Current number of entries, including not-yet-evicted expired ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when the blacklist holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total entries evicted after expiry.
    #[must_use]
    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    /// Evict expired entries (background maintenance).
    pub fn evict_expired(&self) {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter_map(|entry| {
                if entry.value().is_expired() {
                    Some(entry.key().clone())
                } else {
                    None
                }
            })
            .collect();

        let count = expired.len();
        for key in expired {
            self.entries.remove(&key);
        }

        if count > 0 {
            self.evictions.fetch_add(count as u64, Ordering::Relaxed);
        }
    }
}

/// Spawn a background task that sweeps expired entries every `interval`.
///
/// The task exits when the `shutdown` receiver fires.
pub fn spawn_reaper(
    cache: Arc<RevocationCache>,
    interval: Duration,
    mut shutdown: tokio::sync::broadcast::Receiver<()>,
) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let before = cache.evictions();
                    cache.evict_expired();
                    let swept = cache.evictions() - before;
                    if swept > 0 {
                        debug!(count = swept, "Reaped expired blacklist entries");
                    }
                }
                _ = shutdown.recv() => {
                    debug!("Blacklist reaper shutting down");
                    break;
                }
            }
        }
    });
}
