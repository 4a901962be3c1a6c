use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Result of an [`UrlStore::add_for_user`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddOutcome {
    /// The short id the original URL is reachable under. When `existed`
    /// is true this is the id of the earlier insertion, not the one the
    /// caller proposed.
    pub short_id: String,
    /// True when the original URL already had a live mapping. Transports
    /// turn this into HTTP 409 / gRPC `AlreadyExists`.
    pub existed: bool,
}

/// A short id / original URL pair owned by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserUrl {
    pub short_id: String,
    pub original_url: String,
}

/// Aggregate counts over the live contents of a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    /// Number of live (non-deleted) short URLs.
    pub urls: u64,
    /// Number of distinct users owning at least one URL.
    pub users: u64,
}

/// The storage contract implemented by every backend adapter.
///
/// All operations are safe for concurrent use. The in-memory and file
/// backends serialize writes under a single readers-writer lock guarding
/// every index at once; the relational backend delegates mutual exclusion
/// to the database's constraints and transactions. Either way, racing
/// inserts of the same `original_url` resolve so that exactly one wins
/// and the rest observe `existed = true`.
///
/// Record lifecycle is one-way: `nonexistent -> live -> deleted`. The
/// durable backends keep a tombstone; the in-memory backend removes the
/// record outright, so a hard-deleted id becomes indistinguishable from
/// one that never existed. No backend ever reuses a short id.
#[async_trait]
pub trait UrlStore: Send + Sync + 'static {
    /// Inserts `original_url` under `short_id`, owned by `user_id`.
    ///
    /// If the URL already has a live mapping, returns that mapping's id
    /// with `existed = true` and inserts nothing. Returns
    /// `Err(Conflict)` only when `short_id` itself is already taken by a
    /// different URL.
    async fn add_for_user(
        &self,
        short_id: &str,
        original_url: &str,
        user_id: &str,
    ) -> Result<AddOutcome>;

    /// Returns the original URL for `short_id`, or `None` when the id
    /// never existed or has been deleted. Callers that need to tell the
    /// two apart use [`is_deleted`][UrlStore::is_deleted].
    async fn get(&self, short_id: &str) -> Result<Option<String>>;

    /// True only for records that exist and carry a tombstone.
    async fn is_deleted(&self, short_id: &str) -> Result<bool>;

    /// Reverse lookup used for idempotent creation.
    async fn find_by_original_url(&self, original_url: &str) -> Result<Option<String>>;

    /// All live URLs owned by `user_id`, oldest first. Empty when the
    /// user owns nothing.
    async fn urls_for_user(&self, user_id: &str) -> Result<Vec<UserUrl>>;

    /// Best-effort bulk tombstone. Ids not owned by `user_id` are
    /// silently skipped; there is no per-id failure signaling.
    async fn delete_for_user(&self, user_id: &str, short_ids: &[String]) -> Result<()>;

    /// Counts live URLs and distinct users. Computed on demand, O(n) in
    /// live records.
    async fn stats(&self) -> Result<Stats>;

    /// Flushes pending writes and releases backend resources. Safe to
    /// call more than once.
    async fn close(&self) -> Result<()>;
}
