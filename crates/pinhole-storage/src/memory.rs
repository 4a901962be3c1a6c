use async_trait::async_trait;
use pinhole_core::{AddOutcome, Result, Stats, StoreError, UrlStore, UserUrl};
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct Record {
    original_url: String,
    user_id: String,
}

/// All three indices live in one struct so a single lock guards them
/// together. Cross-index consistency depends on that: the check-then-insert
/// in `add_for_user` must not race with another writer.
#[derive(Debug, Default)]
struct Inner {
    urls: HashMap<String, Record>,
    by_original: HashMap<String, String>,
    by_user: HashMap<String, Vec<String>>,
}

/// In-memory implementation of the store contract.
///
/// No persistence. Deletion physically removes the record from every
/// index, which keeps memory bounded but means a deleted id becomes
/// indistinguishable from one that never existed: `is_deleted` reports
/// `false` for it.
///
/// A single coarse readers-writer lock serializes writes against
/// everything; point lookups dominate the workload, so reads proceeding
/// concurrently is the only parallelism that matters here.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UrlStore for MemoryStore {
    async fn add_for_user(
        &self,
        short_id: &str,
        original_url: &str,
        user_id: &str,
    ) -> Result<AddOutcome> {
        let mut inner = self.inner.write().await;

        if let Some(existing) = inner.by_original.get(original_url) {
            return Ok(AddOutcome {
                short_id: existing.clone(),
                existed: true,
            });
        }

        if inner.urls.contains_key(short_id) {
            return Err(StoreError::Conflict(short_id.to_owned()));
        }

        inner.urls.insert(
            short_id.to_owned(),
            Record {
                original_url: original_url.to_owned(),
                user_id: user_id.to_owned(),
            },
        );
        inner
            .by_original
            .insert(original_url.to_owned(), short_id.to_owned());
        inner
            .by_user
            .entry(user_id.to_owned())
            .or_default()
            .push(short_id.to_owned());

        Ok(AddOutcome {
            short_id: short_id.to_owned(),
            existed: false,
        })
    }

    async fn get(&self, short_id: &str) -> Result<Option<String>> {
        let inner = self.inner.read().await;
        Ok(inner.urls.get(short_id).map(|r| r.original_url.clone()))
    }

    async fn is_deleted(&self, _short_id: &str) -> Result<bool> {
        // Hard deletes leave no tombstone behind.
        Ok(false)
    }

    async fn find_by_original_url(&self, original_url: &str) -> Result<Option<String>> {
        let inner = self.inner.read().await;
        Ok(inner.by_original.get(original_url).cloned())
    }

    async fn urls_for_user(&self, user_id: &str) -> Result<Vec<UserUrl>> {
        let inner = self.inner.read().await;

        let Some(ids) = inner.by_user.get(user_id) else {
            return Ok(Vec::new());
        };

        Ok(ids
            .iter()
            .filter_map(|id| {
                inner.urls.get(id).map(|r| UserUrl {
                    short_id: id.clone(),
                    original_url: r.original_url.clone(),
                })
            })
            .collect())
    }

    async fn delete_for_user(&self, user_id: &str, short_ids: &[String]) -> Result<()> {
        let mut inner = self.inner.write().await;

        for short_id in short_ids {
            let owned = inner
                .urls
                .get(short_id)
                .is_some_and(|r| r.user_id == user_id);
            if !owned {
                continue;
            }

            if let Some(record) = inner.urls.remove(short_id) {
                inner.by_original.remove(&record.original_url);
            }
            let now_empty = inner.by_user.get_mut(user_id).map(|ids| {
                ids.retain(|id| id != short_id);
                ids.is_empty()
            });
            if now_empty == Some(true) {
                inner.by_user.remove(user_id);
            }
        }

        Ok(())
    }

    async fn stats(&self) -> Result<Stats> {
        let inner = self.inner.read().await;
        Ok(Stats {
            urls: inner.urls.len() as u64,
            users: inner.by_user.len() as u64,
        })
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
