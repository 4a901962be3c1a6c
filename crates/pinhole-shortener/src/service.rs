use crate::deletion::DeletionQueue;
use crate::error::ShortenerError;
use pinhole_core::{Stats, UrlStore};
use pinhole_generator::Generator;
use std::sync::Arc;
use tracing::warn;

type Result<T> = std::result::Result<T, ShortenerError>;

/// Result of a create call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Created {
    pub short_id: String,
    pub short_url: String,
    /// True when the URL was already shortened; `short_id` is then the
    /// earlier mapping's id. Transports answer 409 / AlreadyExists.
    pub existed: bool,
}

/// A live URL owned by a user, with the public short URL built in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedUrl {
    pub short_id: String,
    pub short_url: String,
    pub original_url: String,
}

/// One entry of a batch create request. The correlation id is opaque to
/// the service and echoed back in the matching [`BatchResult`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchItem {
    pub correlation_id: String,
    pub original_url: String,
}

/// One entry of a batch create response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchResult {
    pub correlation_id: String,
    pub short_url: String,
}

/// Outcome of resolving a short id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Live record; redirect to the original URL.
    Found(String),
    /// The record existed but was deleted (HTTP 410).
    Gone,
    /// The id never existed (HTTP 404).
    NotFound,
}

/// Orchestrates a store backend and an id generator.
///
/// The store is constructed once at process start and shared by handle;
/// this service adds URL validation, short-URL building, and the
/// asynchronous deletion queue on top of the raw storage contract. The
/// generator does not check for collisions — a generated id that is
/// somehow taken surfaces as the store's conflict error and fails the
/// create.
pub struct ShortenerService<G> {
    store: Arc<dyn UrlStore>,
    generator: G,
    base_url: String,
    deletions: DeletionQueue,
}

impl<G: Generator> ShortenerService<G> {
    /// Creates a service over the given store. `base_url` is the public
    /// prefix short URLs are built from, without a trailing slash.
    pub fn new(store: Arc<dyn UrlStore>, generator: G, base_url: impl Into<String>) -> Self {
        let deletions = DeletionQueue::new(Arc::clone(&store));
        Self {
            store,
            generator,
            base_url: base_url.into(),
            deletions,
        }
    }

    /// Builds the full public URL for a short id.
    pub fn short_url(&self, short_id: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), short_id)
    }

    /// Shortens `original_url` for `user_id`, idempotently: a URL that
    /// already has a live mapping yields that mapping with
    /// `existed = true` instead of a new record.
    pub async fn create(&self, original_url: &str, user_id: &str) -> Result<Created> {
        let original_url = original_url.trim();
        validate_url(original_url)?;

        let token = self.generator.generate()?;
        let outcome = self
            .store
            .add_for_user(&token, original_url, user_id)
            .await?;

        Ok(Created {
            short_url: self.short_url(&outcome.short_id),
            short_id: outcome.short_id,
            existed: outcome.existed,
        })
    }

    /// Shortens a list of URLs in one call, correlating results to
    /// request items by caller-chosen ids.
    ///
    /// The batch is best-effort per item: an invalid URL, a failed id
    /// generation, or a store error skips that item (with a log line)
    /// instead of failing the rest. Items whose URL already has a live
    /// mapping get the existing short URL, same as [`create`].
    ///
    /// [`create`]: ShortenerService::create
    pub async fn create_batch(
        &self,
        items: Vec<BatchItem>,
        user_id: &str,
    ) -> Result<Vec<BatchResult>> {
        if items.is_empty() {
            return Err(ShortenerError::EmptyBatch);
        }

        let mut results = Vec::with_capacity(items.len());

        for item in items {
            match self.create(&item.original_url, user_id).await {
                Ok(created) => results.push(BatchResult {
                    correlation_id: item.correlation_id,
                    short_url: created.short_url,
                }),
                Err(err) => {
                    warn!(
                        correlation_id = %item.correlation_id,
                        %err,
                        "skipping batch item"
                    );
                }
            }
        }

        Ok(results)
    }

    /// Resolves a short id for redirecting. Deleted and never-existed
    /// ids are distinguished so transports can answer 410 vs 404.
    pub async fn resolve(&self, short_id: &str) -> Result<Resolution> {
        if let Some(original_url) = self.store.get(short_id).await? {
            return Ok(Resolution::Found(original_url));
        }

        if self.store.is_deleted(short_id).await? {
            return Ok(Resolution::Gone);
        }

        Ok(Resolution::NotFound)
    }

    /// Looks up the existing short URL for an original URL, if any.
    pub async fn find_existing(&self, original_url: &str) -> Result<Option<String>> {
        let found = self.store.find_by_original_url(original_url.trim()).await?;
        Ok(found.map(|id| self.short_url(&id)))
    }

    /// Lists the caller's live URLs, oldest first.
    pub async fn user_urls(&self, user_id: &str) -> Result<Vec<OwnedUrl>> {
        let urls = self.store.urls_for_user(user_id).await?;

        Ok(urls
            .into_iter()
            .map(|u| OwnedUrl {
                short_url: self.short_url(&u.short_id),
                short_id: u.short_id,
                original_url: u.original_url,
            })
            .collect())
    }

    /// Enqueues a best-effort deletion batch and returns immediately.
    pub fn delete_user_urls(&self, user_id: &str, short_ids: Vec<String>) -> Result<()> {
        if short_ids.is_empty() {
            return Err(ShortenerError::EmptyIdList);
        }

        self.deletions.submit(user_id, short_ids);
        Ok(())
    }

    /// Aggregate counts over the store's live contents.
    pub async fn stats(&self) -> Result<Stats> {
        Ok(self.store.stats().await?)
    }

    /// Drains the deletion queue, then flushes and closes the store.
    pub async fn shutdown(&self) -> Result<()> {
        self.deletions.shutdown().await;
        self.store.close().await?;
        Ok(())
    }
}

fn validate_url(url: &str) -> Result<()> {
    if url.is_empty() {
        return Err(ShortenerError::EmptyUrl);
    }

    let Some((scheme, rest)) = url.split_once("://") else {
        return Err(ShortenerError::InvalidUrl(format!(
            "missing scheme: {url}"
        )));
    };

    if rest.is_empty() {
        return Err(ShortenerError::InvalidUrl(format!("missing host: {url}")));
    }

    let scheme = scheme.to_ascii_lowercase();
    if scheme != "http" && scheme != "https" {
        return Err(ShortenerError::InvalidUrl(format!(
            "scheme must be http or https: {scheme}"
        )));
    }

    Ok(())
}
