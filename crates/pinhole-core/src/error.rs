use thiserror::Error;

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors surfaced by a [`UrlStore`][crate::UrlStore] backend.
///
/// Lookup misses are not errors: `get` and `find_by_original_url` return
/// `Ok(None)` instead. `Conflict` covers only short-id collisions (the id
/// is already taken by a different URL); a repeated `original_url` is the
/// idempotent path and reported through
/// [`AddOutcome::existed`][crate::AddOutcome].
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("short id already taken: {0}")]
    Conflict(String),
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage query failed: {0}")]
    Query(String),
    #[error("storage i/o failed: {0}")]
    Io(String),
    #[error("stored data is invalid: {0}")]
    Corrupt(String),
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err.to_string())
    }
}
