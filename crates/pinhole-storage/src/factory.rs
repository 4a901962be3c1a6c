use crate::{FileStore, MemoryStore, PostgresStore};
use pinhole_core::{Result, UrlStore};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Backend selection, resolved from CLI flags or environment before the
/// process starts serving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    /// Volatile in-memory store; hard deletes, nothing survives restart.
    InMemory,
    /// Append-only durability log at `path`, replayed on startup.
    File { path: PathBuf },
    /// PostgreSQL at `dsn`; the database owns durability and uniqueness.
    Postgres { dsn: String },
}

/// Builds the configured backend and hands it back as a shared trait
/// object. The store is constructed exactly once at process start and
/// passed by handle to every consumer; there is no global instance.
///
/// Startup failures (lock held by another process, unreachable database)
/// are returned as-is and are fatal to initialization.
pub async fn create_store(config: StorageConfig) -> Result<Arc<dyn UrlStore>> {
    match config {
        StorageConfig::InMemory => {
            info!(backend = "in-memory", "creating url store");
            Ok(Arc::new(MemoryStore::new()))
        }
        StorageConfig::File { path } => {
            info!(backend = "file", path = %path.display(), "creating url store");
            Ok(Arc::new(FileStore::open(path).await?))
        }
        StorageConfig::Postgres { dsn } => {
            info!(backend = "postgres", "creating url store");
            Ok(Arc::new(PostgresStore::connect(&dsn).await?))
        }
    }
}
