//! Backend adapters for the Pinhole URL store.
//!
//! Three interchangeable implementations of the
//! [`UrlStore`][pinhole_core::UrlStore] contract, selected at startup by
//! [`StorageConfig`]:
//!
//! - [`MemoryStore`] — hash indices behind one readers-writer lock, no
//!   persistence, deletion is physical removal.
//! - [`FileStore`] — the same indices plus an append-only JSON-lines
//!   durability log replayed on startup. Deletion is an in-memory
//!   tombstone; the log never records tombstones, so deletions do not
//!   survive a restart.
//! - [`PostgresStore`] — a relational table whose unique constraints
//!   supply the mutual exclusion the other backends implement with an
//!   in-process lock. Deletion is a soft-delete flag.

pub mod factory;
pub mod file;
pub mod memory;
pub mod postgres;

pub use factory::{create_store, StorageConfig};
pub use file::FileStore;
pub use memory::MemoryStore;
pub use postgres::PostgresStore;

pub use pinhole_core::{AddOutcome, Result, Stats, StoreError, UrlStore, UserUrl};
