use async_trait::async_trait;
use pinhole_core::{AddOutcome, Result, Stats, StoreError, UrlStore, UserUrl};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Capacity of the durability-write queue. A full queue blocks the
/// inserting caller until the writer task frees a slot: bounded latency
/// cost instead of unbounded memory growth.
const WRITE_QUEUE_CAPACITY: usize = 256;

/// One line of the durability log: a single insertion, JSON-encoded and
/// newline-terminated. The log is append-only and records inserts only;
/// tombstones are never written, so deletions do not survive a restart.
#[derive(Debug, Serialize, Deserialize)]
struct LogEntry {
    /// Owner user id.
    uuid: String,
    /// Short id.
    short_url: String,
    original_url: String,
}

#[derive(Debug, Clone)]
struct Record {
    original_url: String,
    user_id: String,
    deleted: bool,
}

/// One lock guards all three indices; see `MemoryStore` for the
/// reasoning. `by_original` only points at live records, so a tombstoned
/// URL can be shortened again under a fresh id.
#[derive(Debug, Default)]
struct Inner {
    urls: HashMap<String, Record>,
    by_original: HashMap<String, String>,
    by_user: HashMap<String, Vec<String>>,
}

/// Holds the `<log>.lock` marker for the lifetime of the store. On Unix
/// the marker additionally carries an exclusive `flock`, so a stale
/// marker left by a crashed process does not block the next startup.
#[derive(Debug)]
struct LockMarker {
    path: PathBuf,
    #[cfg(unix)]
    _flock: nix::fcntl::Flock<std::fs::File>,
}

impl LockMarker {
    #[cfg(unix)]
    fn acquire(log_path: &Path) -> Result<Self> {
        use nix::fcntl::{Flock, FlockArg};

        let path = marker_path(log_path);
        let file = std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&path)?;

        let flock = Flock::lock(file, FlockArg::LockExclusiveNonblock).map_err(|(_, errno)| {
            StoreError::Unavailable(format!(
                "durability log {} is locked by another process: {errno}",
                log_path.display()
            ))
        })?;

        Ok(Self {
            path,
            _flock: flock,
        })
    }

    #[cfg(not(unix))]
    fn acquire(log_path: &Path) -> Result<Self> {
        let path = marker_path(log_path);
        match std::fs::OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(&path)
        {
            Ok(_) => Ok(Self { path }),
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                Err(StoreError::Unavailable(format!(
                    "durability log {} is locked by another process",
                    log_path.display()
                )))
            }
            Err(err) => Err(err.into()),
        }
    }
}

impl Drop for LockMarker {
    fn drop(&mut self) {
        // Marker removal is best-effort; the flock itself is released
        // when the file handle closes.
        let _ = std::fs::remove_file(&self.path);
    }
}

fn marker_path(log_path: &Path) -> PathBuf {
    let mut name = log_path.as_os_str().to_owned();
    name.push(".lock");
    PathBuf::from(name)
}

#[derive(Debug)]
struct Writer {
    handle: JoinHandle<()>,
    marker: LockMarker,
}

/// File-backed implementation of the store contract.
///
/// Runtime state is the same in-memory index set as [`MemoryStore`]; the
/// newline-delimited JSON log exists solely for crash recovery and is
/// replayed once at startup. Appends are funneled through a single writer
/// task fed by a bounded channel, so concurrent inserts never interleave
/// partial lines. Durability is eventual: a crash between the in-memory
/// insert and the flushed append loses that one record.
///
/// Deletion is an in-memory tombstone. The log stays insert-only, so a
/// restart resurrects tombstoned records — an accepted limitation of the
/// format, not something recovery tries to paper over.
///
/// [`MemoryStore`]: crate::MemoryStore
#[derive(Debug)]
pub struct FileStore {
    inner: RwLock<Inner>,
    tx: parking_lot::Mutex<Option<mpsc::Sender<LogEntry>>>,
    writer: Mutex<Option<Writer>>,
}

impl FileStore {
    /// Opens (or creates) the durability log at `path`, acquires the
    /// exclusive lock marker, and replays every valid line into memory.
    ///
    /// Fails with [`StoreError::Unavailable`] when another process holds
    /// the lock. Corrupt lines are skipped with a warning; partial
    /// corruption never prevents startup.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let marker = LockMarker::acquire(&path)?;
        let inner = replay(&path).await?;

        let file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        let (tx, rx) = mpsc::channel(WRITE_QUEUE_CAPACITY);
        let handle = tokio::spawn(run_writer(rx, file));

        Ok(Self {
            inner: RwLock::new(inner),
            tx: parking_lot::Mutex::new(Some(tx)),
            writer: Mutex::new(Some(Writer { handle, marker })),
        })
    }
}

async fn replay(path: &Path) -> Result<Inner> {
    let contents = match tokio::fs::read_to_string(path).await {
        Ok(contents) => contents,
        // A log that does not exist yet is an empty store.
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Inner::default()),
        Err(err) => return Err(err.into()),
    };

    let mut inner = Inner::default();
    let mut replayed = 0usize;

    for (idx, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        let entry: LogEntry = match serde_json::from_str(line) {
            Ok(entry) => entry,
            Err(err) => {
                warn!(
                    path = %path.display(),
                    line = idx + 1,
                    %err,
                    "skipping corrupt durability log line"
                );
                continue;
            }
        };

        // Short ids are never reused, so the first occurrence wins.
        if inner.urls.contains_key(&entry.short_url) {
            continue;
        }

        inner
            .by_original
            .insert(entry.original_url.clone(), entry.short_url.clone());
        inner
            .by_user
            .entry(entry.uuid.clone())
            .or_default()
            .push(entry.short_url.clone());
        inner.urls.insert(
            entry.short_url,
            Record {
                original_url: entry.original_url,
                user_id: entry.uuid,
                deleted: false,
            },
        );
        replayed += 1;
    }

    info!(path = %path.display(), records = replayed, "replayed durability log");
    Ok(inner)
}

async fn run_writer(mut rx: mpsc::Receiver<LogEntry>, file: tokio::fs::File) {
    let mut writer = tokio::io::BufWriter::new(file);

    while let Some(entry) = rx.recv().await {
        append_entry(&mut writer, &entry).await;

        // Drain whatever queued up behind the first entry before paying
        // for a flush.
        while let Ok(entry) = rx.try_recv() {
            append_entry(&mut writer, &entry).await;
        }

        if let Err(err) = writer.flush().await {
            error!(%err, "failed to flush durability log");
        }
    }

    // Channel closed: the store is shutting down. Flush what is left.
    if let Err(err) = writer.flush().await {
        error!(%err, "failed to flush durability log on shutdown");
    }
}

async fn append_entry(writer: &mut tokio::io::BufWriter<tokio::fs::File>, entry: &LogEntry) {
    // The in-memory insert already happened and the caller may be gone;
    // an append failure can only be logged, not surfaced.
    let mut line = match serde_json::to_vec(entry) {
        Ok(line) => line,
        Err(err) => {
            error!(%err, short_id = %entry.short_url, "failed to encode durability log entry");
            return;
        }
    };
    line.push(b'\n');

    if let Err(err) = writer.write_all(&line).await {
        error!(%err, short_id = %entry.short_url, "failed to append durability log entry");
    }
}

#[async_trait]
impl UrlStore for FileStore {
    async fn add_for_user(
        &self,
        short_id: &str,
        original_url: &str,
        user_id: &str,
    ) -> Result<AddOutcome> {
        let Some(tx) = self.tx.lock().clone() else {
            return Err(StoreError::Unavailable("store is closed".to_owned()));
        };

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
                deleted: false,
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

        // Sending while the write guard is held keeps log order aligned
        // with insert order. A full queue blocks here until the writer
        // catches up.
        tx.send(LogEntry {
            uuid: user_id.to_owned(),
            short_url: short_id.to_owned(),
            original_url: original_url.to_owned(),
        })
        .await
        .map_err(|_| StoreError::Unavailable("durability writer stopped".to_owned()))?;

        Ok(AddOutcome {
            short_id: short_id.to_owned(),
            existed: false,
        })
    }

    async fn get(&self, short_id: &str) -> Result<Option<String>> {
        let inner = self.inner.read().await;
        Ok(inner
            .urls
            .get(short_id)
            .filter(|r| !r.deleted)
            .map(|r| r.original_url.clone()))
    }

    async fn is_deleted(&self, short_id: &str) -> Result<bool> {
        let inner = self.inner.read().await;
        Ok(inner.urls.get(short_id).is_some_and(|r| r.deleted))
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
                inner
                    .urls
                    .get(id)
                    .filter(|r| !r.deleted)
                    .map(|r| UserUrl {
                        short_id: id.clone(),
                        original_url: r.original_url.clone(),
                    })
            })
            .collect())
    }

    async fn delete_for_user(&self, user_id: &str, short_ids: &[String]) -> Result<()> {
        let mut inner = self.inner.write().await;

        for short_id in short_ids {
            let original_url = {
                let Some(record) = inner.urls.get_mut(short_id) else {
                    continue;
                };
                if record.user_id != user_id || record.deleted {
                    continue;
                }
                record.deleted = true;
                record.original_url.clone()
            };
            // The URL may be shortened again under a fresh id.
            inner.by_original.remove(&original_url);
        }

        Ok(())
    }

    async fn stats(&self) -> Result<Stats> {
        let inner = self.inner.read().await;
        Ok(Stats {
            urls: inner.urls.values().filter(|r| !r.deleted).count() as u64,
            users: inner.by_user.len() as u64,
        })
    }

    async fn close(&self) -> Result<()> {
        // Dropping the sender stops new writes; in-flight `add_for_user`
        // calls still hold clones and finish first.
        self.tx.lock().take();

        let Some(writer) = self.writer.lock().await.take() else {
            return Ok(());
        };

        writer
            .handle
            .await
            .map_err(|err| StoreError::Io(err.to_string()))?;
        drop(writer.marker);
        Ok(())
    }
}
