use async_trait::async_trait;
use pinhole_core::{AddOutcome, Result, Stats, StoreError, UrlStore, UserUrl};
use sqlx::{PgPool, Row};

/// PostgreSQL implementation of the store contract.
///
/// Mutual exclusion comes from the database, not from in-process locks: a
/// partial unique index on `original_url` (live rows only) makes racing
/// inserts of the same URL resolve to exactly one winner, and the unique
/// constraint on `short_id` guarantees ids are never reused, tombstoned
/// rows included. A violation during insert is translated into the
/// conflict path by re-querying for the existing row, never by parsing
/// the error text.
///
/// Deletion is `SET is_deleted = TRUE` filtered by owner and id set; rows
/// are retained as tombstones.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a store from an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates a store by opening a new connection pool. Failure here is
    /// fatal to process startup; there is no internal retry.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self::new(pool))
    }

    /// Returns a reference to the underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn live_short_id(&self, original_url: &str) -> Result<Option<String>> {
        let row = sqlx::query(
            r#"
            SELECT short_id
            FROM urls
            WHERE original_url = $1
              AND NOT is_deleted
            LIMIT 1
            "#,
        )
        .bind(original_url)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(|row| row.try_get("short_id").map_err(map_sqlx_error))
            .transpose()
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(sqlx::error::DatabaseError::is_unique_violation)
}

fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StoreError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_) => StoreError::Corrupt(message),
        _ => StoreError::Query(message),
    }
}

#[async_trait]
impl UrlStore for PostgresStore {
    async fn add_for_user(
        &self,
        short_id: &str,
        original_url: &str,
        user_id: &str,
    ) -> Result<AddOutcome> {
        if let Some(existing) = self.live_short_id(original_url).await? {
            return Ok(AddOutcome {
                short_id: existing,
                existed: true,
            });
        }

        let result = sqlx::query(
            r#"
            INSERT INTO urls (short_id, original_url, user_id)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(short_id)
        .bind(original_url)
        .bind(user_id)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(AddOutcome {
                short_id: short_id.to_owned(),
                existed: false,
            }),
            Err(err) if is_unique_violation(&err) => {
                // Lost a race on original_url, or the proposed short id is
                // taken. Re-query to find out which.
                match self.live_short_id(original_url).await? {
                    Some(existing) => Ok(AddOutcome {
                        short_id: existing,
                        existed: true,
                    }),
                    None => Err(StoreError::Conflict(short_id.to_owned())),
                }
            }
            Err(err) => Err(map_sqlx_error(err)),
        }
    }

    async fn get(&self, short_id: &str) -> Result<Option<String>> {
        let row = sqlx::query(
            r#"
            SELECT original_url
            FROM urls
            WHERE short_id = $1
              AND NOT is_deleted
            LIMIT 1
            "#,
        )
        .bind(short_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(|row| row.try_get("original_url").map_err(map_sqlx_error))
            .transpose()
    }

    async fn is_deleted(&self, short_id: &str) -> Result<bool> {
        let row = sqlx::query(
            r#"
            SELECT is_deleted
            FROM urls
            WHERE short_id = $1
            LIMIT 1
            "#,
        )
        .bind(short_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        // A missing row is "not deleted", matching the other backends.
        let Some(row) = row else {
            return Ok(false);
        };
        row.try_get("is_deleted").map_err(map_sqlx_error)
    }

    async fn find_by_original_url(&self, original_url: &str) -> Result<Option<String>> {
        self.live_short_id(original_url).await
    }

    async fn urls_for_user(&self, user_id: &str) -> Result<Vec<UserUrl>> {
        let rows = sqlx::query(
            r#"
            SELECT short_id, original_url
            FROM urls
            WHERE user_id = $1
              AND NOT is_deleted
            ORDER BY id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter()
            .map(|row| {
                Ok(UserUrl {
                    short_id: row.try_get("short_id").map_err(map_sqlx_error)?,
                    original_url: row.try_get("original_url").map_err(map_sqlx_error)?,
                })
            })
            .collect()
    }

    async fn delete_for_user(&self, user_id: &str, short_ids: &[String]) -> Result<()> {
        if short_ids.is_empty() {
            return Ok(());
        }

        sqlx::query(
            r#"
            UPDATE urls
            SET is_deleted = TRUE
            WHERE user_id = $1
              AND short_id = ANY($2)
            "#,
        )
        .bind(user_id)
        .bind(short_ids)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn stats(&self) -> Result<Stats> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE NOT is_deleted) AS urls,
                COUNT(DISTINCT user_id) AS users
            FROM urls
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let urls: i64 = row.try_get("urls").map_err(map_sqlx_error)?;
        let users: i64 = row.try_get("users").map_err(map_sqlx_error)?;

        Ok(Stats {
            urls: urls as u64,
            users: users as u64,
        })
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}
