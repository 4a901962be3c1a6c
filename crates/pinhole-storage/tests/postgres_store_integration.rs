use std::time::Duration;

use pinhole_storage::{PostgresStore, Stats, StoreError, UrlStore};
use pinhole_test_infra::{PostgresConfig, PostgresServer};
use sqlx::postgres::PgPoolOptions;

struct Fixture {
    _postgres: PostgresServer,
    store: PostgresStore,
}

impl Fixture {
    async fn start() -> Self {
        let postgres = PostgresServer::new(PostgresConfig::builder().build())
            .await
            .expect("start postgres");
        let url = postgres.database_url().await.expect("postgres url");
        let pool = connect_with_retry(&url).await;

        sqlx::raw_sql(include_str!("ddl/postgres/urls.sql"))
            .execute(&pool)
            .await
            .expect("create schema");

        Self {
            _postgres: postgres,
            store: PostgresStore::new(pool),
        }
    }
}

async fn connect_with_retry(url: &str) -> sqlx::PgPool {
    let mut last_error = None;

    for _ in 0..20 {
        match PgPoolOptions::new().max_connections(5).connect(url).await {
            Ok(pool) => return pool,
            Err(err) => {
                last_error = Some(err);
                tokio::time::sleep(Duration::from_millis(500)).await;
            }
        }
    }

    panic!("failed to connect postgres: {last_error:?}");
}

#[tokio::test]
async fn add_get_and_reverse_lookup() {
    let fixture = Fixture::start().await;
    let store = &fixture.store;

    let outcome = store
        .add_for_user("abc12345", "https://example.com", "user-1")
        .await
        .unwrap();
    assert_eq!(outcome.short_id, "abc12345");
    assert!(!outcome.existed);

    assert_eq!(
        store.get("abc12345").await.unwrap().as_deref(),
        Some("https://example.com")
    );
    assert_eq!(
        store
            .find_by_original_url("https://example.com")
            .await
            .unwrap()
            .as_deref(),
        Some("abc12345")
    );
    assert!(store.get("missing1").await.unwrap().is_none());
}

#[tokio::test]
async fn repeated_url_returns_existing_mapping() {
    let fixture = Fixture::start().await;
    let store = &fixture.store;

    store
        .add_for_user("abc12345", "https://example.com", "user-1")
        .await
        .unwrap();

    let outcome = store
        .add_for_user("ignored", "https://example.com", "user-2")
        .await
        .unwrap();
    assert_eq!(outcome.short_id, "abc12345");
    assert!(outcome.existed);

    // The losing id was never inserted.
    assert!(store.get("ignored").await.unwrap().is_none());
}

#[tokio::test]
async fn short_id_collision_is_a_conflict() {
    let fixture = Fixture::start().await;
    let store = &fixture.store;

    store
        .add_for_user("abc12345", "https://example.com/a", "user-1")
        .await
        .unwrap();

    let err = store
        .add_for_user("abc12345", "https://example.com/b", "user-1")
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)));
}

#[tokio::test]
async fn soft_delete_lifecycle() {
    let fixture = Fixture::start().await;
    let store = &fixture.store;

    store
        .add_for_user("abc12345", "https://example.com", "user-1")
        .await
        .unwrap();

    // Owner-scoped: another user's delete is silently skipped.
    store
        .delete_for_user("user-2", &["abc12345".to_owned()])
        .await
        .unwrap();
    assert!(store.get("abc12345").await.unwrap().is_some());
    assert!(!store.is_deleted("abc12345").await.unwrap());

    store
        .delete_for_user("user-1", &["abc12345".to_owned()])
        .await
        .unwrap();
    assert!(store.get("abc12345").await.unwrap().is_none());
    assert!(store.is_deleted("abc12345").await.unwrap());

    // Monotonic: deleting again changes nothing.
    store
        .delete_for_user("user-1", &["abc12345".to_owned()])
        .await
        .unwrap();
    assert!(store.is_deleted("abc12345").await.unwrap());

    // The tombstoned URL may be shortened again, but not under the old id.
    let outcome = store
        .add_for_user("id-00002", "https://example.com", "user-1")
        .await
        .unwrap();
    assert!(!outcome.existed);

    let err = store
        .add_for_user("abc12345", "https://example.com/other", "user-1")
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)));
}

#[tokio::test]
async fn urls_for_user_excludes_deleted_and_keeps_order() {
    let fixture = Fixture::start().await;
    let store = &fixture.store;

    for (id, url) in [
        ("id-00001", "https://example.com/1"),
        ("id-00002", "https://example.com/2"),
        ("id-00003", "https://example.com/3"),
    ] {
        store.add_for_user(id, url, "user-1").await.unwrap();
    }
    store
        .add_for_user("id-00004", "https://example.com/4", "user-2")
        .await
        .unwrap();

    store
        .delete_for_user("user-1", &["id-00002".to_owned()])
        .await
        .unwrap();

    let urls = store.urls_for_user("user-1").await.unwrap();
    let ids: Vec<&str> = urls.iter().map(|u| u.short_id.as_str()).collect();
    assert_eq!(ids, ["id-00001", "id-00003"]);

    assert!(store.urls_for_user("nobody").await.unwrap().is_empty());
}

#[tokio::test]
async fn stats_count_live_urls_and_distinct_users() {
    let fixture = Fixture::start().await;
    let store = &fixture.store;

    store
        .add_for_user("id-00001", "https://example.com/1", "user-1")
        .await
        .unwrap();
    store
        .add_for_user("id-00002", "https://example.com/2", "user-1")
        .await
        .unwrap();
    store
        .add_for_user("id-00003", "https://example.com/3", "user-2")
        .await
        .unwrap();

    assert_eq!(store.stats().await.unwrap(), Stats { urls: 3, users: 2 });

    store
        .delete_for_user("user-1", &["id-00001".to_owned()])
        .await
        .unwrap();

    // Tombstoned rows leave the url count but their owner still counts.
    assert_eq!(store.stats().await.unwrap(), Stats { urls: 2, users: 2 });
}
