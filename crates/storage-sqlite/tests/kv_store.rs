//! Integration tests for the SQLite key-value store.

use bookshelf_core::constants::RATES_STORAGE_KEY;
use bookshelf_core::fx::{ExchangeRateSet, RateCache};
use bookshelf_core::kv::KeyValueStore;
use bookshelf_storage_sqlite::db::{self, write_actor};
use bookshelf_storage_sqlite::{SqliteKeyValueStore, StorageError};
use diesel::RunQueryDsl;
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

fn open_store(dir: &TempDir) -> (SqliteKeyValueStore, bookshelf_storage_sqlite::WriteHandle) {
    let db_path = db::init(dir.path().to_str().unwrap()).unwrap();
    let pool = db::create_pool(&db_path).unwrap();
    db::run_migrations(&pool).unwrap();
    let writer = write_actor::spawn_writer((*pool).clone());
    (SqliteKeyValueStore::new(pool, writer.clone()), writer)
}

#[tokio::test]
async fn test_set_get_overwrite_remove() {
    let dir = tempfile::tempdir().unwrap();
    let (store, _) = open_store(&dir);

    assert_eq!(store.get("selected_currency").unwrap(), None);
    assert!(!store.has_key("selected_currency").unwrap());

    store.set("selected_currency", json!("USD")).await.unwrap();
    assert_eq!(store.get("selected_currency").unwrap(), Some(json!("USD")));
    assert!(store.has_key("selected_currency").unwrap());

    store.set("selected_currency", json!("EUR")).await.unwrap();
    assert_eq!(store.get("selected_currency").unwrap(), Some(json!("EUR")));

    store.remove("selected_currency").await.unwrap();
    assert_eq!(store.get("selected_currency").unwrap(), None);

    // Removing an absent key is fine
    store.remove("selected_currency").await.unwrap();
}

#[tokio::test]
async fn test_clear_removes_everything() {
    let dir = tempfile::tempdir().unwrap();
    let (store, _) = open_store(&dir);

    store.set("a", json!({"nested": [1, 2]})).await.unwrap();
    store.set("b", json!(true)).await.unwrap();
    store.clear().await.unwrap();

    assert!(!store.has_key("a").unwrap());
    assert!(!store.has_key("b").unwrap());
}

#[tokio::test]
async fn test_invalid_json_reads_as_absent() {
    let dir = tempfile::tempdir().unwrap();
    let (store, writer) = open_store(&dir);

    writer
        .exec(|conn| {
            diesel::sql_query(
                "INSERT INTO app_storage (storage_key, storage_value) \
                 VALUES ('broken', '{not json')",
            )
            .execute(conn)
            .map_err(|e| StorageError::from(e).into())
        })
        .await
        .unwrap();

    assert_eq!(store.get("broken").unwrap(), None);
    assert!(!store.has_key("broken").unwrap());
}

#[tokio::test]
async fn test_values_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let (store, _) = open_store(&dir);
        store.set("k", json!({"x": 1})).await.unwrap();
    }
    let (store, _) = open_store(&dir);
    assert_eq!(store.get("k").unwrap(), Some(json!({"x": 1})));
}

#[tokio::test]
async fn test_rate_cache_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let (store, _) = open_store(&dir);
    let store: Arc<dyn KeyValueStore> = Arc::new(store);
    let cache = RateCache::new(store.clone(), "TRY");

    let rates = ExchangeRateSet::new(
        "TRY",
        vec![("USD", "0.0312".parse().unwrap())],
        Some(chrono::Utc::now()),
    )
    .unwrap();
    cache.save(&rates).await.unwrap();

    assert!(store.has_key(RATES_STORAGE_KEY).unwrap());
    assert_eq!(cache.load().unwrap(), Some(rates));
}
