use async_trait::async_trait;
use diesel::prelude::*;
use serde_json::Value;
use std::sync::Arc;

use super::model::AppStorageDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::app_storage::dsl::*;
use bookshelf_core::errors::Result;
use bookshelf_core::kv::KeyValueStore;

/// [`KeyValueStore`] backed by the `app_storage` table.
///
/// Reads go through the pool; writes are serialized through the writer actor.
pub struct SqliteKeyValueStore {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl SqliteKeyValueStore {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        SqliteKeyValueStore { pool, writer }
    }

    /// Raw stored text for `key`.
    fn get_raw(&self, key: &str) -> Result<Option<String>> {
        let mut conn = get_connection(&self.pool)?;
        let raw = app_storage
            .filter(storage_key.eq(key))
            .select(storage_value)
            .first::<String>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(raw)
    }
}

#[async_trait]
impl KeyValueStore for SqliteKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let Some(raw) = self.get_raw(key)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(parsed) => Ok(Some(parsed)),
            Err(e) => {
                log::warn!("Stored value for '{}' is not valid JSON: {}", key, e);
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let row = AppStorageDB {
            storage_key: key.to_string(),
            storage_value: serde_json::to_string(&value)?,
        };
        self.writer
            .exec(move |conn| {
                diesel::replace_into(app_storage)
                    .values(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let key = key.to_string();
        self.writer
            .exec(move |conn| {
                diesel::delete(app_storage.filter(storage_key.eq(key)))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    async fn clear(&self) -> Result<()> {
        self.writer
            .exec(|conn| {
                diesel::delete(app_storage)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }
}
