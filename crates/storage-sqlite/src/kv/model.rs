//! Database model for key-value entries.

use diesel::prelude::*;

/// One row of `app_storage`. `storage_value` holds serialized JSON.
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::app_storage)]
pub struct AppStorageDB {
    pub storage_key: String,
    pub storage_value: String,
}
