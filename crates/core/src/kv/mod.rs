//! Key-value persistence used by the rate store.

mod kv_traits;
mod memory_store;

pub use kv_traits::{get_json, set_json, KeyValueStore};
pub use memory_store::InMemoryKeyValueStore;
