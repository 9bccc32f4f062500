//! SQLite storage implementation for Bookshelf.
//!
//! This crate provides all database-related functionality using Diesel ORM with SQLite.
//! It implements the [`KeyValueStore`](bookshelf_core::kv::KeyValueStore) trait
//! defined in `bookshelf-core` and contains:
//! - Database connection pooling and management
//! - Diesel migrations
//! - The key-value repository backing the rate cache and display currency
//!
//! # Architecture
//!
//! This crate is the only place in the workspace where Diesel dependencies exist.
//! The core crate is database-agnostic and works with traits.
//!
//! ```text
//!          core (domain)
//!                │
//!                ▼
//!      storage-sqlite (this crate)
//!                │
//!                ▼
//!            SQLite DB
//! ```

pub mod db;
pub mod errors;
pub mod kv;
pub mod schema;

// Re-export database utilities
pub use db::{
    create_pool, get_connection, get_db_path, init, run_migrations, DbConnection, DbPool,
    WriteHandle,
};

// Re-export storage errors and conversion helpers
pub use errors::{IntoCore, StorageError};
pub use kv::SqliteKeyValueStore;

// Re-export from bookshelf-core for convenience
pub use bookshelf_core::errors::{DatabaseError, Error, Result};
