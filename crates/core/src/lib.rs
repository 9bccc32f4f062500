//! Bookshelf Core - price display domain.
//!
//! This crate holds the rate store behind the bookstore's multi-currency
//! price display: cached exchange rates, the user's display currency,
//! conversion and formatting. It is storage-agnostic and defines the
//! [`kv::KeyValueStore`] trait implemented by the `storage-sqlite` crate.

pub mod constants;
pub mod errors;
pub mod events;
pub mod fx;
pub mod kv;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
