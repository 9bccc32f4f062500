//! Rate provider trait and implementations.

pub mod exchangerate_api;
pub mod fixed;
mod traits;

pub use traits::RateProvider;
