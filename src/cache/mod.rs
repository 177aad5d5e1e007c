//! Content-addressed persistence for expensive network fetches.

pub mod key;
pub mod store;

pub use key::{CacheKey, CacheKind};
pub use store::{CacheEntry, CacheStore};
