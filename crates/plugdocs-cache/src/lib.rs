//! In-process caching for plugdocs.
//!
//! Two building blocks live here:
//!
//! - [`MemoryCache`]: key-value store of raw bytes with a per-entry time-to-live,
//!   lazy eviction on read and an optional background sweep
//! - [`Memo`]: compute-once map that hands out shared results
//!
//! [`CacheExt`] layers typed JSON and string accessors over [`MemoryCache`].
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use plugdocs_cache::{CacheExt, MemoryCache};
//!
//! let cache = MemoryCache::new();
//! cache.set_string("greeting", "hello", Duration::from_secs(60));
//! assert_eq!(cache.get_string("greeting").as_deref(), Some("hello"));
//! ```

mod ext;
mod memo;
mod memory;

pub use ext::CacheExt;
pub use memo::Memo;
pub use memory::{CacheStats, MemoryCache};
