//! Typed accessors over [`MemoryCache`].

use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::MemoryCache;

/// Typed convenience methods for [`MemoryCache`].
///
/// The cache itself only stores bytes. This trait adds `get_json`/`set_json`
/// for serde types and `get_string`/`set_string` for UTF-8 text.
pub trait CacheExt {
    /// Retrieve a JSON-deserialized value.
    ///
    /// Returns `None` on miss, expiry, or deserialization failure.
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T>;

    /// Store a value as JSON. Does nothing if serialization fails.
    fn set_json<T: Serialize>(&self, key: &str, value: &T, ttl: Duration);

    /// Retrieve a cached UTF-8 string.
    fn get_string(&self, key: &str) -> Option<String>;

    /// Store a string value.
    fn set_string(&self, key: &str, value: &str, ttl: Duration);
}

impl CacheExt for MemoryCache {
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let bytes = self.get(key)?;
        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key, error = %e, "Discarding undecodable cache entry");
                self.remove(key);
                None
            }
        }
    }

    fn set_json<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        if let Ok(bytes) = serde_json::to_vec(value) {
            self.set(key, &bytes, ttl);
        }
    }

    fn get_string(&self, key: &str) -> Option<String> {
        let bytes = self.get(key)?;
        String::from_utf8(bytes).ok()
    }

    fn set_string(&self, key: &str, value: &str, ttl: Duration) {
        self.set(key, value.as_bytes(), ttl);
    }
}
