//! # Homeshell Screenshot Cache
//!
//! Keeps the last successfully captured bitmap of every launch URL so a
//! cold-starting app can be painted over a recent screenshot while it loads.
//!
//! The cache never fails towards its caller: a missing store, a broken
//! database or a corrupt row all read as "no screenshot", and writes are
//! best-effort.

pub mod sqlite;
pub mod store;

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub use sqlite::SqliteStore;
pub use store::{MemoryStore, ScreenshotStore};

/// A captured frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bitmap {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Encoding of `data` (e.g. "image/png")
    pub mime: String,
    /// Encoded image bytes
    pub data: Vec<u8>,
}

impl Bitmap {
    pub fn new(width: u32, height: u32, mime: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            mime: mime.into(),
            data,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Screenshot storage error
#[derive(Debug, thiserror::Error)]
pub enum ScreenshotError {
    #[error("screenshot storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("invalid screenshot record for {url}: {reason}")]
    InvalidRecord { url: String, reason: String },

    #[error("refusing to store an empty bitmap for {0}")]
    EmptyBitmap(String),
}

pub type Result<T> = std::result::Result<T, ScreenshotError>;

/// Best-effort screenshot cache keyed by launch URL
#[derive(Clone, Default)]
pub struct ScreenshotCache {
    store: Option<Arc<dyn ScreenshotStore>>,
}

impl ScreenshotCache {
    /// Cache backed by `store`
    pub fn new(store: impl ScreenshotStore + 'static) -> Self {
        Self {
            store: Some(Arc::new(store)),
        }
    }

    /// Cache with no backing storage; every read misses
    pub fn unavailable() -> Self {
        Self { store: None }
    }

    /// In-memory cache, mostly useful for tests and headless runs
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }

    /// Open a SQLite-backed cache, degrading to an unavailable cache if the
    /// database cannot be opened
    pub fn open(path: &Path) -> Self {
        match SqliteStore::open(path) {
            Ok(store) => Self::new(store),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "screenshot storage unavailable");
                Self::unavailable()
            }
        }
    }

    /// Is there a store behind this cache
    pub fn is_available(&self) -> bool {
        self.store.is_some()
    }

    /// Last screenshot stored for `url`
    pub fn get(&self, url: &str) -> Option<Bitmap> {
        let store = self.store.as_ref()?;
        match store.load(url) {
            Ok(bitmap) => bitmap,
            Err(err) => {
                tracing::warn!(url, error = %err, "failed to read screenshot");
                None
            }
        }
    }

    /// Store `bitmap` as the latest screenshot for `url`
    pub fn put(&self, url: &str, bitmap: &Bitmap) {
        let Some(store) = self.store.as_ref() else {
            tracing::debug!(url, "screenshot storage unavailable, dropping capture");
            return;
        };

        if bitmap.is_empty() {
            tracing::warn!(url, error = %ScreenshotError::EmptyBitmap(url.to_string()), "skipping screenshot");
            return;
        }

        if let Err(err) = store.store(url, bitmap) {
            tracing::warn!(url, error = %err, "failed to save screenshot");
        }
    }

    /// Forget the screenshot for `url`
    pub fn delete(&self, url: &str) {
        let Some(store) = self.store.as_ref() else {
            return;
        };

        if let Err(err) = store.remove(url) {
            tracing::warn!(url, error = %err, "failed to delete screenshot");
        }
    }
}

impl std::fmt::Debug for ScreenshotCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScreenshotCache")
            .field("available", &self.is_available())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bitmap(fill: u8) -> Bitmap {
        Bitmap::new(2, 2, "image/png", vec![fill; 16])
    }

    #[test]
    fn test_unavailable_cache_misses() {
        let cache = ScreenshotCache::unavailable();
        cache.put("app://clock/index.html", &bitmap(1));
        assert!(cache.get("app://clock/index.html").is_none());
        cache.delete("app://clock/index.html");
    }

    #[test]
    fn test_last_write_wins() {
        let cache = ScreenshotCache::in_memory();
        cache.put("app://clock/index.html", &bitmap(1));
        cache.put("app://clock/index.html", &bitmap(2));
        assert_eq!(cache.get("app://clock/index.html"), Some(bitmap(2)));
    }

    #[test]
    fn test_empty_bitmap_is_not_stored() {
        let cache = ScreenshotCache::in_memory();
        cache.put("app://clock/index.html", &Bitmap::new(0, 0, "image/png", Vec::new()));
        assert!(cache.get("app://clock/index.html").is_none());
    }

    #[test]
    fn test_delete() {
        let cache = ScreenshotCache::in_memory();
        cache.put("app://clock/index.html", &bitmap(3));
        cache.delete("app://clock/index.html");
        assert!(cache.get("app://clock/index.html").is_none());
    }
}
