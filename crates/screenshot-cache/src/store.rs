//! Storage backends

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::{Bitmap, Result};

/// Keyed bitmap storage behind a [`ScreenshotCache`](crate::ScreenshotCache)
pub trait ScreenshotStore: Send + Sync {
    /// Read the bitmap stored for `url`
    fn load(&self, url: &str) -> Result<Option<Bitmap>>;

    /// Replace the bitmap stored for `url`
    fn store(&self, url: &str, bitmap: &Bitmap) -> Result<()>;

    /// Remove the bitmap stored for `url`
    fn remove(&self, url: &str) -> Result<()>;
}

/// Volatile store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Bitmap>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl ScreenshotStore for MemoryStore {
    fn load(&self, url: &str) -> Result<Option<Bitmap>> {
        Ok(self.entries.read().get(url).cloned())
    }

    fn store(&self, url: &str, bitmap: &Bitmap) -> Result<()> {
        self.entries.write().insert(url.to_string(), bitmap.clone());
        Ok(())
    }

    fn remove(&self, url: &str) -> Result<()> {
        self.entries.write().remove(url);
        Ok(())
    }
}
