//! Rendering surface boundary
//!
//! The window manager never renders. It drives opaque surfaces through the
//! [`Surface`] trait and learns about paints, transition ends and crashes
//! through the inbound methods on [`WindowManager`](crate::WindowManager).
//! Every method has a no-op default so partial backends stay usable.

use std::sync::atomic::{AtomicU64, Ordering};

use screenshot_cache::Bitmap;

use crate::frame::FrameMarkers;

/// Identifies one surface for the lifetime of the process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(pub u64);

impl SurfaceId {
    /// Allocate a fresh id
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "surface#{}", self.0)
    }
}

/// What a surface hosts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceKind {
    /// Main window of an app
    App,
    /// Window opened by an app through a named `window.open`
    Wrapper,
    /// Transient overlay fulfilling an activity
    InlineActivity,
}

/// Parameters for a new surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceRequest {
    pub url: String,
    pub manifest_url: Option<String>,
    pub kind: SurfaceKind,
    /// Start loading without being shown
    pub background: bool,
}

/// Surface failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SurfaceError {
    #[error("operation not supported by this surface")]
    Unsupported,

    #[error("surface is gone")]
    Disposed,

    #[error("screenshot capture failed: {0}")]
    Capture(String),
}

/// A rendering surface hosting one document
pub trait Surface {
    fn set_visible(&mut self, _visible: bool) {}

    fn focus(&mut self) {}

    fn blur(&mut self) {}

    fn resize(&mut self, _width: u32, _height: u32) {}

    /// Ask to be told about the next paint through
    /// [`WindowManager::surface_painted`](crate::WindowManager::surface_painted)
    fn request_next_paint(&mut self) {}

    fn cancel_next_paint(&mut self) {}

    /// Transition state to render
    fn apply_markers(&mut self, _markers: FrameMarkers) {}

    /// Placeholder painted behind the document until it paints itself;
    /// `None` means the default background
    fn set_background(&mut self, _background: Option<&Bitmap>) {}

    fn capture_screenshot(&mut self, _width: u32, _height: u32) -> Result<Bitmap, SurfaceError> {
        Err(SurfaceError::Unsupported)
    }

    fn navigate(&mut self, _url: &str) {}

    fn reload(&mut self) {}

    fn dispose(&mut self) {}
}

/// Creates surfaces
pub trait SurfaceFactory {
    fn create(&mut self, id: SurfaceId, request: &SurfaceRequest) -> Box<dyn Surface>;
}
