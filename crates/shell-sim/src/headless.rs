//! Surfaces without a renderer
//!
//! Every surface logs what it is asked to do and answers paint requests and
//! animations after a fixed delay, the way a fast device would.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use window_manager::{
    Bitmap, FrameMarkers, Inbound, Surface, SurfaceError, SurfaceFactory, SurfaceId, SurfaceKind,
    SurfaceRequest,
};

/// Renderer timings
#[derive(Debug, Clone, Copy)]
pub struct Timings {
    pub paint: Duration,
    pub transition: Duration,
}

pub struct HeadlessSurfaces {
    renderer_tx: mpsc::UnboundedSender<Inbound>,
    timings: Timings,
}

impl HeadlessSurfaces {
    /// Renderer signals are delivered on `renderer_tx`
    pub fn new(renderer_tx: mpsc::UnboundedSender<Inbound>, timings: Timings) -> Self {
        Self {
            renderer_tx,
            timings,
        }
    }
}

impl SurfaceFactory for HeadlessSurfaces {
    fn create(&mut self, id: SurfaceId, request: &SurfaceRequest) -> Box<dyn Surface> {
        tracing::info!(surface = %id, kind = ?request.kind, url = %request.url, "surface created");
        Box::new(HeadlessSurface {
            id,
            kind: request.kind,
            url: request.url.clone(),
            renderer_tx: self.renderer_tx.clone(),
            timings: self.timings,
            paint_generation: Arc::new(AtomicU64::new(0)),
            disposed: false,
        })
    }
}

struct HeadlessSurface {
    id: SurfaceId,
    kind: SurfaceKind,
    url: String,
    renderer_tx: mpsc::UnboundedSender<Inbound>,
    timings: Timings,
    /// Bumped on cancel so stale paints are dropped
    paint_generation: Arc<AtomicU64>,
    disposed: bool,
}

impl HeadlessSurface {
    fn after(&self, delay: Duration, event: Inbound) {
        if self.disposed {
            return;
        }
        let tx = self.renderer_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(event);
        });
    }
}

impl Surface for HeadlessSurface {
    fn set_visible(&mut self, visible: bool) {
        tracing::debug!(surface = %self.id, visible, "visibility");
    }

    fn focus(&mut self) {
        tracing::debug!(surface = %self.id, "focus");
    }

    fn blur(&mut self) {
        tracing::debug!(surface = %self.id, "blur");
    }

    fn resize(&mut self, width: u32, height: u32) {
        tracing::debug!(surface = %self.id, width, height, "resize");
    }

    fn request_next_paint(&mut self) {
        if self.disposed {
            return;
        }
        let generation = self.paint_generation.clone();
        let expected = generation.load(Ordering::SeqCst);
        let tx = self.renderer_tx.clone();
        let (id, delay) = (self.id, self.timings.paint);

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if generation.load(Ordering::SeqCst) == expected {
                let _ = tx.send(Inbound::SurfacePainted(id));
            }
        });
    }

    fn cancel_next_paint(&mut self) {
        self.paint_generation.fetch_add(1, Ordering::SeqCst);
    }

    fn apply_markers(&mut self, markers: FrameMarkers) {
        tracing::debug!(surface = %self.id, ?markers, "markers");
        if markers.intersects(FrameMarkers::TRANSITION) || self.kind == SurfaceKind::InlineActivity {
            self.after(self.timings.transition, Inbound::TransitionEnded(self.id));
        }
    }

    fn set_background(&mut self, background: Option<&Bitmap>) {
        tracing::debug!(surface = %self.id, screenshot = background.is_some(), "background");
    }

    fn capture_screenshot(&mut self, width: u32, height: u32) -> Result<Bitmap, SurfaceError> {
        if self.disposed {
            return Err(SurfaceError::Disposed);
        }
        tracing::debug!(surface = %self.id, width, height, "screenshot");
        Ok(Bitmap::new(width, height, "text/plain", self.url.as_bytes().to_vec()))
    }

    fn navigate(&mut self, url: &str) {
        tracing::info!(surface = %self.id, url, "navigate");
        self.url = url.to_string();
    }

    fn reload(&mut self) {
        tracing::info!(surface = %self.id, url = %self.url, "reload");
    }

    fn dispose(&mut self) {
        tracing::info!(surface = %self.id, "surface disposed");
        self.disposed = true;
        self.cancel_next_paint();
    }
}
