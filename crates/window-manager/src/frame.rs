//! Frames: a surface plus the shell-side state wrapped around it

use std::time::Instant;

use bitflags::bitflags;
use screenshot_cache::Bitmap;

use crate::surface::{Surface, SurfaceError, SurfaceId, SurfaceKind, SurfaceRequest};

bitflags! {
    /// Visual state markers of a frame, mirrored to the surface so the
    /// renderer can animate between them
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FrameMarkers: u16 {
        const ACTIVE = 1 << 0;
        const OPENING = 1 << 1;
        const CLOSING = 1 << 2;
        const OPENING_CARD = 1 << 3;
        const CLOSING_CARD = 1 << 4;
        const OPENING_SWITCHING = 1 << 5;
        const INLINE_ACTIVITY = 1 << 6;

        /// Markers that only exist while an animation is in flight
        const TRANSITION = Self::OPENING.bits()
            | Self::CLOSING.bits()
            | Self::OPENING_CARD.bits()
            | Self::CLOSING_CARD.bits()
            | Self::OPENING_SWITCHING.bits();

        /// Intermediate states of a switch animation
        const CARD = Self::OPENING_CARD.bits()
            | Self::CLOSING_CARD.bits()
            | Self::OPENING_SWITCHING.bits();
    }
}

/// What is painted behind a frame that has not painted yet
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Background {
    #[default]
    Unset,
    Default,
    Screenshot(Bitmap),
}

/// A surface owned by the shell
pub struct Frame {
    id: SurfaceId,
    surface: Box<dyn Surface>,
    kind: SurfaceKind,
    url: String,
    markers: FrameMarkers,
    painted: bool,
    visible: bool,
    background: Background,
    loaded_at: Instant,
    open_requested_at: Option<Instant>,
    size: (u32, u32),
}

impl Frame {
    pub(crate) fn new(id: SurfaceId, surface: Box<dyn Surface>, request: &SurfaceRequest) -> Self {
        Self {
            id,
            surface,
            kind: request.kind,
            url: request.url.clone(),
            markers: FrameMarkers::empty(),
            painted: false,
            visible: false,
            background: Background::Unset,
            loaded_at: Instant::now(),
            open_requested_at: None,
            size: (0, 0),
        }
    }

    pub fn id(&self) -> SurfaceId {
        self.id
    }

    pub fn kind(&self) -> SurfaceKind {
        self.kind
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn markers(&self) -> FrameMarkers {
        self.markers
    }

    pub fn has(&self, markers: FrameMarkers) -> bool {
        self.markers.contains(markers)
    }

    pub fn is_painted(&self) -> bool {
        self.painted
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_active(&self) -> bool {
        self.markers.contains(FrameMarkers::ACTIVE)
    }

    pub fn background(&self) -> &Background {
        &self.background
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub(crate) fn loaded_at(&self) -> Instant {
        self.loaded_at
    }

    /// When a warm open was requested, cleared on read
    pub(crate) fn take_open_requested(&mut self) -> Option<Instant> {
        self.open_requested_at.take()
    }

    pub(crate) fn note_open_requested(&mut self, at: Instant) {
        self.open_requested_at = Some(at);
    }

    pub(crate) fn insert(&mut self, markers: FrameMarkers) {
        self.update_markers(self.markers | markers);
    }

    pub(crate) fn remove(&mut self, markers: FrameMarkers) {
        self.update_markers(self.markers - markers);
    }

    pub(crate) fn replace(&mut self, from: FrameMarkers, to: FrameMarkers) {
        self.update_markers((self.markers - from) | to);
    }

    /// Drop every in-flight animation marker
    pub(crate) fn strip_transition_markers(&mut self) {
        self.remove(FrameMarkers::TRANSITION);
    }

    fn update_markers(&mut self, markers: FrameMarkers) {
        if markers != self.markers {
            self.markers = markers;
            self.surface.apply_markers(markers);
        }
    }

    pub(crate) fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
        self.surface.set_visible(visible);
    }

    pub(crate) fn focus(&mut self) {
        self.surface.focus();
    }

    pub(crate) fn blur(&mut self) {
        self.surface.blur();
    }

    pub(crate) fn resize(&mut self, width: u32, height: u32) {
        self.size = (width, height);
        self.surface.resize(width, height);
    }

    pub(crate) fn request_next_paint(&mut self) {
        self.surface.request_next_paint();
    }

    pub(crate) fn cancel_next_paint(&mut self) {
        self.surface.cancel_next_paint();
    }

    pub(crate) fn set_background(&mut self, background: Background) {
        match &background {
            Background::Screenshot(bitmap) => self.surface.set_background(Some(bitmap)),
            Background::Default | Background::Unset => self.surface.set_background(None),
        }
        self.background = background;
    }

    /// Record a paint; returns true for the first one
    pub(crate) fn mark_painted(&mut self) -> bool {
        !std::mem::replace(&mut self.painted, true)
    }

    pub(crate) fn capture(&mut self) -> Result<Bitmap, SurfaceError> {
        let (width, height) = self.size;
        self.surface.capture_screenshot(width, height)
    }

    /// Point the surface at a new document; it counts as unpainted again
    pub(crate) fn navigate(&mut self, url: &str) {
        self.url = url.to_string();
        self.painted = false;
        self.loaded_at = Instant::now();
        self.surface.navigate(url);
    }

    pub(crate) fn reload(&mut self) {
        self.painted = false;
        self.loaded_at = Instant::now();
        self.surface.reload();
    }

    /// Detach and dispose the surface
    pub(crate) fn dispose(&mut self) {
        self.set_background(Background::Unset);
        self.strip_transition_markers();
        self.remove(FrameMarkers::ACTIVE);
        self.surface.dispose();
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("url", &self.url)
            .field("markers", &self.markers)
            .field("painted", &self.painted)
            .field("visible", &self.visible)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Recorder(std::rc::Rc<std::cell::RefCell<Vec<FrameMarkers>>>);

    impl Surface for Recorder {
        fn apply_markers(&mut self, markers: FrameMarkers) {
            self.0.borrow_mut().push(markers);
        }
    }

    fn frame() -> (Frame, std::rc::Rc<std::cell::RefCell<Vec<FrameMarkers>>>) {
        let log = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let request = SurfaceRequest {
            url: "app://clock/index.html".to_string(),
            manifest_url: None,
            kind: SurfaceKind::App,
            background: false,
        };
        (Frame::new(SurfaceId::next(), Box::new(Recorder(log.clone())), &request), log)
    }

    #[test]
    fn test_strip_keeps_active() {
        let (mut frame, _) = frame();
        frame.insert(FrameMarkers::ACTIVE | FrameMarkers::OPENING_CARD);
        frame.strip_transition_markers();
        assert_eq!(frame.markers(), FrameMarkers::ACTIVE);
    }

    #[test]
    fn test_markers_forwarded_only_on_change() {
        let (mut frame, log) = frame();
        frame.insert(FrameMarkers::OPENING);
        frame.insert(FrameMarkers::OPENING);
        frame.replace(FrameMarkers::OPENING, FrameMarkers::ACTIVE);
        assert_eq!(*log.borrow(), vec![FrameMarkers::OPENING, FrameMarkers::ACTIVE]);
    }

    #[test]
    fn test_first_paint_reported_once() {
        let (mut frame, _) = frame();
        assert!(frame.mark_painted());
        assert!(!frame.mark_painted());
        frame.reload();
        assert!(!frame.is_painted());
        assert!(frame.mark_painted());
    }
}
