//! Open, close and switch animations
//!
//! At most one frame is opening and one is closing at any time. Each slot
//! carries a [`Latch`]; every scheduled step remembers the latch it was
//! issued with and does nothing once the slot has moved on, which is how a
//! newer foreground request supersedes an animation in flight.
//!
//! The renderer reports the end of each marker animation through
//! [`WindowManager::transition_ended`]. Outside a switch an opening frame
//! settles on its first end and a closing frame on its first end. During a
//! switch the frames walk through the card states:
//!
//! ```text
//! close: CLOSING -> CLOSING_CARD -> closed
//! open:  OPENING_CARD -> OPENING_SWITCHING -> OPENING -> opened
//! ```
//!
//! with the opening frame parked on `OPENING_CARD` until the closing frame
//! reaches `CLOSING_CARD`.

use std::time::Instant;

use screenshot_cache::Bitmap;

use crate::coordinator::{Continuation, WindowManager};
use crate::events::{LoadKind, ShellEvent};
use crate::frame::{Background, Frame, FrameMarkers};
use crate::scheduler::{AfterBackground, Task, TimerId, TimerKind};
use crate::surface::{SurfaceId, SurfaceKind};

/// Generation of a slot assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Latch(u64);

/// Identifies a pending paint wait
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WaitId(u64);

/// Step to run once a paint (or its timeout) arrives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PaintStep {
    StartOpening(Latch),
    StartClosing(Latch),
}

pub(crate) struct PaintWait {
    pub id: WaitId,
    pub surface: SurfaceId,
    pub step: PaintStep,
    pub timer: TimerId,
}

/// Occupant of the open or close slot
pub(crate) struct Slot {
    pub surface: SurfaceId,
    /// `None` once cancelled
    pub latch: Option<Latch>,
    /// The marker animation has been started
    pub started: bool,
    pub on_done: Option<Continuation>,
}

/// Open and close slots with their latches and paint waits
#[derive(Default)]
pub struct TransitionController {
    open: Option<Slot>,
    close: Option<Slot>,
    next_latch: u64,
    switching: bool,
    waits: Vec<PaintWait>,
    next_wait: u64,
}

impl TransitionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open_surface(&self) -> Option<SurfaceId> {
        self.open.as_ref().map(|slot| slot.surface)
    }

    pub fn close_surface(&self) -> Option<SurfaceId> {
        self.close.as_ref().map(|slot| slot.surface)
    }

    /// A close and an open are animating together
    pub fn is_switching(&self) -> bool {
        self.switching
    }

    pub fn is_idle(&self) -> bool {
        self.open.is_none() && self.close.is_none()
    }

    pub(crate) fn set_switching(&mut self, switching: bool) {
        self.switching = switching;
    }

    fn issue(&mut self) -> Latch {
        self.next_latch += 1;
        Latch(self.next_latch)
    }

    /// Put `surface` in the open slot, returning every displaced occupant
    pub(crate) fn claim_open(
        &mut self,
        surface: SurfaceId,
        on_done: Option<Continuation>,
    ) -> (Latch, Vec<Slot>) {
        let mut displaced: Vec<Slot> = self.open.take().into_iter().collect();
        if self.close_surface() == Some(surface) {
            displaced.extend(self.close.take());
        }

        let latch = self.issue();
        self.open = Some(Slot {
            surface,
            latch: Some(latch),
            started: false,
            on_done,
        });
        (latch, displaced)
    }

    /// Put `surface` in the close slot, returning every displaced occupant
    pub(crate) fn claim_close(
        &mut self,
        surface: SurfaceId,
        on_done: Option<Continuation>,
    ) -> (Latch, Vec<Slot>) {
        let mut displaced: Vec<Slot> = self.close.take().into_iter().collect();
        if self.open_surface() == Some(surface) {
            displaced.extend(self.open.take());
        }

        let latch = self.issue();
        self.close = Some(Slot {
            surface,
            latch: Some(latch),
            started: false,
            on_done,
        });
        (latch, displaced)
    }

    pub(crate) fn is_open_latch(&self, latch: Latch) -> bool {
        self.open
            .as_ref()
            .is_some_and(|slot| slot.latch == Some(latch))
    }

    /// Mark the opening animation started if `latch` is still current
    pub(crate) fn begin_open(&mut self, latch: Latch) -> Option<SurfaceId> {
        Self::begin(self.open.as_mut(), latch)
    }

    /// Mark the closing animation started if `latch` is still current
    pub(crate) fn begin_close(&mut self, latch: Latch) -> Option<SurfaceId> {
        Self::begin(self.close.as_mut(), latch)
    }

    fn begin(slot: Option<&mut Slot>, latch: Latch) -> Option<SurfaceId> {
        let slot = slot?;
        if slot.latch != Some(latch) || slot.started {
            return None;
        }
        slot.started = true;
        Some(slot.surface)
    }

    pub(crate) fn take_open(&mut self) -> Option<Slot> {
        let slot = self.open.take();
        self.settle_switch();
        slot
    }

    pub(crate) fn take_close(&mut self) -> Option<Slot> {
        let slot = self.close.take();
        self.settle_switch();
        slot
    }

    /// Free every slot held by `surface`
    pub(crate) fn release(&mut self, surface: SurfaceId) -> Vec<Slot> {
        let mut released = Vec::new();
        if self.open_surface() == Some(surface) {
            released.extend(self.open.take());
        }
        if self.close_surface() == Some(surface) {
            released.extend(self.close.take());
        }
        self.settle_switch();
        released
    }

    fn settle_switch(&mut self) {
        if self.is_idle() {
            self.switching = false;
        }
    }

    /// Invalidate both latches; pending steps become no-ops
    pub(crate) fn cancel_latches(&mut self) {
        for slot in self.open.iter_mut().chain(self.close.iter_mut()) {
            slot.latch = None;
        }
    }

    /// Empty both slots and drop every paint wait
    pub(crate) fn clear(&mut self) -> (Vec<Slot>, Vec<PaintWait>) {
        let slots = self.open.take().into_iter().chain(self.close.take()).collect();
        self.switching = false;
        (slots, std::mem::take(&mut self.waits))
    }

    pub(crate) fn next_wait_id(&mut self) -> WaitId {
        self.next_wait += 1;
        WaitId(self.next_wait)
    }

    pub(crate) fn add_wait(&mut self, wait: PaintWait) {
        self.waits.push(wait);
    }

    pub(crate) fn take_wait(&mut self, id: WaitId) -> Option<PaintWait> {
        let index = self.waits.iter().position(|wait| wait.id == id)?;
        Some(self.waits.remove(index))
    }

    pub(crate) fn take_waits_for(&mut self, surface: SurfaceId) -> Vec<PaintWait> {
        let (taken, kept) = std::mem::take(&mut self.waits)
            .into_iter()
            .partition(|wait| wait.surface == surface);
        self.waits = kept;
        taken
    }
}

impl WindowManager {
    /// Frame of an app or inline activity
    pub(crate) fn frame_mut(&mut self, surface: SurfaceId) -> Option<&mut Frame> {
        match self.registry.frame_mut(surface) {
            Some(frame) => Some(frame),
            None => self.activities.find_mut(surface),
        }
    }

    fn markers_of(&mut self, surface: Option<SurfaceId>) -> Option<FrameMarkers> {
        surface
            .and_then(|surface| self.frame_mut(surface))
            .map(|frame| frame.markers())
    }

    /// Strip leftover animation state from frames that lost their slot
    fn strip_displaced(&mut self, displaced: Vec<Slot>) {
        for slot in displaced {
            let still_claimed = self.transition.close_surface() == Some(slot.surface)
                || self.transition.open_surface() == Some(slot.surface);
            if let Some(frame) = self.frame_mut(slot.surface) {
                frame.strip_transition_markers();
                if !still_claimed {
                    frame.remove(FrameMarkers::ACTIVE);
                }
            }
        }
    }

    /// Animate `origin` into view
    pub(crate) fn open_window(&mut self, origin: &str, on_done: Option<Continuation>) {
        let Some(app) = self.registry.get(origin) else {
            tracing::warn!(origin, "open requested for an app that is not running");
            self.defer_opt(on_done);
            return;
        };

        let surface = app.frame.id();
        let (fullscreen, wrapper) = (app.fullscreen, app.wrapper);
        let is_home = self.home.as_deref() == Some(origin);

        let (latch, displaced) = self.transition.claim_open(surface, on_done);
        self.strip_displaced(displaced);

        let (width, height) = self.viewport.frame_size(fullscreen, wrapper);
        let Some(frame) = self.registry.frame_mut(surface) else {
            return;
        };
        frame.resize(width, height);

        if is_home {
            // Home is opaque and always ready: no background, no paint wait
            frame.set_visible(true);
            self.window_opened(surface);
            if let Some(callback) = self.transition.take_open().and_then(|slot| slot.on_done) {
                callback(self);
            }
            return;
        }

        tracing::debug!(origin, %surface, ?latch, "opening");
        self.chrome.set_fullscreen_layout(fullscreen);

        if frame.is_painted() {
            frame.note_open_requested(Instant::now());
            frame.set_visible(true);
        } else {
            let url = frame.url().to_string();
            self.request_background(surface, &url, AfterBackground::StartOpen(latch));
        }
        self.wait_for_paint(surface, PaintStep::StartOpening(latch));
    }

    /// Animate `origin` out, revealing home beneath it
    pub(crate) fn close_window(&mut self, origin: &str, on_done: Option<Continuation>) {
        let Some(app) = self.registry.get(origin) else {
            tracing::warn!(origin, "close requested for an app that is not running");
            self.defer_opt(on_done);
            return;
        };

        let surface = app.frame.id();
        let (width, height) = self.viewport.frame_size(app.fullscreen, app.wrapper);

        let (latch, displaced) = self.transition.claim_close(surface, on_done);
        self.strip_displaced(displaced);

        let home_surface = match self.ensure_home() {
            Ok(home) => {
                self.open_window(&home, None);
                self.registry.get(&home).map(|app| app.frame.id())
            }
            Err(err) => {
                tracing::warn!(%err, "closing without a homescreen");
                None
            }
        };

        if let Some(frame) = self.registry.frame_mut(surface) {
            frame.blur();
            frame.resize(width, height);
        }

        tracing::debug!(origin, %surface, ?latch, "closing");
        self.events.emit(ShellEvent::AppWillClose {
            origin: origin.to_string(),
        });

        match home_surface {
            Some(home) => self.wait_for_paint(home, PaintStep::StartClosing(latch)),
            None => self.start_closing(latch),
        }
    }

    /// Close the foreground app and open `origin` as one animation
    pub(crate) fn switch_window(&mut self, origin: &str, on_done: Option<Continuation>) {
        let Some(current) = self.displayed.clone() else {
            self.open_window(origin, on_done);
            return;
        };

        tracing::debug!(from = %current, to = origin, "switching");
        self.transition.set_switching(true);
        self.close_window(&current, None);
        self.open_window(origin, on_done);
    }

    /// Look up a screenshot for `url`, completing on the next turn
    pub(crate) fn request_background(&mut self, surface: SurfaceId, url: &str, then: AfterBackground) {
        let bitmap = self.screenshots.get(url);
        self.scheduler.defer(Task::BackgroundResolved {
            surface,
            bitmap,
            then,
        });
    }

    pub(crate) fn background_resolved(
        &mut self,
        surface: SurfaceId,
        bitmap: Option<Bitmap>,
        then: AfterBackground,
    ) {
        match then {
            AfterBackground::StartOpen(latch) => {
                if !self.transition.is_open_latch(latch) {
                    tracing::trace!(%surface, "stale background");
                    return;
                }
                if let Some(frame) = self.registry.frame_mut(surface) {
                    if !frame.is_painted() {
                        frame.set_background(placeholder(bitmap));
                    }
                }
                self.start_opening(latch);
            }
            AfterBackground::ShowActivity => self.show_activity(surface, bitmap),
        }
    }

    /// Run `step` on the next paint of `surface` or after the timeout
    fn wait_for_paint(&mut self, surface: SurfaceId, step: PaintStep) {
        let id = self.transition.next_wait_id();
        let deadline = Instant::now() + self.config.transition_timeout();
        let timer = self.scheduler.schedule(deadline, TimerKind::PaintTimeout(id));

        if let Some(frame) = self.frame_mut(surface) {
            frame.request_next_paint();
        }
        self.transition.add_wait(PaintWait {
            id,
            surface,
            step,
            timer,
        });
    }

    fn run_paint_step(&mut self, step: PaintStep) {
        match step {
            PaintStep::StartOpening(latch) => self.start_opening(latch),
            PaintStep::StartClosing(latch) => self.start_closing(latch),
        }
    }

    pub(crate) fn paint_timed_out(&mut self, id: WaitId) {
        let Some(wait) = self.transition.take_wait(id) else {
            return;
        };

        tracing::warn!(surface = %wait.surface, "no paint before timeout, animating anyway");
        if let Some(frame) = self.frame_mut(wait.surface) {
            frame.cancel_next_paint();
        }
        self.run_paint_step(wait.step);
    }

    fn start_opening(&mut self, latch: Latch) {
        let Some(surface) = self.transition.begin_open(latch) else {
            tracing::trace!(?latch, "stale opening step");
            return;
        };

        let marker = if self.transition.is_switching() {
            let close_surface = self.transition.close_surface();
            match self.markers_of(close_surface) {
                Some(markers) if markers.contains(FrameMarkers::CLOSING_CARD) => {
                    FrameMarkers::OPENING_SWITCHING
                }
                Some(_) => FrameMarkers::OPENING_CARD,
                None => FrameMarkers::OPENING,
            }
        } else {
            FrameMarkers::OPENING
        };

        if let Some(frame) = self.frame_mut(surface) {
            tracing::debug!(%surface, ?marker, "start opening");
            frame.set_visible(true);
            frame.insert(marker);
        }
    }

    fn start_closing(&mut self, latch: Latch) {
        let Some(surface) = self.transition.begin_close(latch) else {
            tracing::trace!(?latch, "stale closing step");
            return;
        };

        if let Some(frame) = self.frame_mut(surface) {
            tracing::debug!(%surface, "start closing");
            frame.replace(FrameMarkers::ACTIVE, FrameMarkers::CLOSING);
        }
    }

    /// A surface painted
    pub(crate) fn handle_paint(&mut self, surface: SurfaceId) {
        let Some(frame) = self.frame_mut(surface) else {
            tracing::trace!(%surface, "paint from unknown surface");
            return;
        };

        if frame.mark_painted() {
            if *frame.background() != Background::Unset {
                frame.set_background(Background::Unset);
            }
            self.first_paint(surface);
        }

        for wait in self.transition.take_waits_for(surface) {
            self.scheduler.cancel(wait.timer);
            self.run_paint_step(wait.step);
        }
    }

    fn first_paint(&mut self, surface: SurfaceId) {
        let Some(origin) = self.registry.find_by_surface(surface).map(str::to_string) else {
            return;
        };
        if self.home.as_deref() == Some(origin.as_str()) {
            return;
        }

        let deadline = Instant::now() + self.config.screenshot_delay();
        self.scheduler
            .schedule(deadline, TimerKind::CaptureScreenshot(surface));

        let opening = self.transition.open_surface() == Some(surface);
        let displayed = self.displayed.as_deref() == Some(origin.as_str());
        if let (true, Some(app)) = (opening || displayed, self.registry.get(&origin)) {
            let time = app.frame.loaded_at().elapsed();
            tracing::info!(origin, ?time, "cold load");
            self.events.emit(ShellEvent::AppLoadTime {
                origin,
                time,
                kind: LoadKind::Cold,
            });
        }
    }

    /// Store what `surface` currently shows as its app's placeholder
    pub(crate) fn capture_screenshot(&mut self, surface: SurfaceId) {
        let Some(origin) = self.registry.find_by_surface(surface).map(str::to_string) else {
            return;
        };
        let Some(app) = self.registry.get_mut(&origin) else {
            return;
        };
        if app.frame.kind() != SurfaceKind::App {
            return;
        }

        match app.frame.capture() {
            Ok(bitmap) => {
                tracing::debug!(origin, url = %app.url, "screenshot captured");
                self.screenshots.put(&app.url, &bitmap);
            }
            Err(err) => tracing::debug!(origin, %err, "screenshot capture failed"),
        }
    }

    /// The renderer finished animating `surface`
    pub(crate) fn handle_transition_end(&mut self, surface: SurfaceId) {
        if self.activities.contains(surface) || self.activities.is_retiring(surface) {
            self.activity_transition_ended(surface);
            return;
        }

        let card_mode = |markers: FrameMarkers, switching: bool| {
            switching || markers.intersects(FrameMarkers::CARD)
        };
        let switching = self.transition.is_switching();

        if self.transition.open_surface() == Some(surface) {
            let Some(frame) = self.frame_mut(surface) else {
                return;
            };
            let markers = frame.markers();

            if card_mode(markers, switching) {
                if markers.contains(FrameMarkers::OPENING_CARD) {
                    tracing::trace!(%surface, "parked until the closing card");
                } else if markers.contains(FrameMarkers::OPENING_SWITCHING) {
                    frame.replace(FrameMarkers::OPENING_SWITCHING, FrameMarkers::OPENING);
                } else if markers.contains(FrameMarkers::OPENING) {
                    self.open_finished();
                }
            } else if markers.contains(FrameMarkers::OPENING) {
                self.open_finished();
            }
        } else if self.transition.close_surface() == Some(surface) {
            let Some(frame) = self.frame_mut(surface) else {
                return;
            };
            let markers = frame.markers();

            if card_mode(markers, switching) {
                if markers.contains(FrameMarkers::CLOSING) {
                    frame.replace(FrameMarkers::CLOSING, FrameMarkers::CLOSING_CARD);
                    self.promote_parked_open();
                } else if markers.contains(FrameMarkers::CLOSING_CARD) {
                    self.close_finished();
                }
            } else if markers.contains(FrameMarkers::CLOSING) {
                self.close_finished();
            }
        } else {
            tracing::trace!(%surface, "transition end for an untracked surface");
        }
    }

    /// Move a parked opening card on once nothing holds it back
    fn promote_parked_open(&mut self) {
        let open_surface = self.transition.open_surface();
        if let Some(frame) = open_surface.and_then(|surface| self.frame_mut(surface)) {
            if frame.has(FrameMarkers::OPENING_CARD) {
                frame.replace(FrameMarkers::OPENING_CARD, FrameMarkers::OPENING_SWITCHING);
            }
        }
    }

    fn open_finished(&mut self) {
        let Some(slot) = self.transition.take_open() else {
            return;
        };
        if let Some(frame) = self.frame_mut(slot.surface) {
            frame.strip_transition_markers();
        }
        self.window_opened(slot.surface);
        self.defer_opt(slot.on_done);
    }

    fn close_finished(&mut self) {
        let Some(slot) = self.transition.take_close() else {
            return;
        };
        if let Some(frame) = self.frame_mut(slot.surface) {
            frame.strip_transition_markers();
        }
        self.window_closed(slot.surface);
        self.defer_opt(slot.on_done);
    }

    /// `surface` is now the foreground
    pub(crate) fn window_opened(&mut self, surface: SurfaceId) {
        let Some(origin) = self.registry.find_by_surface(surface).map(str::to_string) else {
            return;
        };
        let is_home = self.home.as_deref() == Some(origin.as_str());

        if let Some(previous) = self.displayed.clone().filter(|previous| *previous != origin) {
            if let Some(app) = self.registry.get_mut(&previous) {
                app.frame.blur();
            }
        }

        let no_overlays = self.activities.is_empty();
        let Some(app) = self.registry.get_mut(&origin) else {
            return;
        };
        app.frame.insert(FrameMarkers::ACTIVE);
        app.frame.set_visible(!self.locked);
        if no_overlays {
            app.frame.focus();
        }

        let warm = app.frame.take_open_requested().map(|at| at.elapsed());
        let (wrapper, fullscreen, orientation) = (app.wrapper, app.fullscreen, app.orientation);
        let manifest_url = app.manifest_url.clone();

        self.chrome.set_footer_visible(wrapper);
        self.chrome.set_fullscreen_layout(fullscreen);

        let keep_home = is_home || self.first_run_active || self.attention.is_fully_visible();
        if !keep_home {
            if let Some(home) = self.home.clone().and_then(|home| self.registry.get_mut(&home)) {
                home.frame.set_visible(false);
            }
        }

        self.displayed = Some(origin.clone());
        let home_default = is_home.then_some(self.config.default_orientation);
        match orientation.or(home_default) {
            Some(orientation) => self.orientation.lock(orientation),
            None => self.orientation.unlock(),
        }

        tracing::info!(origin, "app opened");
        self.events.emit(ShellEvent::AppOpen {
            origin: origin.clone(),
            manifest_url,
            is_home,
        });

        if let (false, Some(time)) = (is_home, warm) {
            self.events.emit(ShellEvent::AppLoadTime {
                origin,
                time,
                kind: LoadKind::Warm,
            });
        }
    }

    /// `surface` left the screen
    pub(crate) fn window_closed(&mut self, surface: SurfaceId) {
        if let Some(frame) = self.registry.frame_mut(surface) {
            frame.remove(FrameMarkers::ACTIVE);
            frame.set_visible(false);
        }

        let fullscreen = self
            .displayed
            .as_deref()
            .and_then(|origin| self.registry.get(origin))
            .is_some_and(|app| app.fullscreen);
        self.chrome.set_fullscreen_layout(fullscreen);
    }

    /// Hide and empty both slots, dropping their continuations
    pub(crate) fn reset_slots(&mut self) {
        let (slots, waits) = self.transition.clear();

        for wait in waits {
            self.scheduler.cancel(wait.timer);
            if let Some(frame) = self.frame_mut(wait.surface) {
                frame.cancel_next_paint();
            }
        }

        let mut reaped = Vec::new();
        for slot in slots {
            if let Some(frame) = self.frame_mut(slot.surface) {
                frame.set_visible(false);
                frame.strip_transition_markers();
            }
            if let Some(origin) = self.registry.find_by_surface(slot.surface) {
                if self.registry.get(origin).is_some_and(|app| app.killed) {
                    reaped.push(origin.to_string());
                }
            }
        }

        // A superseded close of a killed app still has to finish the kill
        for origin in reaped {
            self.remove_and_finish(&origin);
        }
    }

    /// Free the slots held by a surface that is going away
    pub(crate) fn release_surface(&mut self, surface: SurfaceId) {
        for slot in self.transition.release(surface) {
            self.defer_opt(slot.on_done);
        }
        for wait in self.transition.take_waits_for(surface) {
            self.scheduler.cancel(wait.timer);
        }
        if self.transition.close_surface().is_none() {
            self.promote_parked_open();
        }
    }
}

fn placeholder(bitmap: Option<Bitmap>) -> Background {
    match bitmap {
        Some(bitmap) => Background::Screenshot(bitmap),
        None => Background::Default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_open_takes_surface_out_of_close_slot() {
        let mut controller = TransitionController::new();
        let surface = SurfaceId(7);

        controller.claim_close(surface, None);
        let (_, displaced) = controller.claim_open(surface, None);

        assert_eq!(displaced.len(), 1);
        assert_eq!(controller.open_surface(), Some(surface));
        assert_eq!(controller.close_surface(), None);
    }

    #[test]
    fn test_stale_latch_does_not_begin() {
        let mut controller = TransitionController::new();
        let (first, _) = controller.claim_open(SurfaceId(1), None);
        let (second, _) = controller.claim_open(SurfaceId(2), None);

        assert_eq!(controller.begin_open(first), None);
        assert_eq!(controller.begin_open(second), Some(SurfaceId(2)));
        assert_eq!(controller.begin_open(second), None);
    }

    #[test]
    fn test_cancelled_latch_does_not_begin() {
        let mut controller = TransitionController::new();
        let (latch, _) = controller.claim_close(SurfaceId(1), None);
        controller.cancel_latches();
        assert_eq!(controller.begin_close(latch), None);
    }

    #[test]
    fn test_switch_ends_when_both_slots_empty() {
        let mut controller = TransitionController::new();
        controller.set_switching(true);
        controller.claim_close(SurfaceId(1), None);
        controller.claim_open(SurfaceId(2), None);

        controller.take_close();
        assert!(controller.is_switching());
        controller.take_open();
        assert!(!controller.is_switching());
    }

    #[test]
    fn test_waits_by_surface() {
        let mut controller = TransitionController::new();
        let (latch, _) = controller.claim_open(SurfaceId(1), None);

        let mut scheduler = crate::scheduler::Scheduler::new();
        for surface in [SurfaceId(1), SurfaceId(2), SurfaceId(1)] {
            let id = controller.next_wait_id();
            let timer = scheduler.schedule(Instant::now(), TimerKind::PaintTimeout(id));
            controller.add_wait(PaintWait {
                id,
                surface,
                step: PaintStep::StartOpening(latch),
                timer,
            });
        }

        assert_eq!(controller.take_waits_for(SurfaceId(1)).len(), 2);
        let (_, waits) = controller.clear();
        assert_eq!(waits.len(), 1);
    }
}
