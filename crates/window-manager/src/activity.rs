//! Inline activity overlays
//!
//! A LIFO stack of transient surfaces stacked above the foreground app.
//! Only the top entry may hold focus. Entries that are closing leave the
//! stack but stay addressable in `retiring` until their closing transition
//! ends.

use std::time::Instant;

use screenshot_cache::Bitmap;

use crate::coordinator::WindowManager;
use crate::frame::{Background, Frame, FrameMarkers};
use crate::scheduler::{AfterBackground, TimerKind};
use crate::surface::{SurfaceId, SurfaceKind, SurfaceRequest};

/// Parameters of an inline activity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityRequest {
    /// Origin of the app handling the activity
    pub origin: String,
    pub manifest_url: String,
    pub url: String,
}

#[derive(Debug)]
pub struct ActivityEntry {
    pub origin: String,
    pub manifest_url: String,
    pub frame: Frame,
}

#[derive(Debug, Default)]
pub struct InlineActivityStack {
    entries: Vec<ActivityEntry>,
    /// Foreground origin when the first entry was pushed
    caller: Option<String>,
    retiring: Vec<Frame>,
}

impl InlineActivityStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry; the first one records `foreground` as the caller
    pub fn push(&mut self, entry: ActivityEntry, foreground: Option<&str>) {
        if self.entries.is_empty() {
            self.caller = foreground.map(str::to_string);
        }
        self.entries.push(entry);
    }

    pub fn pop_top(&mut self) -> Option<ActivityEntry> {
        self.entries.pop()
    }

    /// Remove every entry, most recent first
    pub fn drain(&mut self) -> Vec<ActivityEntry> {
        let mut entries = std::mem::take(&mut self.entries);
        entries.reverse();
        entries
    }

    /// Remove the entry owning `surface`
    pub fn remove(&mut self, surface: SurfaceId) -> Option<ActivityEntry> {
        let index = self
            .entries
            .iter()
            .position(|entry| entry.frame.id() == surface)?;
        Some(self.entries.remove(index))
    }

    pub fn top(&self) -> Option<&ActivityEntry> {
        self.entries.last()
    }

    pub fn top_mut(&mut self) -> Option<&mut ActivityEntry> {
        self.entries.last_mut()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, surface: SurfaceId) -> bool {
        self.entries.iter().any(|entry| entry.frame.id() == surface)
    }

    pub fn caller(&self) -> Option<&str> {
        self.caller.as_deref()
    }

    pub fn take_caller(&mut self) -> Option<String> {
        self.caller.take()
    }

    /// Frame of a live or retiring entry
    pub fn find_mut(&mut self, surface: SurfaceId) -> Option<&mut Frame> {
        self.entries
            .iter_mut()
            .map(|entry| &mut entry.frame)
            .chain(self.retiring.iter_mut())
            .find(|frame| frame.id() == surface)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ActivityEntry> {
        self.entries.iter_mut()
    }

    /// Keep a closing frame around until its transition ends
    pub fn retire(&mut self, frame: Frame) {
        self.retiring.push(frame);
    }

    pub fn is_retiring(&self, surface: SurfaceId) -> bool {
        self.retiring.iter().any(|frame| frame.id() == surface)
    }

    pub fn take_retired(&mut self, surface: SurfaceId) -> Option<Frame> {
        let index = self.retiring.iter().position(|frame| frame.id() == surface)?;
        Some(self.retiring.remove(index))
    }
}

impl WindowManager {
    /// Stack a new inline activity above the foreground app
    pub fn start_inline_activity(&mut self, request: ActivityRequest) -> SurfaceId {
        let id = SurfaceId::next();
        let surface_request = SurfaceRequest {
            url: request.url.clone(),
            manifest_url: Some(request.manifest_url.clone()),
            kind: SurfaceKind::InlineActivity,
            background: false,
        };
        let surface = self.surfaces.create(id, &surface_request);

        let mut frame = Frame::new(id, surface, &surface_request);
        let (width, height) = self.foreground_box();
        frame.resize(width, height);
        frame.insert(FrameMarkers::INLINE_ACTIVITY);

        if self.activities.is_empty() {
            self.chrome.set_inline_activity_mode(true);
            self.chrome.set_footer_visible(false);
        }

        tracing::info!(origin = %request.origin, surface = %id, "inline activity started");
        let foreground = self.displayed.clone();
        self.activities.push(
            ActivityEntry {
                origin: request.origin,
                manifest_url: request.manifest_url,
                frame,
            },
            foreground.as_deref(),
        );
        self.request_background(id, &request.url, AfterBackground::ShowActivity);
        id
    }

    /// Finish the top activity, returning to the caller once none are left
    pub fn activity_done(&mut self) {
        self.stop_inline_activity(false);
    }

    /// Remove the top activity, or all of them
    pub fn stop_inline_activity(&mut self, all: bool) {
        if self.activities.is_empty() {
            return;
        }

        let removed = if all {
            self.activities.drain()
        } else {
            self.activities.pop_top().into_iter().collect()
        };
        for entry in removed {
            self.retire_activity(entry.frame);
        }
        self.after_activity_removed();
    }

    /// Drop every activity without returning to the caller
    pub(crate) fn collapse_activities(&mut self) {
        if self.activities.is_empty() {
            return;
        }

        for entry in self.activities.drain() {
            self.retire_activity(entry.frame);
        }
        self.activities.take_caller();
        self.restore_chrome();
        self.focus_foreground();
    }

    /// The surface of an activity crashed
    pub(crate) fn remove_activity(&mut self, surface: SurfaceId) {
        if let Some(mut frame) = self.activities.take_retired(surface) {
            frame.dispose();
            return;
        }
        let Some(mut entry) = self.activities.remove(surface) else {
            return;
        };

        tracing::warn!(origin = %entry.origin, %surface, "inline activity crashed");
        self.release_surface(surface);
        entry.frame.dispose();
        self.after_activity_removed();
    }

    fn after_activity_removed(&mut self) {
        if let Some(top) = self.activities.top_mut() {
            top.frame.set_visible(true);
            if top.frame.is_active() {
                top.frame.focus();
            } else {
                // Pushed over before its background resolved: show it now
                let (surface, url) = (top.frame.id(), top.frame.url().to_string());
                self.request_background(surface, &url, AfterBackground::ShowActivity);
            }
            return;
        }

        self.restore_chrome();
        self.focus_foreground();

        let Some(caller) = self.activities.take_caller() else {
            return;
        };
        if self.displayed.as_deref() != Some(caller.as_str()) && self.registry.is_running(&caller) {
            tracing::debug!(origin = %caller, "returning to activity caller");
            self.set_displayed_app(Some(&caller), None);
        }
    }

    /// Take a frame off screen, animating it out if it was shown
    fn retire_activity(&mut self, mut frame: Frame) {
        let surface = frame.id();
        self.transition.release(surface);

        if frame.is_active() {
            frame.blur();
            frame.remove(FrameMarkers::ACTIVE);
            self.activities.retire(frame);

            let deadline = Instant::now() + self.config.transition_timeout();
            self.scheduler
                .schedule(deadline, TimerKind::RetireActivity(surface));
        } else {
            frame.dispose();
        }
    }

    pub(crate) fn dispose_retired(&mut self, surface: SurfaceId) {
        if let Some(mut frame) = self.activities.take_retired(surface) {
            tracing::debug!(%surface, "disposing retired activity");
            frame.dispose();
        }
    }

    fn restore_chrome(&mut self) {
        let wrapper = self
            .displayed
            .as_deref()
            .and_then(|origin| self.registry.get(origin))
            .is_some_and(|app| app.wrapper);
        self.chrome.set_inline_activity_mode(false);
        self.chrome.set_footer_visible(wrapper);
    }

    fn focus_foreground(&mut self) {
        let Some(origin) = self.displayed.clone() else {
            return;
        };
        if let Some(app) = self.registry.get_mut(&origin) {
            app.frame.focus();
        }
    }

    /// Box of the foreground app
    pub(crate) fn foreground_box(&self) -> (u32, u32) {
        self.displayed
            .as_deref()
            .and_then(|origin| self.registry.get(origin))
            .map(|app| app.frame.size())
            .filter(|(width, height)| *width > 0 && *height > 0)
            .unwrap_or_else(|| self.viewport.frame_size(false, false))
    }

    /// Background lookup for a pushed activity completed
    pub(crate) fn show_activity(&mut self, surface: SurfaceId, bitmap: Option<Bitmap>) {
        if self.activities.top().map(|top| top.frame.id()) != Some(surface) {
            tracing::trace!(%surface, "activity no longer on top");
            return;
        }

        let foreground = self.displayed.clone();
        if let Some(app) = foreground.and_then(|origin| self.registry.get_mut(&origin)) {
            app.frame.blur();
        }
        for entry in self.activities.iter_mut() {
            if entry.frame.id() != surface {
                entry.frame.blur();
            }
        }

        if self.transition.open_surface().is_none() {
            self.transition.claim_open(surface, None);
        }

        let Some(frame) = self.activities.find_mut(surface) else {
            return;
        };
        if !frame.is_painted() {
            frame.set_background(match bitmap {
                Some(bitmap) => Background::Screenshot(bitmap),
                None => Background::Default,
            });
        }
        frame.set_visible(true);
        frame.insert(FrameMarkers::ACTIVE);
    }

    pub(crate) fn activity_transition_ended(&mut self, surface: SurfaceId) {
        if self.activities.is_retiring(surface) {
            self.dispose_retired(surface);
            return;
        }

        let is_top = self.activities.top().map(|top| top.frame.id()) == Some(surface);
        let Some(frame) = self.activities.find_mut(surface) else {
            return;
        };
        if frame.is_active() && is_top {
            frame.focus();
        }
        if self.transition.open_surface() == Some(surface) {
            self.transition.take_open();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{Surface, SurfaceKind, SurfaceRequest};

    struct Blank;
    impl Surface for Blank {}

    fn entry(name: &str) -> ActivityEntry {
        let request = SurfaceRequest {
            url: format!("app://{name}/pick.html"),
            manifest_url: None,
            kind: SurfaceKind::InlineActivity,
            background: false,
        };
        ActivityEntry {
            origin: format!("app://{name}"),
            manifest_url: format!("app://{name}/manifest.webapp"),
            frame: Frame::new(SurfaceId::next(), Box::new(Blank), &request),
        }
    }

    #[test]
    fn test_caller_recorded_by_first_push() {
        let mut stack = InlineActivityStack::new();
        stack.push(entry("gallery"), Some("app://sms"));
        stack.push(entry("camera"), Some("app://other"));

        assert_eq!(stack.caller(), Some("app://sms"));
        assert_eq!(stack.top().map(|e| e.origin.as_str()), Some("app://camera"));

        let drained: Vec<String> = stack.drain().into_iter().map(|e| e.origin).collect();
        assert_eq!(drained, vec!["app://camera", "app://gallery"]);
        assert!(stack.is_empty());
        assert_eq!(stack.take_caller().as_deref(), Some("app://sms"));
        assert_eq!(stack.take_caller(), None);
    }

    #[test]
    fn test_retiring_frames_stay_addressable() {
        let mut stack = InlineActivityStack::new();
        stack.push(entry("gallery"), None);
        let id = stack.top().unwrap().frame.id();

        let popped = stack.pop_top().unwrap();
        stack.retire(popped.frame);

        assert!(!stack.contains(id));
        assert!(stack.find_mut(id).is_some());
        assert!(stack.take_retired(id).is_some());
        assert!(stack.find_mut(id).is_none());
    }

    #[test]
    fn test_remove_middle_entry() {
        let mut stack = InlineActivityStack::new();
        stack.push(entry("a"), None);
        stack.push(entry("b"), None);
        let first = stack.iter_mut().next().unwrap().frame.id();

        assert_eq!(stack.remove(first).map(|e| e.origin), Some("app://a".into()));
        assert_eq!(stack.len(), 1);
    }

    mod flows {
        use crate::frame::FrameMarkers;
        use crate::test_support::*;

        #[test]
        fn test_popping_returns_focus_down_the_stack() {
            let mut h = Harness::at_home();
            h.show(APP_A);

            let first = h.wm.start_inline_activity(activity(APP_B));
            h.settle();
            let second = h.wm.start_inline_activity(activity(COMMS));
            h.settle();

            assert_eq!(h.wm.activities().len(), 2);
            assert!(h.surfaces.log(second).focused > 0);
            assert!(h.surfaces.log(first).blurred > 0);
            assert!(h.chrome_calls().contains(&ChromeCall::InlineActivityMode(true)));

            let first_focus = h.surfaces.log(first).focused;
            h.wm.activity_done();
            h.settle();

            assert_eq!(h.wm.activities().len(), 1);
            assert!(h.surfaces.log(first).focused > first_focus);
            assert_eq!(h.surfaces.log(second).disposed, 1);

            let caller_focus = h.log(APP_A).focused;
            h.wm.activity_done();
            h.settle();

            assert!(h.wm.activities().is_empty());
            assert_eq!(h.surfaces.log(first).disposed, 1);
            assert!(h.log(APP_A).focused > caller_focus);
            assert_eq!(h.wm.displayed_app(), Some(APP_A));
            assert_eq!(
                h.chrome_calls().last(),
                Some(&ChromeCall::Footer(false)),
            );
            assert!(h.chrome_calls().contains(&ChromeCall::InlineActivityMode(false)));
        }

        #[test]
        fn test_stop_all_restores_caller_once() {
            let mut h = Harness::at_home();
            h.show(APP_A);
            h.wm.start_inline_activity(activity(APP_B));
            h.wm.start_inline_activity(activity(COMMS));
            h.settle();

            let caller_focus = h.log(APP_A).focused;
            h.wm.stop_inline_activity(true);
            h.settle();

            assert!(h.wm.activities().is_empty());
            assert_eq!(h.log(APP_A).focused, caller_focus + 1);
            let restores = h
                .chrome_calls()
                .iter()
                .filter(|call| **call == ChromeCall::InlineActivityMode(false))
                .count();
            assert_eq!(restores, 1);
        }

        #[test]
        fn test_crashed_activity_is_dropped() {
            let mut h = Harness::at_home();
            h.show(APP_A);
            let surface = h.wm.start_inline_activity(activity(APP_B));
            h.settle();

            h.wm.surface_crashed(surface, true);
            h.settle();

            assert!(h.wm.activities().is_empty());
            assert_eq!(h.surfaces.log(surface).disposed, 1);
            assert!(h.wm.registry().is_running(APP_A));
            assert_eq!(h.wm.displayed_app(), Some(APP_A));
        }

        #[test]
        fn test_switching_apps_collapses_activities() {
            let mut h = Harness::at_home();
            h.show(APP_A);
            let surface = h.wm.start_inline_activity(activity(COMMS));
            h.settle();

            h.show(APP_B);

            assert!(h.wm.activities().is_empty());
            assert_eq!(h.surfaces.log(surface).disposed, 1);
            assert_eq!(h.wm.displayed_app(), Some(APP_B));
        }

        #[test]
        fn test_refocus_foreground_when_redisplayed_over_activity() {
            let mut h = Harness::at_home();
            h.show(APP_A);
            let surface = h.wm.start_inline_activity(activity(APP_B));
            h.settle();
            let focused = h.log(APP_A).focused;

            h.wm.set_displayed_app(Some(APP_A), None);
            h.settle();

            assert!(h.wm.activities().is_empty());
            assert_eq!(h.surfaces.log(surface).disposed, 1);
            assert_eq!(h.log(APP_A).focused, focused + 1);
            assert_eq!(h.wm.displayed_app(), Some(APP_A));
        }

        #[test]
        fn test_entry_pushed_over_before_shown_gets_focus() {
            let mut h = Harness::at_home();
            h.show(APP_A);
            let first = h.wm.start_inline_activity(activity(APP_B));
            let second = h.wm.start_inline_activity(activity(COMMS));
            h.settle();
            assert_eq!(h.surfaces.log(first).focused, 0);

            h.wm.activity_done();
            h.settle();

            assert_eq!(h.surfaces.log(second).disposed, 1);
            let log = h.surfaces.log(first);
            assert!(log.visible);
            assert!(log.focused > 0);
            assert!(log.markers.last().is_some_and(|m| m.contains(FrameMarkers::ACTIVE)));
            assert_eq!(h.wm.transition().open_surface(), None);
        }

        #[test]
        fn test_hung_activity_is_disposed_by_timer() {
            let mut h = Harness::at_home();
            h.show(APP_A);
            let surface = h.wm.start_inline_activity(activity(APP_B));
            h.settle();

            h.wm.activity_done();
            // The renderer never ends the closing animation
            h.surfaces.take_transitions();
            assert_eq!(h.surfaces.log(surface).disposed, 0);

            h.wm.fire_timers(std::time::Instant::now() + std::time::Duration::from_secs(5));
            assert_eq!(h.surfaces.log(surface).disposed, 1);
        }
    }
}
