//! Foreground coordination
//!
//! [`WindowManager::set_displayed_app`] is the single entry point that
//! changes which app is in the foreground. Every request resets the slots
//! left over from the previous one, is classified into one
//! [`TransitionCase`] and handed to the transition code.

use std::collections::HashMap;
use std::time::Instant;

use chrono::Utc;
use screenshot_cache::ScreenshotCache;
use tokio::sync::broadcast;

use crate::activity::InlineActivityStack;
use crate::collaborators::{AttentionScreen, Collaborators, ShellChrome};
use crate::config::ShellConfig;
use crate::error::{Result, WindowManagerError};
use crate::events::{EventBus, ShellEvent};
use crate::frame::FrameMarkers;
use crate::manifest::{AppDescriptor, AppDirectory};
use crate::orientation::OrientationLock;
use crate::registry::{AppInstance, AppRegistry, LaunchSpec};
use crate::scheduler::{Scheduler, Task, TimerKind};
use crate::surface::SurfaceFactory;
use crate::transition::TransitionController;
use crate::viewport::Viewport;

/// Work to run once a request completes
pub type Continuation = Box<dyn FnOnce(&mut WindowManager)>;

/// How a foreground request is carried out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionCase {
    /// Home is already foreground; replay its open
    RefreshHome,
    /// The target is already foreground
    AlreadyDisplayed,
    /// First app after boot is the first-run experience
    FirstRun,
    /// Nothing or home to an app, or nothing to home
    Open,
    /// App to home
    Close,
    /// App to app
    Switch,
}

/// Classify a request for `target` while `current` is foreground
pub fn classify(
    current: Option<&str>,
    target: &str,
    home: &str,
    first_run: Option<&str>,
) -> TransitionCase {
    match current {
        Some(current) if current == target => {
            if target == home {
                TransitionCase::RefreshHome
            } else {
                TransitionCase::AlreadyDisplayed
            }
        }
        None if first_run == Some(target) => TransitionCase::FirstRun,
        None => TransitionCase::Open,
        Some(current) if current == home => TransitionCase::Open,
        Some(_) if target == home => TransitionCase::Close,
        Some(_) => TransitionCase::Switch,
    }
}

/// Owner of every running app and of the foreground
pub struct WindowManager {
    pub(crate) config: ShellConfig,
    pub(crate) viewport: Viewport,
    pub(crate) registry: AppRegistry,
    pub(crate) transition: TransitionController,
    pub(crate) activities: InlineActivityStack,
    pub(crate) scheduler: Scheduler,
    pub(crate) events: EventBus,
    pub(crate) surfaces: Box<dyn SurfaceFactory>,
    pub(crate) directory: Box<dyn AppDirectory>,
    pub(crate) orientation: Box<dyn OrientationLock>,
    pub(crate) attention: Box<dyn AttentionScreen>,
    pub(crate) chrome: Box<dyn ShellChrome>,
    pub(crate) screenshots: ScreenshotCache,
    /// Foreground origin; `None` while nothing has opened yet
    pub(crate) displayed: Option<String>,
    /// Origin of the running homescreen
    pub(crate) home: Option<String>,
    /// Origin of the first-run app while it runs
    pub(crate) first_run: Option<String>,
    pub(crate) first_run_active: bool,
    pub(crate) locked: bool,
    /// Continuations of kills waiting for their surface to detach
    pending_kills: HashMap<String, Continuation>,
}

impl WindowManager {
    pub fn new(config: ShellConfig, collaborators: Collaborators) -> Self {
        let screen = Viewport::default();
        let viewport = config.viewport(screen.width, screen.height);

        Self {
            config,
            viewport,
            registry: AppRegistry::new(),
            transition: TransitionController::new(),
            activities: InlineActivityStack::new(),
            scheduler: Scheduler::new(),
            events: EventBus::new(),
            surfaces: collaborators.surfaces,
            directory: collaborators.directory,
            orientation: collaborators.orientation,
            attention: collaborators.attention,
            chrome: collaborators.chrome,
            screenshots: collaborators.screenshots,
            displayed: None,
            home: None,
            first_run: None,
            first_run_active: false,
            locked: false,
            pending_kills: HashMap::new(),
        }
    }

    /// Subscribe to lifecycle events
    pub fn subscribe(&self) -> broadcast::Receiver<ShellEvent> {
        self.events.subscribe()
    }

    /// Register a listener that may veto an app opening
    pub fn add_will_open_guard(&mut self, guard: impl FnMut(&str) -> bool + 'static) {
        self.events.add_will_open_guard(guard);
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn registry(&self) -> &AppRegistry {
        &self.registry
    }

    pub fn activities(&self) -> &InlineActivityStack {
        &self.activities
    }

    pub fn transition(&self) -> &TransitionController {
        &self.transition
    }

    /// Foreground origin, `None` before anything opened
    pub fn displayed_app(&self) -> Option<&str> {
        self.displayed.as_deref()
    }

    pub fn home_origin(&self) -> Option<&str> {
        self.home.as_deref()
    }

    pub fn is_transitioning(&self) -> bool {
        !self.transition.is_idle()
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Run `continuation` on the next turn
    pub fn defer(&mut self, continuation: Continuation) {
        self.scheduler.defer(Task::Continue(continuation));
    }

    pub(crate) fn defer_opt(&mut self, continuation: Option<Continuation>) {
        if let Some(continuation) = continuation {
            self.defer(continuation);
        }
    }

    /// Drain deferred work, including work queued while draining
    pub fn run_pending(&mut self) {
        while let Some(task) = self.scheduler.pop() {
            match task {
                Task::Continue(continuation) => continuation(self),
                Task::BackgroundResolved {
                    surface,
                    bitmap,
                    then,
                } => self.background_resolved(surface, bitmap, then),
            }
        }
    }

    pub fn has_pending(&self) -> bool {
        self.scheduler.has_pending()
    }

    /// Earliest timer deadline
    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    /// Fire every timer due at `now`, then drain deferred work
    pub fn fire_timers(&mut self, now: Instant) {
        for timer in self.scheduler.take_due(now) {
            match timer {
                TimerKind::PaintTimeout(wait) => self.paint_timed_out(wait),
                TimerKind::CaptureScreenshot(surface) => self.capture_screenshot(surface),
                TimerKind::RetireActivity(surface) => self.dispose_retired(surface),
            }
        }
        self.run_pending();
    }

    /// Installed app behind `manifest_url`
    pub(crate) fn resolve_app(&self, manifest_url: &str) -> Result<AppDescriptor> {
        self.directory
            .resolve(manifest_url)
            .ok_or_else(|| WindowManagerError::UnknownManifest(manifest_url.to_string()))
    }

    /// Fails unless `origin` runs and is not being killed
    pub(crate) fn check_running(&self, origin: &str) -> Result<()> {
        match self.registry.get(origin) {
            Some(app) if !app.killed => Ok(()),
            _ => Err(WindowManagerError::NotRunning(origin.to_string())),
        }
    }

    /// Make sure the homescreen runs, starting it if needed
    pub fn ensure_home(&mut self) -> Result<String> {
        let manifest_url = self.config.homescreen_manifest_url.clone();
        let app = self
            .directory
            .resolve(&manifest_url)
            .ok_or_else(|| WindowManagerError::MissingHomescreen(manifest_url.clone()))?;

        let origin = app.origin.clone();
        if !self.registry.is_running(&origin) {
            let spec = LaunchSpec::new(app.launch_url(), manifest_url, app.manifest);
            let instance = self
                .registry
                .create(&origin, spec, self.surfaces.as_mut())?;
            let (width, height) = self.viewport.frame_size(instance.fullscreen, false);
            instance.frame.resize(width, height);
        }

        self.home = Some(origin.clone());
        Ok(origin)
    }

    /// Bring `origin` (home when `None`) to the foreground
    ///
    /// `on_done` runs once the request settled: after the transition, right
    /// away when nothing has to move, and also when the request is refused.
    pub fn set_displayed_app(&mut self, origin: Option<&str>, on_done: Option<Continuation>) {
        let home = match self.ensure_home() {
            Ok(home) => home,
            Err(err) => {
                tracing::warn!(%err, "cannot change the foreground");
                self.defer_opt(on_done);
                return;
            }
        };

        let target = origin.unwrap_or(&home).to_string();
        if let Err(err) = self.check_running(&target) {
            tracing::warn!(%err, "ignoring foreground request");
            self.defer_opt(on_done);
            return;
        }

        let current = self.displayed.clone();
        let case = classify(
            current.as_deref(),
            &target,
            &home,
            self.first_run.as_deref(),
        );

        self.transition.cancel_latches();
        self.collapse_activities();
        self.reset_slots();

        if target == home && !self.attention.is_fully_visible() {
            if let Some(app) = self.registry.get_mut(&home) {
                app.frame.set_visible(true);
            }
        }

        if current.as_deref() != Some(target.as_str()) && !self.events.dispatch_will_open(&target) {
            tracing::info!(origin = %target, "opening vetoed");
            if let Some(on_done) = on_done {
                on_done(self);
            }
            return;
        }

        tracing::debug!(from = ?current, to = %target, ?case, "set displayed app");
        match case {
            TransitionCase::RefreshHome | TransitionCase::Open => {
                self.open_window(&target, on_done)
            }
            TransitionCase::AlreadyDisplayed => {
                if let Some(on_done) = on_done {
                    on_done(self);
                }
            }
            TransitionCase::FirstRun => {
                let finish: Continuation = Box::new(move |wm: &mut WindowManager| {
                    wm.chrome.dismiss_splash();
                    wm.chrome.set_first_run_mode(true);
                    wm.first_run_active = true;
                    if let Some(on_done) = on_done {
                        on_done(wm);
                    }
                });
                self.open_window(&target, Some(finish));
            }
            TransitionCase::Close => match current {
                Some(current) => self.close_window(&current, on_done),
                None => self.open_window(&target, on_done),
            },
            TransitionCase::Switch => self.switch_window(&target, on_done),
        }

        if let Some(app) = self.registry.get_mut(&home) {
            if target == home {
                app.frame.insert(FrameMarkers::ACTIVE);
            } else {
                app.frame.remove(FrameMarkers::ACTIVE);
            }
        }

        if let Some(app) = self.registry.get_mut(&target) {
            app.launch_time = Utc::now();
        }

        self.attention.show_for_origin(&target);
    }

    /// Terminate `origin`
    ///
    /// Safe to call repeatedly: only the first call detaches the surface and
    /// emits [`ShellEvent::AppTerminated`].
    pub fn kill(&mut self, origin: &str, on_done: Option<Continuation>) {
        let Some(app) = self.registry.get_mut(origin) else {
            tracing::debug!(origin, "kill for an app that is not running");
            self.defer_opt(on_done);
            return;
        };
        if app.killed {
            tracing::debug!(origin, "already being killed");
            self.defer_opt(on_done);
            return;
        }
        app.killed = true;

        tracing::info!(origin, "killing app");
        if let Some(on_done) = on_done {
            self.pending_kills.insert(origin.to_string(), on_done);
        }

        let is_home = self.home.as_deref() == Some(origin);
        if self.displayed.as_deref() != Some(origin) {
            self.remove_and_finish(origin);
        } else if is_home {
            self.remove_and_finish(origin);
            match self.ensure_home() {
                Ok(_) => self.set_displayed_app(None, None),
                Err(err) => tracing::warn!(%err, "homescreen not restarted"),
            }
        } else {
            let origin = origin.to_string();
            self.set_displayed_app(
                None,
                Some(Box::new(move |wm: &mut WindowManager| {
                    wm.remove_and_finish(&origin)
                })),
            );
        }
    }

    /// Detach `origin` and forget it
    pub(crate) fn remove_frame(&mut self, origin: &str) -> Option<AppInstance> {
        let app = self.registry.remove(origin)?;
        self.release_surface(app.frame.id());

        if self.displayed.as_deref() == Some(origin) {
            self.displayed = None;
            self.orientation.lock(self.config.default_orientation);
        }
        if self.home.as_deref() == Some(origin) {
            self.home = None;
        }
        Some(app)
    }

    /// Detach a killed app and announce its termination
    pub(crate) fn remove_and_finish(&mut self, origin: &str) {
        if self.remove_frame(origin).is_some() {
            tracing::info!(origin, "app terminated");
            self.events.emit(ShellEvent::AppTerminated {
                origin: origin.to_string(),
            });

            if self.first_run.as_deref() == Some(origin) {
                self.first_run = None;
                self.first_run_active = false;
                self.chrome.set_first_run_mode(false);
                self.events.emit(ShellEvent::FtuDone);
            }
        }

        if let Some(on_done) = self.pending_kills.remove(origin) {
            self.defer(on_done);
        }
    }
}

impl std::fmt::Debug for WindowManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowManager")
            .field("displayed", &self.displayed)
            .field("home", &self.home)
            .field("running", &self.registry.running_count())
            .field("activities", &self.activities.len())
            .field("transitioning", &self.is_transitioning())
            .finish_non_exhaustive()
    }
}
