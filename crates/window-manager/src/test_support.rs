//! Recording fakes for the collaborators

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use screenshot_cache::{Bitmap, ScreenshotCache};
use tokio::sync::broadcast;

use crate::activity::ActivityRequest;
use crate::collaborators::{AttentionScreen, Collaborators, ShellChrome};
use crate::config::ShellConfig;
use crate::coordinator::WindowManager;
use crate::events::ShellEvent;
use crate::frame::FrameMarkers;
use crate::manifest::{AppDescriptor, Manifest, StaticDirectory};
use crate::orientation::{Orientation, OrientationLock};
use crate::surface::{Surface, SurfaceError, SurfaceFactory, SurfaceId, SurfaceKind, SurfaceRequest};

pub const HOME: &str = "app://home.test";
pub const ALT_HOME: &str = "app://althome.test";
pub const APP_A: &str = "app://a.test";
pub const APP_B: &str = "app://b.test";
pub const FTU: &str = "app://ftu.test";
pub const COMMS: &str = "app://comms.test";

/// Everything a surface was asked to do
#[derive(Debug, Clone, Default)]
pub struct SurfaceLog {
    pub kind: Option<SurfaceKind>,
    pub url: String,
    pub visible: bool,
    pub focused: usize,
    pub blurred: usize,
    pub size: (u32, u32),
    pub paint_requests: usize,
    pub paint_cancels: usize,
    pub markers: Vec<FrameMarkers>,
    pub backgrounds: Vec<Option<Bitmap>>,
    pub navigations: Vec<String>,
    pub reloads: usize,
    pub disposed: usize,
    /// Waiting for the renderer to paint
    pub paint_pending: bool,
    /// Waiting for the renderer to end an animation
    pub transition_pending: bool,
}

type Logs = Rc<RefCell<BTreeMap<SurfaceId, SurfaceLog>>>;

/// Shared view of every surface log
#[derive(Clone, Default)]
pub struct SurfaceLogs(Logs);

impl SurfaceLogs {
    pub fn log(&self, id: SurfaceId) -> SurfaceLog {
        self.0.borrow().get(&id).cloned().unwrap_or_default()
    }

    /// Surfaces with an outstanding paint request, clearing it
    pub fn take_paints(&self) -> Vec<SurfaceId> {
        self.take(|log| &mut log.paint_pending)
    }

    /// Surfaces with an animation in flight, clearing it
    pub fn take_transitions(&self) -> Vec<SurfaceId> {
        self.take(|log| &mut log.transition_pending)
    }

    fn take(&self, flag: impl Fn(&mut SurfaceLog) -> &mut bool) -> Vec<SurfaceId> {
        let mut logs = self.0.borrow_mut();
        logs.iter_mut()
            .filter(|(_, log)| log.disposed == 0)
            .filter_map(|(id, log)| std::mem::take(flag(log)).then_some(*id))
            .collect()
    }
}

pub struct RecordingSurfaces {
    logs: SurfaceLogs,
    capture: Option<Bitmap>,
}

impl RecordingSurfaces {
    pub fn new() -> Self {
        Self {
            logs: SurfaceLogs::default(),
            capture: None,
        }
    }

    pub fn with_capture(bitmap: Bitmap) -> Self {
        Self {
            capture: Some(bitmap),
            ..Self::new()
        }
    }

    pub fn logs(&self) -> SurfaceLogs {
        self.logs.clone()
    }

    pub fn log(&self, id: SurfaceId) -> SurfaceLog {
        self.logs.log(id)
    }
}

impl SurfaceFactory for RecordingSurfaces {
    fn create(&mut self, id: SurfaceId, request: &SurfaceRequest) -> Box<dyn Surface> {
        self.logs.0.borrow_mut().insert(
            id,
            SurfaceLog {
                kind: Some(request.kind),
                url: request.url.clone(),
                ..Default::default()
            },
        );
        Box::new(RecordingSurface {
            id,
            kind: request.kind,
            logs: self.logs.0.clone(),
            capture: self.capture.clone(),
        })
    }
}

struct RecordingSurface {
    id: SurfaceId,
    kind: SurfaceKind,
    logs: Logs,
    capture: Option<Bitmap>,
}

impl RecordingSurface {
    fn record(&self, f: impl FnOnce(&mut SurfaceLog)) {
        if let Some(log) = self.logs.borrow_mut().get_mut(&self.id) {
            f(log);
        }
    }
}

impl Surface for RecordingSurface {
    fn set_visible(&mut self, visible: bool) {
        self.record(|log| log.visible = visible);
    }

    fn focus(&mut self) {
        self.record(|log| log.focused += 1);
    }

    fn blur(&mut self) {
        self.record(|log| log.blurred += 1);
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.record(|log| log.size = (width, height));
    }

    fn request_next_paint(&mut self) {
        self.record(|log| {
            log.paint_requests += 1;
            log.paint_pending = true;
        });
    }

    fn cancel_next_paint(&mut self) {
        self.record(|log| {
            log.paint_cancels += 1;
            log.paint_pending = false;
        });
    }

    fn apply_markers(&mut self, markers: FrameMarkers) {
        let animates = markers.intersects(FrameMarkers::TRANSITION)
            || self.kind == SurfaceKind::InlineActivity;
        self.record(|log| {
            log.markers.push(markers);
            log.transition_pending |= animates;
        });
    }

    fn set_background(&mut self, background: Option<&Bitmap>) {
        let background = background.cloned();
        self.record(|log| log.backgrounds.push(background));
    }

    fn capture_screenshot(&mut self, _width: u32, _height: u32) -> Result<Bitmap, SurfaceError> {
        self.capture.clone().ok_or(SurfaceError::Unsupported)
    }

    fn navigate(&mut self, url: &str) {
        self.record(|log| {
            log.url = url.to_string();
            log.navigations.push(url.to_string());
        });
    }

    fn reload(&mut self) {
        self.record(|log| log.reloads += 1);
    }

    fn dispose(&mut self) {
        self.record(|log| {
            log.disposed += 1;
            log.visible = false;
        });
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChromeCall {
    DismissSplash,
    FirstRunMode(bool),
    Footer(bool),
    Fullscreen(bool),
    InlineActivityMode(bool),
}

#[derive(Clone, Default)]
pub struct RecordingChrome(pub Rc<RefCell<Vec<ChromeCall>>>);

impl ShellChrome for RecordingChrome {
    fn dismiss_splash(&mut self) {
        self.0.borrow_mut().push(ChromeCall::DismissSplash);
    }

    fn set_first_run_mode(&mut self, active: bool) {
        self.0.borrow_mut().push(ChromeCall::FirstRunMode(active));
    }

    fn set_footer_visible(&mut self, visible: bool) {
        self.0.borrow_mut().push(ChromeCall::Footer(visible));
    }

    fn set_fullscreen_layout(&mut self, fullscreen: bool) {
        self.0.borrow_mut().push(ChromeCall::Fullscreen(fullscreen));
    }

    fn set_inline_activity_mode(&mut self, active: bool) {
        self.0.borrow_mut().push(ChromeCall::InlineActivityMode(active));
    }
}

/// Lock calls, `None` for unlock
#[derive(Clone, Default)]
pub struct RecordingOrientation(pub Rc<RefCell<Vec<Option<Orientation>>>>);

impl OrientationLock for RecordingOrientation {
    fn lock(&mut self, orientation: Orientation) {
        self.0.borrow_mut().push(Some(orientation));
    }

    fn unlock(&mut self) {
        self.0.borrow_mut().push(None);
    }
}

#[derive(Clone, Default)]
pub struct FakeAttention {
    pub fully_visible: Rc<Cell<bool>>,
    pub shown: Rc<RefCell<Vec<String>>>,
}

impl AttentionScreen for FakeAttention {
    fn is_fully_visible(&self) -> bool {
        self.fully_visible.get()
    }

    fn show_for_origin(&mut self, origin: &str) {
        self.shown.borrow_mut().push(origin.to_string());
    }
}

pub fn test_config() -> ShellConfig {
    let mut config = ShellConfig::default();
    config.homescreen_manifest_url = format!("{HOME}/manifest.webapp");
    config.screenshots.enabled = false;
    config
}

fn app(origin: &str, manifest: Manifest) -> AppDescriptor {
    AppDescriptor::new(origin, format!("{origin}/manifest.webapp"), manifest)
}

pub fn test_directory() -> StaticDirectory {
    let comms = Manifest::from_json(
        r#"{
            "name": "Communications",
            "type": "certified",
            "launch_path": "/index.html",
            "entry_points": {
                "dialer": { "name": "Phone", "launch_path": "/dialer/index.html", "fullscreen": true },
                "contacts": { "name": "Contacts", "launch_path": "/contacts/index.html" }
            }
        }"#,
    )
    .unwrap();

    [
        app(HOME, Manifest::simple("Home").with_orientation(Orientation::PortraitPrimary)),
        app(ALT_HOME, Manifest::simple("Other Home")),
        app(APP_A, Manifest::simple("A").with_orientation(Orientation::LandscapePrimary)),
        app(APP_B, Manifest::simple("B")),
        app(FTU, Manifest::simple("First Run").with_fullscreen(true)),
        app(COMMS, comms),
    ]
    .into_iter()
    .collect()
}

pub fn activity(origin: &str) -> ActivityRequest {
    ActivityRequest {
        origin: origin.to_string(),
        manifest_url: format!("{origin}/manifest.webapp"),
        url: format!("{origin}/pick.html"),
    }
}

/// A window manager wired to recording fakes plus a scripted renderer
pub struct Harness {
    pub wm: WindowManager,
    pub surfaces: SurfaceLogs,
    pub chrome: RecordingChrome,
    pub orientation: RecordingOrientation,
    pub attention: FakeAttention,
    pub cache: ScreenshotCache,
    pub events: broadcast::Receiver<ShellEvent>,
}

impl Harness {
    pub fn new() -> Self {
        Self::build(test_config(), RecordingSurfaces::new())
    }

    pub fn with_config(config: ShellConfig) -> Self {
        Self::build(config, RecordingSurfaces::new())
    }

    pub fn with_capture(bitmap: Bitmap) -> Self {
        Self::build(test_config(), RecordingSurfaces::with_capture(bitmap))
    }

    /// Booted with home in the foreground
    pub fn at_home() -> Self {
        let mut harness = Self::new();
        harness.wm.set_displayed_app(None, None);
        harness.settle();
        harness
    }

    fn build(config: ShellConfig, surfaces: RecordingSurfaces) -> Self {
        let logs = surfaces.logs();
        let chrome = RecordingChrome::default();
        let orientation = RecordingOrientation::default();
        let attention = FakeAttention::default();
        let cache = ScreenshotCache::in_memory();

        let collaborators = Collaborators::new(surfaces, test_directory())
            .with_chrome(chrome.clone())
            .with_orientation_lock(orientation.clone())
            .with_attention_screen(attention.clone())
            .with_screenshots(cache.clone());

        let wm = WindowManager::new(config, collaborators);
        let events = wm.subscribe();

        Self {
            wm,
            surfaces: logs,
            chrome,
            orientation,
            attention,
            cache,
            events,
        }
    }

    /// One renderer round: drain work, deliver paints, end animations.
    /// Returns false when nothing happened.
    pub fn step(&mut self) -> bool {
        let pending = self.wm.has_pending();
        self.wm.run_pending();

        let paints = self.surfaces.take_paints();
        for surface in &paints {
            self.wm.surface_painted(*surface);
        }
        self.wm.run_pending();

        let transitions = self.surfaces.take_transitions();
        for surface in &transitions {
            self.wm.transition_ended(*surface);
        }
        self.wm.run_pending();

        pending || !paints.is_empty() || !transitions.is_empty()
    }

    /// Let the renderer run until everything settled
    pub fn settle(&mut self) {
        for _ in 0..64 {
            if !self.step() {
                return;
            }
        }
        panic!("renderer never settled");
    }

    /// Start `origin` without showing it
    pub fn start(&mut self, origin: &str) {
        self.wm.open_app_message(
            &format!("{origin}/manifest.webapp"),
            &format!("{origin}/index.html"),
            true,
        );
    }

    /// Start if needed and bring `origin` to the foreground
    pub fn show(&mut self, origin: &str) {
        if !self.wm.registry().is_running(origin) {
            self.start(origin);
        }
        self.wm.set_displayed_app(Some(origin), None);
        self.settle();
    }

    pub fn go_home(&mut self) {
        self.wm.set_displayed_app(None, None);
        self.settle();
    }

    pub fn surface(&self, origin: &str) -> SurfaceId {
        self.wm
            .registry()
            .get(origin)
            .map(|app| app.frame.id())
            .unwrap_or_else(|| panic!("{origin} is not running"))
    }

    pub fn log(&self, origin: &str) -> SurfaceLog {
        self.surfaces.log(self.surface(origin))
    }

    /// Events emitted since the last call
    pub fn events(&mut self) -> Vec<ShellEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }

    pub fn chrome_calls(&self) -> Vec<ChromeCall> {
        self.chrome.0.borrow().clone()
    }

    pub fn orientation_calls(&self) -> Vec<Option<Orientation>> {
        self.orientation.0.borrow().clone()
    }
}
