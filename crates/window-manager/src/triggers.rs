//! Inbound signals from the rest of the shell

use crate::activity::ActivityRequest;
use crate::coordinator::WindowManager;
use crate::manifest::{self, Manifest};
use crate::registry::LaunchSpec;
use crate::surface::SurfaceId;

/// Everything that can happen to the window manager from outside
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Boot,
    /// Launch an installed app, optionally at a specific URL
    Launch {
        manifest_url: String,
        url: Option<String>,
    },
    /// Deliver a system message or URL to an app
    OpenAppMessage {
        manifest_url: String,
        url: String,
        background: bool,
    },
    /// `window.open` with a name from a web page
    OpenNamedWindow {
        url: String,
        name: String,
        opener: Option<String>,
    },
    StartInlineActivity(ActivityRequest),
    ActivityDone,
    HomePressed,
    SurfaceCrashed {
        surface: SurfaceId,
        fatal: bool,
    },
    Uninstall {
        manifest_url: String,
    },
    SurfacePainted(SurfaceId),
    TransitionEnded(SurfaceId),
    SetViewport {
        width: u32,
        height: u32,
    },
    SetKeyboardHeight(u32),
    /// Height of the minimised attention bar, 0 when gone
    AttentionChanged {
        bar_height: u32,
    },
    SetLocked(bool),
    SetHomescreen {
        manifest_url: String,
    },
    Display {
        origin: Option<String>,
    },
    Kill {
        origin: String,
    },
}

impl WindowManager {
    /// Dispatch an inbound signal and drain the work it queued
    pub fn handle(&mut self, event: Inbound) {
        tracing::trace!(?event, "inbound");

        match event {
            Inbound::Boot => self.boot(),
            Inbound::Launch { manifest_url, url } => self.launch(&manifest_url, url.as_deref()),
            Inbound::OpenAppMessage {
                manifest_url,
                url,
                background,
            } => self.open_app_message(&manifest_url, &url, background),
            Inbound::OpenNamedWindow { url, name, opener } => {
                self.open_named_window(&url, &name, opener.as_deref())
            }
            Inbound::StartInlineActivity(request) => {
                self.start_inline_activity(request);
            }
            Inbound::ActivityDone => self.activity_done(),
            Inbound::HomePressed => self.home_pressed(),
            Inbound::SurfaceCrashed { surface, fatal } => self.surface_crashed(surface, fatal),
            Inbound::Uninstall { manifest_url } => self.uninstall(&manifest_url),
            Inbound::SurfacePainted(surface) => self.surface_painted(surface),
            Inbound::TransitionEnded(surface) => self.transition_ended(surface),
            Inbound::SetViewport { width, height } => self.set_viewport(width, height),
            Inbound::SetKeyboardHeight(height) => self.set_keyboard_height(height),
            Inbound::AttentionChanged { bar_height } => self.attention_changed(bar_height),
            Inbound::SetLocked(locked) => self.set_locked(locked),
            Inbound::SetHomescreen { manifest_url } => self.set_homescreen(&manifest_url),
            Inbound::Display { origin } => self.set_displayed_app(origin.as_deref(), None),
            Inbound::Kill { origin } => self.kill(&origin, None),
        }

        self.run_pending();
    }

    /// Show the first-run app if configured, home otherwise
    pub fn boot(&mut self) {
        if let Some(manifest_url) = self.config.first_run_manifest_url.clone() {
            match self.resolve_app(&manifest_url) {
                Ok(app) => {
                    let origin = app.origin.clone();
                    if !self.registry.is_running(&origin) {
                        let spec = LaunchSpec::new(app.launch_url(), manifest_url, app.manifest);
                        if let Err(err) = self.start_app(&origin, spec) {
                            tracing::warn!(%err, "first-run app not started");
                        }
                    }
                    if self.registry.is_running(&origin) {
                        tracing::info!(origin, "starting first-run experience");
                        self.first_run = Some(origin.clone());
                        self.set_displayed_app(Some(&origin), None);
                        return;
                    }
                }
                Err(err) => tracing::warn!(%err, "first-run app is not installed"),
            }
        }

        self.chrome.dismiss_splash();
        self.set_displayed_app(None, None);
    }

    /// Open an installed app, starting it if needed
    pub fn launch(&mut self, manifest_url: &str, url: Option<&str>) {
        let app = match self.resolve_app(manifest_url) {
            Ok(app) => app,
            Err(err) => {
                tracing::warn!(%err, "launch of an unknown app");
                return;
            }
        };

        let url = url.map(str::to_string).unwrap_or_else(|| app.launch_url());
        let (origin, name) = manifest::launch_identity(&app, &url);

        if !self.registry.is_running(&origin) {
            let spec = LaunchSpec::new(url, manifest_url, app.manifest).named(name);
            if let Err(err) = self.start_app(&origin, spec) {
                tracing::warn!(%err, "launch failed");
                return;
            }
        }
        self.set_displayed_app(Some(&origin), None);
    }

    /// Hand `url` to an app, bringing it up unless `background` is set
    pub fn open_app_message(&mut self, manifest_url: &str, url: &str, background: bool) {
        let app = match self.resolve_app(manifest_url) {
            Ok(app) => app,
            Err(err) => {
                tracing::warn!(%err, "message for an unknown app");
                return;
            }
        };

        let (origin, name) = manifest::launch_identity(&app, url);
        if !self.registry.is_running(&origin) {
            let spec = LaunchSpec::new(url, manifest_url, app.manifest)
                .named(name)
                .in_background(background);
            if let Err(err) = self.start_app(&origin, spec) {
                tracing::warn!(%err, "open failed");
                return;
            }
        }

        if !background {
            self.set_displayed_app(Some(&origin), None);
        }
    }

    /// Open `url` in a wrapper window, reusing the one called `name`
    pub fn open_named_window(&mut self, url: &str, name: &str, opener: Option<&str>) {
        if let Some(origin) = self.registry.find_window(name).map(str::to_string) {
            if let Some(app) = self.registry.get_mut(&origin) {
                if app.url != url {
                    tracing::debug!(name, url, "reusing named window");
                    app.url = url.to_string();
                    app.frame.navigate(url);
                }
            }
            self.set_displayed_app(Some(&origin), None);
            return;
        }

        let origin = url.to_string();
        if !self.registry.is_running(&origin) {
            let (manifest_url, manifest) = opener
                .and_then(|opener| self.registry.get(opener))
                .map(|app| (app.manifest_url.clone(), app.manifest.clone()))
                .unwrap_or_else(|| (url.to_string(), Manifest::simple(name)));

            let spec = LaunchSpec::new(url, manifest_url, manifest)
                .named(name)
                .wrapper(name);
            if let Err(err) = self.start_app(&origin, spec) {
                tracing::warn!(%err, "window not opened");
                return;
            }
        }
        self.set_displayed_app(Some(&origin), None);
    }

    pub(crate) fn start_app(&mut self, origin: &str, spec: LaunchSpec) -> crate::Result<()> {
        let background = spec.background;
        let app = self
            .registry
            .create(origin, spec, self.surfaces.as_mut())?;
        let (width, height) = self.viewport.frame_size(app.fullscreen, app.wrapper);
        app.frame.resize(width, height);

        if background {
            tracing::debug!(origin, "started in background");
        }
        Ok(())
    }

    /// Home key
    pub fn home_pressed(&mut self) {
        if self.locked {
            tracing::debug!("home ignored while locked");
            return;
        }
        if self.first_run.is_some() && self.displayed == self.first_run {
            tracing::debug!("home ignored during first run");
            return;
        }

        let home_settled = self.displayed.is_some()
            && self.displayed == self.home
            && self.transition.is_idle();
        if !home_settled {
            self.set_displayed_app(None, None);
            return;
        }

        if !self.activities.is_empty() {
            self.collapse_activities();
        } else if let Some(home) = self.home.clone().and_then(|home| self.registry.get_mut(&home)) {
            tracing::debug!("resetting homescreen");
            home.frame.reload();
        }
    }

    /// A surface's renderer failed
    pub fn surface_crashed(&mut self, surface: SurfaceId, fatal: bool) {
        if self.activities.contains(surface) || self.activities.is_retiring(surface) {
            self.remove_activity(surface);
            return;
        }

        let Some(origin) = self.registry.find_by_surface(surface).map(str::to_string) else {
            tracing::debug!(%surface, "crash of an unknown surface");
            return;
        };

        if fatal {
            tracing::warn!(origin, "app crashed");
            self.kill(&origin, None);
        } else if self.displayed.as_deref() == Some(origin.as_str()) {
            tracing::warn!(origin, "foreground app hit a recoverable error, reloading");
            if let Some(app) = self.registry.get_mut(&origin) {
                app.frame.reload();
            }
        } else {
            tracing::debug!(origin, "recoverable error in a background app");
        }
    }

    /// Kill every instance of an app and drop its screenshots
    pub fn uninstall(&mut self, manifest_url: &str) {
        for origin in self.registry.origins_for_manifest(manifest_url) {
            if let Some(app) = self.registry.get(&origin) {
                let url = app.url.clone();
                self.screenshots.delete(&url);
            }
            self.kill(&origin, None);
        }
    }

    pub fn surface_painted(&mut self, surface: SurfaceId) {
        self.handle_paint(surface);
    }

    pub fn transition_ended(&mut self, surface: SurfaceId) {
        self.handle_transition_end(surface);
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport.width = width;
        self.viewport.height = height;
        self.resize_all();
    }

    pub fn set_keyboard_height(&mut self, height: u32) {
        self.viewport.keyboard_height = height;
        self.resize_all();
    }

    /// The attention screen appeared, shrank into a bar or went away
    pub fn attention_changed(&mut self, bar_height: u32) {
        self.viewport.attention_bar_height = bar_height;
        self.resize_all();

        let home_covered = self.displayed.is_some()
            && self.displayed != self.home
            && !self.first_run_active
            && !self.attention.is_fully_visible()
            && self.transition.is_idle();
        if home_covered {
            if let Some(home) = self.home.clone().and_then(|home| self.registry.get_mut(&home)) {
                home.frame.set_visible(false);
            }
        }
    }

    /// Lock screen shown or dismissed
    pub fn set_locked(&mut self, locked: bool) {
        if self.locked == locked {
            return;
        }
        self.locked = locked;

        if let Some(app) = self
            .displayed
            .clone()
            .and_then(|origin| self.registry.get_mut(&origin))
        {
            app.frame.set_visible(!locked);
        }
    }

    /// Switch to a different homescreen app
    pub fn set_homescreen(&mut self, manifest_url: &str) {
        if self.config.homescreen_manifest_url == manifest_url {
            return;
        }

        tracing::info!(manifest_url, "homescreen changed");
        self.config.homescreen_manifest_url = manifest_url.to_string();

        if let Some(old) = self.home.take() {
            if self.displayed.as_deref() == Some(old.as_str()) {
                // Keep the old home recognisable so the kill restarts home
                self.home = Some(old.clone());
            }
            self.kill(&old, None);
        }
        if self.displayed.is_none() {
            self.set_displayed_app(None, None);
        }
    }

    fn resize_all(&mut self) {
        let viewport = self.viewport;
        for app in self.registry.iter_mut() {
            let (width, height) = viewport.frame_size(app.fullscreen, app.wrapper);
            app.frame.resize(width, height);
        }

        let (width, height) = self.foreground_box();
        for entry in self.activities.iter_mut() {
            entry.frame.resize(width, height);
        }
    }
}
