//! Shell subsystems the window manager talks to

use screenshot_cache::ScreenshotCache;

use crate::manifest::AppDirectory;
use crate::orientation::{NoOrientationLock, OrientationLock};
use crate::surface::SurfaceFactory;

/// Attention screen (incoming call, alarm) overlay
pub trait AttentionScreen {
    /// The overlay currently covers the whole screen
    fn is_fully_visible(&self) -> bool {
        false
    }

    /// `origin` became foreground; present a pending overlay for it
    fn show_for_origin(&mut self, _origin: &str) {}
}

/// System chrome around app frames
pub trait ShellChrome {
    fn dismiss_splash(&mut self) {}

    fn set_first_run_mode(&mut self, _active: bool) {}

    /// Footer under wrapper windows
    fn set_footer_visible(&mut self, _visible: bool) {}

    /// Hide the status bar for fullscreen apps
    fn set_fullscreen_layout(&mut self, _fullscreen: bool) {}

    fn set_inline_activity_mode(&mut self, _active: bool) {}
}

#[derive(Debug, Default)]
pub struct NoAttentionScreen;

impl AttentionScreen for NoAttentionScreen {}

#[derive(Debug, Default)]
pub struct NoChrome;

impl ShellChrome for NoChrome {}

/// Everything a [`WindowManager`](crate::WindowManager) is wired to
pub struct Collaborators {
    pub surfaces: Box<dyn SurfaceFactory>,
    pub directory: Box<dyn AppDirectory>,
    pub orientation: Box<dyn OrientationLock>,
    pub attention: Box<dyn AttentionScreen>,
    pub chrome: Box<dyn ShellChrome>,
    pub screenshots: ScreenshotCache,
}

impl Collaborators {
    pub fn new(
        surfaces: impl SurfaceFactory + 'static,
        directory: impl AppDirectory + 'static,
    ) -> Self {
        Self {
            surfaces: Box::new(surfaces),
            directory: Box::new(directory),
            orientation: Box::new(NoOrientationLock),
            attention: Box::new(NoAttentionScreen),
            chrome: Box::new(NoChrome),
            screenshots: ScreenshotCache::unavailable(),
        }
    }

    pub fn with_orientation_lock(mut self, lock: impl OrientationLock + 'static) -> Self {
        self.orientation = Box::new(lock);
        self
    }

    pub fn with_attention_screen(mut self, attention: impl AttentionScreen + 'static) -> Self {
        self.attention = Box::new(attention);
        self
    }

    pub fn with_chrome(mut self, chrome: impl ShellChrome + 'static) -> Self {
        self.chrome = Box::new(chrome);
        self
    }

    pub fn with_screenshots(mut self, screenshots: ScreenshotCache) -> Self {
        self.screenshots = screenshots;
        self
    }
}
