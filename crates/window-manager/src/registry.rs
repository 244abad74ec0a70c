//! Running app instances

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::error::{Result, WindowManagerError};
use crate::frame::Frame;
use crate::manifest::{self, Manifest};
use crate::orientation::Orientation;
use crate::surface::{SurfaceFactory, SurfaceId, SurfaceKind, SurfaceRequest};

/// What to start an instance with
#[derive(Debug, Clone)]
pub struct LaunchSpec {
    pub url: String,
    pub manifest_url: String,
    pub manifest: Manifest,
    /// Display name; derived from the manifest when `None`
    pub name: Option<String>,
    /// Name of a reusable wrapper window
    pub window_name: Option<String>,
    /// Load without showing
    pub background: bool,
}

impl LaunchSpec {
    pub fn new(url: impl Into<String>, manifest_url: impl Into<String>, manifest: Manifest) -> Self {
        Self {
            url: url.into(),
            manifest_url: manifest_url.into(),
            manifest,
            name: None,
            window_name: None,
            background: false,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Launch as a named wrapper window
    pub fn wrapper(mut self, window_name: impl Into<String>) -> Self {
        self.window_name = Some(window_name.into());
        self
    }

    pub fn in_background(mut self, background: bool) -> Self {
        self.background = background;
        self
    }
}

/// One running application surface
#[derive(Debug)]
pub struct AppInstance {
    /// Unique, monotonic
    pub id: u64,
    /// Identity key
    pub origin: String,
    pub name: String,
    pub manifest: Manifest,
    pub manifest_url: String,
    /// Launch URL, also the screenshot key
    pub url: String,
    pub window_name: Option<String>,
    pub wrapper: bool,
    pub fullscreen: bool,
    pub orientation: Option<Orientation>,
    pub frame: Frame,
    /// Last time the instance became foreground
    pub launch_time: DateTime<Utc>,
    /// Set once when a kill starts
    pub killed: bool,
}

/// Registry of running instances keyed by origin
#[derive(Debug, Default)]
pub struct AppRegistry {
    apps: HashMap<String, AppInstance>,
    surfaces: HashMap<SurfaceId, String>,
    next_id: u64,
    running: usize,
}

impl AppRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start an instance for `origin` on a fresh surface
    pub fn create(
        &mut self,
        origin: &str,
        spec: LaunchSpec,
        surfaces: &mut dyn SurfaceFactory,
    ) -> Result<&mut AppInstance> {
        if self.apps.contains_key(origin) {
            return Err(WindowManagerError::DuplicateOrigin(origin.to_string()));
        }

        let traits = manifest::resolve(&spec.manifest, origin);
        let wrapper = spec.window_name.is_some();
        let request = SurfaceRequest {
            url: spec.url.clone(),
            manifest_url: (!wrapper).then(|| spec.manifest_url.clone()),
            kind: if wrapper {
                SurfaceKind::Wrapper
            } else {
                SurfaceKind::App
            },
            background: spec.background,
        };

        let surface_id = SurfaceId::next();
        let surface = surfaces.create(surface_id, &request);

        self.next_id += 1;
        let instance = AppInstance {
            id: self.next_id,
            origin: origin.to_string(),
            name: spec.name.unwrap_or(traits.name),
            manifest: spec.manifest,
            manifest_url: spec.manifest_url,
            url: spec.url,
            window_name: spec.window_name,
            wrapper,
            fullscreen: traits.fullscreen,
            orientation: traits.orientation,
            frame: Frame::new(surface_id, surface, &request),
            launch_time: Utc::now(),
            killed: false,
        };

        tracing::info!(origin, id = instance.id, surface = %surface_id, "app created");

        self.running += 1;
        self.surfaces.insert(surface_id, origin.to_string());
        Ok(self.apps.entry(origin.to_string()).or_insert(instance))
    }

    /// Detach and dispose the instance's surface and forget it
    pub fn remove(&mut self, origin: &str) -> Option<AppInstance> {
        let mut instance = self.apps.remove(origin)?;
        self.surfaces.remove(&instance.frame.id());
        self.running = self.running.saturating_sub(1);

        instance.frame.dispose();
        tracing::info!(origin, id = instance.id, "app removed");
        Some(instance)
    }

    pub fn get(&self, origin: &str) -> Option<&AppInstance> {
        self.apps.get(origin)
    }

    pub fn get_mut(&mut self, origin: &str) -> Option<&mut AppInstance> {
        self.apps.get_mut(origin)
    }

    pub fn is_running(&self, origin: &str) -> bool {
        self.apps.contains_key(origin)
    }

    pub fn running_count(&self) -> usize {
        self.running
    }

    /// Origin owning `surface`
    pub fn find_by_surface(&self, surface: SurfaceId) -> Option<&str> {
        self.surfaces.get(&surface).map(String::as_str)
    }

    pub fn frame_mut(&mut self, surface: SurfaceId) -> Option<&mut Frame> {
        let origin = self.surfaces.get(&surface)?;
        self.apps.get_mut(origin).map(|app| &mut app.frame)
    }

    /// Every running origin started from `manifest_url`
    pub fn origins_for_manifest(&self, manifest_url: &str) -> Vec<String> {
        let mut origins: Vec<String> = self
            .apps
            .values()
            .filter(|app| app.manifest_url == manifest_url)
            .map(|app| app.origin.clone())
            .collect();
        origins.sort();
        origins
    }

    /// Running wrapper window called `name`
    pub fn find_window(&self, name: &str) -> Option<&str> {
        self.apps
            .values()
            .find(|app| app.window_name.as_deref() == Some(name))
            .map(|app| app.origin.as_str())
    }

    /// Instances, most recently foregrounded first
    pub fn by_launch_time(&self) -> Vec<&AppInstance> {
        let mut apps: Vec<&AppInstance> = self.apps.values().collect();
        apps.sort_by(|a, b| b.launch_time.cmp(&a.launch_time).then(b.id.cmp(&a.id)));
        apps
    }

    pub fn iter(&self) -> impl Iterator<Item = &AppInstance> {
        self.apps.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut AppInstance> {
        self.apps.values_mut()
    }
}
