//! App manifests and the application directory
//!
//! A manifest is either a plain app or a certified app that exposes several
//! entry points, each of which runs as its own instance with origin
//! `app_origin + launch_path`. [`resolve`] derives the traits the window
//! manager cares about (name, fullscreen, orientation) for either shape.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Deserializer, Serialize};

use crate::orientation::Orientation;

/// Traits shared by a manifest and its entry points
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestTraits {
    pub name: String,
    pub launch_path: Option<String>,
    pub fullscreen: bool,
    pub orientation: Option<Orientation>,
}

/// One entry point of a certified app
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryPoint {
    #[serde(default)]
    pub name: Option<String>,
    pub launch_path: String,
    #[serde(default)]
    pub fullscreen: bool,
    #[serde(default, deserialize_with = "first_orientation")]
    pub orientation: Option<Orientation>,
}

/// App manifest
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawManifest")]
pub enum Manifest {
    Simple(ManifestTraits),
    Certified {
        base: ManifestTraits,
        entry_points: BTreeMap<String, EntryPoint>,
    },
}

impl Manifest {
    pub fn simple(name: impl Into<String>) -> Self {
        Self::Simple(ManifestTraits {
            name: name.into(),
            launch_path: Some("/index.html".to_string()),
            ..Default::default()
        })
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn base(&self) -> &ManifestTraits {
        match self {
            Self::Simple(base) | Self::Certified { base, .. } => base,
        }
    }

    pub fn base_mut(&mut self) -> &mut ManifestTraits {
        match self {
            Self::Simple(base) | Self::Certified { base, .. } => base,
        }
    }

    pub fn name(&self) -> &str {
        &self.base().name
    }

    pub fn entry_points(&self) -> Option<&BTreeMap<String, EntryPoint>> {
        match self {
            Self::Simple(_) => None,
            Self::Certified { entry_points, .. } => Some(entry_points),
        }
    }

    pub fn with_fullscreen(mut self, fullscreen: bool) -> Self {
        self.base_mut().fullscreen = fullscreen;
        self
    }

    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.base_mut().orientation = Some(orientation);
        self
    }
}

/// Manifest as found on disk
#[derive(Debug, Deserialize)]
struct RawManifest {
    #[serde(default)]
    name: String,
    #[serde(default)]
    launch_path: Option<String>,
    #[serde(default)]
    fullscreen: bool,
    #[serde(default, deserialize_with = "first_orientation")]
    orientation: Option<Orientation>,
    #[serde(default, rename = "type")]
    app_type: Option<String>,
    #[serde(default)]
    entry_points: BTreeMap<String, EntryPoint>,
}

impl From<RawManifest> for Manifest {
    fn from(raw: RawManifest) -> Self {
        let base = ManifestTraits {
            name: raw.name,
            launch_path: raw.launch_path,
            fullscreen: raw.fullscreen,
            orientation: raw.orientation,
        };

        // Entry points are only honoured for certified apps
        if raw.app_type.as_deref() == Some("certified") && !raw.entry_points.is_empty() {
            Self::Certified {
                base,
                entry_points: raw.entry_points,
            }
        } else {
            Self::Simple(base)
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OrientationField {
    One(Orientation),
    Many(Vec<Orientation>),
}

fn first_orientation<'de, D>(deserializer: D) -> Result<Option<Orientation>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<OrientationField>::deserialize(deserializer)? {
        None => None,
        Some(OrientationField::One(orientation)) => Some(orientation),
        Some(OrientationField::Many(list)) => list.into_iter().next(),
    })
}

/// Traits of one running origin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTraits {
    pub name: String,
    pub fullscreen: bool,
    pub orientation: Option<Orientation>,
}

/// First path segment of an origin, e.g. `dialer` for
/// `app://communications.example.org/dialer/index.html`
pub fn entry_name(origin: &str) -> Option<&str> {
    let rest = origin.split_once("://").map(|(_, rest)| rest).unwrap_or(origin);
    let (_, path) = rest.split_once('/')?;
    let segment = path.split(['/', '?', '#']).next()?;
    (!segment.is_empty()).then_some(segment)
}

/// Derive name, fullscreen and orientation for `origin`
///
/// For certified apps an entry point named by the origin's first path
/// segment takes precedence over the manifest itself.
pub fn resolve(manifest: &Manifest, origin: &str) -> ResolvedTraits {
    let base = manifest.base();

    let entry = manifest
        .entry_points()
        .zip(entry_name(origin))
        .and_then(|(points, name)| points.get(name));

    match entry {
        Some(entry) => ResolvedTraits {
            name: entry.name.clone().unwrap_or_else(|| base.name.clone()),
            fullscreen: entry.fullscreen,
            orientation: entry.orientation,
        },
        None => ResolvedTraits {
            name: base.name.clone(),
            fullscreen: base.fullscreen,
            orientation: base.orientation,
        },
    }
}

/// Instance origin and display name for a launch of `url`
///
/// Certified apps launched at one of their entry points run under the
/// origin `app_origin + launch_path`.
pub fn launch_identity(app: &AppDescriptor, url: &str) -> (String, String) {
    let fallback = (app.origin.clone(), app.manifest.name().to_string());

    let Some(points) = app.manifest.entry_points() else {
        return fallback;
    };
    let Some(given) = url.strip_prefix(app.origin.as_str()) else {
        return fallback;
    };
    let path = given.split('?').next().unwrap_or(given);

    points
        .iter()
        .find(|(key, point)| path.starts_with(&format!("/{key}")) && point.launch_path == path)
        .map(|(_, point)| {
            let name = point
                .name
                .clone()
                .unwrap_or_else(|| app.manifest.name().to_string());
            (format!("{}{}", app.origin, point.launch_path), name)
        })
        .unwrap_or(fallback)
}

/// An installed application as reported by the application directory
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AppDescriptor {
    pub origin: String,
    pub manifest_url: String,
    pub manifest: Manifest,
}

impl AppDescriptor {
    pub fn new(origin: impl Into<String>, manifest_url: impl Into<String>, manifest: Manifest) -> Self {
        Self {
            origin: origin.into(),
            manifest_url: manifest_url.into(),
            manifest,
        }
    }

    /// Default launch URL
    pub fn launch_url(&self) -> String {
        let path = self.manifest.base().launch_path.as_deref().unwrap_or("/");
        format!("{}{}", self.origin, path)
    }
}

/// Installed application lookup
pub trait AppDirectory {
    fn resolve(&self, manifest_url: &str) -> Option<AppDescriptor>;
}

/// Directory over a fixed set of apps
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    apps: HashMap<String, AppDescriptor>,
}

impl StaticDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, app: AppDescriptor) {
        self.apps.insert(app.manifest_url.clone(), app);
    }

    pub fn with(mut self, app: AppDescriptor) -> Self {
        self.insert(app);
        self
    }

    pub fn remove(&mut self, manifest_url: &str) -> Option<AppDescriptor> {
        self.apps.remove(manifest_url)
    }

    pub fn len(&self) -> usize {
        self.apps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }
}

impl FromIterator<AppDescriptor> for StaticDirectory {
    fn from_iter<I: IntoIterator<Item = AppDescriptor>>(iter: I) -> Self {
        let mut directory = Self::new();
        for app in iter {
            directory.insert(app);
        }
        directory
    }
}

impl AppDirectory for StaticDirectory {
    fn resolve(&self, manifest_url: &str) -> Option<AppDescriptor> {
        self.apps.get(manifest_url).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMMS: &str = r#"{
        "name": "Communications",
        "type": "certified",
        "orientation": ["portrait-primary"],
        "entry_points": {
            "dialer": { "name": "Phone", "launch_path": "/dialer/index.html", "orientation": "portrait-primary" },
            "contacts": { "launch_path": "/contacts/index.html", "fullscreen": true }
        }
    }"#;

    fn comms() -> AppDescriptor {
        AppDescriptor::new(
            "app://communications.example.org",
            "app://communications.example.org/manifest.webapp",
            Manifest::from_json(COMMS).unwrap(),
        )
    }

    #[test]
    fn test_parse_certified() {
        let manifest = Manifest::from_json(COMMS).unwrap();
        assert_eq!(manifest.entry_points().map(|points| points.len()), Some(2));
        assert_eq!(manifest.base().orientation, Some(Orientation::PortraitPrimary));
    }

    #[test]
    fn test_entry_points_ignored_unless_certified() {
        let manifest = Manifest::from_json(
            r#"{ "name": "Web", "entry_points": { "a": { "launch_path": "/a.html" } } }"#,
        )
        .unwrap();
        assert!(manifest.entry_points().is_none());
    }

    #[test]
    fn test_entry_name() {
        assert_eq!(entry_name("app://comms.example.org/dialer/index.html"), Some("dialer"));
        assert_eq!(entry_name("app://clock.example.org"), None);
        assert_eq!(entry_name("app://clock.example.org/"), None);
    }

    #[test]
    fn test_resolve_entry_point() {
        let app = comms();
        let traits = resolve(&app.manifest, "app://communications.example.org/contacts/index.html");
        assert_eq!(traits.name, "Communications");
        assert!(traits.fullscreen);
        assert_eq!(traits.orientation, None);

        let traits = resolve(&app.manifest, "app://communications.example.org/dialer/index.html");
        assert_eq!(traits.name, "Phone");
        assert!(!traits.fullscreen);
    }

    #[test]
    fn test_resolve_simple() {
        let manifest = Manifest::simple("Clock")
            .with_fullscreen(true)
            .with_orientation(Orientation::Landscape);
        let traits = resolve(&manifest, "app://clock.example.org");
        assert_eq!(traits.name, "Clock");
        assert!(traits.fullscreen);
        assert_eq!(traits.orientation, Some(Orientation::Landscape));
    }

    #[test]
    fn test_launch_identity() {
        let app = comms();
        let (origin, name) =
            launch_identity(&app, "app://communications.example.org/dialer/index.html?call=1");
        assert_eq!(origin, "app://communications.example.org/dialer/index.html");
        assert_eq!(name, "Phone");

        let (origin, _) = launch_identity(&app, "app://communications.example.org/other.html");
        assert_eq!(origin, "app://communications.example.org");
    }

    #[test]
    fn test_launch_url() {
        let app = AppDescriptor::new("app://clock.example.org", "app://clock.example.org/manifest.webapp", Manifest::simple("Clock"));
        assert_eq!(app.launch_url(), "app://clock.example.org/index.html");
    }
}
