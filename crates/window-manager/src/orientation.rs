//! Screen orientation

use serde::{Deserialize, Serialize};

/// Orientation an app may request in its manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Orientation {
    #[default]
    PortraitPrimary,
    PortraitSecondary,
    Portrait,
    LandscapePrimary,
    LandscapeSecondary,
    Landscape,
}

impl Orientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PortraitPrimary => "portrait-primary",
            Self::PortraitSecondary => "portrait-secondary",
            Self::Portrait => "portrait",
            Self::LandscapePrimary => "landscape-primary",
            Self::LandscapeSecondary => "landscape-secondary",
            Self::Landscape => "landscape",
        }
    }
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Device orientation lock
pub trait OrientationLock {
    fn lock(&mut self, _orientation: Orientation) {}

    fn unlock(&mut self) {}
}

/// Orientation lock that ignores every request
#[derive(Debug, Default)]
pub struct NoOrientationLock;

impl OrientationLock for NoOrientationLock {}
