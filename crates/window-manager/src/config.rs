//! Shell configuration
//!
//! Loaded from `<config dir>/homeshell/shell.toml`; every field has a
//! default so a partial (or missing) file is fine.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use screenshot_cache::ScreenshotCache;
use serde::{Deserialize, Serialize};
use telemetry::LogConfig;

use crate::orientation::Orientation;
use crate::viewport::Viewport;

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Manifest of the home surface
    pub homescreen_manifest_url: String,
    /// Manifest of the first-run experience, if any
    pub first_run_manifest_url: Option<String>,
    /// Upper bound on waiting for a paint before animating anyway
    pub transition_timeout_ms: u64,
    /// Delay between first paint and screenshot capture
    pub screenshot_delay_ms: u64,
    /// Orientation for a homescreen whose manifest declares none
    pub default_orientation: Orientation,
    pub chrome: ChromeConfig,
    pub screenshots: ScreenshotConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChromeConfig {
    pub status_bar_height: u32,
    pub footer_height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenshotConfig {
    pub enabled: bool,
    /// Database location; defaults to the user data directory
    pub path: Option<PathBuf>,
}

impl ShellConfig {
    /// Load configuration from disk or return defaults
    pub fn load_or_default() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from `path`
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
    }

    /// Save configuration to `path`
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("homeshell")
            .join("shell.toml")
    }

    pub fn transition_timeout(&self) -> Duration {
        Duration::from_millis(self.transition_timeout_ms)
    }

    pub fn screenshot_delay(&self) -> Duration {
        Duration::from_millis(self.screenshot_delay_ms)
    }

    /// Viewport of a `width` x `height` screen with the configured chrome
    pub fn viewport(&self, width: u32, height: u32) -> Viewport {
        Viewport {
            status_bar_height: self.chrome.status_bar_height,
            footer_height: self.chrome.footer_height,
            ..Viewport::new(width, height)
        }
    }

    /// Open the configured screenshot cache
    pub fn open_screenshot_cache(&self) -> ScreenshotCache {
        if !self.screenshots.enabled {
            return ScreenshotCache::unavailable();
        }

        match self.screenshots.resolved_path() {
            Some(path) => ScreenshotCache::open(&path),
            None => {
                tracing::warn!("no data directory for screenshots, using memory");
                ScreenshotCache::in_memory()
            }
        }
    }
}

impl ScreenshotConfig {
    pub fn resolved_path(&self) -> Option<PathBuf> {
        self.path.clone().or_else(|| {
            dirs::data_local_dir().map(|dir| dir.join("homeshell").join("screenshots.sqlite"))
        })
    }
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            homescreen_manifest_url: "app://homescreen.homeshell.local/manifest.webapp".into(),
            first_run_manifest_url: None,
            transition_timeout_ms: 1000,
            screenshot_delay_ms: 50,
            default_orientation: Orientation::PortraitPrimary,
            chrome: ChromeConfig::default(),
            screenshots: ScreenshotConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Default for ChromeConfig {
    fn default() -> Self {
        Self {
            status_bar_height: 20,
            footer_height: 40,
        }
    }
}

impl Default for ScreenshotConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
        }
    }
}
