//! Installed apps for a simulated session
//!
//! ```toml
//! [[apps]]
//! origin = "app://clock.local"
//! manifest = { name = "Clock", launch_path = "/index.html", orientation = "portrait-primary" }
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use window_manager::{AppDescriptor, Manifest, StaticDirectory};

#[derive(Debug, Deserialize)]
struct AppsFile {
    #[serde(default)]
    apps: Vec<AppEntry>,
}

#[derive(Debug, Deserialize)]
struct AppEntry {
    origin: String,
    /// Defaults to `<origin>/manifest.webapp`
    manifest_url: Option<String>,
    manifest: Manifest,
}

pub fn load(path: &Path) -> Result<StaticDirectory> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read apps file {}", path.display()))?;
    parse(&content).with_context(|| format!("invalid apps file {}", path.display()))
}

pub fn parse(content: &str) -> Result<StaticDirectory> {
    let file: AppsFile = toml::from_str(content)?;
    Ok(file
        .apps
        .into_iter()
        .map(|entry| {
            let manifest_url = entry
                .manifest_url
                .unwrap_or_else(|| format!("{}/manifest.webapp", entry.origin));
            AppDescriptor::new(entry.origin, manifest_url, entry.manifest)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use window_manager::AppDirectory;

    use super::*;

    #[test]
    fn test_parse_apps() {
        let directory = parse(
            r#"
            [[apps]]
            origin = "app://home.local"
            manifest = { name = "Home", launch_path = "/index.html" }

            [[apps]]
            origin = "app://comms.local"
            manifest_url = "app://comms.local/app.webapp"

            [apps.manifest]
            name = "Comms"
            type = "certified"

            [apps.manifest.entry_points.dialer]
            name = "Phone"
            launch_path = "/dialer/index.html"
            fullscreen = true
            "#,
        )
        .unwrap();

        assert_eq!(directory.len(), 2);
        let home = directory.resolve("app://home.local/manifest.webapp").unwrap();
        assert_eq!(home.launch_url(), "app://home.local/index.html");

        let comms = directory.resolve("app://comms.local/app.webapp").unwrap();
        assert!(comms.manifest.entry_points().is_some_and(|points| points.contains_key("dialer")));
    }

    #[test]
    fn test_empty_file() {
        assert!(parse("").unwrap().is_empty());
    }
}
