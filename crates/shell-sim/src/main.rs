//! Homeshell simulator
//!
//! Boots the window manager over headless surfaces, replays a session
//! script (or waits for Ctrl-C) and logs everything the shell does.

mod apps;
mod headless;
mod script;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use telemetry::LogLevel;
use tokio::sync::mpsc;
use window_manager::{Collaborators, Inbound, ShellConfig, ShellRuntime, WindowManager};

use headless::{HeadlessSurfaces, Timings};
use script::Step;

#[derive(Parser)]
#[command(name = "shell-sim")]
#[command(about = "Replay a Homeshell session against headless surfaces")]
struct Cli {
    /// Shell configuration (defaults to the user config file)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Installed apps
    #[arg(long)]
    apps: PathBuf,

    /// Session script; without one the shell runs until Ctrl-C
    #[arg(long)]
    script: Option<PathBuf>,

    /// Time a surface takes to paint
    #[arg(long, default_value_t = 30)]
    paint_ms: u64,

    /// Length of an animation
    #[arg(long, default_value_t = 250)]
    transition_ms: u64,

    /// Overrides the configured log level
    #[arg(long)]
    log_level: Option<LogLevel>,

    /// Screen size as WIDTHxHEIGHT
    #[arg(long, default_value = "320x480", value_parser = parse_size)]
    screen: (u32, u32),
}

fn parse_size(value: &str) -> Result<(u32, u32), String> {
    let (width, height) = value
        .split_once('x')
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {value}"))?;
    let width = width.parse().map_err(|_| format!("bad width: {width}"))?;
    let height = height.parse().map_err(|_| format!("bad height: {height}"))?;
    Ok((width, height))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ShellConfig::load(path)?,
        None => ShellConfig::load_or_default()?,
    };
    if let Some(level) = cli.log_level {
        config.log.level = level;
    }
    telemetry::init(&config.log)?;

    let directory = apps::load(&cli.apps)?;
    let steps = match &cli.script {
        Some(path) => Some(
            script::load(path).with_context(|| format!("invalid script {}", path.display()))?,
        ),
        None => None,
    };
    tracing::info!(apps = directory.len(), "starting shell simulator");

    let (renderer_tx, mut renderer_rx) = mpsc::unbounded_channel();
    let timings = Timings {
        paint: Duration::from_millis(cli.paint_ms),
        transition: Duration::from_millis(cli.transition_ms),
    };
    let collaborators = Collaborators::new(HeadlessSurfaces::new(renderer_tx, timings), directory)
        .with_screenshots(config.open_screenshot_cache());

    let mut manager = WindowManager::new(config, collaborators);
    let (width, height) = cli.screen;
    manager.set_viewport(width, height);

    let mut events = manager.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            tracing::info!(?event, "shell event");
        }
    });

    let (runtime, handle) = ShellRuntime::new(manager);

    let renderer = handle.clone();
    tokio::spawn(async move {
        while let Some(event) = renderer_rx.recv().await {
            if !renderer.send(event) {
                break;
            }
        }
    });

    let driver = async move {
        handle.send(Inbound::Boot);
        match steps {
            Some(steps) => {
                for step in steps {
                    match step {
                        Step::Send(event) => {
                            tracing::info!(?event, "script");
                            handle.send(event);
                        }
                        Step::Wait(delay) => tokio::time::sleep(delay).await,
                    }
                }
                // Let the last transition finish
                tokio::time::sleep(timings.paint + timings.transition * 2).await;
            }
            None => {
                if let Err(err) = tokio::signal::ctrl_c().await {
                    tracing::error!("failed to wait for Ctrl-C: {err}");
                }
            }
        }
        handle.shutdown();
    };

    let (manager, ()) = tokio::join!(runtime.run(), driver);

    tracing::info!(
        displayed = manager.displayed_app().unwrap_or("<none>"),
        running = manager.registry().running_count(),
        "session finished"
    );
    for app in manager.registry().by_launch_time() {
        tracing::info!(origin = %app.origin, name = %app.name, "still running");
    }

    Ok(())
}
