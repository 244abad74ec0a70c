//! # Homeshell Window Manager
//!
//! Decides which app is in the foreground of the shell and drives the
//! animations between apps, the homescreen and inline activities.
//!
//! The manager is a single-owner state machine. Every input arrives as a
//! method call on [`WindowManager`] (or an [`Inbound`] signal through
//! [`ShellRuntime`]); renderer callbacks and timers re-enter it through a
//! FIFO of deferred tasks, so nothing ever runs inside another handler.

pub mod activity;
pub mod collaborators;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod frame;
pub mod manifest;
pub mod orientation;
pub mod registry;
pub mod runtime;
mod scheduler;
pub mod surface;
pub mod transition;
pub mod triggers;
pub mod viewport;

#[cfg(test)]
pub(crate) mod test_support;

pub use activity::{ActivityEntry, ActivityRequest, InlineActivityStack};
pub use collaborators::{AttentionScreen, Collaborators, NoAttentionScreen, NoChrome, ShellChrome};
pub use config::{ChromeConfig, ScreenshotConfig, ShellConfig};
pub use coordinator::{Continuation, TransitionCase, WindowManager, classify};
pub use error::{Result, WindowManagerError};
pub use events::{LoadKind, ShellEvent};
pub use frame::{Background, Frame, FrameMarkers};
pub use manifest::{AppDescriptor, AppDirectory, EntryPoint, Manifest, StaticDirectory};
pub use orientation::{NoOrientationLock, Orientation, OrientationLock};
pub use registry::{AppInstance, AppRegistry, LaunchSpec};
pub use runtime::{ShellHandle, ShellRuntime};
pub use surface::{Surface, SurfaceError, SurfaceFactory, SurfaceId, SurfaceKind, SurfaceRequest};
pub use transition::{Latch, TransitionController};
pub use triggers::Inbound;
pub use viewport::Viewport;

pub use screenshot_cache::{Bitmap, ScreenshotCache};
