//! Tokio driver for the window manager
//!
//! The manager itself never blocks or spawns. [`ShellRuntime`] owns it on a
//! single task, feeds it [`Inbound`] signals from any number of
//! [`ShellHandle`]s and fires its timers on time.

use std::future::pending;

use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};

use crate::coordinator::WindowManager;
use crate::triggers::Inbound;

enum Message {
    Event(Inbound),
    Shutdown,
}

/// Sends signals to a running [`ShellRuntime`]
#[derive(Clone)]
pub struct ShellHandle {
    tx: mpsc::UnboundedSender<Message>,
}

impl ShellHandle {
    /// Queue `event`; false once the runtime has stopped
    pub fn send(&self, event: Inbound) -> bool {
        self.tx.send(Message::Event(event)).is_ok()
    }

    /// Stop the runtime after the signals already queued
    pub fn shutdown(&self) {
        let _ = self.tx.send(Message::Shutdown);
    }
}

/// Event loop owning a [`WindowManager`]
pub struct ShellRuntime {
    manager: WindowManager,
    rx: mpsc::UnboundedReceiver<Message>,
}

impl ShellRuntime {
    pub fn new(manager: WindowManager) -> (Self, ShellHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { manager, rx }, ShellHandle { tx })
    }

    pub fn manager(&self) -> &WindowManager {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut WindowManager {
        &mut self.manager
    }

    /// Process signals and timers until shut down or every handle is gone
    pub async fn run(mut self) -> WindowManager {
        tracing::debug!("shell runtime started");

        loop {
            self.manager.run_pending();
            let deadline = self.manager.next_deadline().map(Instant::from_std);

            tokio::select! {
                message = self.rx.recv() => match message {
                    Some(Message::Event(event)) => self.manager.handle(event),
                    Some(Message::Shutdown) | None => break,
                },
                _ = async {
                    match deadline {
                        Some(deadline) => sleep_until(deadline).await,
                        None => pending::<()>().await,
                    }
                } => {
                    self.manager.fire_timers(std::time::Instant::now());
                }
            }
        }

        self.manager.run_pending();
        tracing::debug!("shell runtime stopped");
        self.manager
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::test_support::*;

    #[tokio::test]
    async fn test_runtime_drives_transitions() {
        let mut config = test_config();
        config.transition_timeout_ms = 10;
        let h = Harness::with_config(config);
        let (runtime, handle) = ShellRuntime::new(h.wm);

        let driver = async {
            handle.send(Inbound::Boot);
            handle.send(Inbound::Launch {
                manifest_url: format!("{APP_A}/manifest.webapp"),
                url: None,
            });
            // No renderer here: paint timeouts start the animation
            tokio::time::sleep(Duration::from_millis(50)).await;
            handle.shutdown();
        };

        let (manager, ()) = tokio::join!(runtime.run(), driver);

        assert!(manager.registry().is_running(APP_A));
        assert!(manager.registry().get(APP_A).unwrap().frame.has(crate::FrameMarkers::OPENING));
        assert_eq!(manager.displayed_app(), Some(HOME));
    }

    #[tokio::test]
    async fn test_runtime_stops_when_handles_dropped() {
        let h = Harness::new();
        let (runtime, handle) = ShellRuntime::new(h.wm);

        let sender = handle.clone();
        drop(handle);
        assert!(sender.send(Inbound::Boot));
        drop(sender);

        let manager = runtime.run().await;
        assert_eq!(manager.displayed_app(), Some(HOME));
    }
}
