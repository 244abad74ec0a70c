//! Lifecycle notifications published to other shell subsystems

use std::time::Duration;

use tokio::sync::broadcast;

/// How an app reached its load time measurement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadKind {
    /// First paint of a fresh surface
    Cold,
    /// Reopening a surface that had already painted
    Warm,
}

/// Shell lifecycle event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellEvent {
    /// About to bring `origin` to the foreground
    AppWillOpen { origin: String },
    /// `origin` is now the foreground
    AppOpen {
        origin: String,
        manifest_url: String,
        is_home: bool,
    },
    /// `origin` starts closing
    AppWillClose { origin: String },
    AppLoadTime {
        origin: String,
        time: Duration,
        kind: LoadKind,
    },
    /// `origin` was killed and its surface detached
    AppTerminated { origin: String },
    /// The first-run experience finished
    FtuDone,
}

/// Returns true to veto opening the given origin
pub type WillOpenGuard = Box<dyn FnMut(&str) -> bool>;

/// Outbound notification bus
pub struct EventBus {
    /// Event sender
    event_tx: broadcast::Sender<ShellEvent>,
    /// Listeners able to cancel an `AppWillOpen`
    guards: Vec<WillOpenGuard>,
}

impl EventBus {
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(256);

        Self {
            event_tx,
            guards: Vec::new(),
        }
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<ShellEvent> {
        self.event_tx.subscribe()
    }

    pub fn emit(&self, event: ShellEvent) {
        tracing::trace!(?event, "shell event");
        let _ = self.event_tx.send(event);
    }

    /// Register a listener that may cancel an app opening
    pub fn add_will_open_guard(&mut self, guard: impl FnMut(&str) -> bool + 'static) {
        self.guards.push(Box::new(guard));
    }

    /// Announce that `origin` is about to open; false if a guard vetoed it
    pub fn dispatch_will_open(&mut self, origin: &str) -> bool {
        self.emit(ShellEvent::AppWillOpen {
            origin: origin.to_string(),
        });

        // Every guard sees the notification even after a veto
        let mut vetoed = false;
        for guard in &mut self.guards {
            vetoed |= guard(origin);
        }
        !vetoed
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_will_open_veto() {
        let mut bus = EventBus::new();
        let mut rx = bus.subscribe();

        assert!(bus.dispatch_will_open("app://clock"));

        bus.add_will_open_guard(|origin| origin == "app://camera");
        assert!(bus.dispatch_will_open("app://clock"));
        assert!(!bus.dispatch_will_open("app://camera"));

        let mut seen = 0;
        while let Ok(ShellEvent::AppWillOpen { .. }) = rx.try_recv() {
            seen += 1;
        }
        assert_eq!(seen, 3);
    }

    #[test]
    fn test_emit_without_subscribers() {
        let bus = EventBus::new();
        bus.emit(ShellEvent::FtuDone);
    }
}
