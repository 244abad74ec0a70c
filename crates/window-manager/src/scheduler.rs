//! Cooperative scheduling
//!
//! Nothing here runs concurrently. Deferred continuations and storage
//! completions wait in a FIFO queue drained by
//! [`WindowManager::run_pending`](crate::WindowManager::run_pending); timers
//! wait for [`WindowManager::fire_timers`](crate::WindowManager::fire_timers).

use std::collections::{BTreeMap, VecDeque};
use std::time::Instant;

use screenshot_cache::Bitmap;

use crate::coordinator::Continuation;
use crate::surface::SurfaceId;
use crate::transition::{Latch, WaitId};

/// Unit of deferred work
pub(crate) enum Task {
    Continue(Continuation),
    /// A screenshot lookup completed
    BackgroundResolved {
        surface: SurfaceId,
        bitmap: Option<Bitmap>,
        then: AfterBackground,
    },
}

/// What waits on a background lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AfterBackground {
    /// Start the opening transition issued with this latch
    StartOpen(Latch),
    /// Show a freshly pushed inline activity
    ShowActivity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TimerKind {
    /// Give up waiting for a paint
    PaintTimeout(WaitId),
    /// Capture a screenshot of a surface after its first paint
    CaptureScreenshot(SurfaceId),
    /// Dispose a closing inline activity the renderer never finished
    RetireActivity(SurfaceId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct TimerId(u64);

#[derive(Default)]
pub(crate) struct Scheduler {
    queue: VecDeque<Task>,
    /// Ordered by deadline, then by scheduling order
    timers: BTreeMap<(Instant, TimerId), TimerKind>,
    next_timer: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn defer(&mut self, task: Task) {
        self.queue.push_back(task);
    }

    pub fn pop(&mut self) -> Option<Task> {
        self.queue.pop_front()
    }

    pub fn has_pending(&self) -> bool {
        !self.queue.is_empty()
    }

    pub fn schedule(&mut self, at: Instant, kind: TimerKind) -> TimerId {
        self.next_timer += 1;
        let id = TimerId(self.next_timer);
        self.timers.insert((at, id), kind);
        id
    }

    pub fn cancel(&mut self, id: TimerId) {
        self.timers.retain(|(_, timer), _| *timer != id);
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.keys().next().map(|(at, _)| *at)
    }

    /// Remove and return every timer due at `now`, earliest first
    pub fn take_due(&mut self, now: Instant) -> Vec<TimerKind> {
        let mut due = Vec::new();
        while let Some(entry) = self.timers.first_entry() {
            if entry.key().0 > now {
                break;
            }
            due.push(entry.remove());
        }
        due
    }
}
