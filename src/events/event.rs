//! # Lifecycle events emitted by the supervisor and its workers.
//!
//! [`EventKind`] classifies events into:
//! - **Shutdown events**: what triggered the cascade and how the join ended;
//! - **Task events**: one task's start, exit, failure or panic;
//! - **Listener events**: accept loops of handler-bearing tasks;
//! - **Subscriber events**: delivery problems inside the [`SubscriberSet`](crate::SubscriberSet).
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use cohort::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::TaskPanicked)
//!     .with_task("worker")
//!     .with_reason("boom");
//!
//! assert!(ev.is_failure());
//! assert_eq!(ev.task.as_deref(), Some("worker"));
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Shutdown events ===
    /// The cascade started: every task context is being cancelled.
    ShutdownRequested,

    /// The process received an interrupt; the cascade follows.
    InterruptReceived,

    /// The externally supplied context was cancelled; the cascade follows.
    ExternalCancelled,

    /// Every task confirmed completion within the grace period.
    ///
    /// Terminal: the last event of a launch.
    AllStoppedWithin,

    /// Grace period elapsed before every task completed.
    ///
    /// Sets `reason` to the names of the unfinished tasks and `timeout_ms`.
    /// Terminal: the last event of a launch.
    GraceExceeded,

    // === Task events ===
    /// Task body is about to run.
    TaskStarting,

    /// Task body returned `Ok` or `Canceled`.
    TaskStopped,

    /// Task body returned an error, or its identity could not be registered.
    ///
    /// Sets `reason`.
    TaskFailed,

    /// Task body panicked; the panic was contained by the worker.
    ///
    /// Sets `reason` to the panic message.
    TaskPanicked,

    // === Listener events ===
    /// Accept loop of a handler-bearing task started.
    ListenerStarted,

    /// Accept loop of a handler-bearing task ended.
    ListenerStopped,

    // === Subscriber events ===
    /// Subscriber panicked during event processing (`task` = subscriber name).
    SubscriberPanicked,

    /// Subscriber dropped an event (`task` = subscriber name, `reason` = "full"/"closed").
    SubscriberOverflow,
}

impl EventKind {
    /// True for kinds that end a launch.
    pub fn is_terminal(self) -> bool {
        matches!(self, EventKind::AllStoppedWithin | EventKind::GraceExceeded)
    }
}

/// Runtime event with optional metadata.
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Name of the task (or subscriber), if applicable.
    pub task: Option<Arc<str>>,
    /// Human-readable reason (errors, panic messages, stuck tasks).
    pub reason: Option<Arc<str>>,
    /// Timeout in milliseconds (compact).
    pub timeout_ms: Option<u32>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            task: None,
            reason: None,
            timeout_ms: None,
        }
    }

    /// Attaches a task name.
    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a timeout duration (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.timeout_ms = Some(ms);
        self
    }

    /// True for task failures and contained panics.
    #[inline]
    pub fn is_failure(&self) -> bool {
        matches!(self.kind, EventKind::TaskFailed | EventKind::TaskPanicked)
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_task(subscriber)
            .with_reason(reason)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_task(subscriber)
            .with_reason(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_is_monotonic() {
        let a = Event::new(EventKind::TaskStarting);
        let b = Event::new(EventKind::TaskStopped);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_timeout_is_clamped() {
        let ev = Event::new(EventKind::GraceExceeded).with_timeout(Duration::from_secs(u64::MAX));
        assert_eq!(ev.timeout_ms, Some(u32::MAX));
    }

    #[test]
    fn test_failure_classification() {
        assert!(Event::new(EventKind::TaskFailed).is_failure());
        assert!(Event::new(EventKind::TaskPanicked).is_failure());
        assert!(!Event::new(EventKind::TaskStopped).is_failure());
        assert!(EventKind::GraceExceeded.is_terminal());
        assert!(!EventKind::ShutdownRequested.is_terminal());
    }
}
