//! # LogWriter: line-oriented event printer
//!
//! A subscriber that writes incoming [`Event`]s to any [`io::Write`] sink.
//! [`Verbosity::All`] prints every lifecycle event, [`Verbosity::FailuresOnly`]
//! prints task failures and contained panics only.
//!
//! ## Example output
//! ```text
//! [starting] task="pinger"
//! [listening] task="ponger"
//! [failed] task="pinger" err="connection refused"
//! [panicked] task="worker" err="boom"
//! [stopped] task="ponger"
//! [shutdown-requested]
//! [all-stopped-within-grace]
//! [grace-exceeded] timeout_ms=30000 stuck="slow"
//! ```

use std::io::{self, Write};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Which events a [`LogWriter`] prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Every lifecycle event.
    #[default]
    All,
    /// Task failures and panics only.
    FailuresOnly,
}

/// Event writer subscriber.
pub struct LogWriter {
    sink: Mutex<Box<dyn Write + Send>>,
    verbosity: Verbosity,
}

impl LogWriter {
    /// Construct a [`LogWriter`] over an arbitrary sink.
    #[must_use]
    pub fn new(sink: impl Write + Send + 'static, verbosity: Verbosity) -> Self {
        Self {
            sink: Mutex::new(Box::new(sink)),
            verbosity,
        }
    }

    /// Construct a [`LogWriter`] printing to stdout.
    #[must_use]
    pub fn stdout(verbosity: Verbosity) -> Self {
        Self::new(io::stdout(), verbosity)
    }

    fn render(e: &Event) -> String {
        let task = e.task.as_deref().unwrap_or("unknown");
        let reason = e.reason.as_deref().unwrap_or("unknown");
        match e.kind {
            EventKind::ShutdownRequested => "[shutdown-requested]".to_string(),
            EventKind::InterruptReceived => "[interrupt-received]".to_string(),
            EventKind::ExternalCancelled => "[external-cancelled]".to_string(),
            EventKind::AllStoppedWithin => "[all-stopped-within-grace]".to_string(),
            EventKind::GraceExceeded => format!(
                "[grace-exceeded] timeout_ms={} stuck={:?}",
                e.timeout_ms.unwrap_or_default(),
                reason
            ),
            EventKind::TaskStarting => format!("[starting] task={task:?}"),
            EventKind::TaskStopped => format!("[stopped] task={task:?}"),
            EventKind::TaskFailed => format!("[failed] task={task:?} err={reason:?}"),
            EventKind::TaskPanicked => format!("[panicked] task={task:?} err={reason:?}"),
            EventKind::ListenerStarted => format!("[listening] task={task:?}"),
            EventKind::ListenerStopped => format!("[listener-stopped] task={task:?}"),
            EventKind::SubscriberOverflow => {
                format!("[subscriber-overflow] subscriber={task:?} reason={reason:?}")
            }
            EventKind::SubscriberPanicked => {
                format!("[subscriber-panicked] subscriber={task} info={reason}")
            }
        }
    }
}

impl Default for LogWriter {
    fn default() -> Self {
        Self::stdout(Verbosity::All)
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        if self.verbosity == Verbosity::FailuresOnly && !e.is_failure() {
            return;
        }
        let line = Self::render(e);
        let mut sink = match self.sink.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        // Diagnostics only: a broken sink never affects control flow.
        let _ = writeln!(sink, "{line}");
        let _ = sink.flush();
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl SharedBuf {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_all_prints_lifecycle() {
        let buf = SharedBuf::default();
        let log = LogWriter::new(buf.clone(), Verbosity::All);

        log.on_event(&Event::new(EventKind::TaskStarting).with_task("a"))
            .await;
        log.on_event(&Event::new(EventKind::ShutdownRequested)).await;

        assert_eq!(buf.text(), "[starting] task=\"a\"\n[shutdown-requested]\n");
    }

    #[tokio::test]
    async fn test_failures_only_skips_lifecycle() {
        let buf = SharedBuf::default();
        let log = LogWriter::new(buf.clone(), Verbosity::FailuresOnly);

        log.on_event(&Event::new(EventKind::TaskStarting).with_task("a"))
            .await;
        log.on_event(
            &Event::new(EventKind::TaskPanicked)
                .with_task("a")
                .with_reason("boom"),
        )
        .await;

        assert_eq!(buf.text(), "[panicked] task=\"a\" err=\"boom\"\n");
    }

    #[tokio::test]
    async fn test_grace_exceeded_names_stuck_tasks() {
        let buf = SharedBuf::default();
        let log = LogWriter::new(buf.clone(), Verbosity::All);

        log.on_event(
            &Event::new(EventKind::GraceExceeded)
                .with_timeout(std::time::Duration::from_millis(50))
                .with_reason("slow"),
        )
        .await;

        assert_eq!(buf.text(), "[grace-exceeded] timeout_ms=50 stuck=\"slow\"\n");
    }
}
