//! # Task registry: per-task contexts and completion handles.
//!
//! The registry owns, for every launched task, its cancellation token and the
//! `JoinHandle` of its worker. Both are created, stored and cancelled as a unit.
//!
//! ## Rules
//! - All access goes through one lock, so the cascade never misses a task
//!   added while it enumerates.
//! - A task added after the cascade started is cancelled on insertion.
//! - Cancelling is idempotent; [`TaskRegistry::take`] hands the handles to the joiner.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::worker::Worker;

/// One running task.
struct Slot {
    name: Arc<str>,
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

/// Lock-protected list of running tasks.
#[derive(Default)]
pub(crate) struct TaskRegistry {
    slots: Mutex<Vec<Slot>>,
}

impl TaskRegistry {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Spawns one worker per entry, each with its own token.
    ///
    /// `shutdown` is checked under the lock: if the cascade already ran, the
    /// new tokens are cancelled immediately.
    pub(crate) async fn spawn_all(&self, shutdown: &CancellationToken, workers: Vec<Worker>) {
        let mut slots = self.slots.lock().await;
        for worker in workers {
            let name = Arc::clone(worker.name());
            let cancel = CancellationToken::new();
            if shutdown.is_cancelled() {
                cancel.cancel();
            }
            let join = tokio::spawn(worker.run(cancel.clone()));
            slots.push(Slot { name, cancel, join });
        }
    }

    /// Cancels every registered task; returns how many there were.
    pub(crate) async fn cancel_all(&self) -> usize {
        let slots = self.slots.lock().await;
        for slot in slots.iter() {
            slot.cancel.cancel();
        }
        slots.len()
    }

    /// Removes and returns the completion handles.
    pub(crate) async fn take(&self) -> Vec<(Arc<str>, JoinHandle<()>)> {
        let mut slots = self.slots.lock().await;
        slots.drain(..).map(|s| (s.name, s.join)).collect()
    }

    /// Names of the registered tasks, in launch order.
    pub(crate) async fn names(&self) -> Vec<Arc<str>> {
        let slots = self.slots.lock().await;
        slots.iter().map(|s| Arc::clone(&s.name)).collect()
    }
}
