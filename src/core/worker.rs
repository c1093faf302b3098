//! # Supervised worker: runs one task body and reports how it ended.
//!
//! ## Flow
//! ```text
//! Worker::run(ctx)
//!   ├─► build TaskOptions (name, discovery, pools)
//!   ├─► registration requested? ── create_and_register ──► Err → TaskFailed ─┐
//!   │         └─► handler? spawn accept loop (ListenerStarted)                │
//!   ├─► publish TaskStarting                                                  │
//!   ├─► task.spawn(ctx, opts, args) under catch_unwind                        │
//!   │         ├─ Ok / Canceled → TaskStopped                                  │
//!   │         ├─ Err(e)        → TaskFailed(reason = e)                       │
//!   │         └─ panic         → TaskPanicked(reason = panic message)         │
//!   └─► always: ctx.cancel() → await accept loop → shutdown.cancel() ◄────────┘
//! ```
//!
//! ## Rules
//! - Exactly one terminal task event per task body.
//! - A panicking accept loop is reported as `TaskPanicked` with a
//!   `listener:` reason, followed by `ListenerStopped`.
//! - Failures and panics are contained here; they never reach the launch caller.
//! - Any exit, clean or not, starts the group cascade.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::discovery::{
    ChannelPools, DiscoveryRef, HandlerRef, Identity, IdentityRef, MemoryIdentity,
};
use crate::error::{panic_message, DiscoveryError, TaskError};
use crate::events::{Bus, Event, EventKind};
use crate::tasks::{Args, TaskOptions, TaskRef};

/// Everything one worker needs; built by the supervisor from a declaration.
pub(crate) struct Worker {
    pub(crate) name: Arc<str>,
    pub(crate) task: TaskRef,
    pub(crate) args: Args,
    pub(crate) register: bool,
    pub(crate) handler: Option<HandlerRef>,
    pub(crate) discovery: Option<DiscoveryRef>,
    pub(crate) pools: Arc<ChannelPools>,
    pub(crate) idle_timeout: Duration,
    pub(crate) bus: Bus,
    pub(crate) shutdown: CancellationToken,
}

impl Worker {
    pub(crate) fn name(&self) -> &Arc<str> {
        &self.name
    }

    /// Runs the task to completion, then cancels `ctx` and triggers the cascade.
    pub(crate) async fn run(self, ctx: CancellationToken) {
        let listener = self.execute(&ctx).await;

        ctx.cancel();
        if let Some(listener) = listener {
            // The listener reports its own panic; only an abort errs here.
            let _ = listener.await;
        }
        self.shutdown.cancel();
    }

    /// Returns the accept loop handle, if one was started.
    async fn execute(&self, ctx: &CancellationToken) -> Option<JoinHandle<()>> {
        let mut opts = TaskOptions::new(
            Arc::clone(&self.name),
            self.discovery.clone(),
            Arc::clone(&self.pools),
            self.idle_timeout,
        );

        let mut listener = None;
        if self.register || self.handler.is_some() {
            match self.register_identity() {
                Ok(identity) => {
                    if self.handler.is_some() {
                        let acceptor = Arc::clone(&identity);
                        let ctx = ctx.clone();
                        listener =
                            Some(self.spawn_listener(async move { acceptor.accept(ctx).await }));
                    }
                    opts = opts.with_identity(identity);
                }
                Err(e) => {
                    self.publish_failed(&e);
                    return listener;
                }
            }
        }

        self.bus
            .publish(Event::new(EventKind::TaskStarting).with_task(Arc::clone(&self.name)));

        let body = async {
            self.task
                .spawn(ctx.clone(), opts, Arc::clone(&self.args))
                .await
        };
        match AssertUnwindSafe(body).catch_unwind().await {
            Ok(Ok(())) | Ok(Err(TaskError::Canceled)) => {
                self.bus
                    .publish(Event::new(EventKind::TaskStopped).with_task(Arc::clone(&self.name)));
            }
            Ok(Err(e)) => self.publish_failed(&e),
            Err(panic) => {
                self.bus.publish(
                    Event::new(EventKind::TaskPanicked)
                        .with_task(Arc::clone(&self.name))
                        .with_reason(panic_message(&*panic)),
                );
            }
        }
        listener
    }

    fn register_identity(&self) -> Result<IdentityRef, TaskError> {
        let registration = |source| TaskError::Registration {
            name: self.name.to_string(),
            source,
        };
        let discovery = self
            .discovery
            .as_ref()
            .ok_or_else(|| registration(DiscoveryError::Unavailable))?;

        let identity: IdentityRef = MemoryIdentity::create_and_register(
            self.name.to_string(),
            self.idle_timeout,
            self.handler.clone(),
            discovery,
            Arc::clone(&self.pools),
        )
        .map_err(registration)?;
        Ok(identity)
    }

    /// Runs the accept loop, reporting its start, its end and a panic if it has one.
    fn spawn_listener<F>(&self, accept: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let bus = self.bus.clone();
        let name = Arc::clone(&self.name);
        tokio::spawn(async move {
            bus.publish(Event::new(EventKind::ListenerStarted).with_task(Arc::clone(&name)));
            if let Err(panic) = AssertUnwindSafe(accept).catch_unwind().await {
                bus.publish(
                    Event::new(EventKind::TaskPanicked)
                        .with_task(Arc::clone(&name))
                        .with_reason(format!("listener: {}", panic_message(&*panic))),
                );
            }
            bus.publish(Event::new(EventKind::ListenerStopped).with_task(name));
        })
    }

    fn publish_failed(&self, err: &TaskError) {
        self.bus.publish(
            Event::new(EventKind::TaskFailed)
                .with_task(Arc::clone(&self.name))
                .with_reason(err.to_string()),
        );
    }
}
