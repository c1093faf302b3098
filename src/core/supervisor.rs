//! # Supervisor: launches a batch of tasks and cascades their shutdown.
//!
//! The [`Supervisor`] owns the runtime [`Config`], the event subscribers and
//! the [`ChannelPools`] shared by the identities of its launches. Each
//! [`launch`](Supervisor::launch) validates a batch of [`TaskDecl`]s, spawns one
//! supervised worker per declaration and returns a [`Running`] handle.
//!
//! ## High-level architecture
//! ```text
//! launch(ctx, decls)
//!   ├─► validate: empty? duplicate names? missing body?  ── Err(RuntimeError), nothing spawned
//!   ├─► name anonymous declarations (32 hex digits)
//!   ├─► discovery registry (if cfg.discovery)
//!   ├─► Bus + listener: Bus.subscribe() ─► SubscriberSet::emit(&Event) ─► stop after terminal event
//!   ├─► cascade watcher ──┐ (readiness ack)
//!   ├─► interrupt bridge ─┤ (readiness ack)
//!   └─► TaskRegistry::spawn_all (under lock): one token + one worker per declaration
//!
//! Cascade (once per launch):
//!   first worker exit ──► shutdown.cancel() ─┐
//!   SIGINT / SIGTERM  ──► shutdown.cancel() ─┼─► cascade watcher
//!   ctx.cancel()      ──► (child token)     ─┘      ├─► publish ShutdownRequested
//!                                                   ├─► TaskRegistry::cancel_all()
//!                                                   └─► exit.cancel()
//!
//! Running::await_exit()
//!   ├─► exit.cancelled()
//!   ├─► join every worker, bounded by cfg.grace
//!   │      ├─ all joined → AllStoppedWithin
//!   │      └─ timeout    → GraceExceeded (reason = unfinished task names)
//!   └─► wait for the listener to flush subscribers (bounded by cfg.grace)
//! ```
//!
//! ## Rules
//! - Declaration errors are the only errors `launch` returns.
//! - Task failures, panics and a grace shortfall are reported as events, never as errors.
//! - Cancellation is cooperative: a task that ignores its token keeps running
//!   after `await_exit` returns.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use cohort::{Args, Config, Supervisor, TaskDecl, TaskError, TaskFn, TaskOptions};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cfg = Config::builder().grace(Duration::from_secs(5)).build()?;
//!     let sup = Supervisor::new(cfg, Vec::new());
//!
//!     let ticker = TaskFn::arc(|ctx: CancellationToken, _opts: TaskOptions, _args: Args| async move {
//!         ctx.cancelled().await;
//!         Ok::<_, TaskError>(())
//!     });
//!     let oneshot = TaskFn::arc(|_ctx: CancellationToken, _opts: TaskOptions, _args: Args| async move {
//!         tokio::time::sleep(Duration::from_millis(10)).await;
//!         Ok::<_, TaskError>(())
//!     });
//!
//!     // `oneshot` returns first; its exit cancels `ticker`.
//!     sup.run(
//!         CancellationToken::new(),
//!         vec![
//!             TaskDecl::new(ticker).with_name("ticker"),
//!             TaskDecl::new(oneshot).with_name("oneshot"),
//!         ],
//!     )
//!     .await?;
//!     Ok(())
//! }
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use crate::core::{registry::TaskRegistry, shutdown::ShutdownSignal, worker::Worker, Config};
use crate::discovery::{ChannelPools, DiscoveryRef, MemoryDiscovery};
use crate::error::RuntimeError;
use crate::events::{Bus, Event, EventKind};
use crate::subscribers::{Subscribe, SubscriberSet};
use crate::tasks::{TaskDecl, TaskRef};

/// Launches and supervises batches of tasks.
pub struct Supervisor {
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
    pools: Arc<ChannelPools>,
}

impl Supervisor {
    /// Creates a supervisor with its own conduit pools.
    pub fn new(cfg: Config, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        Self::with_pools(cfg, subscribers, ChannelPools::new())
    }

    pub(crate) fn with_pools(
        cfg: Config,
        subscribers: Vec<Arc<dyn Subscribe>>,
        pools: Arc<ChannelPools>,
    ) -> Self {
        Self {
            cfg,
            subscribers,
            pools,
        }
    }

    /// Runtime configuration.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Conduit pools shared by every identity this supervisor creates.
    pub fn pools(&self) -> &Arc<ChannelPools> {
        &self.pools
    }

    /// Launches `decls` and waits for the group to exit.
    ///
    /// Shorthand for [`launch`](Self::launch) followed by [`Running::await_exit`].
    pub async fn run(
        &self,
        ctx: CancellationToken,
        decls: Vec<TaskDecl>,
    ) -> Result<(), RuntimeError> {
        self.launch(ctx, decls).await?.await_exit().await;
        Ok(())
    }

    /// Validates `decls` and spawns one supervised worker per declaration.
    ///
    /// Cancelling `ctx` starts the same cascade as the first task exit.
    ///
    /// ### Interrupts
    /// The first `SIGINT`/`SIGTERM` (Ctrl-C elsewhere) also starts the cascade.
    /// The bridge stops listening once shutdown begins, but tokio keeps its
    /// process-wide handler installed: after the first launch the default
    /// action (terminating the process) no longer applies. Hosts that still
    /// want to react to interrupts afterwards must listen for them themselves.
    ///
    /// ### Errors
    /// [`RuntimeError`] if the batch is empty, a name is declared twice or a
    /// declaration has no task body. Nothing is spawned in that case.
    pub async fn launch(
        &self,
        ctx: CancellationToken,
        decls: Vec<TaskDecl>,
    ) -> Result<Running, RuntimeError> {
        let decls = prepare(decls)?;

        let discovery: Option<DiscoveryRef> = self.cfg.discovery().then(MemoryDiscovery::shared);
        let bus = Bus::new(self.cfg.bus_capacity());
        let listener = self.spawn_listener(&bus);

        let shutdown = ctx.child_token();
        let exit = CancellationToken::new();
        let registry = TaskRegistry::new();

        let (cascade_ready, cascade_ack) = oneshot::channel();
        spawn_cascade_watcher(
            ctx.clone(),
            shutdown.clone(),
            exit.clone(),
            Arc::clone(&registry),
            bus.clone(),
            cascade_ready,
        );
        let (bridge_ready, bridge_ack) = oneshot::channel();
        spawn_interrupt_bridge(shutdown.clone(), bus.clone(), bridge_ready);
        let _ = cascade_ack.await;
        let _ = bridge_ack.await;

        let workers = decls
            .into_iter()
            .map(|(name, task, decl)| Worker {
                name,
                task,
                args: Arc::from(decl.args),
                register: decl.register,
                handler: decl.handler,
                discovery: discovery.clone(),
                pools: Arc::clone(&self.pools),
                idle_timeout: self.cfg.idle_timeout(),
                bus: bus.clone(),
                shutdown: shutdown.clone(),
            })
            .collect();
        registry.spawn_all(&shutdown, workers).await;

        Ok(Running {
            grace: self.cfg.grace(),
            discovery,
            registry,
            shutdown,
            exit,
            bus,
            listener,
        })
    }

    /// Subscribes to `bus` and forwards events to a fresh [`SubscriberSet`]
    /// until the terminal event, then flushes the set.
    fn spawn_listener(&self, bus: &Bus) -> JoinHandle<()> {
        let mut rx = bus.subscribe();
        let set = SubscriberSet::new(self.subscribers.clone(), bus.clone());
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ev) => {
                        set.emit(&ev);
                        if ev.kind.is_terminal() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            set.shutdown().await;
        })
    }
}

/// A launched batch of tasks.
pub struct Running {
    grace: std::time::Duration,
    discovery: Option<DiscoveryRef>,
    registry: Arc<TaskRegistry>,
    shutdown: CancellationToken,
    exit: CancellationToken,
    bus: Bus,
    listener: JoinHandle<()>,
}

impl Running {
    /// Registry shared by the tasks of this launch, if one was created.
    pub fn discovery(&self) -> Option<&DiscoveryRef> {
        self.discovery.as_ref()
    }

    /// Names of the launched tasks (generated names included), in declaration order.
    pub async fn names(&self) -> Vec<Arc<str>> {
        self.registry.names().await
    }

    /// Starts the shutdown cascade. Idempotent.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// True once the cascade has been triggered.
    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Waits for the cascade, then for every worker, bounded by the grace period.
    ///
    /// Never fails: a grace shortfall is published as
    /// [`EventKind::GraceExceeded`] naming the tasks still running. Flushing
    /// subscribers shares the same deadline, so a slow subscriber never
    /// stretches the wait past `grace`.
    pub async fn await_exit(self) {
        self.exit.cancelled().await;

        // One budget covers both the join and the subscriber flush.
        let deadline = Instant::now() + self.grace;
        let mut handles = self.registry.take().await;
        let joined = time::timeout_at(
            deadline,
            futures::future::join_all(handles.iter_mut().map(|(_, join)| join)),
        )
        .await;

        match joined {
            Ok(_) => self.bus.publish(Event::new(EventKind::AllStoppedWithin)),
            Err(_elapsed) => {
                let stuck: Vec<&str> = handles
                    .iter()
                    .filter(|(_, join)| !join.is_finished())
                    .map(|(name, _)| &**name)
                    .collect();
                self.bus.publish(
                    Event::new(EventKind::GraceExceeded)
                        .with_timeout(self.grace)
                        .with_reason(stuck.join(", ")),
                );
            }
        }

        let _ = time::timeout_at(deadline, self.listener).await;
    }
}

/// Cancels every task once the cascade is triggered, then releases `await_exit`.
fn spawn_cascade_watcher(
    external: CancellationToken,
    shutdown: CancellationToken,
    exit: CancellationToken,
    registry: Arc<TaskRegistry>,
    bus: Bus,
    ready: oneshot::Sender<()>,
) {
    tokio::spawn(async move {
        let _ = ready.send(());
        tokio::select! {
            biased;
            _ = external.cancelled() => bus.publish(Event::new(EventKind::ExternalCancelled)),
            _ = shutdown.cancelled() => {}
        }
        bus.publish(Event::new(EventKind::ShutdownRequested));
        registry.cancel_all().await;
        exit.cancel();
    });
}

/// Turns the first process interrupt into a cascade trigger; stops once the cascade began.
fn spawn_interrupt_bridge(shutdown: CancellationToken, bus: Bus, ready: oneshot::Sender<()>) {
    tokio::spawn(async move {
        let signal = ShutdownSignal::listen();
        let _ = ready.send(());
        let Ok(mut signal) = signal else {
            return;
        };
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => {}
            _ = signal.recv() => {
                bus.publish(Event::new(EventKind::InterruptReceived));
                shutdown.cancel();
            }
        }
    });
}

/// Validates the batch and assigns names to anonymous declarations.
///
/// Returns each declaration with its final name and its task body taken out.
fn prepare(decls: Vec<TaskDecl>) -> Result<Vec<(Arc<str>, TaskRef, TaskDecl)>, RuntimeError> {
    if decls.is_empty() {
        return Err(RuntimeError::NoTasks);
    }

    let mut taken = HashSet::with_capacity(decls.len());
    for name in decls.iter().filter_map(TaskDecl::name) {
        if !taken.insert(name.to_string()) {
            return Err(RuntimeError::DuplicateName {
                name: name.to_string(),
            });
        }
    }

    let mut prepared = Vec::with_capacity(decls.len());
    for mut decl in decls {
        let name = match decl.name() {
            Some(name) => name.to_string(),
            None => {
                let mut generated = generate_name();
                while !taken.insert(generated.clone()) {
                    generated = generate_name();
                }
                generated
            }
        };
        let Some(task) = decl.task.take() else {
            return Err(RuntimeError::MissingTask { name });
        };
        prepared.push((Arc::from(name), task, decl));
    }
    Ok(prepared)
}

/// Random 128-bit name rendered as 32 hex digits.
fn generate_name() -> String {
    format!("{:032x}", rand::random::<u128>())
}
