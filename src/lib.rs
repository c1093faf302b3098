//! # cohort
//!
//! **Cohort** launches a group of cancellable async tasks, supervises them as
//! one unit and lets them talk to each other through named in-process identities.
//!
//! Any task exit (clean, failed or panicked), a process interrupt or the
//! cancellation of the caller's token starts one shutdown cascade that cancels
//! every task, followed by a join bounded by a grace period.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │   TaskDecl   │   │   TaskDecl   │   │   TaskDecl   │
//!     │  (+handler)  │   │(+registration)   │  (anonymous) │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Supervisor::launch                                               │
//! │  - validation (empty / duplicate / missing body)                  │
//! │  - MemoryDiscovery (one registry per launch)                      │
//! │  - TaskRegistry (token + JoinHandle per task, one lock)           │
//! │  - cascade watcher, interrupt bridge                              │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │    Worker    │   │    Worker    │   │    Worker    │
//!     │ identity +   │   │ identity     │   │              │
//!     │ accept loop  │   │              │   │              │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            │ connect / send   │                  │
//!            ◄──────────────────┘                  │
//!            │  (pooled single-slot conduits)      │
//!            ▼                                     ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                    │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                       listener ──► SubscriberSet ──► LogWriter / custom
//! ```
//!
//! ### Lifecycle
//! ```text
//! launch ──► Worker::run(ctx)
//!   ├─► register identity (optional) ─► accept loop (if handler)
//!   ├─► publish TaskStarting
//!   ├─► body → TaskStopped | TaskFailed | TaskPanicked
//!   └─► cancel own ctx ─► trigger cascade
//!
//! cascade ──► ShutdownRequested ─► cancel every task ─► await_exit joins
//!                                                       ├─ AllStoppedWithin
//!                                                       └─ GraceExceeded (stuck names)
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                         |
//! |-------------------|---------------------------------------------------------------|--------------------------------------------|
//! | **Supervision**   | Launch a batch, cascade shutdown, bounded join.               | [`Supervisor`], [`Running`]                |
//! | **Tasks**         | Task bodies and their declarations.                           | [`Task`], [`TaskFn`], [`TaskDecl`], [`TaskOptions`] |
//! | **Discovery**     | Registry, identities, connect/send protocol.                  | [`Discovery`], [`Identity`], [`Handler`]   |
//! | **Pools**         | Reuse of single-slot conduits.                                | [`ChannelPools`]                           |
//! | **Subscriber API**| Hook into lifecycle events.                                   | [`Subscribe`], [`Event`]                   |
//! | **Errors**        | Typed errors per boundary.                                    | [`RuntimeError`], [`ConnectError`], ...    |
//! | **Configuration** | Validated immutable settings.                                 | [`Config`], [`ConnectOptions`], [`SendOptions`] |
//!
//! ## Optional features
//! - `logging` (default): exports the built-in [`LogWriter`] and [`Verbosity`].
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use cohort::{
//!     Args, Config, ConnectOptions, HandlerFn, Identity, Payload, Req, Res, SendOptions,
//!     Status, Supervisor, TaskDecl, TaskError, TaskFn, TaskOptions,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let sup = Supervisor::builder(Config::builder().grace(Duration::from_secs(5)).build()?)
//!         .build();
//!
//!     let pong = TaskFn::arc(|ctx: CancellationToken, _opts: TaskOptions, _args: Args| async move {
//!         ctx.cancelled().await;
//!         Ok::<_, TaskError>(())
//!     });
//!     let echo = HandlerFn::arc(|_ctx: CancellationToken, req: Req| async move {
//!         Res::success(req.kind, req.payload)
//!     });
//!
//!     let ping = TaskFn::arc(|ctx: CancellationToken, opts: TaskOptions, _args: Args| async move {
//!         let me = opts.identity().ok_or(TaskError::Canceled)?;
//!         // `pong` registers from its own worker; give it a moment.
//!         tokio::time::sleep(Duration::from_millis(20)).await;
//!         let conn = me
//!             .connect(&ctx, "pong", ConnectOptions::default())
//!             .await
//!             .map_err(|e| TaskError::fail(e.to_string()))?;
//!         let req = Req::new("text", Payload::new("hello"));
//!         let res = me.send(&ctx, &req, &conn, SendOptions::default()).await;
//!         assert_eq!(res.map(|r| r.status), Some(Status::Success));
//!         Ok::<_, TaskError>(())
//!     });
//!
//!     sup.run(
//!         CancellationToken::new(),
//!         vec![
//!             TaskDecl::new(pong).with_name("pong").with_handler(echo),
//!             TaskDecl::new(ping).with_name("ping").with_registration(),
//!         ],
//!     )
//!     .await?;
//!     Ok(())
//! }
//! ```

mod core;
mod discovery;
mod error;
mod events;
mod subscribers;
mod tasks;

// ---- Public re-exports ----

pub use core::{
    Config, ConfigBuilder, Running, Supervisor, SupervisorBuilder, DEFAULT_BUS_CAPACITY,
    DEFAULT_GRACE, DEFAULT_IDLE_TIMEOUT,
};
pub use discovery::{
    Address, BoxResFuture, ChannelPools, Conduit, ConduitSender, ConnectOptions, ConnectOptionsBuilder,
    ConnectRequest, Connection, Discovery, DiscoveryRef, Handler, HandlerFn, HandlerRef,
    Identity, IdentityRef, MemoryDiscovery, MemoryIdentity, Payload, Pool, Req,
    RequestEnvelope, Res, SendOptions, SendOptionsBuilder, Status, DEFAULT_CONNECT_TIMEOUT,
    DEFAULT_MAX_IDLE, DEFAULT_SEND_TIMEOUT,
};
pub use error::{ConfigError, ConnectError, DiscoveryError, RuntimeError, TaskError};
pub use events::{Bus, Event, EventKind};
pub use subscribers::{Subscribe, SubscriberSet};
pub use tasks::{Args, BoxTaskFuture, Task, TaskDecl, TaskFn, TaskOptions, TaskRef};

// Optional: expose the built-in logger subscriber.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::{LogWriter, Verbosity};
