//! # Task abstraction.
//!
//! This module defines the [`Task`] trait (async, cancelable). The common handle
//! type is [`TaskRef`], an `Arc<dyn Task>` suitable for sharing across the runtime.
//!
//! A task receives a [`CancellationToken`] and should periodically check it to
//! stop cooperatively during shutdown. Names are not part of the task: they
//! belong to the [`TaskDecl`](crate::TaskDecl) that launches it.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::discovery::Payload;
use crate::error::TaskError;
use crate::tasks::TaskOptions;

/// Boxed future returned by [`Task::spawn`].
pub type BoxTaskFuture = Pin<Box<dyn Future<Output = Result<(), TaskError>> + Send + 'static>>;

/// Shared handle to a task.
pub type TaskRef = Arc<dyn Task>;

/// Positional arguments handed to a task body.
pub type Args = Arc<[Payload]>;

/// # Asynchronous, cancelable unit.
///
/// Each call to [`spawn`](Task::spawn) creates a fresh future that owns its state.
///
/// # Example
/// ```
/// use tokio_util::sync::CancellationToken;
/// use cohort::{Args, BoxTaskFuture, Task, TaskError, TaskOptions};
///
/// struct Demo;
///
/// impl Task for Demo {
///     fn spawn(&self, ctx: CancellationToken, _opts: TaskOptions, _args: Args) -> BoxTaskFuture {
///         Box::pin(async move {
///             ctx.cancelled().await;
///             Err(TaskError::Canceled)
///         })
///     }
/// }
/// ```
pub trait Task: Send + Sync + 'static {
    /// Creates a new future that runs the task until completion or cancellation.
    ///
    /// Implementations should watch `ctx` and exit quickly to honor shutdown.
    fn spawn(&self, ctx: CancellationToken, opts: TaskOptions, args: Args) -> BoxTaskFuture;
}
