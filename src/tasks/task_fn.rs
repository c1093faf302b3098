//! # Function-backed task (`TaskFn`)
//!
//! [`TaskFn`] wraps a closure `F: Fn(CancellationToken, TaskOptions, Args) -> Fut`,
//! producing a fresh future per spawn. No state is shared between spawns; if a
//! body needs shared state, capture an `Arc<...>` explicitly.
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use cohort::{Args, TaskError, TaskFn, TaskOptions, TaskRef};
//!
//! let t: TaskRef = TaskFn::arc(|ctx: CancellationToken, _opts: TaskOptions, _args: Args| async move {
//!     if ctx.is_cancelled() {
//!         return Ok(());
//!     }
//!     // do work...
//!     Ok::<_, TaskError>(())
//! });
//! # let _ = t;
//! ```

use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::TaskError;
use crate::tasks::task::{Args, BoxTaskFuture, Task};
use crate::tasks::TaskOptions;

/// Function-backed task implementation.
#[derive(Debug)]
pub struct TaskFn<F> {
    f: F,
}

impl<F> TaskFn<F> {
    /// Creates a new function-backed task.
    ///
    /// Prefer [`TaskFn::arc`] when you immediately need a [`TaskRef`](crate::TaskRef).
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Creates the task and returns it as a shared handle.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

impl<F, Fut> Task for TaskFn<F>
where
    F: Fn(CancellationToken, TaskOptions, Args) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
{
    fn spawn(&self, ctx: CancellationToken, opts: TaskOptions, args: Args) -> BoxTaskFuture {
        Box::pin((self.f)(ctx, opts, args))
    }
}
