//! # Task declaration.
//!
//! [`TaskDecl`] describes one task to launch: an optional name, the body,
//! its arguments and whether the task gets a registered identity.
//!
//! A declaration is consumed by [`Supervisor::launch`](crate::Supervisor::launch).
//!
//! ## Rules
//! - Names must be unique within one launch; unnamed declarations get a
//!   generated name.
//! - A declaration built with [`TaskDecl::default`] has no body and is
//!   rejected by `launch` unless [`with_task`](TaskDecl::with_task) is called.
//! - A handler implies registration: the identity is needed to accept connections.
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use cohort::{Args, HandlerFn, Req, Res, TaskDecl, TaskError, TaskFn, TaskOptions};
//!
//! let decl = TaskDecl::new(TaskFn::arc(
//!     |ctx: CancellationToken, _opts: TaskOptions, _args: Args| async move {
//!         ctx.cancelled().await;
//!         Ok::<_, TaskError>(())
//!     },
//! ))
//! .with_name("echo")
//! .with_handler(HandlerFn::arc(|_ctx: CancellationToken, req: Req| async move {
//!     Res::success(req.kind, req.payload)
//! }));
//!
//! assert_eq!(decl.name(), Some("echo"));
//! assert!(decl.registers());
//! ```

use crate::discovery::{HandlerRef, Payload};
use crate::tasks::TaskRef;

/// Declaration of one task in a launch batch.
#[derive(Clone, Default)]
pub struct TaskDecl {
    pub(crate) name: Option<String>,
    pub(crate) task: Option<TaskRef>,
    pub(crate) args: Vec<Payload>,
    pub(crate) register: bool,
    pub(crate) handler: Option<HandlerRef>,
}

impl TaskDecl {
    /// Declares an anonymous task running `task`.
    pub fn new(task: TaskRef) -> Self {
        Self {
            task: Some(task),
            ..Self::default()
        }
    }

    /// Sets the task name (an empty name counts as unnamed).
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the task body.
    pub fn with_task(mut self, task: TaskRef) -> Self {
        self.task = Some(task);
        self
    }

    /// Appends one argument.
    pub fn with_arg(mut self, arg: Payload) -> Self {
        self.args.push(arg);
        self
    }

    /// Replaces the argument list.
    pub fn with_args(mut self, args: impl IntoIterator<Item = Payload>) -> Self {
        self.args = args.into_iter().collect();
        self
    }

    /// Registers an identity under the task's name before the body runs.
    pub fn with_registration(mut self) -> Self {
        self.register = true;
        self
    }

    /// Registers an identity answering requests with `handler` and runs its accept loop.
    pub fn with_handler(mut self, handler: HandlerRef) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Declared name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref().filter(|n| !n.is_empty())
    }

    /// True if the worker creates an identity for this task.
    pub fn registers(&self) -> bool {
        self.register || self.handler.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_has_no_body() {
        let decl = TaskDecl::default().with_name("x");
        assert!(decl.task.is_none());
        assert!(!decl.registers());
    }

    #[test]
    fn test_empty_name_counts_as_unnamed() {
        assert_eq!(TaskDecl::default().with_name("").name(), None);
    }

    #[test]
    fn test_args_accumulate() {
        let decl = TaskDecl::default()
            .with_arg(Payload::new(1u32))
            .with_arg(Payload::new("two"));
        assert_eq!(decl.args.len(), 2);
        assert_eq!(decl.args[1].downcast_ref::<&str>(), Some(&"two"));
    }
}
