//! # Task abstractions and declarations.
//!
//! This module provides the task-related types:
//! - [`Task`] - trait for implementing async cancelable tasks
//! - [`TaskFn`] - function-based task implementation
//! - [`TaskRef`] - shared reference to a task (`Arc<dyn Task>`)
//! - [`TaskDecl`] - declaration bundling a task with its name, arguments and identity wiring
//! - [`TaskOptions`] - per-task options handed to the body by the worker

mod decl;
mod options;
mod task;
mod task_fn;

pub use decl::TaskDecl;
pub use options::TaskOptions;
pub use task::{Args, BoxTaskFuture, Task, TaskRef};
pub use task_fn::TaskFn;
