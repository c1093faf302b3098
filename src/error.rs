//! Error types used by the cohort runtime, its tasks and the discovery layer.
//!
//! - [`RuntimeError`]: declaration errors raised by `launch` before any task starts.
//! - [`ConfigError`]: invalid values passed to one of the validating builders.
//! - [`TaskError`]: errors returned by task bodies (contained by the worker).
//! - [`DiscoveryError`]: registry failures (`register` / `find`).
//! - [`ConnectError`]: failures of the connect handshake.
//!
//! Every enum provides `as_label` (stable snake_case label for logs).

use std::time::Duration;
use thiserror::Error;

/// # Errors produced by the supervisor before any task is spawned.
///
/// All variants are fatal to the launch call and guarantee that nothing was started.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    /// The declaration list was empty.
    #[error("at least one task declaration must be provided")]
    NoTasks,

    /// Two declarations share the same name.
    #[error("task names must be unique: {name:?} declared more than once")]
    DuplicateName {
        /// The duplicated name.
        name: String,
    },

    /// A declaration carries no task body.
    #[error("task {name:?} has no task body")]
    MissingTask {
        /// Name of the offending declaration (generated if it was anonymous).
        name: String,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use cohort::RuntimeError;
    ///
    /// let err = RuntimeError::DuplicateName { name: "worker".into() };
    /// assert_eq!(err.as_label(), "runtime_duplicate_name");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::NoTasks => "runtime_no_tasks",
            RuntimeError::DuplicateName { .. } => "runtime_duplicate_name",
            RuntimeError::MissingTask { .. } => "runtime_missing_task",
        }
    }
}

/// # Errors produced by the validating builders.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A duration that must be strictly positive was zero.
    #[error("{field} must be greater than zero")]
    ZeroDuration {
        /// Name of the builder field.
        field: &'static str,
    },

    /// A capacity that must be at least one was zero.
    #[error("{field} must be at least one")]
    ZeroCapacity {
        /// Name of the builder field.
        field: &'static str,
    },
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::ZeroDuration { .. } => "config_zero_duration",
            ConfigError::ZeroCapacity { .. } => "config_zero_capacity",
        }
    }
}

/// # Errors produced by task execution.
///
/// A task error never reaches the launch caller: the worker reports it and
/// starts the shutdown cascade.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum TaskError {
    /// Task execution failed.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Task observed cancellation and exited gracefully.
    #[error("context cancelled")]
    Canceled,

    /// The worker could not register the task's identity.
    #[error("{name} could not be registered: {source}")]
    Registration {
        /// Task (and identity) name.
        name: String,
        /// Registry failure.
        #[source]
        source: DiscoveryError,
    },
}

impl TaskError {
    /// Shorthand for [`TaskError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        TaskError::Fail {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use cohort::TaskError;
    ///
    /// assert_eq!(TaskError::fail("boom").as_label(), "task_failed");
    /// assert_eq!(TaskError::Canceled.as_label(), "task_canceled");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Fail { .. } => "task_failed",
            TaskError::Canceled => "task_canceled",
            TaskError::Registration { .. } => "task_registration_failed",
        }
    }
}

/// # Errors produced by a discovery registry.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryError {
    /// Identity names must not be empty.
    #[error("invalid identity name")]
    InvalidName,

    /// No identity with this name is registered.
    #[error("{name:?} is not registered")]
    NotFound {
        /// Looked-up name.
        name: String,
    },

    /// Another identity already uses this name.
    #[error("{name:?} is already registered")]
    AlreadyRegistered {
        /// Conflicting name.
        name: String,
    },

    /// No registry was configured for this launch.
    #[error("no discovery registry available")]
    Unavailable,
}

impl DiscoveryError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            DiscoveryError::InvalidName => "discovery_invalid_name",
            DiscoveryError::NotFound { .. } => "discovery_not_found",
            DiscoveryError::AlreadyRegistered { .. } => "discovery_already_registered",
            DiscoveryError::Unavailable => "discovery_unavailable",
        }
    }
}

/// # Errors produced by the connect handshake.
///
/// Each failure mode is classified separately so callers can tell a missing
/// peer from a slow one.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectError {
    /// Neither the options nor the identity carry a registry.
    #[error("cannot connect, no discovery registry available")]
    NoDiscovery,

    /// Target name could not be resolved.
    #[error("{name:?} is not registered")]
    NotFound {
        /// Target name.
        name: String,
    },

    /// Caller's context was cancelled while waiting.
    #[error("context completed")]
    ContextCompleted,

    /// Remote did not reply within the connect timeout.
    #[error("timeout after {timeout:?} whilst attempting connect")]
    Timeout {
        /// Configured connect timeout.
        timeout: Duration,
    },

    /// Target address or reply conduit was closed.
    #[error("connection channel closed")]
    ConnectionChannel,

    /// Remote replied without a connection.
    #[error("empty connection returned by remote")]
    NilConnection,
}

impl ConnectError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConnectError::NoDiscovery => "connect_no_discovery",
            ConnectError::NotFound { .. } => "connect_not_found",
            ConnectError::ContextCompleted => "connect_context_completed",
            ConnectError::Timeout { .. } => "connect_timeout",
            ConnectError::ConnectionChannel => "connect_channel_closed",
            ConnectError::NilConnection => "connect_nil_connection",
        }
    }
}

/// Extracts a readable message from a caught panic payload.
pub(crate) fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
