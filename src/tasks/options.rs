//! # Per-task options.
//!
//! [`TaskOptions`] is built by the worker for each launched task and handed to
//! the task body. It carries the task's own name, the launch's discovery
//! registry (if one was created) and, when the declaration asked for it, the
//! identity registered under the task's name.

use std::sync::Arc;
use std::time::Duration;

use crate::discovery::{ChannelPools, DiscoveryRef, HandlerRef, IdentityRef, MemoryIdentity};
use crate::error::DiscoveryError;

/// Execution options of one task.
///
/// Cheap to clone; every field is shared.
#[derive(Clone)]
pub struct TaskOptions {
    name: Arc<str>,
    discovery: Option<DiscoveryRef>,
    identity: Option<IdentityRef>,
    pools: Arc<ChannelPools>,
    idle_timeout: Duration,
}

impl TaskOptions {
    pub(crate) fn new(
        name: Arc<str>,
        discovery: Option<DiscoveryRef>,
        pools: Arc<ChannelPools>,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            name,
            discovery,
            identity: None,
            pools,
            idle_timeout,
        }
    }

    pub(crate) fn with_identity(mut self, identity: IdentityRef) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Declared (or generated) task name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registry shared by every task of the launch.
    pub fn discovery(&self) -> Option<&DiscoveryRef> {
        self.discovery.as_ref()
    }

    /// Identity registered under [`name`](Self::name), if requested by the declaration.
    pub fn identity(&self) -> Option<&IdentityRef> {
        self.identity.as_ref()
    }

    /// Conduit pools of the launch.
    pub fn pools(&self) -> &Arc<ChannelPools> {
        &self.pools
    }

    /// Creates and registers an additional identity from inside the task body.
    ///
    /// Uses the launch's registry, pools and idle timeout. The caller is
    /// responsible for running its accept loop if `handler` is set.
    pub fn register_identity(
        &self,
        name: impl Into<String>,
        handler: Option<HandlerRef>,
    ) -> Result<Arc<MemoryIdentity>, DiscoveryError> {
        let discovery = self.discovery.as_ref().ok_or(DiscoveryError::Unavailable)?;
        MemoryIdentity::create_and_register(
            name,
            self.idle_timeout,
            handler,
            discovery,
            Arc::clone(&self.pools),
        )
    }
}
