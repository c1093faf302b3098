use std::sync::Arc;

use super::{supervisor::Supervisor, Config};
use crate::discovery::ChannelPools;
use crate::subscribers::Subscribe;

/// Builder for constructing a Supervisor with optional features.
///
/// ```rust
/// use cohort::{Config, Supervisor};
///
/// let sup = Supervisor::builder(Config::default()).build();
/// assert_eq!(sup.pools().requests().idle(), 0);
/// ```
pub struct SupervisorBuilder {
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
    pools: Option<Arc<ChannelPools>>,
}

impl SupervisorBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
            pools: None,
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive runtime events (task lifecycle, failures, etc.)
    /// through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Adds one event subscriber.
    pub fn with_subscriber(mut self, subscriber: Arc<dyn Subscribe>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    /// Adds a [`LogWriter`](crate::LogWriter) writing to `sink`.
    ///
    /// Requires the `logging` feature flag.
    #[cfg(feature = "logging")]
    pub fn with_log_writer(
        self,
        sink: impl std::io::Write + Send + 'static,
        verbosity: crate::subscribers::Verbosity,
    ) -> Self {
        self.with_subscriber(Arc::new(crate::subscribers::LogWriter::new(sink, verbosity)))
    }

    /// Injects the conduit pools used by supervisor-created identities.
    ///
    /// By default every supervisor gets its own pools.
    pub fn with_pools(mut self, pools: Arc<ChannelPools>) -> Self {
        self.pools = Some(pools);
        self
    }

    /// Builds and returns the Supervisor instance.
    pub fn build(self) -> Supervisor {
        let pools = self.pools.unwrap_or_else(ChannelPools::new);
        Supervisor::with_pools(self.cfg, self.subscribers, pools)
    }
}

impl Supervisor {
    /// Creates a builder for constructing a Supervisor.
    pub fn builder(cfg: Config) -> SupervisorBuilder {
        SupervisorBuilder::new(cfg)
    }
}
