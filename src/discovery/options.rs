//! Per-call options for [`Identity::connect`](super::Identity::connect) and
//! [`Identity::send`](super::Identity::send).
//!
//! Both are immutable values; non-default values go through a builder whose
//! `build` rejects zero timeouts.

use std::time::Duration;

use crate::error::ConfigError;

use super::registry::DiscoveryRef;

/// Default time to wait for the remote to answer a connect request.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default time to wait for a response to a sent request.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// Options for one connect attempt.
#[derive(Clone)]
pub struct ConnectOptions {
    timeout: Duration,
    discovery: Option<DiscoveryRef>,
}

impl ConnectOptions {
    /// Starts a builder from the defaults.
    pub fn builder() -> ConnectOptionsBuilder {
        ConnectOptionsBuilder {
            inner: Self::default(),
        }
    }

    /// Time allowed for the remote to reply.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Registry overriding the identity's own one, if any.
    pub fn discovery(&self) -> Option<&DiscoveryRef> {
        self.discovery.as_ref()
    }
}

impl Default for ConnectOptions {
    /// `timeout = 10s`, no registry override.
    fn default() -> Self {
        Self {
            timeout: DEFAULT_CONNECT_TIMEOUT,
            discovery: None,
        }
    }
}

/// Builder for [`ConnectOptions`].
pub struct ConnectOptionsBuilder {
    inner: ConnectOptions,
}

impl ConnectOptionsBuilder {
    /// Sets the connect timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.inner.timeout = timeout;
        self
    }

    /// Resolves target names through `discovery` instead of the identity's registry.
    pub fn discovery(mut self, discovery: DiscoveryRef) -> Self {
        self.inner.discovery = Some(discovery);
        self
    }

    /// Validates and returns the options.
    pub fn build(self) -> Result<ConnectOptions, ConfigError> {
        if self.inner.timeout.is_zero() {
            return Err(ConfigError::ZeroDuration {
                field: "connect timeout",
            });
        }
        Ok(self.inner)
    }
}

/// Options for one request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SendOptions {
    timeout: Duration,
}

impl SendOptions {
    /// Starts a builder from the defaults.
    pub fn builder() -> SendOptionsBuilder {
        SendOptionsBuilder {
            inner: Self::default(),
        }
    }

    /// Time allowed for the response to arrive.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for SendOptions {
    /// `timeout = 1h`.
    fn default() -> Self {
        Self {
            timeout: DEFAULT_SEND_TIMEOUT,
        }
    }
}

/// Builder for [`SendOptions`].
pub struct SendOptionsBuilder {
    inner: SendOptions,
}

impl SendOptionsBuilder {
    /// Sets the send timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.inner.timeout = timeout;
        self
    }

    /// Validates and returns the options.
    pub fn build(self) -> Result<SendOptions, ConfigError> {
        if self.inner.timeout.is_zero() {
            return Err(ConfigError::ZeroDuration {
                field: "send timeout",
            });
        }
        Ok(self.inner)
    }
}
