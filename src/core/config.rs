//! # Runtime configuration.
//!
//! Provides [`Config`], the immutable settings of one [`Supervisor`](crate::Supervisor),
//! and [`ConfigBuilder`], which validates them.
//!
//! ```rust
//! use std::time::Duration;
//! use cohort::Config;
//!
//! let cfg = Config::builder()
//!     .grace(Duration::from_secs(5))
//!     .discovery(false)
//!     .build()
//!     .unwrap();
//! assert_eq!(cfg.grace(), Duration::from_secs(5));
//! assert!(!cfg.discovery());
//!
//! assert!(Config::builder().grace(Duration::ZERO).build().is_err());
//! ```

use std::time::Duration;

use crate::error::ConfigError;

/// Default shutdown grace period.
pub const DEFAULT_GRACE: Duration = Duration::from_secs(30);

/// Default idle timeout of identities created by the supervisor.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Default event bus capacity.
pub const DEFAULT_BUS_CAPACITY: usize = 1024;

/// Configuration of the supervisor runtime.
///
/// ## Field semantics
/// - `grace`: how long `await_exit` waits for tasks after the cascade
///   (a shortfall is reported, never escalated)
/// - `discovery`: create a registry per launch; without it no task can own an identity
/// - `idle_timeout`: idle bound of connections accepted by supervisor-created identities
/// - `bus_capacity`: event bus ring buffer size
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    grace: Duration,
    discovery: bool,
    idle_timeout: Duration,
    bus_capacity: usize,
}

impl Config {
    /// Starts a builder from the defaults.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder {
            inner: Self::default(),
        }
    }

    /// Maximum wait for tasks to finish once the cascade started.
    #[inline]
    pub fn grace(&self) -> Duration {
        self.grace
    }

    /// True if each launch creates a discovery registry.
    #[inline]
    pub fn discovery(&self) -> bool {
        self.discovery
    }

    /// Idle timeout of supervisor-created identities.
    #[inline]
    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    /// Capacity of the event bus.
    #[inline]
    pub fn bus_capacity(&self) -> usize {
        self.bus_capacity
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `grace = 30s`
    /// - `discovery = true`
    /// - `idle_timeout = 60s`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            grace: DEFAULT_GRACE,
            discovery: true,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            bus_capacity: DEFAULT_BUS_CAPACITY,
        }
    }
}

/// Builder for [`Config`].
#[derive(Clone, Debug)]
pub struct ConfigBuilder {
    inner: Config,
}

impl ConfigBuilder {
    /// Sets the shutdown grace period.
    pub fn grace(mut self, grace: Duration) -> Self {
        self.inner.grace = grace;
        self
    }

    /// Enables or disables the per-launch discovery registry.
    pub fn discovery(mut self, enabled: bool) -> Self {
        self.inner.discovery = enabled;
        self
    }

    /// Sets the idle timeout of supervisor-created identities.
    pub fn idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.inner.idle_timeout = idle_timeout;
        self
    }

    /// Sets the event bus capacity.
    pub fn bus_capacity(mut self, capacity: usize) -> Self {
        self.inner.bus_capacity = capacity;
        self
    }

    /// Validates and returns the configuration.
    pub fn build(self) -> Result<Config, ConfigError> {
        let cfg = self.inner;
        if cfg.grace.is_zero() {
            return Err(ConfigError::ZeroDuration { field: "grace" });
        }
        if cfg.idle_timeout.is_zero() {
            return Err(ConfigError::ZeroDuration {
                field: "idle timeout",
            });
        }
        if cfg.bus_capacity == 0 {
            return Err(ConfigError::ZeroCapacity {
                field: "bus capacity",
            });
        }
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = Config::builder().build().unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.grace(), Duration::from_secs(30));
        assert!(cfg.discovery());
    }

    #[test]
    fn test_rejects_zero_values() {
        assert_eq!(
            Config::builder().idle_timeout(Duration::ZERO).build(),
            Err(ConfigError::ZeroDuration {
                field: "idle timeout"
            })
        );
        assert_eq!(
            Config::builder().bus_capacity(0).build(),
            Err(ConfigError::ZeroCapacity {
                field: "bus capacity"
            })
        );
    }
}
