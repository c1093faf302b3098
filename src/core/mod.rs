//! Runtime core: orchestration and lifecycle.
//!
//! The public API from this module is [`Supervisor`] (with its
//! [`SupervisorBuilder`] and [`Config`]) and the [`Running`] handle returned
//! by a launch.
//!
//! Internal modules:
//! - [`worker`]: runs one task body, contains its failure and triggers the cascade;
//! - [`supervisor`]: validates declarations, spawns workers, cascades shutdown, joins with grace;
//! - [`registry`]: per-task tokens and completion handles behind one lock;
//! - [`shutdown`]: cross-platform interrupt handling.

mod builder;
mod config;
mod registry;
mod shutdown;
mod supervisor;
mod worker;

pub use builder::SupervisorBuilder;
pub use config::{
    Config, ConfigBuilder, DEFAULT_BUS_CAPACITY, DEFAULT_GRACE, DEFAULT_IDLE_TIMEOUT,
};
pub use supervisor::{Running, Supervisor};
