//! Runtime events: types and broadcast bus.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: supervisor watchers (cascade, interrupt bridge), workers,
//!   `Running::await_exit`, `SubscriberSet` workers (overflow/panic).
//! - **Consumer**: the per-launch listener in `core::supervisor`, which fans
//!   out to the `SubscriberSet`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
