//! # Event subscribers.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out
//! and the built-in [`LogWriter`] sink (feature `logging`).
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   Worker / watcher ── publish(Event) ──► Bus ──► listener ──► SubscriberSet::emit
//!                                                                   │
//!                                                     ┌─────────────┼──────────┐
//!                                                     ▼             ▼          ▼
//!                                                 LogWriter      Metrics    Custom
//! ```
//!
//! ## Implementing custom subscribers
//! ```no_run
//! use cohort::{Subscribe, Event, EventKind};
//! use async_trait::async_trait;
//!
//! struct FailureCounter;
//!
//! #[async_trait]
//! impl Subscribe for FailureCounter {
//!     async fn on_event(&self, event: &Event) {
//!         if let EventKind::TaskFailed | EventKind::TaskPanicked = event.kind {
//!             // increment failure counter
//!         }
//!     }
//! }
//! ```

#[cfg(feature = "logging")]
mod log;
mod subscribe;
mod subscriber_set;

#[cfg(feature = "logging")]
pub use log::{LogWriter, Verbosity};
pub use subscribe::Subscribe;
pub use subscriber_set::SubscriberSet;
