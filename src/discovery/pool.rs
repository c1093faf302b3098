//! # Reuse pools for single-slot conduits.
//!
//! Handshake replies and responses are always one value, produced by exactly
//! one producer and consumed by exactly one consumer. A capacity-one
//! [`mpsc`] channel fits that shape and lets the producer enqueue without
//! waiting. [`ChannelPools`] keeps three [`Pool`]s of such conduits so the
//! hot path does not allocate a fresh channel per exchange.
//!
//! ## Rules
//! - A conduit returns to its pool only when nobody else holds a sender for
//!   it; otherwise a late producer could write into a future borrower's slot.
//! - A returned conduit is drained before it becomes available again.
//! - [`Pool::reclaim`] waits in the background until a late value arrives or
//!   every producer handle is gone, then returns the conduit. It gives the
//!   conduit up if the context is cancelled first.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, DropGuard};

use super::message::{Connection, RequestEnvelope, Res};

/// Default number of idle conduits kept per pool.
pub const DEFAULT_MAX_IDLE: usize = 64;

/// Single-slot channel owned by one borrower at a time.
#[derive(Debug)]
pub struct Conduit<T> {
    tx: mpsc::Sender<T>,
    rx: mpsc::Receiver<T>,
    lent: Option<CancellationToken>,
}

impl<T> Conduit<T> {
    fn new() -> Self {
        let (tx, rx) = mpsc::channel(1);
        Self { tx, rx, lent: None }
    }

    /// Sender half to hand to the producer.
    ///
    /// Once every clone of the returned sender is dropped, [`Conduit::recv`]
    /// stops waiting and reports `None` if nothing was sent.
    pub(crate) fn sender(&mut self) -> ConduitSender<T> {
        let lent = CancellationToken::new();
        self.lent = Some(lent.clone());
        ConduitSender {
            tx: self.tx.clone(),
            _alive: Arc::new(lent.drop_guard()),
        }
    }

    pub(crate) async fn recv(&mut self) -> Option<T> {
        let Some(lent) = self.lent.clone() else {
            return self.rx.recv().await;
        };
        tokio::select! {
            biased;
            value = self.rx.recv() => return value,
            _ = lent.cancelled() => {}
        }
        // Every producer is gone; a value sent just before is still buffered.
        self.rx.try_recv().ok()
    }

    /// True while any sender other than our own is alive.
    fn is_shared(&self) -> bool {
        self.tx.strong_count() > 1
    }

    fn drain(&mut self) {
        while self.rx.try_recv().is_ok() {}
        self.lent = None;
    }
}

/// Producer handle of a [`Conduit`].
///
/// Dropping the last clone tells the borrower that no value is coming.
pub struct ConduitSender<T> {
    tx: mpsc::Sender<T>,
    _alive: Arc<DropGuard>,
}

impl<T> ConduitSender<T> {
    /// Enqueues `value`, waiting for the slot to free up.
    pub async fn send(&self, value: T) -> Result<(), mpsc::error::SendError<T>> {
        self.tx.send(value).await
    }

    /// Enqueues `value` if the slot is free.
    pub fn try_send(&self, value: T) -> Result<(), mpsc::error::TrySendError<T>> {
        self.tx.try_send(value)
    }

    /// True once the receiving side has gone away.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl<T> Clone for ConduitSender<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            _alive: Arc::clone(&self._alive),
        }
    }
}

impl<T> fmt::Debug for ConduitSender<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConduitSender")
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}

/// Lazily-filled pool of [`Conduit`]s of one message type.
#[derive(Debug)]
pub struct Pool<T> {
    idle: Mutex<Vec<Conduit<T>>>,
    max_idle: usize,
    created: AtomicUsize,
}

impl<T: Send + 'static> Pool<T> {
    /// Creates an empty pool keeping at most `max_idle` idle conduits.
    pub fn new(max_idle: usize) -> Self {
        Self {
            idle: Mutex::new(Vec::new()),
            max_idle,
            created: AtomicUsize::new(0),
        }
    }

    /// Borrows an idle conduit, creating one if none is available.
    pub fn get(&self) -> Conduit<T> {
        if let Some(c) = self.lock().pop() {
            return c;
        }
        self.created.fetch_add(1, Ordering::Relaxed);
        Conduit::new()
    }

    /// Returns a conduit.
    ///
    /// Conduits still reachable through another sender are discarded; the
    /// rest are drained and kept (up to `max_idle`).
    pub fn put(&self, mut conduit: Conduit<T>) {
        if conduit.is_shared() {
            return;
        }
        conduit.drain();

        let mut idle = self.lock();
        if idle.len() < self.max_idle {
            idle.push(conduit);
        }
    }

    /// Returns a conduit once no producer can write into it anymore.
    ///
    /// Used when the borrower stopped waiting (timeout) while a producer may
    /// still answer. Settles on the late value, or on the producer handle
    /// being dropped undelivered. The conduit is dropped if `ctx` is
    /// cancelled first.
    pub fn reclaim(self: &Arc<Self>, mut conduit: Conduit<T>, ctx: CancellationToken) {
        let pool = Arc::clone(self);
        tokio::spawn(async move {
            let settled = tokio::select! {
                _ = conduit.recv() => true,
                _ = ctx.cancelled() => false,
            };
            if settled {
                pool.put(conduit);
            }
        });
    }

    /// Number of idle conduits.
    pub fn idle(&self) -> usize {
        self.lock().len()
    }

    /// Number of conduits created since the pool was built.
    pub fn created(&self) -> usize {
        self.created.load(Ordering::Relaxed)
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Conduit<T>>> {
        self.idle.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<T: Send + 'static> Default for Pool<T> {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_IDLE)
    }
}

/// The three conduit pools used by identities.
///
/// One instance is owned by the supervisor and injected into every identity
/// it creates; tests can build their own to observe reuse.
#[derive(Debug, Default)]
pub struct ChannelPools {
    connections: Arc<Pool<Option<Connection>>>,
    requests: Arc<Pool<RequestEnvelope>>,
    responses: Arc<Pool<Res>>,
}

impl ChannelPools {
    /// Creates empty pools.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Handshake reply conduits.
    pub fn connections(&self) -> &Arc<Pool<Option<Connection>>> {
        &self.connections
    }

    /// Per-connection request conduits.
    pub fn requests(&self) -> &Arc<Pool<RequestEnvelope>> {
        &self.requests
    }

    /// Response conduits.
    pub fn responses(&self) -> &Arc<Pool<Res>> {
        &self.responses
    }
}
