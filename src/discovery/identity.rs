//! # Identities: named endpoints that accept connections and exchange requests.
//!
//! ## Protocol
//! ```text
//! connector.connect(ctx, "bob")                      bob.accept(ctx)
//!   ├─► discovery.find("bob") → Address                │
//!   ├─► borrow reply conduit                           │
//!   ├─► Address ◄── ConnectRequest{from, reply} ───────┤ recv
//!   │                                                  ├─► borrow request conduit
//!   │                                                  ├─► spawn handling loop ──┐
//!   └─► select { ctx │ timeout │ reply } ◄── Some(Connection) ──┘               │
//!                                                                               │
//! connector.send(ctx, req, &conn)                         handling loop         │
//!   ├─► borrow response conduit                          (one per connection) ◄─┘
//!   ├─► conn.requests ◄── RequestEnvelope{req, reply}    select { ctx │ envelope │ idle }
//!   └─► select { ctx │ timeout │ response } ◄── Res ──── handler(req) (panic → Error)
//! ```
//!
//! ## Rules
//! - `connect` and `send` wait on, in priority order: caller cancellation, the
//!   configured timeout, the reply.
//! - A send timeout is a value (`Status::RequestTimeout`), not an error.
//! - A handling loop ends on cancellation, once every clone of its
//!   [`Connection`] is dropped, or after `idle_timeout` without a request; its
//!   request conduit then goes back to the pool.
//! - A request dropped before the remote answered it yields a
//!   `"connection closed"` error response instead of waiting out the timeout.
//! - An identity without a handler refuses connections with an empty reply.

use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use crate::error::{ConnectError, DiscoveryError};

use super::handler::{invoke, HandlerRef};
use super::message::{Address, ConnectRequest, Connection, Req, RequestEnvelope, Res};
use super::options::{ConnectOptions, SendOptions};
use super::pool::{ChannelPools, Conduit, Pool};
use super::registry::{Discovery, DiscoveryRef};

/// Shared handle to an identity.
pub type IdentityRef = Arc<dyn Identity>;

/// A named, addressable endpoint.
#[async_trait]
pub trait Identity: Send + Sync + 'static {
    /// Unique name of this identity.
    fn name(&self) -> &str;

    /// Inbound address receiving connect requests.
    fn address(&self) -> Address;

    /// Consumes connect requests until `ctx` is cancelled or the address closes.
    async fn accept(&self, ctx: CancellationToken);

    /// Performs the connect handshake with the identity called `target`.
    async fn connect(
        &self,
        ctx: &CancellationToken,
        target: &str,
        opts: ConnectOptions,
    ) -> Result<Connection, ConnectError>;

    /// Sends `req` over `conn` and waits for the response.
    ///
    /// Returns `None` if `ctx` is cancelled first, and a `RequestTimeout`
    /// response if the send timeout elapses.
    async fn send(
        &self,
        ctx: &CancellationToken,
        req: &Req,
        conn: &Connection,
        opts: SendOptions,
    ) -> Option<Res>;
}

/// In-process identity backed by tokio channels and pooled conduits.
pub struct MemoryIdentity {
    name: String,
    address: mpsc::Sender<ConnectRequest>,
    inbound: Mutex<mpsc::Receiver<ConnectRequest>>,
    handler: Option<HandlerRef>,
    idle_timeout: Duration,
    pools: Arc<ChannelPools>,
    discovery: Option<Weak<dyn Discovery>>,
}

impl MemoryIdentity {
    /// Creates an identity that is not registered anywhere.
    ///
    /// `connect` then needs a registry passed through [`ConnectOptions`].
    pub fn new(
        name: impl Into<String>,
        idle_timeout: Duration,
        handler: Option<HandlerRef>,
        pools: Arc<ChannelPools>,
    ) -> Self {
        let (address, inbound) = mpsc::channel(1);
        Self {
            name: name.into(),
            address,
            inbound: Mutex::new(inbound),
            handler,
            idle_timeout,
            pools,
            discovery: None,
        }
    }

    /// Creates an identity and registers it with `discovery`.
    ///
    /// The identity resolves connect targets through the same registry.
    pub fn create_and_register(
        name: impl Into<String>,
        idle_timeout: Duration,
        handler: Option<HandlerRef>,
        discovery: &DiscoveryRef,
        pools: Arc<ChannelPools>,
    ) -> Result<Arc<Self>, DiscoveryError> {
        let mut identity = Self::new(name, idle_timeout, handler, pools);
        identity.discovery = Some(Arc::downgrade(discovery));

        let identity = Arc::new(identity);
        discovery.register(identity.clone())?;
        Ok(identity)
    }

    /// Idle timeout applied to each accepted connection.
    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    /// True if this identity answers requests.
    pub fn has_handler(&self) -> bool {
        self.handler.is_some()
    }

    fn resolve(&self, opts: &ConnectOptions) -> Result<DiscoveryRef, ConnectError> {
        if let Some(ds) = opts.discovery() {
            return Ok(Arc::clone(ds));
        }
        self.discovery
            .as_ref()
            .and_then(Weak::upgrade)
            .ok_or(ConnectError::NoDiscovery)
    }
}

#[async_trait]
impl Identity for MemoryIdentity {
    fn name(&self) -> &str {
        &self.name
    }

    fn address(&self) -> Address {
        Address(self.address.clone())
    }

    async fn accept(&self, ctx: CancellationToken) {
        let mut inbound = tokio::select! {
            _ = ctx.cancelled() => return,
            guard = self.inbound.lock() => guard,
        };

        loop {
            let request = tokio::select! {
                _ = ctx.cancelled() => return,
                req = inbound.recv() => match req {
                    Some(req) => req,
                    None => return,
                },
            };
            let ConnectRequest { reply, .. } = request;

            let Some(handler) = self.handler.clone() else {
                let _ = reply.try_send(None);
                continue;
            };

            let mut conduit = self.pools.requests().get();
            let conn = Connection {
                requests: conduit.sender(),
                timeout: self.idle_timeout,
            };
            tokio::spawn(handle_connection(
                ctx.clone(),
                conduit,
                handler,
                Arc::clone(self.pools.requests()),
                self.idle_timeout,
            ));

            let _ = reply.try_send(Some(conn));
        }
    }

    async fn connect(
        &self,
        ctx: &CancellationToken,
        target: &str,
        opts: ConnectOptions,
    ) -> Result<Connection, ConnectError> {
        let discovery = self.resolve(&opts)?;
        let address = discovery
            .find(target)
            .map_err(|_| ConnectError::NotFound {
                name: target.to_string(),
            })?;

        let pool = self.pools.connections();
        let mut conduit = pool.get();
        let request = ConnectRequest {
            from: self.name.clone(),
            reply: conduit.sender(),
        };
        let timeout = opts.timeout();

        let outcome = {
            let exchange = async {
                address
                    .0
                    .send(request)
                    .await
                    .map_err(|_| ConnectError::ConnectionChannel)?;
                match conduit.recv().await {
                    Some(Some(conn)) => Ok(conn),
                    Some(None) => Err(ConnectError::NilConnection),
                    None => Err(ConnectError::ConnectionChannel),
                }
            };

            tokio::select! {
                biased;
                _ = ctx.cancelled() => Err(ConnectError::ContextCompleted),
                _ = time::sleep(timeout) => Err(ConnectError::Timeout { timeout }),
                res = exchange => res,
            }
        };

        pool.put(conduit);
        outcome
    }

    async fn send(
        &self,
        ctx: &CancellationToken,
        req: &Req,
        conn: &Connection,
        opts: SendOptions,
    ) -> Option<Res> {
        let pool = self.pools.responses();
        let mut conduit = pool.get();
        let envelope = RequestEnvelope {
            req: req.clone(),
            reply: conduit.sender(),
        };

        let outcome = {
            let exchange = async {
                if conn.requests.send(envelope).await.is_err() {
                    return Exchange::Undeliverable;
                }
                match conduit.recv().await {
                    Some(res) => Exchange::Answered(res),
                    None => Exchange::Undeliverable,
                }
            };

            tokio::select! {
                biased;
                _ = ctx.cancelled() => Exchange::Cancelled,
                _ = time::sleep(opts.timeout()) => Exchange::TimedOut,
                res = exchange => res,
            }
        };

        match outcome {
            Exchange::Answered(res) => {
                pool.put(conduit);
                Some(res)
            }
            Exchange::Undeliverable => {
                pool.put(conduit);
                Some(Res::error("connection closed"))
            }
            Exchange::TimedOut => {
                // The handler may still answer; the conduit is recycled only after that.
                pool.reclaim(conduit, ctx.clone());
                Some(Res::timeout())
            }
            Exchange::Cancelled => {
                pool.put(conduit);
                None
            }
        }
    }
}

enum Exchange {
    Answered(Res),
    Undeliverable,
    TimedOut,
    Cancelled,
}

/// Serves one accepted connection until cancellation or idle expiry.
async fn handle_connection(
    ctx: CancellationToken,
    mut conduit: Conduit<RequestEnvelope>,
    handler: HandlerRef,
    pool: Arc<Pool<RequestEnvelope>>,
    idle_timeout: Duration,
) {
    let idle = time::sleep(idle_timeout);
    tokio::pin!(idle);

    loop {
        let next = tokio::select! {
            biased;
            _ = ctx.cancelled() => None,
            env = conduit.recv() => env,
            _ = &mut idle => None,
        };
        let Some(RequestEnvelope { req, reply }) = next else {
            break;
        };

        let res = invoke(&handler, ctx.clone(), req).await;
        let _ = reply.try_send(res);
        drop(reply);

        idle.as_mut().reset(Instant::now() + idle_timeout);
    }

    pool.put(conduit);
}
