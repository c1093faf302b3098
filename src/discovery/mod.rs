//! # Identity / discovery messaging layer.
//!
//! Tasks can register named [`Identity`]s in a [`Discovery`] registry, connect
//! to each other by name and exchange [`Req`]/[`Res`] pairs over single-slot
//! conduits recycled through [`ChannelPools`].
//!
//! ## Contents
//! - [`Discovery`], [`MemoryDiscovery`]: name → identity registry;
//! - [`Identity`], [`MemoryIdentity`]: accept / connect / send;
//! - [`Handler`], [`HandlerFn`]: request processing;
//! - [`ConnectOptions`], [`SendOptions`]: per-call timeouts;
//! - [`ChannelPools`], [`Pool`]: conduit reuse;
//! - message types: [`Req`], [`Res`], [`Status`], [`Payload`], [`Connection`], [`Address`].

mod handler;
mod identity;
mod message;
mod options;
mod pool;
mod registry;

pub use handler::{BoxResFuture, Handler, HandlerFn, HandlerRef};
pub use identity::{Identity, IdentityRef, MemoryIdentity};
pub use message::{Address, ConnectRequest, Connection, Payload, Req, RequestEnvelope, Res, Status};
pub use options::{
    ConnectOptions, ConnectOptionsBuilder, SendOptions, SendOptionsBuilder,
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_SEND_TIMEOUT,
};
pub use pool::{ChannelPools, Conduit, ConduitSender, Pool, DEFAULT_MAX_IDLE};
pub use registry::{Discovery, DiscoveryRef, MemoryDiscovery};
