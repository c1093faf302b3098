//! # Request handlers.
//!
//! A [`Handler`] turns a [`Req`] into a [`Res`]. [`HandlerFn`] wraps a closure
//! producing a fresh future per request, the same way `TaskFn` wraps task bodies.
//!
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use cohort::{HandlerFn, HandlerRef, Req, Res};
//!
//! let echo: HandlerRef = HandlerFn::arc(|_ctx: CancellationToken, req: Req| async move {
//!     Res::success(req.kind, req.payload)
//! });
//! # let _ = echo;
//! ```

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;

use futures::FutureExt;
use tokio_util::sync::CancellationToken;

use super::message::{Req, Res};
use crate::error::panic_message;

/// Boxed response future returned by [`Handler::handle`].
pub type BoxResFuture = Pin<Box<dyn Future<Output = Res> + Send + 'static>>;

/// Shared handle to a handler.
pub type HandlerRef = Arc<dyn Handler>;

/// Processes one request.
pub trait Handler: Send + Sync + 'static {
    /// Produces the response for `req`.
    ///
    /// `ctx` is the accepting identity's context; long handlers should watch it.
    fn handle(&self, ctx: CancellationToken, req: Req) -> BoxResFuture;
}

/// Function-backed handler.
pub struct HandlerFn<F> {
    f: F,
}

impl<F> HandlerFn<F> {
    /// Wraps `f`.
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Wraps `f` and returns it as a [`HandlerRef`]-compatible `Arc`.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

impl<F, Fut> Handler for HandlerFn<F>
where
    F: Fn(CancellationToken, Req) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Res> + Send + 'static,
{
    fn handle(&self, ctx: CancellationToken, req: Req) -> BoxResFuture {
        Box::pin((self.f)(ctx, req))
    }
}

/// Runs `handler`, converting a panic into an `Error` response.
pub(crate) async fn invoke(handler: &HandlerRef, ctx: CancellationToken, req: Req) -> Res {
    let fut = async move { handler.handle(ctx, req).await };
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(res) => res,
        Err(panic) => Res::error(format!("caught panic: {}", panic_message(&*panic))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::{Payload, Status};

    #[tokio::test]
    async fn test_invoke_returns_handler_response() {
        let h: HandlerRef = HandlerFn::arc(|_ctx: CancellationToken, req: Req| async move {
            Res::success(req.kind, req.payload)
        });
        let res = invoke(&h, CancellationToken::new(), Req::new("n", Payload::new(3u8))).await;
        assert_eq!(res.status, Status::Success);
        assert_eq!(res.kind, "n");
        assert_eq!(res.payload_as::<u8>(), Some(&3));
    }

    #[tokio::test]
    async fn test_invoke_recovers_panic() {
        let h: HandlerRef = HandlerFn::arc(|_ctx: CancellationToken, _req: Req| async move {
            if true {
                panic!("kaboom");
            }
            Res::default()
        });
        let res = invoke(&h, CancellationToken::new(), Req::default()).await;
        assert_eq!(res.status, Status::Error);
        assert_eq!(res.error.as_deref(), Some("caught panic: kaboom"));
        assert!(res.payload.is_none());
        assert!(res.kind.is_empty());
    }
}
