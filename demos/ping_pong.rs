//! # Example: ping_pong
//!
//! Two supervised tasks talking through the discovery registry.
//!
//! Demonstrates how to:
//! - Give a task a request [`HandlerFn`] (its identity accepts connections).
//! - Register a second task so it can connect and send requests.
//! - Watch the lifecycle through the built-in [`LogWriter`].
//!
//! ## Flow
//! ```text
//! launch ──► worker "pong": register identity ─► accept loop ─► wait for ctx
//!        └─► worker "ping": register identity ─► connect("pong") ─► 3 × send ─► return
//!                                                                            │
//!            cascade: ShutdownRequested ─► cancel "pong" ─► AllStoppedWithin ◄┘
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example ping_pong
//! ```

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use cohort::{
    Args, Config, ConnectError, ConnectOptions, HandlerFn, Identity, Payload, Req, Res,
    SendOptions, Supervisor, TaskDecl, TaskError, TaskFn, TaskOptions, TaskRef, Verbosity,
};

fn pong() -> TaskRef {
    TaskFn::arc(|ctx: CancellationToken, _opts: TaskOptions, _args: Args| async move {
        ctx.cancelled().await;
        Ok::<(), TaskError>(())
    })
}

fn ping() -> TaskRef {
    TaskFn::arc(|ctx: CancellationToken, opts: TaskOptions, _args: Args| async move {
        let me = opts
            .identity()
            .cloned()
            .ok_or_else(|| TaskError::fail("ping has no identity"))?;

        let conn = loop {
            match me.connect(&ctx, "pong", ConnectOptions::default()).await {
                Ok(conn) => break conn,
                // "pong" registers from its own worker; it may not be there yet.
                Err(ConnectError::NotFound { .. }) => {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
                Err(e) => return Err(TaskError::fail(e.to_string())),
            }
        };

        for round in 1..=3u32 {
            let req = Req::new("ping", Payload::new(round));
            match me.send(&ctx, &req, &conn, SendOptions::default()).await {
                Some(res) => println!(
                    "[ping] round {round}: {:?} {} {:?}",
                    res.status,
                    res.kind,
                    res.payload_as::<u32>()
                ),
                None => return Err(TaskError::Canceled),
            }
        }
        Ok(())
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cfg = Config::builder().grace(Duration::from_secs(2)).build()?;
    let sup = Supervisor::builder(cfg)
        .with_log_writer(std::io::stdout(), Verbosity::All)
        .build();

    let handler = HandlerFn::arc(|_ctx: CancellationToken, req: Req| async move {
        Res::success("pong", req.payload)
    });

    sup.run(
        CancellationToken::new(),
        vec![
            TaskDecl::new(pong()).with_name("pong").with_handler(handler),
            TaskDecl::new(ping()).with_name("ping").with_registration(),
        ],
    )
    .await?;
    Ok(())
}
