//! # Example: cascade
//!
//! One failing task brings the whole group down; a task that ignores its
//! token is named in the grace report.
//!
//! ## Flow
//! ```text
//! launch ──► "steady" × 2: wait for ctx
//!        ├─► "stubborn": sleeps past the grace period, ignoring ctx
//!        └─► "flaky": fails after 300ms ─► TaskFailed ─► ShutdownRequested
//!                                                         ├─► steady: cancelled, stopped
//!                                                         └─► grace (500ms) ─► GraceExceeded stuck="stubborn"
//! ```
//!
//! Press Ctrl-C before "flaky" fails to see the interrupt start the same cascade.
//!
//! ## Run
//! ```bash
//! cargo run --example cascade
//! ```

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use cohort::{
    Args, Config, Supervisor, TaskDecl, TaskError, TaskFn, TaskOptions, TaskRef, Verbosity,
};

fn steady() -> TaskRef {
    TaskFn::arc(|ctx: CancellationToken, opts: TaskOptions, _args: Args| async move {
        ctx.cancelled().await;
        println!("[{}] cancelled", opts.name());
        Err::<(), _>(TaskError::Canceled)
    })
}

fn stubborn() -> TaskRef {
    TaskFn::arc(|_ctx: CancellationToken, _opts: TaskOptions, _args: Args| async move {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok::<(), TaskError>(())
    })
}

fn flaky() -> TaskRef {
    TaskFn::arc(|_ctx: CancellationToken, _opts: TaskOptions, _args: Args| async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        Err::<(), _>(TaskError::fail("upstream went away"))
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cfg = Config::builder()
        .grace(Duration::from_millis(500))
        .discovery(false)
        .build()?;
    let sup = Supervisor::builder(cfg)
        .with_log_writer(std::io::stdout(), Verbosity::All)
        .build();

    let running = sup
        .launch(
            CancellationToken::new(),
            vec![
                TaskDecl::new(steady()),
                TaskDecl::new(steady()),
                TaskDecl::new(stubborn()).with_name("stubborn"),
                TaskDecl::new(flaky()).with_name("flaky"),
            ],
        )
        .await?;

    for name in running.names().await {
        println!("[main] launched {name}");
    }
    running.await_exit().await;
    Ok(())
}
