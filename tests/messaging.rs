use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use cohort::{
    Args, ChannelPools, Config, ConnectError, ConnectOptions, Connection, Discovery,
    HandlerFn, HandlerRef, Identity, IdentityRef, MemoryDiscovery, MemoryIdentity, Payload, Req,
    Res, SendOptions, Status, Supervisor, TaskDecl, TaskError, TaskFn, TaskOptions,
};

fn echo() -> HandlerRef {
    HandlerFn::arc(|_ctx: CancellationToken, req: Req| async move {
        Res::success(req.kind, req.payload)
    })
}

/// Echoes after sleeping for the number of milliseconds carried by the request.
fn delayed_echo() -> HandlerRef {
    HandlerFn::arc(|_ctx: CancellationToken, req: Req| async move {
        let ms = req.payload_as::<u64>().copied().unwrap_or_default();
        tokio::time::sleep(Duration::from_millis(ms)).await;
        Res::success(req.kind, req.payload)
    })
}

/// Sibling tasks register concurrently; retry until the target shows up.
async fn connect_retrying(
    me: &IdentityRef,
    ctx: &CancellationToken,
    target: &str,
) -> Result<Connection, ConnectError> {
    loop {
        match me.connect(ctx, target, ConnectOptions::default()).await {
            Err(ConnectError::NotFound { .. }) => {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            other => return other,
        }
    }
}

#[tokio::test]
async fn test_round_trip_between_supervised_tasks() {
    let sup = Supervisor::new(Config::default(), Vec::new());
    let received: Arc<Mutex<Option<Res>>> = Arc::new(Mutex::new(None));

    let pong = TaskFn::arc(|ctx: CancellationToken, _o: TaskOptions, _a: Args| async move {
        ctx.cancelled().await;
        Ok::<_, TaskError>(())
    });

    let ping = {
        let received = received.clone();
        TaskFn::arc(move |ctx: CancellationToken, opts: TaskOptions, _a: Args| {
            let received = received.clone();
            async move {
                let me = opts.identity().cloned().ok_or(TaskError::Canceled)?;
                let conn = connect_retrying(&me, &ctx, "pong")
                    .await
                    .map_err(|e| TaskError::fail(e.to_string()))?;
                let req = Req::new("text", Payload::new("hello"));
                let res = me.send(&ctx, &req, &conn, SendOptions::default()).await;
                *received.lock().unwrap() = res;
                Ok::<_, TaskError>(())
            }
        })
    };

    sup.run(
        CancellationToken::new(),
        vec![
            TaskDecl::new(pong).with_name("pong").with_handler(echo()),
            TaskDecl::new(ping).with_name("ping").with_registration(),
        ],
    )
    .await
    .unwrap();

    let res = received.lock().unwrap().take().unwrap();
    assert_eq!(res.status, Status::Success);
    assert_eq!(res.kind, "text");
    assert_eq!(res.payload_as::<&str>(), Some(&"hello"));
}

#[tokio::test]
async fn test_connect_errors() {
    let ds = MemoryDiscovery::shared();
    let pools = ChannelPools::new();
    let ctx = CancellationToken::new();
    let registered = MemoryIdentity::create_and_register(
        "registered",
        Duration::from_secs(1),
        None,
        &ds,
        pools.clone(),
    )
    .unwrap();
    let unregistered = MemoryIdentity::new("loner", Duration::from_secs(1), None, pools);

    let missing = registered
        .connect(&ctx, "nobody", ConnectOptions::default())
        .await
        .err();
    assert!(matches!(missing, Some(ConnectError::NotFound { name }) if name == "nobody"));

    let no_registry = unregistered
        .connect(&ctx, "registered", ConnectOptions::default())
        .await
        .err();
    assert!(matches!(no_registry, Some(ConnectError::NoDiscovery)));

    // `registered` has no handler: it refuses with an empty reply.
    let acceptor = registered.clone();
    let accept_ctx = ctx.clone();
    tokio::spawn(async move { acceptor.accept(accept_ctx).await });
    let opts = ConnectOptions::builder().discovery(ds.clone()).build().unwrap();
    let refused = unregistered.connect(&ctx, "registered", opts).await.err();
    assert!(matches!(refused, Some(ConnectError::NilConnection)));
    ctx.cancel();
}

#[tokio::test]
async fn test_send_timeout_does_not_corrupt_later_sends() {
    let ds = MemoryDiscovery::shared();
    let pools = ChannelPools::new();
    let ctx = CancellationToken::new();
    let server = MemoryIdentity::create_and_register(
        "server",
        Duration::from_secs(5),
        Some(delayed_echo()),
        &ds,
        pools.clone(),
    )
    .unwrap();
    let client =
        MemoryIdentity::create_and_register("client", Duration::from_secs(5), None, &ds, pools.clone())
            .unwrap();

    let acceptor = server.clone();
    let accept_ctx = ctx.clone();
    tokio::spawn(async move { acceptor.accept(accept_ctx).await });

    let conn = client
        .connect(&ctx, "server", ConnectOptions::default())
        .await
        .unwrap();

    let short = SendOptions::builder()
        .timeout(Duration::from_millis(30))
        .build()
        .unwrap();
    let begun = tokio::time::Instant::now();
    let late = client
        .send(&ctx, &Req::new("late", Payload::new(150u64)), &conn, short)
        .await
        .unwrap();
    assert_eq!(late.status, Status::RequestTimeout);
    assert!(begun.elapsed() < Duration::from_millis(150));

    // Open a second connection while the first handler is still busy.
    let conn2 = client
        .connect(&ctx, "server", ConnectOptions::default())
        .await
        .unwrap();
    for i in 0..3u64 {
        let res = client
            .send(&ctx, &Req::new(format!("fresh-{i}"), Payload::new(i)), &conn2, SendOptions::default())
            .await
            .unwrap();
        assert_eq!(res.status, Status::Success);
        assert_eq!(res.kind, format!("fresh-{i}"));
    }

    // Let the late answer land, then reuse the pooled conduits again.
    tokio::time::sleep(Duration::from_millis(200)).await;
    for i in 0..3u64 {
        let res = client
            .send(&ctx, &Req::new(format!("after-{i}"), Payload::new(0u64)), &conn2, SendOptions::default())
            .await
            .unwrap();
        assert_eq!(res.kind, format!("after-{i}"));
    }
    assert!(ds.find("server").is_ok());
    ctx.cancel();
}

#[tokio::test]
async fn test_idle_connection_returns_its_conduit_to_the_pool() {
    let ds = MemoryDiscovery::shared();
    let pools = ChannelPools::new();
    let ctx = CancellationToken::new();
    let server = MemoryIdentity::create_and_register(
        "server",
        Duration::from_millis(50),
        Some(echo()),
        &ds,
        pools.clone(),
    )
    .unwrap();
    let client =
        MemoryIdentity::create_and_register("client", Duration::from_secs(1), None, &ds, pools.clone())
            .unwrap();

    let acceptor = server.clone();
    let accept_ctx = ctx.clone();
    tokio::spawn(async move { acceptor.accept(accept_ctx).await });

    // A connection the client forgets about: its conduit comes back after the idle timeout.
    let abandoned = client
        .connect(&ctx, "server", ConnectOptions::default())
        .await
        .unwrap();
    assert_eq!(abandoned.timeout(), Duration::from_millis(50));
    drop(abandoned);
    assert_eq!(pools.requests().idle(), 0);
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(pools.requests().idle(), 1);

    // A connection kept past its idle timeout reports the closed handling loop.
    let kept = client
        .connect(&ctx, "server", ConnectOptions::default())
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;
    let res = client
        .send(&ctx, &Req::new("late", Payload::new(())), &kept, SendOptions::default())
        .await
        .unwrap();
    assert_eq!(res.status, Status::Error);
    assert_eq!(res.error.as_deref(), Some("connection closed"));
    ctx.cancel();
}
