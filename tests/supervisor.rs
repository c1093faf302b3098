use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use cohort::{
    Args, Config, Event, EventKind, RuntimeError, Subscribe, Supervisor, TaskDecl, TaskError,
    TaskFn, TaskOptions, TaskRef,
};

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<Event>>,
}

impl Recorder {
    fn kinds(&self) -> Vec<EventKind> {
        self.events.lock().unwrap().iter().map(|e| e.kind).collect()
    }

    fn find(&self, kind: EventKind) -> Option<Event> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.kind == kind)
            .cloned()
    }
}

#[async_trait]
impl Subscribe for Recorder {
    async fn on_event(&self, ev: &Event) {
        self.events.lock().unwrap().push(ev.clone());
    }

    fn name(&self) -> &'static str {
        "recorder"
    }
}

fn supervisor(grace: Duration) -> (Supervisor, Arc<Recorder>) {
    let recorder = Arc::new(Recorder::default());
    let cfg = Config::builder().grace(grace).build().unwrap();
    let sup = Supervisor::builder(cfg)
        .with_subscriber(recorder.clone())
        .build();
    (sup, recorder)
}

/// Waits for cancellation and counts both the start and the observed cancel.
fn waiter(started: Arc<AtomicUsize>, cancelled: Arc<AtomicUsize>) -> TaskRef {
    TaskFn::arc(move |ctx: CancellationToken, _o: TaskOptions, _a: Args| {
        let started = started.clone();
        let cancelled = cancelled.clone();
        async move {
            started.fetch_add(1, Ordering::SeqCst);
            ctx.cancelled().await;
            cancelled.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(TaskError::Canceled)
        }
    })
}

fn failing(after: Duration) -> TaskRef {
    TaskFn::arc(move |_ctx: CancellationToken, _o: TaskOptions, _a: Args| async move {
        tokio::time::sleep(after).await;
        Err::<(), _>(TaskError::fail("boom"))
    })
}

#[tokio::test]
async fn test_one_worker_per_declaration_and_exit_after_all_done() {
    let (sup, recorder) = supervisor(Duration::from_secs(2));
    let started = Arc::new(AtomicUsize::new(0));
    let cancelled = Arc::new(AtomicUsize::new(0));

    let mut decls: Vec<TaskDecl> = (0..4)
        .map(|i| TaskDecl::new(waiter(started.clone(), cancelled.clone())).with_name(format!("w{i}")))
        .collect();
    decls.push(TaskDecl::new(failing(Duration::from_millis(50))).with_name("trigger"));

    let running = sup.launch(CancellationToken::new(), decls).await.unwrap();
    assert_eq!(running.names().await.len(), 5);
    running.await_exit().await;

    assert_eq!(started.load(Ordering::SeqCst), 4);
    assert_eq!(cancelled.load(Ordering::SeqCst), 4);

    let kinds = recorder.kinds();
    assert_eq!(kinds.iter().filter(|k| **k == EventKind::TaskStarting).count(), 5);
    assert_eq!(kinds.last(), Some(&EventKind::AllStoppedWithin));
}

#[tokio::test]
async fn test_failure_cancels_every_sibling_and_is_reported() {
    let (sup, recorder) = supervisor(Duration::from_secs(2));
    let started = Arc::new(AtomicUsize::new(0));
    let cancelled = Arc::new(AtomicUsize::new(0));

    sup.run(
        CancellationToken::new(),
        vec![
            TaskDecl::new(waiter(started.clone(), cancelled.clone())).with_name("a"),
            TaskDecl::new(waiter(started.clone(), cancelled.clone())).with_name("b"),
            TaskDecl::new(failing(Duration::from_millis(30))).with_name("bad"),
        ],
    )
    .await
    .unwrap();

    assert_eq!(cancelled.load(Ordering::SeqCst), 2);
    let failed = recorder.find(EventKind::TaskFailed).unwrap();
    assert_eq!(failed.task.as_deref(), Some("bad"));
    assert!(failed.reason.unwrap().contains("boom"));
    assert!(recorder.find(EventKind::ShutdownRequested).is_some());
}

#[tokio::test]
async fn test_external_cancel_cascades_like_a_failure() {
    let (sup, recorder) = supervisor(Duration::from_secs(2));
    let started = Arc::new(AtomicUsize::new(0));
    let cancelled = Arc::new(AtomicUsize::new(0));
    let ctx = CancellationToken::new();

    let running = sup
        .launch(
            ctx.clone(),
            vec![
                TaskDecl::new(waiter(started.clone(), cancelled.clone())).with_name("a"),
                TaskDecl::new(waiter(started.clone(), cancelled.clone())).with_name("b"),
            ],
        )
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(30)).await;
    assert!(!running.is_shutting_down());
    ctx.cancel();
    running.await_exit().await;

    assert_eq!(cancelled.load(Ordering::SeqCst), 2);
    let kinds = recorder.kinds();
    assert!(kinds.contains(&EventKind::ExternalCancelled));
    assert!(kinds.contains(&EventKind::ShutdownRequested));
    assert_eq!(kinds.last(), Some(&EventKind::AllStoppedWithin));
}

#[tokio::test]
async fn test_duplicate_names_start_nothing() {
    let (sup, _recorder) = supervisor(Duration::from_secs(1));
    let started = Arc::new(AtomicUsize::new(0));
    let cancelled = Arc::new(AtomicUsize::new(0));

    let err = sup
        .launch(
            CancellationToken::new(),
            vec![
                TaskDecl::new(waiter(started.clone(), cancelled.clone())).with_name("same"),
                TaskDecl::new(waiter(started.clone(), cancelled.clone())).with_name("same"),
            ],
        )
        .await
        .err();

    assert_eq!(err, Some(RuntimeError::DuplicateName { name: "same".into() }));
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(started.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_empty_batch_and_missing_body_are_rejected() {
    let (sup, _recorder) = supervisor(Duration::from_secs(1));

    assert_eq!(
        sup.run(CancellationToken::new(), Vec::new()).await,
        Err(RuntimeError::NoTasks)
    );
    assert_eq!(
        sup.run(CancellationToken::new(), vec![TaskDecl::default().with_name("x")])
            .await,
        Err(RuntimeError::MissingTask { name: "x".into() })
    );
}

#[tokio::test]
async fn test_panic_is_reported_with_task_name() {
    let (sup, recorder) = supervisor(Duration::from_secs(1));
    let started = Arc::new(AtomicUsize::new(0));
    let cancelled = Arc::new(AtomicUsize::new(0));

    let explodes: TaskRef = TaskFn::arc(|_ctx: CancellationToken, _o: TaskOptions, _a: Args| async move {
        if true {
            panic!("kaboom");
        }
        Ok::<_, TaskError>(())
    });

    sup.run(
        CancellationToken::new(),
        vec![
            TaskDecl::new(explodes).with_name("explodes"),
            TaskDecl::new(waiter(started, cancelled.clone())).with_name("survivor"),
        ],
    )
    .await
    .unwrap();

    let ev = recorder.find(EventKind::TaskPanicked).unwrap();
    assert_eq!(ev.task.as_deref(), Some("explodes"));
    assert_eq!(ev.reason.as_deref(), Some("kaboom"));
    assert_eq!(cancelled.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_grace_exceeded_names_stuck_task_and_returns() {
    let (sup, recorder) = supervisor(Duration::from_millis(100));

    let stubborn: TaskRef = TaskFn::arc(|_ctx: CancellationToken, _o: TaskOptions, _a: Args| async move {
        // Ignores its token.
        std::future::pending::<()>().await;
        Ok::<_, TaskError>(())
    });

    let begun = tokio::time::Instant::now();
    sup.run(
        CancellationToken::new(),
        vec![
            TaskDecl::new(stubborn).with_name("stubborn"),
            TaskDecl::new(failing(Duration::from_millis(10))).with_name("quitter"),
        ],
    )
    .await
    .unwrap();
    assert!(begun.elapsed() < Duration::from_secs(2));

    let ev = recorder.find(EventKind::GraceExceeded).unwrap();
    assert_eq!(ev.reason.as_deref(), Some("stubborn"));
    assert_eq!(ev.timeout_ms, Some(100));
    assert_eq!(recorder.kinds().last(), Some(&EventKind::GraceExceeded));
}

#[tokio::test]
async fn test_anonymous_tasks_get_generated_names() {
    let (sup, _recorder) = supervisor(Duration::from_secs(1));
    let names = Arc::new(Mutex::new(Vec::new()));

    let recorder = {
        let names = names.clone();
        TaskFn::arc(move |_ctx: CancellationToken, opts: TaskOptions, _a: Args| {
            names.lock().unwrap().push(opts.name().to_string());
            async move { Ok::<_, TaskError>(()) }
        })
    };

    sup.run(
        CancellationToken::new(),
        vec![TaskDecl::new(recorder.clone()), TaskDecl::new(recorder)],
    )
    .await
    .unwrap();

    let names = names.lock().unwrap();
    assert_eq!(names.len(), 2);
    assert_ne!(names[0], names[1]);
    assert!(names.iter().all(|n| n.len() == 32));
}

#[tokio::test]
async fn test_args_reach_task_body() {
    let (sup, _recorder) = supervisor(Duration::from_secs(1));
    let seen = Arc::new(Mutex::new(None));

    let body = {
        let seen = seen.clone();
        TaskFn::arc(move |_ctx: CancellationToken, _o: TaskOptions, args: Args| {
            let sum: u32 = args.iter().filter_map(|a| a.downcast_ref::<u32>()).sum();
            *seen.lock().unwrap() = Some(sum);
            async move { Ok::<_, TaskError>(()) }
        })
    };

    sup.run(
        CancellationToken::new(),
        vec![TaskDecl::new(body).with_args([cohort::Payload::new(2u32), cohort::Payload::new(40u32)])],
    )
    .await
    .unwrap();

    assert_eq!(*seen.lock().unwrap(), Some(42));
}

#[tokio::test]
async fn test_registration_without_discovery_is_a_task_failure() {
    let recorder = Arc::new(Recorder::default());
    let cfg = Config::builder().discovery(false).build().unwrap();
    let sup = Supervisor::builder(cfg).with_subscriber(recorder.clone()).build();

    let noop: TaskRef = TaskFn::arc(|_ctx: CancellationToken, _o: TaskOptions, _a: Args| async move {
        Ok::<_, TaskError>(())
    });

    let running = sup
        .launch(
            CancellationToken::new(),
            vec![TaskDecl::new(noop).with_name("lonely").with_registration()],
        )
        .await
        .unwrap();
    assert!(running.discovery().is_none());
    running.await_exit().await;

    let ev = recorder.find(EventKind::TaskFailed).unwrap();
    assert_eq!(ev.task.as_deref(), Some("lonely"));
    assert!(recorder.find(EventKind::TaskStarting).is_none());
}

struct Sluggish;

#[async_trait]
impl Subscribe for Sluggish {
    async fn on_event(&self, _ev: &Event) {
        tokio::time::sleep(Duration::from_millis(300)).await;
    }

    fn name(&self) -> &'static str {
        "sluggish"
    }
}

#[tokio::test]
async fn test_slow_subscriber_does_not_stretch_grace() {
    let cfg = Config::builder()
        .grace(Duration::from_millis(200))
        .build()
        .unwrap();
    let sup = Supervisor::builder(cfg)
        .with_subscriber(Arc::new(Sluggish))
        .build();

    let stubborn: TaskRef = TaskFn::arc(|_ctx: CancellationToken, _o: TaskOptions, _a: Args| async move {
        std::future::pending::<()>().await;
        Ok::<_, TaskError>(())
    });

    let running = sup
        .launch(
            CancellationToken::new(),
            vec![
                TaskDecl::new(stubborn).with_name("stubborn"),
                TaskDecl::new(failing(Duration::from_millis(10))).with_name("quitter"),
            ],
        )
        .await
        .unwrap();

    let begun = tokio::time::Instant::now();
    running.await_exit().await;
    assert!(begun.elapsed() < Duration::from_millis(350));
}
