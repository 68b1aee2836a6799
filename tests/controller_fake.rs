// tests/controller_fake.rs

//! Controller loop with an in-memory filesystem, fake watchers and a fake
//! backend.

mod common;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use compose_watcher::compose::ComposeReader;
use compose_watcher::engine::ComposeController;
use compose_watcher::errors::Result;
use compose_watcher::fs::mock::MockFileSystem;
use compose_watcher::types::{ChangeEvent, Operation};
use compose_watcher_test_utils::{ComposeFileBuilder, FakeBackend, WatchLog, fake_factory};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use common::{init_tracing, wait_until, with_timeout};

const COMPOSE: &str = "/srv/docker-compose.yml";
const WINDOW: Duration = Duration::from_millis(20);

// Watcher numbering follows creation order: the provider's watcher is
// always 0, every listener gets the next one.
const PROVIDER: usize = 0;

struct Harness {
    fs: MockFileSystem,
    log: Arc<WatchLog>,
    backend: FakeBackend,
    stop: oneshot::Sender<()>,
    handle: JoinHandle<Result<()>>,
}

fn start(fs: MockFileSystem) -> Harness {
    let log = WatchLog::new();
    let backend = FakeBackend::new();
    let controller = ComposeController::new(
        ComposeReader::new(Arc::new(fs.clone())),
        &[PathBuf::from(COMPOSE)],
        fake_factory(&log),
        Arc::new(fs.clone()),
        backend.clone(),
        WINDOW,
    )
    .unwrap();

    let (stop, stop_rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(controller.run(async {
        let _ = stop_rx.await;
    }));

    Harness {
        fs,
        log,
        backend,
        stop,
        handle,
    }
}

fn project() -> MockFileSystem {
    let fs = MockFileSystem::new();
    fs.add_file(
        COMPOSE,
        ComposeFileBuilder::new()
            .build_service("app", "./app")
            .image_service("db", "postgres")
            .build(),
    );
    fs.add_dir("/srv/app/src");
    fs
}

fn write(path: &str) -> ChangeEvent {
    ChangeEvent::new(path, Operation::Write)
}

#[tokio::test]
async fn initial_read_watches_build_dirs_and_rebuilds() {
    init_tracing();
    let h = start(project());

    wait_until(|| h.backend.rebuilds() == 1).await;
    assert_eq!(h.log.created(), 2);
    assert_eq!(
        h.log.watched(1),
        vec![PathBuf::from("/srv/app"), PathBuf::from("/srv/app/src")]
    );

    h.stop.send(()).unwrap();
    with_timeout(h.handle).await.unwrap().unwrap();
    assert_eq!(h.backend.shutdowns(), 1);
    assert!(h.log.is_closed(PROVIDER));
    assert!(h.log.is_closed(1));
}

#[tokio::test]
async fn burst_of_source_changes_rebuilds_once() {
    init_tracing();
    let h = start(project());
    wait_until(|| h.backend.rebuilds() == 1).await;

    for _ in 0..3 {
        assert!(h.log.emit(1, write("/srv/app/src/main.rs")));
    }
    wait_until(|| h.backend.rebuilds() == 2).await;

    tokio::time::sleep(WINDOW * 5).await;
    assert_eq!(h.backend.rebuilds(), 2);

    h.stop.send(()).unwrap();
    with_timeout(h.handle).await.unwrap().unwrap();
}

#[tokio::test]
async fn compose_change_replaces_the_listener() {
    init_tracing();
    let h = start(project());
    wait_until(|| h.backend.rebuilds() == 1).await;

    h.fs.add_dir("/srv/worker");
    h.fs.add_file(
        COMPOSE,
        ComposeFileBuilder::new()
            .build_service("app", "./app")
            .labeled_service("worker", "./worker")
            .build(),
    );
    assert!(h.log.emit(PROVIDER, write(COMPOSE)));

    wait_until(|| h.backend.rebuilds() == 2).await;
    assert!(h.log.is_closed(1));
    assert_eq!(h.log.created(), 3);
    assert_eq!(
        h.log.watched(2),
        vec![
            PathBuf::from("/srv/app"),
            PathBuf::from("/srv/app/src"),
            PathBuf::from("/srv/worker"),
        ]
    );

    // The old listener is gone; only the new one drives rebuilds.
    assert!(!h.log.emit(1, write("/srv/app/src/main.rs")));
    assert!(h.log.emit(2, write("/srv/worker/job.py")));
    wait_until(|| h.backend.rebuilds() == 3).await;

    h.stop.send(()).unwrap();
    with_timeout(h.handle).await.unwrap().unwrap();
}

#[tokio::test]
async fn failures_are_logged_and_the_loop_continues() {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_dir("/srv/app");
    let h = start(fs);

    // No compose file yet: the read fails, nothing is built or watched.
    tokio::time::sleep(WINDOW * 5).await;
    assert_eq!(h.backend.rebuilds(), 0);
    assert_eq!(h.log.created(), 1);

    h.fs.add_file(COMPOSE, ComposeFileBuilder::new().build_service("app", "./app").build());
    h.log.emit(PROVIDER, ChangeEvent::new(COMPOSE, Operation::Create));
    wait_until(|| h.backend.rebuilds() == 1).await;

    h.backend.set_failing(true);
    h.log.emit(1, write("/srv/app/x"));
    wait_until(|| h.backend.rebuilds() == 2).await;
    h.log.emit(1, write("/srv/app/y"));
    wait_until(|| h.backend.rebuilds() == 3).await;

    h.stop.send(()).unwrap();
    with_timeout(h.handle).await.unwrap().unwrap();
}

#[tokio::test]
async fn missing_watch_root_is_skipped() {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file(
        COMPOSE,
        ComposeFileBuilder::new()
            .build_service("app", "./app")
            .build_service("ghost", "./ghost")
            .build(),
    );
    fs.add_dir("/srv/app");
    let h = start(fs);

    wait_until(|| h.backend.rebuilds() == 1).await;
    assert_eq!(h.log.watched(1), vec![PathBuf::from("/srv/app")]);

    h.stop.send(()).unwrap();
    with_timeout(h.handle).await.unwrap().unwrap();
}

#[tokio::test]
async fn provider_closure_ends_the_loop() {
    init_tracing();
    let h = start(project());
    wait_until(|| h.backend.rebuilds() == 1).await;

    h.log.hang_up(PROVIDER);
    with_timeout(h.handle).await.unwrap().unwrap();
    assert_eq!(h.backend.shutdowns(), 1);
}

#[tokio::test]
async fn listener_closure_is_tolerated() {
    init_tracing();
    let h = start(project());
    wait_until(|| h.backend.rebuilds() == 1).await;

    h.log.hang_up(1);
    wait_until(|| h.log.is_closed(1)).await;

    // Compose changes still re-target a fresh listener.
    h.log.emit(PROVIDER, write(COMPOSE));
    wait_until(|| h.backend.rebuilds() == 2).await;
    assert_eq!(h.log.created(), 3);

    h.stop.send(()).unwrap();
    with_timeout(h.handle).await.unwrap().unwrap();
}
