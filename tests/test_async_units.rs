use behavior_host::prelude::*;
use futures::channel::{mpsc, oneshot};
use futures::executor::LocalPool;
use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;
use tokio::task::LocalSet;

#[derive(Default)]
struct Loader {
    renders: Cell<u32>,
}

impl Owner for Loader {
    fn mark_needs_render(&self) {
        self.renders.set(self.renders.get() + 1);
    }

    fn configuration(&self) {}
}

fn fetch(rx: oneshot::Receiver<Result<String, String>>) -> UnitFuture<String, String> {
    unit_future(async move { rx.await.unwrap_or_else(|_| Err("cancelled".to_string())) })
}

// ------------------------------------
// tokio LocalSet
// ------------------------------------

#[tokio::test]
async fn test_future_unit_on_tokio_local_set() {
    let local = Rc::new(LocalSet::new());
    let spawner = TokioLocalSpawner::new(Rc::clone(&local));
    local
        .run_until(async {
            let loader = Rc::new(Loader::default());
            let mut host: UnitHost = UnitHost::builder()
                .label("loader")
                .spawner(spawner)
                .build(&loader);
            let (tx, rx) = oneshot::channel();

            let unit = host.install(FutureUnit::new(fetch(rx)));
            assert_eq!(unit.borrow().snapshot(), AsyncSnapshot::waiting());

            tx.send(Ok("profile".to_string())).unwrap();
            for _ in 0..4 {
                tokio::task::yield_now().await;
            }

            assert_eq!(
                unit.borrow().snapshot(),
                AsyncSnapshot::with_data(ConnectionState::Done, "profile".to_string())
            );
            assert_eq!(loader.renders.get(), 1);
            host.forward_dispose();
        })
        .await;
}

#[tokio::test]
async fn test_stream_unit_on_tokio_local_set() {
    let local = Rc::new(LocalSet::new());
    let spawner = TokioLocalSpawner::new(Rc::clone(&local));
    local
        .run_until(async {
            let loader = Rc::new(Loader::default());
            let mut host: UnitHost = UnitHost::builder().spawner(spawner).build(&loader);
            let (tx, rx) = mpsc::unbounded::<Result<u32, String>>();

            let unit = host.install(StreamUnit::new(rx));
            for progress in [10, 50, 100] {
                tx.unbounded_send(Ok(progress)).unwrap();
            }
            drop(tx);
            for _ in 0..4 {
                tokio::task::yield_now().await;
            }

            assert_eq!(
                unit.borrow().snapshot(),
                AsyncSnapshot::with_data(ConnectionState::Done, 100)
            );
            assert_eq!(loader.renders.get(), 4);
        })
        .await;
}

#[tokio::test]
async fn test_install_outside_local_set_runs_once_driven() {
    let local = Rc::new(LocalSet::new());
    let loader = Rc::new(Loader::default());
    let sink = Arc::new(MemorySink::new());
    let mut host: UnitHost = UnitHost::builder()
        .spawner(TokioLocalSpawner::new(Rc::clone(&local)))
        .sink(sink.clone())
        .build(&loader);

    let unit = host.install(FutureUnit::new(unit_future(async { Ok::<u32, String>(1) })));
    assert!(sink.is_empty());
    assert_eq!(unit.borrow().snapshot(), AsyncSnapshot::waiting());

    local
        .run_until(async {
            for _ in 0..4 {
                tokio::task::yield_now().await;
            }
        })
        .await;

    assert_eq!(
        unit.borrow().snapshot(),
        AsyncSnapshot::with_data(ConnectionState::Done, 1)
    );
    assert_eq!(loader.renders.get(), 1);
}

// ------------------------------------
// futures LocalPool
// ------------------------------------

#[test]
fn test_switching_futures_only_latest_lands() {
    let mut pool = LocalPool::new();
    let loader = Rc::new(Loader::default());
    let sink = Arc::new(MemorySink::new());
    let mut host: UnitHost = UnitHost::builder()
        .spawner(pool.spawner())
        .sink(sink.clone())
        .build(&loader);

    let (first_tx, first_rx) = oneshot::channel();
    let (second_tx, second_rx) = oneshot::channel();
    let unit = host.install(FutureUnit::new(fetch(first_rx)));
    unit.borrow_mut().update(Some(fetch(second_rx))).unwrap();

    second_tx.send(Ok("second".to_string())).unwrap();
    pool.run_until_stalled();
    first_tx.send(Ok("first".to_string())).unwrap();
    pool.run_until_stalled();

    assert_eq!(unit.borrow().snapshot().data().map(String::as_str), Some("second"));
    assert_eq!(loader.renders.get(), 1);
    assert!(sink.is_empty());
}

#[test]
fn test_clearing_future_moves_to_none() {
    let mut pool = LocalPool::new();
    let loader = Rc::new(Loader::default());
    let mut host: UnitHost = UnitHost::builder().spawner(pool.spawner()).build(&loader);
    let (tx, rx) = oneshot::channel();

    let unit = host.install(FutureUnit::new(fetch(rx)));
    unit.borrow_mut().update(None).unwrap();
    tx.send(Err("offline".to_string())).unwrap();
    pool.run_until_stalled();

    assert_eq!(unit.borrow().snapshot(), AsyncSnapshot::nothing());
    assert!(unit.borrow().future().is_none());
    assert_eq!(loader.renders.get(), 0);
}

#[test]
fn test_spawn_failure_is_reported_as_create_failure() {
    let pool = LocalPool::new();
    let spawner = pool.spawner();
    drop(pool);
    let loader = Rc::new(Loader::default());
    let sink = Arc::new(MemorySink::new());
    let mut host: UnitHost = UnitHost::builder()
        .spawner(spawner)
        .sink(sink.clone())
        .build(&loader);
    let (_tx, rx) = oneshot::channel();

    let unit = host.install(FutureUnit::new(fetch(rx)));

    assert_eq!(host.len(), 1);
    assert_eq!(unit.borrow().snapshot(), AsyncSnapshot::nothing());
    assert_eq!(
        sink.summary(),
        vec![(UnitKind::FUTURE, LifecycleEvent::Create)]
    );
}

#[test]
fn test_dropped_host_drops_pending_resolution() {
    let mut pool = LocalPool::new();
    let loader = Rc::new(Loader::default());
    let (tx, rx) = oneshot::channel();
    {
        let mut host: UnitHost = UnitHost::builder().spawner(pool.spawner()).build(&loader);
        host.install(FutureUnit::new(fetch(rx)));
        host.forward_dispose();
    }

    tx.send(Ok("late".to_string())).unwrap();
    pool.run_until_stalled();

    assert_eq!(loader.renders.get(), 0);
}
