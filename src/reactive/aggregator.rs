//! Change aggregation: turn a resource's notification stream into render calls.
//!
//! [`attach`] spawns one task per resource. The task is the only consumer of
//! that resource's events, so batch accumulation, snapshot recomputation and
//! the render callback never overlap for the same resource.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use futures::stream::BoxStream;
use futures::StreamExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::Instrument;

use super::batch::ChangeBatch;
use super::resource::{Resource, ResourceEvent, ResourceKind, SafeSnapshot};

/// What the render callback receives.
///
/// The sanitized value is not included: read it from the snapshot receiver
/// handed to an [`attach_with`] callback, or from [`Reactive::safe_value`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderUpdate {
    pub changes: ChangeBatch,
}

/// Receiver for the published sanitized snapshot.
pub type SnapshotReceiver = watch::Receiver<Arc<SafeSnapshot>>;

type RenderFn = Box<dyn FnMut(RenderUpdate, &SnapshotReceiver) + Send>;

/// Shared between the wrapper and its task. Holding the lock while publishing
/// and rendering is what lets [`Reactive::detach`] guarantee no late delivery.
struct Delivery {
    on_render: Option<RenderFn>,
    snapshot: SnapshotReceiver,
    detached: bool,
}

/// A resource bound to the aggregator.
///
/// Dropping the wrapper detaches it.
pub struct Reactive<R: Resource> {
    resource: Arc<R>,
    snapshot: SnapshotReceiver,
    delivery: Arc<Mutex<Delivery>>,
    task: JoinHandle<()>,
}

impl<R: Resource> fmt::Debug for Reactive<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reactive")
            .field("kind", &self.resource.kind())
            .field("detached", &self.is_detached())
            .finish()
    }
}

/// Bind `resource` so that every flushed batch reaches `on_render`.
///
/// Collections stay silent until loaded, except that a collection loading
/// with zero records renders once with an empty batch. A collection ignores
/// its own (local) writes. Models render on every change.
///
/// Must be called within a tokio runtime. `on_render` must not call
/// [`Reactive::detach`] on the wrapper that drives it.
pub fn attach<R, F>(resource: Arc<R>, mut on_render: F) -> Reactive<R>
where
    R: Resource,
    F: FnMut(RenderUpdate) + Send + 'static,
{
    attach_with(resource, move |update, _: &SnapshotReceiver| on_render(update))
}

/// Like [`attach`], but the callback also receives the snapshot receiver,
/// already holding the snapshot published for this flush.
pub fn attach_with<R, F>(resource: Arc<R>, on_render: F) -> Reactive<R>
where
    R: Resource,
    F: FnMut(RenderUpdate, &SnapshotReceiver) + Send + 'static,
{
    spawn(resource, Some(Box::new(on_render)))
}

/// Bind `resource` without a render callback: the sanitized snapshot is kept
/// current (collections only once loaded, local writes included) and errors
/// are logged.
pub fn track<R: Resource>(resource: Arc<R>) -> Reactive<R> {
    spawn(resource, None)
}

fn spawn<R: Resource>(resource: Arc<R>, on_render: Option<RenderFn>) -> Reactive<R> {
    let kind = resource.kind();
    let (publisher, snapshot) = watch::channel(Arc::new(SafeSnapshot::empty(kind)));
    let ignore_local = kind == ResourceKind::Collection && on_render.is_some();
    let delivery = Arc::new(Mutex::new(Delivery {
        on_render,
        snapshot: snapshot.clone(),
        detached: false,
    }));
    // Subscribe before spawning so nothing emitted after `attach` returns is missed.
    let events = resource.listen();
    let task = tokio::spawn(
        run(
            Arc::clone(&resource),
            events,
            publisher,
            Arc::clone(&delivery),
            ignore_local,
        )
        .in_current_span(),
    );

    Reactive {
        resource,
        snapshot,
        delivery,
        task,
    }
}

impl<R: Resource> Reactive<R> {
    /// The wrapped resource.
    pub fn resource(&self) -> &Arc<R> {
        &self.resource
    }

    /// The most recently published sanitized snapshot.
    pub fn safe_value(&self) -> Arc<SafeSnapshot> {
        Arc::clone(&self.snapshot.borrow())
    }

    /// A receiver that observes each newly published snapshot.
    pub fn subscribe(&self) -> SnapshotReceiver {
        self.snapshot.clone()
    }

    pub fn is_detached(&self) -> bool {
        lock(&self.delivery).detached
    }

    /// Stop processing. Once this returns the render callback will not be
    /// invoked again and the snapshot stays frozen.
    pub fn detach(&self) {
        let mut delivery = lock(&self.delivery);
        if !delivery.detached {
            delivery.detached = true;
            delivery.on_render = None;
            self.task.abort();
            tracing::trace!(kind = ?self.resource.kind(), "resource detached");
        }
    }
}

impl<R: Resource> Drop for Reactive<R> {
    fn drop(&mut self) {
        self.detach();
    }
}

/// A panicking render callback poisons the lock; the state itself stays valid.
fn lock(delivery: &Mutex<Delivery>) -> MutexGuard<'_, Delivery> {
    delivery.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

async fn run<R: Resource>(
    resource: Arc<R>,
    mut events: BoxStream<'static, ResourceEvent>,
    publisher: watch::Sender<Arc<SafeSnapshot>>,
    delivery: Arc<Mutex<Delivery>>,
    ignore_local: bool,
) {
    let kind = resource.kind();
    let mut batch = ChangeBatch::new();

    while let Some(event) = events.next().await {
        let flushed = match event {
            ResourceEvent::Error(error) => {
                tracing::error!(%error, ?kind, "resource error");
                true
            }
            ResourceEvent::Change(change) if ignore_local && !change.is_remote => true,
            ResourceEvent::Change(change) => {
                if let Some(key) = change.key(kind) {
                    batch.record(key, change.is_remote);
                }
                if kind == ResourceKind::Collection && !resource.is_loaded() {
                    continue;
                }
                flush(resource.as_ref(), &publisher, &delivery, batch.take())
            }
            ResourceEvent::Load => {
                if kind == ResourceKind::Collection
                    && resource.is_loaded()
                    && resource.value().is_empty()
                {
                    // Pending pre-load keys stay queued for the next change.
                    flush(resource.as_ref(), &publisher, &delivery, ChangeBatch::new())
                } else {
                    true
                }
            }
        };
        if !flushed {
            break;
        }
    }
}

/// Publish a fresh snapshot and hand `changes` to the callback. Returns
/// `false` once the wrapper has been detached.
fn flush<R: Resource>(
    resource: &R,
    publisher: &watch::Sender<Arc<SafeSnapshot>>,
    delivery: &Mutex<Delivery>,
    changes: ChangeBatch,
) -> bool {
    let mut delivery = lock(delivery);
    if delivery.detached {
        return false;
    }
    publisher.send_replace(Arc::new(SafeSnapshot::of(&resource.value())));
    let Delivery {
        on_render,
        snapshot,
        ..
    } = &mut *delivery;
    if let Some(on_render) = on_render.as_mut() {
        tracing::trace!(changes = changes.len(), "flushing change batch");
        on_render(RenderUpdate { changes }, &*snapshot);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::memory::{MemoryResource, Origin};
    use crate::reactive::resource::{ChangeEvent, ResourceError, ResourceValue};
    use crate::value::{record_from_json, Value};
    use futures::channel::mpsc;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::mpsc as tokio_mpsc;
    use tracing_test::traced_test;

    /// A resource whose events and load state are driven by the test.
    struct Scripted {
        kind: ResourceKind,
        loaded: AtomicBool,
        value: Mutex<ResourceValue>,
        listeners: Mutex<Vec<mpsc::UnboundedSender<ResourceEvent>>>,
    }

    impl Scripted {
        fn collection() -> Arc<Self> {
            Arc::new(Self {
                kind: ResourceKind::Collection,
                loaded: AtomicBool::new(false),
                value: Mutex::new(ResourceValue::Collection(Vec::new())),
                listeners: Mutex::new(Vec::new()),
            })
        }

        fn emit(&self, event: ResourceEvent) {
            for tx in self.listeners.lock().unwrap().iter() {
                let _ = tx.unbounded_send(event.clone());
            }
        }

        fn change(&self, id: &str, is_remote: bool) {
            self.emit(ResourceEvent::Change(ChangeEvent {
                is_remote,
                resource_id: Some(id.into()),
                resource_field: None,
            }));
        }
    }

    impl Resource for Scripted {
        fn kind(&self) -> ResourceKind {
            self.kind
        }

        fn value(&self) -> ResourceValue {
            self.value.lock().unwrap().clone()
        }

        fn is_loaded(&self) -> bool {
            self.loaded.load(Ordering::SeqCst)
        }

        fn listen(&self) -> BoxStream<'static, ResourceEvent> {
            let (tx, rx) = mpsc::unbounded();
            self.listeners.lock().unwrap().push(tx);
            rx.boxed()
        }
    }

    fn recorder() -> (
        impl FnMut(RenderUpdate) + Send + 'static,
        tokio_mpsc::UnboundedReceiver<RenderUpdate>,
    ) {
        let (tx, rx) = tokio_mpsc::unbounded_channel();
        (move |update: RenderUpdate| {
            let _ = tx.send(update);
        }, rx)
    }

    #[tokio::test]
    async fn collection_queues_remote_changes_until_loaded() {
        let resource = Scripted::collection();
        let (on_render, mut renders) = recorder();
        let _reactive = attach(Arc::clone(&resource), on_render);

        resource.change("k", false);
        resource.change("k", true);
        resource.change("m", false);
        tokio::task::yield_now().await;
        assert!(renders.try_recv().is_err(), "no render before load");

        resource.loaded.store(true, Ordering::SeqCst);
        resource.change("j", true);
        let update = renders.recv().await.unwrap();
        assert_eq!(
            update.changes,
            [("j", true), ("k", true)].into_iter().collect::<ChangeBatch>()
        );
    }

    #[tokio::test]
    async fn collection_ignores_its_own_writes() {
        let resource = MemoryResource::collection();
        let (on_render, mut renders) = recorder();
        let reactive = attach(Arc::clone(&resource), on_render);

        resource.load(vec![record_from_json(json!({"id": "k", "t": "a"}))]);
        assert_eq!(
            renders.recv().await.unwrap().changes.iter().collect::<Vec<_>>(),
            vec![("k", true)]
        );

        assert!(resource.update("k", "t", Value::from("b"), Origin::Local));
        resource.insert(record_from_json(json!({"id": "n"})), Origin::Local);
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(renders.try_recv().is_err(), "local writes must not render");
        assert_eq!(reactive.safe_value().records()[0]["t"], Value::from("a"));

        // The next remote change snapshots everything, local writes included.
        resource.update("k", "t", Value::from("c"), Origin::Remote);
        let update = renders.recv().await.unwrap();
        assert_eq!(update.changes.iter().collect::<Vec<_>>(), vec![("k", true)]);
        assert_eq!(reactive.safe_value().records().len(), 2);
        assert_eq!(reactive.safe_value().records()[0]["t"], Value::from("c"));
    }

    #[tokio::test]
    async fn collection_empty_load_renders_once() {
        let resource = MemoryResource::collection();
        let (on_render, mut renders) = recorder();
        let reactive = attach(Arc::clone(&resource), on_render);

        resource.load(Vec::new());
        let update = renders.recv().await.unwrap();
        assert!(update.changes.is_empty());
        assert_eq!(*reactive.safe_value(), SafeSnapshot::Collection(Vec::new()));

        tokio::task::yield_now().await;
        assert!(renders.try_recv().is_err());
    }

    #[tokio::test]
    async fn collection_flushes_each_change_after_load() {
        let resource = MemoryResource::collection();
        let (on_render, mut renders) = recorder();
        let reactive = attach(Arc::clone(&resource), on_render);

        resource.load(vec![record_from_json(json!({"id": "1", "title": "<b>one</b>"}))]);
        let update = renders.recv().await.unwrap();
        assert_eq!(update.changes.get("1"), Some(true));
        assert_eq!(
            reactive.safe_value().records()[0]["title"],
            Value::from("&lt;b&gt;one&lt;/b&gt;")
        );

        resource.update("1", "title", Value::from("two"), Origin::Remote);
        let update = renders.recv().await.unwrap();
        assert_eq!(update.changes.iter().collect::<Vec<_>>(), vec![("1", true)]);
        assert_eq!(reactive.safe_value().records()[0]["title"], Value::from("two"));
    }

    #[tokio::test]
    async fn model_renders_every_change() {
        let resource = MemoryResource::model(record_from_json(json!({"name": "a"})));
        let (on_render, mut renders) = recorder();
        let reactive = attach(Arc::clone(&resource), on_render);

        resource.set_field("name", Value::from("O'Neil"), Origin::Remote);
        let update = renders.recv().await.unwrap();
        assert_eq!(update.changes.iter().collect::<Vec<_>>(), vec![("name", true)]);
        assert_eq!(
            reactive.safe_value().record().unwrap()["name"],
            Value::from("O&#039;Neil")
        );

        resource.set_field("age", Value::from(3_i64), Origin::Local);
        let update = renders.recv().await.unwrap();
        assert_eq!(update.changes.iter().collect::<Vec<_>>(), vec![("age", false)]);
    }

    #[tokio::test]
    async fn callback_sees_published_snapshot() {
        let resource = MemoryResource::model(Default::default());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (done_tx, mut done_rx) = tokio_mpsc::unbounded_channel();

        let seen_c = Arc::clone(&seen);
        let _bound = attach_with(Arc::clone(&resource), move |_update, snapshot| {
            seen_c.lock().unwrap().push(snapshot.borrow().to_value());
            let _ = done_tx.send(());
        });

        resource.set_field("x", Value::from("<"), Origin::Remote);
        done_rx.recv().await.unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![Value::from(json!({"x": "&lt;"}))]);
    }

    #[tokio::test]
    #[traced_test]
    async fn errors_are_logged_and_processing_continues() {
        let resource = MemoryResource::model(Default::default());
        let (on_render, mut renders) = recorder();
        let _reactive = attach(Arc::clone(&resource), on_render);

        resource.fail(ResourceError::Transport("socket hang up".into()));
        resource.set_field("a", Value::from(1_i64), Origin::Remote);
        renders.recv().await.unwrap();
        assert!(logs_contain("resource error"));
        assert!(logs_contain("socket hang up"));
    }

    #[tokio::test]
    async fn detach_stops_delivery() {
        let resource = MemoryResource::model(Default::default());
        let (on_render, mut renders) = recorder();
        let reactive = attach(Arc::clone(&resource), on_render);

        resource.set_field("a", Value::from(1_i64), Origin::Remote);
        renders.recv().await.unwrap();

        reactive.detach();
        assert!(reactive.is_detached());
        resource.set_field("a", Value::from(2_i64), Origin::Remote);
        tokio::task::yield_now().await;
        // The callback (and its sender) were dropped on detach.
        assert!(renders.recv().await.is_none());
        assert_eq!(
            reactive.safe_value().record().unwrap()["a"],
            Value::Number(1.0)
        );
    }

    #[tokio::test]
    async fn dropping_wrapper_detaches() {
        let resource = MemoryResource::model(Default::default());
        let (on_render, mut renders) = recorder();
        drop(attach(Arc::clone(&resource), on_render));
        resource.set_field("a", Value::from(1_i64), Origin::Remote);
        assert!(renders.recv().await.is_none());
    }

    #[tokio::test]
    async fn track_keeps_snapshot_current() {
        let resource = MemoryResource::collection();
        let reactive = track(Arc::clone(&resource));
        let mut snapshots = reactive.subscribe();

        resource.load(vec![record_from_json(json!({"id": "1", "n": "&"}))]);
        snapshots.changed().await.unwrap();
        assert_eq!(snapshots.borrow().records()[0]["n"], Value::from("&amp;"));

        // Without a callback, local writes still refresh the snapshot.
        resource.update("1", "n", Value::from("<"), Origin::Local);
        snapshots.changed().await.unwrap();
        assert_eq!(snapshots.borrow().records()[0]["n"], Value::from("&lt;"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn independent_resources_do_not_interfere() {
        let first = MemoryResource::model(Default::default());
        let second = MemoryResource::model(Default::default());
        let (on_first, mut first_renders) = recorder();
        let (on_second, mut second_renders) = recorder();
        let _a = attach(Arc::clone(&first), on_first);
        let _b = attach(Arc::clone(&second), on_second);

        first.set_field("x", Value::from(1_i64), Origin::Remote);
        second.set_field("y", Value::from(2_i64), Origin::Local);

        let a = first_renders.recv().await.unwrap();
        let b = second_renders.recv().await.unwrap();
        assert_eq!(a.changes.iter().collect::<Vec<_>>(), vec![("x", true)]);
        assert_eq!(b.changes.iter().collect::<Vec<_>>(), vec![("y", false)]);
    }
}
