//! End-to-end behaviour of the sync facade against a recording remote.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tether_engine::{
    Entity, Fields, KeyConfig, LocalState, Remote, RemoteOp, Result, SyncHandle,
};

/// A remote whose listing is fixed and whose mutations echo their input.
#[derive(Default)]
struct MockRemote {
    listing: Vec<Fields>,
    supported: Option<Vec<RemoteOp>>,
    calls: Mutex<Vec<(RemoteOp, Value)>>,
}

impl MockRemote {
    fn listing(items: Value) -> Self {
        Self {
            listing: decode(items).into_iter().map(Entity::into_fields).collect(),
            ..Default::default()
        }
    }

    fn only(mut self, ops: &[RemoteOp]) -> Self {
        self.supported = Some(ops.to_vec());
        self
    }

    fn record(&self, op: RemoteOp, entity: &Fields) {
        self.calls
            .lock()
            .unwrap()
            .push((op, Value::Object(entity.clone())));
    }

    fn calls_to(&self, op: RemoteOp) -> Vec<Value> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(o, _)| *o == op)
            .map(|(_, v)| v.clone())
            .collect()
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Remote for MockRemote {
    fn supports(&self, op: RemoteOp) -> bool {
        self.supported
            .as_ref()
            .map(|ops| ops.contains(&op))
            .unwrap_or(true)
    }

    async fn list(&self) -> Result<Vec<Fields>> {
        Ok(self.listing.clone())
    }

    async fn create(&self, entity: Fields) -> Result<Fields> {
        self.record(RemoteOp::Create, &entity);
        Ok(entity)
    }

    async fn update(&self, entity: Fields) -> Result<Fields> {
        self.record(RemoteOp::Update, &entity);
        Ok(entity)
    }

    async fn destroy(&self, entity: Fields) -> Result<()> {
        self.record(RemoteOp::Destroy, &entity);
        Ok(())
    }
}

fn decode(value: Value) -> Vec<Entity> {
    Entity::decode_collection(value, "sync").unwrap()
}

/// A collection handle plus every value written to its local store.
fn handle(remote: Arc<MockRemote>, local: Value) -> (SyncHandle<Arc<MockRemote>>, Writes) {
    let writes = Writes::default();
    let sink = writes.clone();
    let state = LocalState::new(decode(local)).with_listener(move |entities: &Vec<Entity>| {
        sink.0
            .lock()
            .unwrap()
            .push(Entity::encode_collection(entities, "sync"));
        Ok(())
    });
    (
        SyncHandle::collection(remote, state, KeyConfig::default()),
        writes,
    )
}

#[derive(Clone, Default)]
struct Writes(Arc<Mutex<Vec<Value>>>);

impl Writes {
    fn all(&self) -> Vec<Value> {
        self.0.lock().unwrap().clone()
    }

    fn last(&self) -> Option<Value> {
        self.0.lock().unwrap().last().cloned()
    }
}

fn f(value: Value) -> Fields {
    tether_engine::fields(value)
}

#[tokio::test]
async fn remote_create_is_absorbed() {
    let remote = Arc::new(MockRemote::listing(json!([{"id": 1}])));
    let (mut db, writes) = handle(remote, json!([]));

    assert!(db.list().is_empty());
    db.sync().await.unwrap();
    assert_eq!(writes.all(), vec![json!([{"id": 1}])]);
}

#[tokio::test]
async fn remote_delete_is_absorbed() {
    let remote = Arc::new(MockRemote::listing(json!([])));
    let (mut db, writes) = handle(remote, json!([{"id": 1}]));

    assert_eq!(db.list().len(), 1);
    db.sync().await.unwrap();
    assert_eq!(writes.all(), vec![json!([])]);
}

#[tokio::test]
async fn local_create_is_staged_without_remote_call() {
    let remote = Arc::new(MockRemote::listing(json!([])));
    let (mut db, writes) = handle(remote.clone(), json!([]));

    let returned = db.create(f(json!({"id": 1}))).unwrap();

    assert_eq!(returned, f(json!({"id": 1})));
    assert_eq!(writes.last(), Some(json!([{"id": 1, "sync": "create"}])));
    assert_eq!(remote.call_count(), 0);
}

#[tokio::test]
async fn local_update_is_staged() {
    let remote = Arc::new(MockRemote::listing(json!([{"id": 1}])));
    let (mut db, writes) = handle(remote, json!([{"id": 1}]));

    db.update(f(json!({"id": 1, "a": 1}))).unwrap();
    assert_eq!(
        writes.last(),
        Some(json!([{"id": 1, "a": 1, "sync": "update"}]))
    );
}

#[tokio::test]
async fn local_create_flushes_to_remote() {
    let remote = Arc::new(MockRemote::listing(json!([])));
    let (mut db, writes) = handle(remote.clone(), json!([{"id": 1, "sync": "create"}]));

    db.sync().await.unwrap();

    assert_eq!(writes.last(), Some(json!([{"id": 1}])));
    assert_eq!(remote.calls_to(RemoteOp::Create), vec![json!({"id": 1})]);
}

#[tokio::test]
async fn combined_flush() {
    let remote = Arc::new(MockRemote::listing(json!([{"id": 0}])));
    let (mut db, writes) = handle(
        remote.clone(),
        json!([
            {"id": 0},
            {"id": 1},
            {"id": 2, "sync": "destroy"},
            {"id": 3, "sync": "create"},
            {"id": 4, "sync": "update", "a": 1}
        ]),
    );

    let summary = db.sync().await.unwrap();

    assert_eq!(remote.calls_to(RemoteOp::Destroy), vec![json!({"id": 2})]);
    assert_eq!(remote.calls_to(RemoteOp::Create), vec![json!({"id": 3})]);
    assert_eq!(remote.calls_to(RemoteOp::Update), vec![json!({"id": 4, "a": 1})]);
    assert_eq!(
        writes.all(),
        vec![json!([{"id": 0}, {"id": 3}, {"id": 4, "a": 1}])]
    );
    assert_eq!(summary.flushed(), 3);
    assert_eq!(summary.total, 3);
}

#[tokio::test]
async fn create_then_update_stays_create() {
    let remote = Arc::new(MockRemote::default());
    let (mut db, writes) = handle(remote, json!([{"id": 1, "sync": "create"}]));

    db.update(f(json!({"id": 1, "a": 1}))).unwrap();
    assert_eq!(
        writes.last(),
        Some(json!([{"id": 1, "a": 1, "sync": "create"}]))
    );
}

#[tokio::test]
async fn create_then_destroy_removes() {
    let remote = Arc::new(MockRemote::default());
    let (mut db, writes) = handle(remote.clone(), json!([{"id": 1, "sync": "create"}]));

    db.destroy(Some(&f(json!({"id": 1})))).unwrap();

    assert_eq!(writes.last(), Some(json!([])));
    assert_eq!(remote.call_count(), 0);
}

#[tokio::test]
async fn update_then_destroy_defers() {
    let remote = Arc::new(MockRemote::default());
    let (mut db, writes) = handle(remote, json!([{"id": 1, "sync": "update"}]));

    db.destroy(Some(&f(json!({"id": 1})))).unwrap();

    assert_eq!(writes.last(), Some(json!([{"id": 1, "sync": "destroy"}])));
    assert!(db.list().is_empty());
}

#[tokio::test]
async fn destroyed_entity_flushes_on_next_sync() {
    let remote = Arc::new(MockRemote::listing(json!([{"id": 1}])));
    let (mut db, writes) = handle(remote.clone(), json!([{"id": 1}]));

    db.destroy(Some(&f(json!({"id": 1})))).unwrap();
    db.sync().await.unwrap();

    assert_eq!(remote.calls_to(RemoteOp::Destroy), vec![json!({"id": 1})]);
    assert_eq!(writes.last(), Some(json!([])));
}

#[tokio::test]
async fn sync_writes_exactly_once() {
    let remote = Arc::new(MockRemote::listing(json!([{"id": 0}, {"id": 1}])));
    let (mut db, writes) = handle(
        remote,
        json!([{"id": 2, "sync": "create"}, {"id": 3, "sync": "create"}]),
    );

    db.sync().await.unwrap();
    assert_eq!(writes.all().len(), 1);
}

#[tokio::test]
async fn missing_remote_operation_passes_through() {
    let remote = Arc::new(MockRemote::listing(json!([{"id": 1}])).only(&[RemoteOp::List]));
    let (mut db, writes) = handle(
        remote.clone(),
        json!([
            {"id": 1, "sync": "destroy"},
            {"id": 2, "a": 1, "sync": "create"}
        ]),
    );

    let summary = db.sync().await.unwrap();

    assert_eq!(remote.call_count(), 0);
    assert_eq!(summary.skipped, 2);
    assert_eq!(writes.last(), Some(json!([{"id": 1}, {"id": 2, "a": 1}])));
}

#[tokio::test]
async fn sync_twice_is_idempotent_without_pending() {
    let remote = Arc::new(MockRemote::listing(json!([{"id": 0, "a": 1}, {"id": 1}])));
    let (mut db, writes) = handle(remote.clone(), json!([{"id": 0, "a": 1}, {"id": 1}]));

    db.sync().await.unwrap();
    let first = db.to_value();
    db.sync().await.unwrap();

    assert_eq!(db.to_value(), first);
    assert_eq!(first, json!([{"id": 0, "a": 1}, {"id": 1}]));
    assert_eq!(writes.all().len(), 2);
    assert_eq!(remote.call_count(), 0);
}

#[tokio::test]
async fn status_field_in_input_is_never_sent() {
    let remote = Arc::new(MockRemote::listing(json!([{"id": 1}])));
    let (mut db, writes) = handle(remote.clone(), json!([{"id": 1}]));

    db.update(f(json!({"id": 1, "a": 1, "sync": "create"}))).unwrap();
    assert_eq!(
        writes.last(),
        Some(json!([{"id": 1, "a": 1, "sync": "update"}]))
    );

    db.sync().await.unwrap();
    assert_eq!(remote.calls_to(RemoteOp::Update), vec![json!({"id": 1, "a": 1})]);
    assert_eq!(writes.last(), Some(json!([{"id": 1, "a": 1}])));
}

#[tokio::test]
async fn omitted_remote_methods_pass_through() {
    struct ListOnly;

    #[async_trait]
    impl Remote for ListOnly {
        async fn list(&self) -> Result<Vec<Fields>> {
            Ok(Vec::new())
        }
    }

    let state = LocalState::new(decode(json!([{"id": 1, "sync": "create"}])));
    let mut db = SyncHandle::collection(ListOnly, state, KeyConfig::default());

    let summary = db.sync().await.unwrap();

    assert_eq!(summary.skipped, 1);
    assert_eq!(db.to_value(), json!([{"id": 1}]));
}
