//! Sync facade - one handle over either reconciler, bound to a remote.
//!
//! The caller states the resource shape up front; the facade never guesses it
//! from the local value. [`StoredSync`] additionally seeds the local value
//! from a [`Storage`] and writes every replacement back to it.

use crate::{
    error::Result, CollectionReconciler, Entity, Error, Fields, KeyConfig, LocalState, Remote,
    SingletonReconciler, Storage, SyncSummary,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

/// Whether a resource is a keyed collection or a single entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceShape {
    #[default]
    Collection,
    Singleton,
}

impl ResourceShape {
    /// Local value used when nothing has been stored yet.
    pub fn empty_value(&self) -> Value {
        match self {
            ResourceShape::Collection => Value::Array(Vec::new()),
            ResourceShape::Singleton => Value::Object(Fields::new()),
        }
    }
}

impl fmt::Display for ResourceShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceShape::Collection => f.write_str("collection"),
            ResourceShape::Singleton => f.write_str("singleton"),
        }
    }
}

impl FromStr for ResourceShape {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "collection" => Ok(ResourceShape::Collection),
            "singleton" => Ok(ResourceShape::Singleton),
            other => Err(Error::InvalidShape(other.to_string())),
        }
    }
}

/// The reconciler behind a [`SyncHandle`].
#[derive(Debug)]
pub enum Reconciler {
    Collection(CollectionReconciler),
    Singleton(SingletonReconciler),
}

impl Reconciler {
    /// Decode an annotated local value for `shape`.
    pub fn from_value(value: Value, shape: ResourceShape, keys: KeyConfig) -> Result<Self> {
        match shape {
            ResourceShape::Collection => {
                let entities = Entity::decode_collection(value, &keys.status)?;
                Ok(Reconciler::Collection(CollectionReconciler::new(
                    LocalState::new(entities),
                    keys,
                )))
            }
            ResourceShape::Singleton => {
                let entity = Entity::from_value(value, &keys.status)?;
                Ok(Reconciler::Singleton(SingletonReconciler::new(
                    LocalState::new(entity),
                    keys,
                )))
            }
        }
    }

    pub fn shape(&self) -> ResourceShape {
        match self {
            Reconciler::Collection(_) => ResourceShape::Collection,
            Reconciler::Singleton(_) => ResourceShape::Singleton,
        }
    }

    /// Observe every replacement in annotated JSON form.
    pub fn subscribe_value<F>(&mut self, mut listener: F)
    where
        F: FnMut(&Value) -> Result<()> + Send + 'static,
    {
        match self {
            Reconciler::Collection(c) => {
                let status_key = c.keys().status.clone();
                c.state_mut().subscribe(move |entities: &Vec<Entity>| {
                    listener(&Entity::encode_collection(entities, &status_key))
                });
            }
            Reconciler::Singleton(s) => {
                let status_key = s.keys().status.clone();
                s.state_mut()
                    .subscribe(move |entity: &Entity| listener(&entity.to_value(&status_key)));
            }
        }
    }

    /// Reset to the empty value without notifying listeners.
    fn restore_empty(&mut self) {
        match self {
            Reconciler::Collection(c) => c.state_mut().restore(Vec::new()),
            Reconciler::Singleton(s) => s.state_mut().restore(Entity::default()),
        }
    }
}

fn not_on_singleton(op: &'static str) -> Error {
    Error::NotApplicable {
        op,
        shape: ResourceShape::Singleton,
    }
}

/// A local resource bound to its remote.
pub struct SyncHandle<R> {
    remote: R,
    local: Reconciler,
}

impl<R: Remote> SyncHandle<R> {
    pub fn new(remote: R, local: Reconciler) -> Self {
        Self { remote, local }
    }

    /// Bind a collection to `remote`.
    pub fn collection(remote: R, state: LocalState<Vec<Entity>>, keys: KeyConfig) -> Self {
        Self::new(
            remote,
            Reconciler::Collection(CollectionReconciler::new(state, keys)),
        )
    }

    /// Bind a singleton to `remote`.
    pub fn singleton(remote: R, state: LocalState<Entity>, keys: KeyConfig) -> Self {
        Self::new(
            remote,
            Reconciler::Singleton(SingletonReconciler::new(state, keys)),
        )
    }

    /// Decode an annotated local value and bind it to `remote`.
    pub fn from_value(
        remote: R,
        value: Value,
        shape: ResourceShape,
        keys: KeyConfig,
    ) -> Result<Self> {
        Ok(Self::new(remote, Reconciler::from_value(value, shape, keys)?))
    }

    pub fn shape(&self) -> ResourceShape {
        self.local.shape()
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.local
    }

    pub fn reconciler_mut(&mut self) -> &mut Reconciler {
        &mut self.local
    }

    /// Visible entities. A singleton lists its one value.
    pub fn list(&self) -> Vec<&Entity> {
        match &self.local {
            Reconciler::Collection(c) => c.list(),
            Reconciler::Singleton(s) => vec![s.list()],
        }
    }

    pub fn get(&self, entity: &Fields) -> Result<Option<&Entity>> {
        match &self.local {
            Reconciler::Collection(c) => Ok(c.get(entity)),
            Reconciler::Singleton(_) => Err(not_on_singleton("get")),
        }
    }

    pub fn create(&mut self, entity: Fields) -> Result<Fields> {
        match &mut self.local {
            Reconciler::Collection(c) => c.create(entity),
            Reconciler::Singleton(_) => Err(not_on_singleton("create")),
        }
    }

    /// Stage an update. A singleton returns its merged fields.
    pub fn update(&mut self, entity: Fields) -> Result<Fields> {
        match &mut self.local {
            Reconciler::Collection(c) => c.update(entity),
            Reconciler::Singleton(s) => s.update(entity).map(Entity::into_fields),
        }
    }

    pub fn destroy(&mut self, entity: Option<&Fields>) -> Result<()> {
        match &mut self.local {
            Reconciler::Collection(c) => c.destroy(entity),
            Reconciler::Singleton(_) => Err(not_on_singleton("destroy")),
        }
    }

    /// Reconcile with the bound remote.
    ///
    /// Taking `&mut self` keeps at most one sync in flight per handle.
    pub async fn sync(&mut self) -> Result<SyncSummary> {
        match &mut self.local {
            Reconciler::Collection(c) => c.sync(&self.remote).await,
            Reconciler::Singleton(s) => s.sync(&self.remote).await,
        }
    }

    /// The local value in annotated JSON form.
    pub fn to_value(&self) -> Value {
        match &self.local {
            Reconciler::Collection(c) => {
                Entity::encode_collection(c.entities(), &c.keys().status)
            }
            Reconciler::Singleton(s) => s.list().to_value(&s.keys().status),
        }
    }
}

impl<R> fmt::Debug for SyncHandle<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncHandle")
            .field("local", &self.local)
            .finish_non_exhaustive()
    }
}

/// A [`SyncHandle`] whose local value lives in a [`Storage`] key.
pub struct StoredSync<R> {
    handle: SyncHandle<R>,
    storage: Arc<dyn Storage>,
    key: String,
}

impl<R: Remote> StoredSync<R> {
    /// Load `key` from `storage` (or start empty) and persist every change.
    pub fn open(
        remote: R,
        storage: Arc<dyn Storage>,
        key: impl Into<String>,
        shape: ResourceShape,
        keys: KeyConfig,
    ) -> Result<Self> {
        let key = key.into();
        let value = storage
            .get(&key)?
            .unwrap_or_else(|| shape.empty_value());

        let mut local = Reconciler::from_value(value, shape, keys)?;
        let sink = Arc::clone(&storage);
        let sink_key = key.clone();
        local.subscribe_value(move |value| sink.set(&sink_key, value));

        debug!(
            %key,
            %shape,
            persistent = storage.is_persistent(),
            "opened stored resource"
        );
        Ok(Self {
            handle: SyncHandle::new(remote, local),
            storage,
            key,
        })
    }

    /// Forget the stored value and return to the empty local value.
    pub fn reset(&mut self) -> Result<()> {
        self.storage.remove(&self.key)?;
        self.handle.local.restore_empty();
        Ok(())
    }

    /// Whether the backing storage survives the process.
    pub fn is_persistent(&self) -> bool {
        self.storage.is_persistent()
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl<R> Deref for StoredSync<R> {
    type Target = SyncHandle<R>;

    fn deref(&self) -> &Self::Target {
        &self.handle
    }
}

impl<R> DerefMut for StoredSync<R> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{fields, MemoryStorage};
    use async_trait::async_trait;
    use serde_json::json;

    struct Fixed(Value);

    #[async_trait]
    impl Remote for Fixed {
        async fn list(&self) -> Result<Vec<Fields>> {
            Ok(Entity::decode_collection(self.0.clone(), "sync")?
                .into_iter()
                .map(Entity::into_fields)
                .collect())
        }

        async fn load(&self) -> Result<Fields> {
            Ok(fields(self.0.clone()))
        }

        async fn create(&self, entity: Fields) -> Result<Fields> {
            Ok(entity)
        }
    }

    #[test]
    fn shape_parsing() {
        assert_eq!("singleton".parse::<ResourceShape>(), Ok(ResourceShape::Singleton));
        assert_eq!(
            "list".parse::<ResourceShape>(),
            Err(Error::InvalidShape("list".into()))
        );
        assert_eq!(ResourceShape::default(), ResourceShape::Collection);
    }

    #[test]
    fn singleton_rejects_collection_ops() {
        let mut handle = SyncHandle::singleton(
            Fixed(json!({})),
            LocalState::default(),
            KeyConfig::default(),
        );

        let err = handle.create(fields(json!({"id": 1}))).unwrap_err();
        assert_eq!(
            err,
            Error::NotApplicable {
                op: "create",
                shape: ResourceShape::Singleton
            }
        );
        assert!(handle.get(&fields(json!({"id": 1}))).is_err());
        assert!(handle.destroy(None).is_err());
        assert_eq!(handle.list().len(), 1);
    }

    #[test]
    fn from_value_checks_shape() {
        let err = SyncHandle::from_value(
            Fixed(json!([])),
            json!({"id": 1}),
            ResourceShape::Collection,
            KeyConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidEntity(_)));
    }

    #[tokio::test]
    async fn stored_sync_persists_every_change() {
        let storage = Arc::new(MemoryStorage::new());
        let mut stored = StoredSync::open(
            Fixed(json!([{"id": 0}])),
            storage.clone(),
            "todos",
            ResourceShape::Collection,
            KeyConfig::default(),
        )
        .unwrap();

        assert!(!stored.is_persistent());
        assert_eq!(storage.get("todos").unwrap(), None);

        stored.create(fields(json!({"id": 1}))).unwrap();
        assert_eq!(
            storage.get("todos").unwrap(),
            Some(json!([{"id": 1, "sync": "create"}]))
        );

        stored.sync().await.unwrap();
        assert_eq!(
            storage.get("todos").unwrap(),
            Some(json!([{"id": 0}, {"id": 1}]))
        );
    }

    #[test]
    fn stored_sync_reloads_and_resets() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .set("todos", &json!([{"id": 5, "sync": "update"}]))
            .unwrap();

        let mut stored = StoredSync::open(
            Fixed(json!([])),
            storage.clone(),
            "todos",
            ResourceShape::Collection,
            KeyConfig::default(),
        )
        .unwrap();
        assert_eq!(stored.to_value(), json!([{"id": 5, "sync": "update"}]));

        stored.reset().unwrap();
        assert_eq!(stored.to_value(), json!([]));
        assert_eq!(storage.get("todos").unwrap(), None);
    }

    #[tokio::test]
    async fn stored_singleton_uses_custom_status_key() {
        let storage = Arc::new(MemoryStorage::new());
        let mut stored = StoredSync::open(
            Fixed(json!({"plan": "pro"})),
            storage.clone(),
            "profile",
            ResourceShape::Singleton,
            KeyConfig::new("id", "pending"),
        )
        .unwrap();

        stored.update(fields(json!({"lang": "de"}))).unwrap();
        assert_eq!(
            storage.get("profile").unwrap(),
            Some(json!({"lang": "de", "pending": "update"}))
        );

        // Fixed has no update; the pending value settles locally.
        stored.sync().await.unwrap();
        assert_eq!(storage.get("profile").unwrap(), Some(json!({"lang": "de"})));
    }
}
