//! Collection reconciliation.
//!
//! This is the core of the engine. Local mutations are staged as pending
//! entities; `sync` merges them with the remote collection and flushes them.
//!
//! # Algorithm
//!
//! 1. Fetch the remote collection
//! 2. For each remote entity, take the local version if it is pending,
//!    otherwise the remote version (remote order)
//! 3. Append local-only entities that are pending; drop the rest
//! 4. Flush each pending candidate through the remote, one at a time
//! 5. Drop candidates whose flush yielded nothing (destroys)
//! 6. Replace the local collection once, after every flush has settled

use crate::{
    error::Result, executor::run_in_order, Entity, Error, Fields, KeyConfig, LocalState,
    PendingStatus, Remote,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Outcome of one `sync` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSummary {
    /// Pending creations sent to the remote
    pub created: usize,
    /// Pending updates sent to the remote
    pub updated: usize,
    /// Pending deletions sent to the remote
    pub destroyed: usize,
    /// Pending entities kept as-is because the remote lacks the operation
    pub skipped: usize,
    /// Size of the local value after sync
    pub total: usize,
}

impl SyncSummary {
    /// Number of remote mutations performed.
    pub fn flushed(&self) -> usize {
        self.created + self.updated + self.destroyed
    }

    /// Count one flush and return the fields it keeps, if any.
    fn record(&mut self, flushed: Flushed) -> Option<Fields> {
        match flushed {
            Flushed::Kept(fields) => Some(fields),
            Flushed::PassedThrough(fields) => {
                self.skipped += 1;
                Some(fields)
            }
            Flushed::Sent(status, result) => {
                match status {
                    PendingStatus::Create => self.created += 1,
                    PendingStatus::Update => self.updated += 1,
                    PendingStatus::Destroy => self.destroyed += 1,
                }
                result
            }
        }
    }
}

/// What flushing one candidate did.
#[derive(Debug)]
enum Flushed {
    /// Already settled, nothing sent
    Kept(Fields),
    /// Sent to the remote; `None` after a destroy
    Sent(PendingStatus, Option<Fields>),
    /// The remote lacks the operation
    PassedThrough(Fields),
}

/// Reconciler for a keyed collection of entities.
#[derive(Debug)]
pub struct CollectionReconciler {
    keys: KeyConfig,
    state: LocalState<Vec<Entity>>,
}

impl CollectionReconciler {
    pub fn new(state: LocalState<Vec<Entity>>, keys: KeyConfig) -> Self {
        Self { keys, state }
    }

    pub fn keys(&self) -> &KeyConfig {
        &self.keys
    }

    /// Every tracked entity, including those pending destruction.
    pub fn entities(&self) -> &[Entity] {
        self.state.current()
    }

    pub fn state_mut(&mut self) -> &mut LocalState<Vec<Entity>> {
        &mut self.state
    }

    /// Entities visible to callers: everything not pending destruction.
    pub fn list(&self) -> Vec<&Entity> {
        self.state
            .current()
            .iter()
            .filter(|e| !e.is_destroyed())
            .collect()
    }

    /// The visible entity sharing `entity`'s identity.
    pub fn get(&self, entity: &Fields) -> Option<&Entity> {
        self.state
            .current()
            .iter()
            .filter(|e| !e.is_destroyed())
            .find(|e| self.keys.same_identity(&e.fields, entity))
    }

    /// Stage a creation at the end of the collection.
    pub fn create(&mut self, entity: Fields) -> Result<Fields> {
        let entity = self.keys.without_status(entity);
        let mut next = self.state.current().clone();
        next.push(Entity::pending(entity.clone(), PendingStatus::Create));
        self.state.replace(next)?;
        Ok(entity)
    }

    /// Stage an update of every entity sharing `entity`'s identity.
    ///
    /// The staged entity replaces the old one wholesale. An entity still
    /// pending creation stays pending creation.
    pub fn update(&mut self, entity: Fields) -> Result<Fields> {
        let entity = self.keys.without_status(entity);
        let next = self
            .state
            .current()
            .iter()
            .map(|existing| {
                if self.keys.same_identity(&existing.fields, &entity) {
                    Entity::pending(
                        entity.clone(),
                        PendingStatus::after_update(existing.status),
                    )
                } else {
                    existing.clone()
                }
            })
            .collect();
        self.state.replace(next)?;
        Ok(entity)
    }

    /// Stage a destroy of every entity sharing `entity`'s identity, or of
    /// every entity when `entity` is `None`.
    ///
    /// Entities pending creation are dropped outright.
    pub fn destroy(&mut self, entity: Option<&Fields>) -> Result<()> {
        let next = self
            .state
            .current()
            .iter()
            .filter_map(|existing| {
                let matches = entity
                    .map(|target| self.keys.same_identity(&existing.fields, target))
                    .unwrap_or(true);
                if !matches {
                    return Some(existing.clone());
                }
                PendingStatus::after_destroy(existing.status)
                    .map(|status| Entity::pending(existing.fields.clone(), status))
            })
            .collect();
        self.state.replace(next)
    }

    /// Merge with `remote` and flush pending entities.
    ///
    /// The local collection is replaced exactly once, after every remote call
    /// has succeeded. On failure it keeps its pre-sync value.
    pub async fn sync<R: Remote + ?Sized>(&mut self, remote: &R) -> Result<SyncSummary> {
        let remote_entities = remote.list().await?;
        let candidates = merge(&self.keys, self.state.current(), remote_entities);

        let outcomes = run_in_order(
            candidates
                .into_iter()
                .map(|candidate| move || flush(remote, candidate)),
        )
        .await?;

        let mut summary = SyncSummary::default();
        let next: Vec<Entity> = outcomes
            .into_iter()
            .filter_map(|outcome| summary.record(outcome))
            .map(|fields| Entity::settled(self.keys.without_status(fields)))
            .collect();
        summary.total = next.len();
        self.state.replace(next)?;

        debug!(
            created = summary.created,
            updated = summary.updated,
            destroyed = summary.destroyed,
            skipped = summary.skipped,
            total = summary.total,
            "collection synced"
        );
        Ok(summary)
    }
}

/// Build the flush candidates from the local and remote collections.
///
/// Remote order comes first. A pending local entity wins over its remote
/// counterpart; local-only entities survive only while pending.
pub fn merge(keys: &KeyConfig, local: &[Entity], remote: Vec<Fields>) -> Vec<Entity> {
    let remote: Vec<Fields> = remote.into_iter().map(|f| keys.without_status(f)).collect();
    let local_index = index_by_identity(keys, local.iter().map(|e| &e.fields));
    let remote_index = index_by_identity(keys, remote.iter());

    let mut candidates = Vec::with_capacity(remote.len());
    for fields in remote {
        let local_match = identity_key(keys, &fields)
            .and_then(|key| local_index.get(&key))
            .map(|&i| &local[i]);
        match local_match {
            Some(entity) if entity.is_pending() => candidates.push(entity.clone()),
            _ => candidates.push(Entity::settled(fields)),
        }
    }

    candidates.extend(
        local
            .iter()
            .filter(|e| {
                identity_key(keys, &e.fields)
                    .map(|key| !remote_index.contains_key(&key))
                    .unwrap_or(true)
            })
            .filter(|e| e.is_pending())
            .cloned(),
    );

    candidates
}

/// Send one candidate to the remote.
///
/// A remote lacks an operation when `supports` says so or when the call
/// answers `Unsupported`; the candidate then passes through without its
/// status.
async fn flush<R: Remote + ?Sized>(remote: &R, candidate: Entity) -> Result<Flushed> {
    let (fields, status) = candidate.into_parts();
    let Some(status) = status else {
        return Ok(Flushed::Kept(fields));
    };

    let op = status.remote_op();
    if !remote.supports(op) {
        warn!(%op, "remote lacks operation, keeping entity without flushing");
        return Ok(Flushed::PassedThrough(fields));
    }

    debug!(%op, "flushing pending entity");
    let sent = match status {
        PendingStatus::Create => remote.create(fields.clone()).await.map(Some),
        PendingStatus::Update => remote.update(fields.clone()).await.map(Some),
        PendingStatus::Destroy => remote.destroy(fields.clone()).await.map(|()| None),
    };
    match sent {
        Ok(result) => Ok(Flushed::Sent(status, result)),
        Err(Error::Unsupported(missing)) if missing == op => {
            warn!(%op, "remote does not implement operation, keeping entity without flushing");
            Ok(Flushed::PassedThrough(fields))
        }
        Err(err) => Err(err),
    }
}

/// Hashable form of an identity value.
///
/// Object keys are written sorted, so equal values render to equal text
/// whatever order the map iterates in.
fn identity_key(keys: &KeyConfig, fields: &Fields) -> Option<String> {
    fields.get(&keys.id).map(|value| {
        let mut out = String::new();
        write_canonical(value, &mut out);
        out
    })
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (key, value)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::from(key.as_str()).to_string());
                out.push(':');
                write_canonical(value, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        other => out.push_str(&other.to_string()),
    }
}

/// Position of the first entity carrying each identity.
fn index_by_identity<'a>(
    keys: &KeyConfig,
    entities: impl Iterator<Item = &'a Fields>,
) -> HashMap<String, usize> {
    let mut index = HashMap::new();
    for (i, fields) in entities.enumerate() {
        if let Some(key) = identity_key(keys, fields) {
            index.entry(key).or_insert(i);
        }
    }
    index
}
