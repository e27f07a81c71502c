//! Singleton reconciliation.
//!
//! A singleton resource holds exactly one entity and has no identity key.
//! The only local mutation is `update`.
//!
//! Note the asymmetry with collections: a settled singleton absorbs remote
//! fields over local ones, while a pending collection entity beats its remote
//! counterpart wholesale.

use crate::{
    error::Result, Entity, Error, Fields, KeyConfig, LocalState, PendingStatus, Remote, RemoteOp,
    SyncSummary,
};
use tracing::{debug, warn};

/// Reconciler for a single unkeyed entity.
#[derive(Debug)]
pub struct SingletonReconciler {
    keys: KeyConfig,
    state: LocalState<Entity>,
}

impl SingletonReconciler {
    /// Only the status key of `keys` is used.
    pub fn new(state: LocalState<Entity>, keys: KeyConfig) -> Self {
        Self { keys, state }
    }

    pub fn keys(&self) -> &KeyConfig {
        &self.keys
    }

    pub fn state_mut(&mut self) -> &mut LocalState<Entity> {
        &mut self.state
    }

    /// The current local value.
    pub fn list(&self) -> &Entity {
        self.state.current()
    }

    /// Shallow-merge `entity` into the local value and mark it pending.
    pub fn update(&mut self, entity: Fields) -> Result<Entity> {
        let mut fields = self.state.current().fields.clone();
        fields.extend(self.keys.without_status(entity));
        let next = Entity::pending(fields, PendingStatus::Update);
        self.state.replace(next.clone())?;
        Ok(next)
    }

    /// Flush a pending update, or absorb the remote value.
    ///
    /// A flushed update keeps the local fields; the remote's response is not
    /// adopted.
    pub async fn sync<R: Remote + ?Sized>(&mut self, remote: &R) -> Result<SyncSummary> {
        let current = self.state.current().clone();
        let mut summary = SyncSummary {
            total: 1,
            ..Default::default()
        };

        if current.status == Some(PendingStatus::Update) {
            let body = current.into_fields();
            let sent = if remote.supports(RemoteOp::Update) {
                debug!("flushing pending singleton update");
                match remote.update(body.clone()).await {
                    Ok(_) => true,
                    Err(Error::Unsupported(RemoteOp::Update)) => false,
                    Err(err) => return Err(err),
                }
            } else {
                false
            };
            if sent {
                summary.updated = 1;
            } else {
                warn!("remote lacks update, settling singleton without flushing");
                summary.skipped = 1;
            }
            self.state.replace(Entity::settled(body))?;
        } else {
            let mut next = current;
            let remote_fields = remote.load().await?;
            next.fields.extend(self.keys.without_status(remote_fields));
            self.state.replace(next)?;
            debug!("singleton absorbed remote value");
        }

        Ok(summary)
    }
}
