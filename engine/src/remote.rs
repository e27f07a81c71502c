//! Remote resource abstraction.
//!
//! The reconcilers never talk to a transport directly. They call into a
//! [`Remote`], which may implement any subset of the operations. An omitted
//! operation keeps its default body, which answers `Unsupported`; it may also
//! be declared up front through [`Remote::supports`]. Either way a pending
//! entity whose flush operation is missing passes through unchanged.

use crate::{error::Result, Error, Fields, RemoteOp};
use async_trait::async_trait;

/// The authoritative copy of a resource.
#[async_trait]
pub trait Remote: Send + Sync {
    /// Whether `op` is available. Defaults to every operation.
    fn supports(&self, _op: RemoteOp) -> bool {
        true
    }

    /// Fetch the whole collection.
    async fn list(&self) -> Result<Vec<Fields>> {
        Err(Error::Unsupported(RemoteOp::List))
    }

    /// Fetch the single entity of a singleton resource.
    async fn load(&self) -> Result<Fields> {
        Err(Error::Unsupported(RemoteOp::Load))
    }

    /// Fetch one entity by the identity carried in `entity`.
    async fn get(&self, _entity: &Fields) -> Result<Fields> {
        Err(Error::Unsupported(RemoteOp::Get))
    }

    /// Create `entity`, returning the remote's version of it.
    async fn create(&self, _entity: Fields) -> Result<Fields> {
        Err(Error::Unsupported(RemoteOp::Create))
    }

    /// Replace `entity`, returning the remote's version of it.
    async fn update(&self, _entity: Fields) -> Result<Fields> {
        Err(Error::Unsupported(RemoteOp::Update))
    }

    /// Delete `entity`.
    async fn destroy(&self, _entity: Fields) -> Result<()> {
        Err(Error::Unsupported(RemoteOp::Destroy))
    }
}

#[async_trait]
impl<R: Remote + ?Sized> Remote for &R {
    fn supports(&self, op: RemoteOp) -> bool {
        (**self).supports(op)
    }

    async fn list(&self) -> Result<Vec<Fields>> {
        (**self).list().await
    }

    async fn load(&self) -> Result<Fields> {
        (**self).load().await
    }

    async fn get(&self, entity: &Fields) -> Result<Fields> {
        (**self).get(entity).await
    }

    async fn create(&self, entity: Fields) -> Result<Fields> {
        (**self).create(entity).await
    }

    async fn update(&self, entity: Fields) -> Result<Fields> {
        (**self).update(entity).await
    }

    async fn destroy(&self, entity: Fields) -> Result<()> {
        (**self).destroy(entity).await
    }
}

#[async_trait]
impl<R: Remote + ?Sized> Remote for std::sync::Arc<R> {
    fn supports(&self, op: RemoteOp) -> bool {
        (**self).supports(op)
    }

    async fn list(&self) -> Result<Vec<Fields>> {
        (**self).list().await
    }

    async fn load(&self) -> Result<Fields> {
        (**self).load().await
    }

    async fn get(&self, entity: &Fields) -> Result<Fields> {
        (**self).get(entity).await
    }

    async fn create(&self, entity: Fields) -> Result<Fields> {
        (**self).create(entity).await
    }

    async fn update(&self, entity: Fields) -> Result<Fields> {
        (**self).update(entity).await
    }

    async fn destroy(&self, entity: Fields) -> Result<()> {
        (**self).destroy(entity).await
    }
}
