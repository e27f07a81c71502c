//! # Tether Engine
//!
//! A reconciliation engine for local-first resources.
//!
//! This crate keeps a local copy of a remote resource, stages local mutations
//! against it, and reconciles the two on demand. An unflushed local mutation
//! is never lost to a remote read: pending local entities always win over the
//! remote copy until they have been flushed.
//!
//! ## Design Principles
//!
//! - **No IO**: the remote resource and persistence are injected traits
//! - **Ordered**: remote calls of one sync run strictly one after another
//! - **All or nothing locally**: the local value is replaced once per sync,
//!   only after every remote call has succeeded
//!
//! ## Core Concepts
//!
//! ### Entities and pending status
//!
//! An [`Entity`] is an open map of [`Fields`] plus an optional
//! [`PendingStatus`]:
//! - [`PendingStatus::Create`] - created locally, unknown to the remote
//! - [`PendingStatus::Update`] - changed locally since the last flush
//! - [`PendingStatus::Destroy`] - removed locally, awaiting remote deletion
//!
//! The status never reaches the remote. Locally it is persisted under a
//! configurable key (see [`KeyConfig`], default `sync`).
//!
//! ### Reconcilers
//!
//! - [`CollectionReconciler`] - a keyed collection (identity key default `id`)
//! - [`SingletonReconciler`] - a single unkeyed entity
//!
//! ### Facade
//!
//! [`SyncHandle`] binds either reconciler to a [`Remote`]; [`StoredSync`]
//! additionally loads and saves the local value through a [`Storage`].
//!
//! ## Quick Start
//!
//! ```rust
//! use tether_engine::{
//!     fields, Fields, KeyConfig, LocalState, Remote, Result, SyncHandle,
//! };
//! use serde_json::json;
//!
//! struct Todos;
//!
//! #[async_trait::async_trait]
//! impl Remote for Todos {
//!     async fn list(&self) -> Result<Vec<Fields>> {
//!         Ok(vec![fields(json!({"id": 0, "title": "from server"}))])
//!     }
//!
//!     async fn create(&self, entity: Fields) -> Result<Fields> {
//!         Ok(entity)
//!     }
//! }
//!
//! # futures::executor::block_on(async {
//! let mut todos = SyncHandle::collection(Todos, LocalState::default(), KeyConfig::default());
//!
//! // Stage locally; nothing is sent yet.
//! todos.create(fields(json!({"id": 1, "title": "buy milk"}))).unwrap();
//! assert_eq!(todos.to_value(), json!([{"id": 1, "title": "buy milk", "sync": "create"}]));
//!
//! // Merge with the remote and flush.
//! let summary = todos.sync().await.unwrap();
//! assert_eq!(summary.created, 1);
//! assert_eq!(
//!     todos.to_value(),
//!     json!([{"id": 0, "title": "from server"}, {"id": 1, "title": "buy milk"}])
//! );
//! # });
//! ```
//!
//! ## Concurrency
//!
//! `sync` takes `&mut self`, so one handle never has two syncs in flight.
//! Sharing a handle across tasks means wrapping it in a lock; mutations made
//! through another path while a sync is suspended are overwritten when it
//! completes.

pub mod collection;
pub mod entity;
pub mod error;
pub mod executor;
pub mod facade;
pub mod local;
pub mod remote;
pub mod singleton;
pub mod status;
pub mod storage;

// Re-export main types at crate root
pub use collection::{merge, CollectionReconciler, SyncSummary};
pub use entity::{fields, Entity, Fields, KeyConfig, DEFAULT_ID_KEY, DEFAULT_STATUS_KEY};
pub use error::{Error, Result};
pub use executor::run_in_order;
pub use facade::{Reconciler, ResourceShape, StoredSync, SyncHandle};
pub use local::{Listener, LocalState};
pub use remote::Remote;
pub use singleton::SingletonReconciler;
pub use status::{PendingStatus, RemoteOp};
pub use storage::{MemoryStorage, Storage};
