//! Backing stores for the opinion board.
//!
//! `OpinionStore` is the shared live contract: create, delete and an
//! ordered subscription that pushes the full list on every change.
//! `LocalSlot` is the single-file alternative used in local-only mode.

pub mod local;
pub mod memory;
pub mod postgres;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;

use crate::models::opinion::{Opinion, OpinionId, OpinionRecord};

pub use local::LocalSlot;
pub use memory::MemoryOpinionStore;
pub use postgres::PgOpinionStore;

#[derive(Debug)]
pub enum StoreError {
    Db(sqlx::Error),
    Io(std::io::Error),
    Json(serde_json::Error),
    Unavailable(String),
    Subscription(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Db(e) => write!(f, "Database error: {e}"),
            StoreError::Io(e) => write!(f, "I/O error: {e}"),
            StoreError::Json(e) => write!(f, "Serialization error: {e}"),
            StoreError::Unavailable(msg) => write!(f, "Store unavailable: {msg}"),
            StoreError::Subscription(msg) => write!(f, "Subscription failed: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Db(e)
    }
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Json(e)
    }
}

/// One push from a live subscription: the full ordered list, or the error
/// that ended the subscription.
pub type SnapshotEvent = Result<Vec<Opinion>, StoreError>;

pub type SnapshotHandler = Arc<dyn Fn(SnapshotEvent) + Send + Sync>;

/// Handle to a running subscription. Cancelling (or dropping) it stops the
/// background task that feeds the handler.
pub struct Subscription {
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    pub fn from_task(task: JoinHandle<()>) -> Self {
        Subscription { task: Some(task) }
    }

    pub fn cancel(mut self) {
        self.abort();
    }

    fn abort(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.abort();
    }
}

/// A shared document collection of opinions with live ordered snapshots.
#[async_trait]
pub trait OpinionStore: Send + Sync {
    /// Persist a record and return the id the store assigned to it.
    async fn create(&self, record: OpinionRecord) -> Result<OpinionId, StoreError>;

    /// Remove a record. Removing an unknown id is not an error.
    async fn delete(&self, id: &OpinionId) -> Result<(), StoreError>;

    /// Start pushing the full list, newest first, to `handler`: once
    /// immediately and again after every change.
    async fn subscribe(&self, handler: SnapshotHandler) -> Result<Subscription, StoreError>;

    /// Short name used in logs and the health endpoint.
    fn kind(&self) -> &'static str;
}
