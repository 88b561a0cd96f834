//! Transactional document store abstraction.
//!
//! Both game engines write their authoritative documents through this
//! interface: a path-keyed JSON document store with a compare-and-swap
//! mutation primitive and change fan-out. Two implementations exist, picked
//! by [`StoreConfig`]: [`MemoryStore`] for single-process play (bots, demos,
//! tests) and [`PgStore`] for shared tables replicated through Postgres.
//!
//! An absent document is not an error; consumers treat it as "no game yet"
//! and initialize fresh state through `transact`.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;

/// The latest contents of a document path. `None` means the document does
/// not exist (yet, or anymore).
pub type Snapshot = Option<Value>;

/// What a transaction closure wants done with a document.
#[derive(Clone, Debug)]
pub enum Mutation {
    /// Leave the document as it is; the transaction is a no-op.
    Abort,
    /// Replace the document with this value.
    Write(Value),
    /// Delete the document.
    Remove,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("document at {path} kept changing underneath the transaction after {attempts} attempts")]
    Contention { path: String, attempts: u32 },
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A path-keyed transactional document store.
///
/// `transact` is the only way the engines mutate documents: the closure
/// receives the current snapshot and computes the next one, and the store
/// re-invokes it if a concurrent writer got there first. Closures must
/// therefore be pure over their input snapshot.
#[async_trait]
pub trait Store: Send + Sync {
    async fn read_once(&self, path: &str) -> StoreResult<Snapshot>;

    async fn write(&self, path: &str, value: Value) -> StoreResult<()>;

    async fn remove(&self, path: &str) -> StoreResult<()>;

    /// Atomically read-modify-write a document. Returns the snapshot the
    /// transaction settled on.
    async fn transact(
        &self,
        path: &str,
        update: &mut (dyn FnMut(Snapshot) -> Mutation + Send),
    ) -> StoreResult<Snapshot>;

    /// Watch a document. The receiver always holds the latest snapshot;
    /// new subscribers see the current value immediately.
    async fn subscribe(&self, path: &str) -> StoreResult<watch::Receiver<Snapshot>>;
}

/// Which store backend to run against. The engines are oblivious to the
/// choice; deployment wiring picks one.
#[derive(Clone, Debug)]
pub enum StoreConfig {
    /// In-process fallback: single browser/process simulations and tests.
    Memory,
    /// Shared replicated mode over Postgres.
    Postgres { url: String },
}

impl StoreConfig {
    pub async fn build(&self) -> StoreResult<Arc<dyn Store>> {
        match self {
            Self::Memory => Ok(Arc::new(MemoryStore::new())),
            Self::Postgres { url } => Ok(Arc::new(PgStore::connect(url).await?)),
        }
    }
}
