//! In-memory store implementation.
//!
//! A mutex-guarded document map with watch-channel fan-out. Transactions
//! run under the map lock, so the compare-and-swap loop trivially commits
//! on the first attempt; the semantics observable to callers are identical
//! to the replicated store's.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use tokio::sync::watch;

use super::{Mutation, Snapshot, Store, StoreResult};

#[derive(Default)]
pub struct MemoryStore {
    documents: Mutex<HashMap<String, Value>>,
    watchers: Mutex<HashMap<String, watch::Sender<Snapshot>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn publish(&self, path: &str, snapshot: Snapshot) {
        let watchers = self
            .watchers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(sender) = watchers.get(path) {
            sender.send_replace(snapshot);
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn read_once(&self, path: &str) -> StoreResult<Snapshot> {
        let documents = self
            .documents
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(documents.get(path).cloned())
    }

    async fn write(&self, path: &str, value: Value) -> StoreResult<()> {
        {
            let mut documents = self
                .documents
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            documents.insert(path.to_string(), value.clone());
        }
        self.publish(path, Some(value));
        Ok(())
    }

    async fn remove(&self, path: &str) -> StoreResult<()> {
        {
            let mut documents = self
                .documents
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            documents.remove(path);
        }
        self.publish(path, None);
        Ok(())
    }

    async fn transact(
        &self,
        path: &str,
        update: &mut (dyn FnMut(Snapshot) -> Mutation + Send),
    ) -> StoreResult<Snapshot> {
        let result = {
            let mut documents = self
                .documents
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let current = documents.get(path).cloned();
            match update(current.clone()) {
                Mutation::Abort => return Ok(current),
                Mutation::Write(next) => {
                    documents.insert(path.to_string(), next.clone());
                    Some(next)
                }
                Mutation::Remove => {
                    documents.remove(path);
                    None
                }
            }
        };
        self.publish(path, result.clone());
        Ok(result)
    }

    async fn subscribe(&self, path: &str) -> StoreResult<watch::Receiver<Snapshot>> {
        let current = self.read_once(path).await?;
        let mut watchers = self
            .watchers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let sender = watchers
            .entry(path.to_string())
            .or_insert_with(|| watch::channel(current).0);
        Ok(sender.subscribe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn missing_documents_read_as_none() {
        let store = MemoryStore::new();
        assert!(store.read_once("tables/10").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn transact_sees_its_own_prior_writes() {
        let store = MemoryStore::new();
        store
            .transact("counter", &mut |current| {
                assert!(current.is_none());
                Mutation::Write(json!(1))
            })
            .await
            .unwrap();
        let after = store
            .transact("counter", &mut |current| {
                let n = current.and_then(|v| v.as_i64()).unwrap_or(0);
                Mutation::Write(json!(n + 1))
            })
            .await
            .unwrap();
        assert_eq!(after, Some(json!(2)));
    }

    #[tokio::test]
    async fn abort_leaves_the_document_alone() {
        let store = MemoryStore::new();
        store.write("doc", json!({"a": 1})).await.unwrap();
        let settled = store
            .transact("doc", &mut |_| Mutation::Abort)
            .await
            .unwrap();
        assert_eq!(settled, Some(json!({"a": 1})));
    }

    #[tokio::test]
    async fn subscribers_see_the_current_value_and_later_changes() {
        let store = MemoryStore::new();
        store.write("doc", json!("first")).await.unwrap();

        let mut receiver = store.subscribe("doc").await.unwrap();
        assert_eq!(*receiver.borrow(), Some(json!("first")));

        store.write("doc", json!("second")).await.unwrap();
        receiver.changed().await.unwrap();
        assert_eq!(*receiver.borrow(), Some(json!("second")));

        store.remove("doc").await.unwrap();
        receiver.changed().await.unwrap();
        assert!(receiver.borrow().is_none());
    }
}
