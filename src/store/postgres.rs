//! Postgres-backed replicated store.
//!
//! Documents live in a single `documents` table as JSONB rows with a
//! version counter. `transact` is an optimistic-concurrency loop: read the
//! row, compute the next value, and commit with
//! `UPDATE ... WHERE version = $seen`; a lost race re-runs the closure
//! against the fresh snapshot. Change fan-out rides `pg_notify`, consumed
//! by one shared `PgListener` task that refreshes local watch channels.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgListener, PgPool, PgPoolOptions};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;

use super::{Mutation, Snapshot, Store, StoreError, StoreResult};

const NOTIFY_CHANNEL: &str = "game_hub_documents";

/// A lost CAS race beyond this many attempts reports contention instead of
/// spinning forever.
const MAX_TRANSACT_ATTEMPTS: u32 = 16;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS documents (
    path TEXT PRIMARY KEY,
    doc JSONB NOT NULL,
    version BIGINT NOT NULL DEFAULT 1
)";

type Watchers = Arc<Mutex<HashMap<String, watch::Sender<Snapshot>>>>;

pub struct PgStore {
    pool: PgPool,
    watchers: Watchers,
    listener_started: AtomicBool,
}

impl PgStore {
    pub async fn connect(url: &str) -> StoreResult<Self> {
        let pool = PgPoolOptions::new().max_connections(8).connect(url).await?;
        sqlx::query(SCHEMA).execute(&pool).await?;
        Ok(Self {
            pool,
            watchers: Arc::new(Mutex::new(HashMap::new())),
            listener_started: AtomicBool::new(false),
        })
    }

    async fn fetch(pool: &PgPool, path: &str) -> Result<Option<(Value, i64)>, sqlx::Error> {
        sqlx::query_as::<_, (Value, i64)>("SELECT doc, version FROM documents WHERE path = $1")
            .bind(path)
            .fetch_optional(pool)
            .await
    }

    async fn notify(&self, path: &str) -> StoreResult<()> {
        sqlx::query("SELECT pg_notify($1, $2)")
            .bind(NOTIFY_CHANNEL)
            .bind(path)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    fn publish_local(watchers: &Watchers, path: &str, snapshot: Snapshot) {
        let watchers = watchers.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(sender) = watchers.get(path) {
            sender.send_replace(snapshot);
        }
    }

    /// Start the shared LISTEN task on first subscription.
    fn ensure_listener(&self) {
        if self
            .listener_started
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }
        let pool = self.pool.clone();
        let watchers = Arc::clone(&self.watchers);
        tokio::spawn(async move {
            let mut listener = match PgListener::connect_with(&pool).await {
                Ok(listener) => listener,
                Err(err) => {
                    log::error!("document listener failed to connect: {err}");
                    return;
                }
            };
            if let Err(err) = listener.listen(NOTIFY_CHANNEL).await {
                log::error!("document listener failed to LISTEN: {err}");
                return;
            }
            loop {
                match listener.recv().await {
                    Ok(notification) => {
                        let path = notification.payload().to_string();
                        let snapshot = match Self::fetch(&pool, &path).await {
                            Ok(row) => row.map(|(doc, _)| doc),
                            Err(err) => {
                                log::warn!("failed to refresh {path} after notify: {err}");
                                continue;
                            }
                        };
                        Self::publish_local(&watchers, &path, snapshot);
                    }
                    Err(err) => {
                        // PgListener reconnects internally; note it and go on.
                        log::warn!("document listener hiccup: {err}");
                    }
                }
            }
        });
    }
}

#[async_trait]
impl Store for PgStore {
    async fn read_once(&self, path: &str) -> StoreResult<Snapshot> {
        Ok(Self::fetch(&self.pool, path).await?.map(|(doc, _)| doc))
    }

    async fn write(&self, path: &str, value: Value) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO documents (path, doc) VALUES ($1, $2)
             ON CONFLICT (path)
             DO UPDATE SET doc = EXCLUDED.doc, version = documents.version + 1",
        )
        .bind(path)
        .bind(&value)
        .execute(&self.pool)
        .await?;
        Self::publish_local(&self.watchers, path, Some(value));
        self.notify(path).await
    }

    async fn remove(&self, path: &str) -> StoreResult<()> {
        sqlx::query("DELETE FROM documents WHERE path = $1")
            .bind(path)
            .execute(&self.pool)
            .await?;
        Self::publish_local(&self.watchers, path, None);
        self.notify(path).await
    }

    async fn transact(
        &self,
        path: &str,
        update: &mut (dyn FnMut(Snapshot) -> Mutation + Send),
    ) -> StoreResult<Snapshot> {
        for attempt in 1..=MAX_TRANSACT_ATTEMPTS {
            let row = Self::fetch(&self.pool, path).await?;
            let (current, version) = match row {
                Some((doc, version)) => (Some(doc), Some(version)),
                None => (None, None),
            };

            match update(current.clone()) {
                Mutation::Abort => return Ok(current),
                Mutation::Write(next) => {
                    let committed = match version {
                        Some(seen) => {
                            sqlx::query(
                                "UPDATE documents SET doc = $2, version = version + 1
                                 WHERE path = $1 AND version = $3",
                            )
                            .bind(path)
                            .bind(&next)
                            .bind(seen)
                            .execute(&self.pool)
                            .await?
                            .rows_affected()
                                == 1
                        }
                        None => {
                            sqlx::query(
                                "INSERT INTO documents (path, doc) VALUES ($1, $2)
                                 ON CONFLICT (path) DO NOTHING",
                            )
                            .bind(path)
                            .bind(&next)
                            .execute(&self.pool)
                            .await?
                            .rows_affected()
                                == 1
                        }
                    };
                    if committed {
                        Self::publish_local(&self.watchers, path, Some(next.clone()));
                        self.notify(path).await?;
                        return Ok(Some(next));
                    }
                }
                Mutation::Remove => {
                    let committed = match version {
                        Some(seen) => {
                            sqlx::query("DELETE FROM documents WHERE path = $1 AND version = $2")
                                .bind(path)
                                .bind(seen)
                                .execute(&self.pool)
                                .await?
                                .rows_affected()
                                == 1
                        }
                        // Nothing there to remove.
                        None => return Ok(None),
                    };
                    if committed {
                        Self::publish_local(&self.watchers, path, None);
                        self.notify(path).await?;
                        return Ok(None);
                    }
                }
            }
            log::debug!("transact on {path} lost the race (attempt {attempt}), retrying");
        }
        Err(StoreError::Contention {
            path: path.to_string(),
            attempts: MAX_TRANSACT_ATTEMPTS,
        })
    }

    async fn subscribe(&self, path: &str) -> StoreResult<watch::Receiver<Snapshot>> {
        self.ensure_listener();
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
