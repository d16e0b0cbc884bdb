//! In-memory versioned document store with optimistic transactions.

use std::sync::Arc;

use dashmap::DashMap;
use provender_shared::config::StoreConfig;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::{Mutex, broadcast};

use super::error::StoreError;

/// Notification published after a committed write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Collection the write landed in.
    pub collection: String,
    /// Document id within the collection.
    pub id: String,
}

/// A stored document: a JSON value plus its commit version.
#[derive(Debug, Clone)]
struct RawDocument {
    version: u64,
    data: serde_json::Value,
}

type Collection = Arc<DashMap<String, RawDocument>>;

/// Version a transaction observed for a document (`None` = absent).
#[derive(Debug, Clone)]
struct ReadStamp {
    collection: String,
    id: String,
    version: Option<u64>,
}

/// Write staged by a transaction, applied atomically at commit.
#[derive(Debug, Clone)]
struct StagedWrite {
    collection: String,
    id: String,
    data: serde_json::Value,
}

/// In-memory document store.
///
/// Snapshot reads ([`MemoryStore::get`], [`MemoryStore::query`]) are
/// lock-free. Mutations go through [`MemoryStore::transact`]: the closure
/// reads and stages writes against a [`Txn`], and the store commits the
/// staged writes only if every document the closure read is still at the
/// version it observed. On conflict the closure is re-run, up to a bounded
/// number of retries.
#[derive(Debug)]
pub struct MemoryStore {
    collections: DashMap<String, Collection>,
    commit_lock: Mutex<()>,
    changes: broadcast::Sender<ChangeEvent>,
    max_retries: u32,
}

impl MemoryStore {
    /// Creates a store with the given retry bound and change-bus capacity.
    #[must_use]
    pub fn new(max_retries: u32, change_buffer: usize) -> Self {
        let (changes, _) = broadcast::channel(change_buffer.max(1));
        Self {
            collections: DashMap::new(),
            commit_lock: Mutex::new(()),
            changes,
            max_retries,
        }
    }

    /// Creates a store tuned by the application configuration.
    #[must_use]
    pub fn from_config(cfg: &StoreConfig) -> Self {
        Self::new(cfg.max_txn_retries, cfg.change_buffer)
    }

    fn collection(&self, name: &str) -> Collection {
        if let Some(existing) = self.collections.get(name) {
            return Arc::clone(&existing);
        }
        Arc::clone(
            &self
                .collections
                .entry(name.to_owned())
                .or_insert_with(|| Arc::new(DashMap::new())),
        )
    }

    /// Snapshot-reads and deserializes one document.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Serialization`] if the stored value does not
    /// deserialize into `T`.
    pub fn get<T: DeserializeOwned>(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<T>, StoreError> {
        let coll = self.collection(collection);
        let Some(doc) = coll.get(id) else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_value(doc.data.clone())?))
    }

    /// Snapshot-reads every document in a collection.
    ///
    /// Order is unspecified; callers that need an order sort the result.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Serialization`] if any stored value does not
    /// deserialize into `T`.
    pub fn query<T: DeserializeOwned>(&self, collection: &str) -> Result<Vec<T>, StoreError> {
        let coll = self.collection(collection);
        let mut out = Vec::with_capacity(coll.len());
        for doc in coll.iter() {
            out.push(serde_json::from_value(doc.data.clone())?);
        }
        Ok(out)
    }

    /// Subscribes to committed-write notifications.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.changes.subscribe()
    }

    /// Runs `f` as an atomic read-modify-write transaction.
    ///
    /// The closure may fail with a domain error `E`; domain failures abort
    /// immediately without retry. Version conflicts re-run the closure, and
    /// after `max_retries` re-runs the transaction fails with
    /// [`StoreError::Conflict`] converted into `E`.
    ///
    /// The closure must be pure over the [`Txn`] it is given: it can run
    /// more than once and must not cause side effects outside the store.
    ///
    /// # Errors
    ///
    /// Returns the closure's error, or `E::from(StoreError::Conflict)` when
    /// the retry budget is exhausted.
    pub async fn transact<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: Fn(&mut Txn<'_>) -> Result<T, E>,
        E: From<StoreError>,
    {
        for attempt in 0..=self.max_retries {
            let mut txn = Txn {
                store: self,
                reads: Vec::new(),
                writes: Vec::new(),
            };
            let value = f(&mut txn)?;
            let Txn { reads, writes, .. } = txn;

            let _commit = self.commit_lock.lock().await;
            if self.reads_still_valid(&reads) {
                let mut events = Vec::with_capacity(writes.len());
                for write in writes {
                    let coll = self.collection(&write.collection);
                    // Compute-then-insert in one statement so the read guard
                    // on the same key is dropped before the insert.
                    let version = coll.get(&write.id).map_or(1, |doc| doc.version + 1);
                    coll.insert(
                        write.id.clone(),
                        RawDocument {
                            version,
                            data: write.data,
                        },
                    );
                    events.push(ChangeEvent {
                        collection: write.collection,
                        id: write.id,
                    });
                }
                drop(_commit);
                for event in events {
                    // No receivers is fine.
                    let _ = self.changes.send(event);
                }
                return Ok(value);
            }
            drop(_commit);
            tracing::debug!(attempt, "transaction conflict, retrying");
        }
        Err(E::from(StoreError::Conflict(self.max_retries)))
    }

    fn reads_still_valid(&self, reads: &[ReadStamp]) -> bool {
        reads.iter().all(|stamp| {
            let coll = self.collection(&stamp.collection);
            let current = coll.get(&stamp.id).map(|doc| doc.version);
            current == stamp.version
        })
    }
}

/// Transaction handle passed to the [`MemoryStore::transact`] closure.
///
/// Reads are recorded for commit-time validation and see the transaction's
/// own staged writes (read-your-writes).
#[derive(Debug)]
pub struct Txn<'a> {
    store: &'a MemoryStore,
    reads: Vec<ReadStamp>,
    writes: Vec<StagedWrite>,
}

impl Txn<'_> {
    /// Reads one document inside the transaction.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Serialization`] if the value does not
    /// deserialize into `T`.
    pub fn get<T: DeserializeOwned>(
        &mut self,
        collection: &str,
        id: &str,
    ) -> Result<Option<T>, StoreError> {
        if let Some(staged) = self
            .writes
            .iter()
            .rev()
            .find(|w| w.collection == collection && w.id == id)
        {
            return Ok(Some(serde_json::from_value(staged.data.clone())?));
        }
        let coll = self.store.collection(collection);
        let doc = coll.get(id).map(|d| (d.version, d.data.clone()));
        self.reads.push(ReadStamp {
            collection: collection.to_owned(),
            id: id.to_owned(),
            version: doc.as_ref().map(|(version, _)| *version),
        });
        match doc {
            Some((_, data)) => Ok(Some(serde_json::from_value(data)?)),
            None => Ok(None),
        }
    }

    /// Stages a write; it becomes visible to others only at commit.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Serialization`] if `value` does not serialize.
    pub fn put<T: Serialize>(
        &mut self,
        collection: &str,
        id: &str,
        value: &T,
    ) -> Result<(), StoreError> {
        self.writes.push(StagedWrite {
            collection: collection.to_owned(),
            id: id.to_owned(),
            data: serde_json::to_value(value)?,
        });
        Ok(())
    }
}
