//! In-process document store.
//!
//! Holds collections in memory and pushes a full snapshot to every live
//! subscriber after each change. Failures can be injected per identity or for
//! the feed, and request counters let callers assert how many remote calls
//! were issued.

use super::backend::{DocumentStore, FeedEvent, FeedSubscription};
use crate::domain::{MaterialRecord, Result, TrackerError};
use async_trait::async_trait;
use futures_util::StreamExt;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{mpsc, Mutex};

#[derive(Default)]
struct Inner {
    collections: BTreeMap<String, Vec<MaterialRecord>>,
    subscribers: Vec<(String, mpsc::UnboundedSender<FeedEvent>)>,
    failing_ids: HashMap<String, String>,
    requested: Vec<String>,
}

impl Inner {
    fn publish(&mut self, collection: &str) {
        let records = self.collections.get(collection).cloned().unwrap_or_default();
        self.subscribers.retain(|(_, tx)| !tx.is_closed());
        for (name, tx) in &self.subscribers {
            if name == collection {
                let _ = tx.send(FeedEvent::Snapshot(records.clone()));
            }
        }
    }

    fn collection_of(&self, id: &str) -> Option<String> {
        self.collections
            .iter()
            .find(|(_, records)| records.iter().any(|r| r.id == id))
            .map(|(name, _)| name.clone())
    }
}

/// Document store backed by process memory.
#[derive(Default)]
pub struct InMemoryStore {
    inner: Mutex<Inner>,
    batch_support: bool,
    delete_calls: AtomicU64,
    batch_calls: AtomicU64,
}

impl InMemoryStore {
    /// Creates an empty store that only offers per-item deletes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables the all-or-nothing batch delete.
    #[must_use]
    pub fn with_batch_support(mut self, enabled: bool) -> Self {
        self.batch_support = enabled;
        self
    }

    /// Adds a document with a fresh identity and returns that identity.
    pub async fn insert(
        &self,
        collection: &str,
        color: &str,
        weight_grams: u64,
        is_metal: bool,
        category: &str,
    ) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        let record = MaterialRecord::new(id.clone(), color, weight_grams, is_metal, category);

        let mut inner = self.inner.lock().await;
        inner.collections.entry(collection.to_string()).or_default().push(record);
        inner.publish(collection);
        id
    }

    /// Appends records with their existing identities.
    pub async fn seed(&self, collection: &str, records: Vec<MaterialRecord>) {
        let mut inner = self.inner.lock().await;
        inner.collections.entry(collection.to_string()).or_default().extend(records);
        inner.publish(collection);
    }

    /// Makes every delete of `id` fail with `reason`.
    pub async fn fail_deletes_for(&self, id: &str, reason: &str) {
        self.inner.lock().await.failing_ids.insert(id.to_string(), reason.to_string());
    }

    /// Removes every injected delete failure.
    pub async fn clear_failures(&self) {
        self.inner.lock().await.failing_ids.clear();
    }

    /// Pushes a connection error to subscribers of `collection`.
    pub async fn emit_connection_error(&self, collection: &str, reason: &str) {
        let mut inner = self.inner.lock().await;
        inner.subscribers.retain(|(_, tx)| !tx.is_closed());
        for (name, tx) in &inner.subscribers {
            if name == collection {
                let _ = tx.send(FeedEvent::ConnectionError(reason.to_string()));
            }
        }
    }

    /// Pushes the current contents of `collection` again.
    pub async fn republish(&self, collection: &str) {
        self.inner.lock().await.publish(collection);
    }

    /// Number of `delete_by_id` calls received.
    pub fn delete_calls(&self) -> u64 {
        self.delete_calls.load(Ordering::Relaxed)
    }

    /// Number of `delete_batch` calls received.
    pub fn batch_calls(&self) -> u64 {
        self.batch_calls.load(Ordering::Relaxed)
    }

    /// Every identity a delete was requested for, in request order.
    pub async fn requested_deletes(&self) -> Vec<String> {
        self.inner.lock().await.requested.clone()
    }

    /// Live subscriber count across all collections.
    pub async fn subscriber_count(&self) -> usize {
        let inner = self.inner.lock().await;
        inner.subscribers.iter().filter(|(_, tx)| !tx.is_closed()).count()
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn subscribe(&self, collection: &str) -> Result<FeedSubscription> {
        let (tx, rx) = mpsc::unbounded_channel();

        let mut inner = self.inner.lock().await;
        let current = inner.collections.get(collection).cloned().unwrap_or_default();
        tx.send(FeedEvent::Snapshot(current))
            .map_err(|e| TrackerError::Storage(format!("Failed to prime subscription: {e}")))?;
        inner.subscribers.push((collection.to_string(), tx));
        drop(inner);

        tracing::debug!(collection = %collection, "feed subscribed");

        let stream = futures_util::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|event| (event, rx))
        })
        .boxed();
        Ok(FeedSubscription::new(collection, stream))
    }

    async fn delete_by_id(&self, id: &str) -> Result<()> {
        self.delete_calls.fetch_add(1, Ordering::Relaxed);

        let mut inner = self.inner.lock().await;
        inner.requested.push(id.to_string());

        if let Some(reason) = inner.failing_ids.get(id) {
            return Err(TrackerError::DeleteFailed {
                id: id.to_string(),
                reason: reason.clone(),
            });
        }

        // deleting a missing document succeeds, like most document stores
        let Some(collection) = inner.collection_of(id) else {
            return Ok(());
        };
        if let Some(records) = inner.collections.get_mut(&collection) {
            records.retain(|r| r.id != id);
        }
        inner.publish(&collection);
        Ok(())
    }

    async fn delete_batch(&self, ids: &[String]) -> Result<()> {
        self.batch_calls.fetch_add(1, Ordering::Relaxed);

        let mut inner = self.inner.lock().await;
        inner.requested.extend(ids.iter().cloned());

        if let Some((id, reason)) = ids
            .iter()
            .find_map(|id| inner.failing_ids.get(id).map(|reason| (id, reason)))
        {
            return Err(TrackerError::DeleteFailed {
                id: id.clone(),
                reason: reason.clone(),
            });
        }

        let touched: Vec<String> = inner.collections.keys().cloned().collect();
        for records in inner.collections.values_mut() {
            records.retain(|r| !ids.contains(&r.id));
        }
        for collection in touched {
            inner.publish(&collection);
        }
        Ok(())
    }

    fn supports_batch_delete(&self) -> bool {
        self.batch_support
    }

    async fn fetch_all(&self, collection: &str) -> Result<Vec<MaterialRecord>> {
        Ok(self
            .inner
            .lock()
            .await
            .collections
            .get(collection)
            .cloned()
            .unwrap_or_default())
    }
}
