//! Remote document store abstraction.
//!
//! This module defines the [`DocumentStore`] trait that abstracts over the
//! remote collaborator holding the material collection. The pipeline only ever
//! sees full snapshots pushed through a [`FeedSubscription`] and issues deletes
//! by identity.
//!
//! # Delete semantics
//!
//! A store either offers an all-or-nothing batch delete, or only per-item
//! deletes. [`delete_records`] hides the difference: it returns a
//! [`DeleteOutcome`] listing which identities were deleted and which failed, so
//! a per-item store reports partial failure item by item.

use crate::domain::{MaterialRecord, Result, TrackerError};
use async_trait::async_trait;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use tracing::Instrument;

/// One notification from the remote feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEvent {
    /// Full current contents of the collection.
    Snapshot(Vec<MaterialRecord>),
    /// The feed failed. Later notifications may still arrive.
    ConnectionError(String),
}

/// Live listener on a collection.
///
/// Dropping the subscription or calling [`unsubscribe`](Self::unsubscribe)
/// releases the listener on the store side.
pub struct FeedSubscription {
    collection: String,
    stream: Option<BoxStream<'static, FeedEvent>>,
}

impl FeedSubscription {
    #[must_use]
    pub fn new(collection: impl Into<String>, stream: BoxStream<'static, FeedEvent>) -> Self {
        Self {
            collection: collection.into(),
            stream: Some(stream),
        }
    }

    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Waits for the next notification.
    ///
    /// Returns `None` once unsubscribed or when the store closed the feed.
    /// Cancel-safe: dropping the future loses no notification.
    pub async fn next(&mut self) -> Option<FeedEvent> {
        match self.stream.as_mut() {
            Some(stream) => stream.next().await,
            None => None,
        }
    }

    /// Releases the listener. Idempotent.
    pub fn unsubscribe(&mut self) {
        if self.stream.take().is_some() {
            tracing::debug!(collection = %self.collection, "feed unsubscribed");
        }
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.stream.is_some()
    }
}

impl std::fmt::Debug for FeedSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedSubscription")
            .field("collection", &self.collection)
            .field("active", &self.is_active())
            .finish()
    }
}

/// Per-identity result of a delete request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteOutcome {
    /// Identities the store confirmed deleted.
    pub deleted: Vec<String>,
    /// Identities that failed, with the store's reason.
    pub failed: Vec<(String, String)>,
}

impl DeleteOutcome {
    /// Every identity failed for the same reason.
    #[must_use]
    pub fn all_failed(ids: &[String], reason: &str) -> Self {
        Self {
            deleted: Vec::new(),
            failed: ids.iter().map(|id| (id.clone(), reason.to_string())).collect(),
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// Failures as crate errors, one per identity.
    pub fn errors(&self) -> impl Iterator<Item = TrackerError> + '_ {
        self.failed.iter().map(|(id, reason)| TrackerError::DeleteFailed {
            id: id.clone(),
            reason: reason.clone(),
        })
    }
}

/// Abstraction over the remote document collaborator.
///
/// Implementations must be shareable across tasks; the pipeline holds one as
/// `Arc<dyn DocumentStore>` and issues deletes from spawned tasks.
///
/// # Implementations
///
/// - [`InMemoryStore`](super::InMemoryStore): in-process store with failure injection
///
/// # Examples
///
/// ```
/// use material_tracker::remote::{DocumentStore, InMemoryStore};
///
/// # #[tokio::main]
/// # async fn main() {
/// let store = InMemoryStore::new();
/// let id = store.insert("materials", "red", 50, true, "scrap").await;
/// store.delete_by_id(&id).await.unwrap();
/// assert!(store.fetch_all("materials").await.unwrap().is_empty());
/// # }
/// ```
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Starts listening to `collection`.
    ///
    /// The first notification is the current contents.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be registered.
    async fn subscribe(&self, collection: &str) -> Result<FeedSubscription>;

    /// Deletes one document by identity.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::DeleteFailed`] if the store rejects the delete.
    async fn delete_by_id(&self, id: &str) -> Result<()>;

    /// Deletes several documents in one all-or-nothing request.
    ///
    /// Only called when [`supports_batch_delete`](Self::supports_batch_delete)
    /// returns `true`.
    ///
    /// # Errors
    ///
    /// Returns an error if the batch was rejected; nothing was deleted.
    async fn delete_batch(&self, ids: &[String]) -> Result<()> {
        let _ = ids;
        Err(TrackerError::Storage("batch delete not supported".to_string()))
    }

    /// Whether [`delete_batch`](Self::delete_batch) is available.
    fn supports_batch_delete(&self) -> bool {
        false
    }

    /// One-shot read of the collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    async fn fetch_all(&self, collection: &str) -> Result<Vec<MaterialRecord>>;
}

/// Deletes `ids`, reporting the result per identity.
///
/// A single identity goes through `delete_by_id`. Several identities use one
/// batch request when the store supports it, otherwise one independent request
/// each, so a partial failure names exactly the identities that failed.
pub async fn delete_records(store: &dyn DocumentStore, ids: &[String]) -> DeleteOutcome {
    let span = tracing::debug_span!("delete_records",
        item_count = ids.len(),
        batch = store.supports_batch_delete()
    );
    issue_deletes(store, ids).instrument(span).await
}

async fn issue_deletes(store: &dyn DocumentStore, ids: &[String]) -> DeleteOutcome {
    match ids {
        [] => DeleteOutcome::default(),
        [id] => match store.delete_by_id(id).await {
            Ok(()) => DeleteOutcome {
                deleted: vec![id.clone()],
                failed: Vec::new(),
            },
            Err(err) => DeleteOutcome::all_failed(ids, &failure_reason(err)),
        },
        _ if store.supports_batch_delete() => match store.delete_batch(ids).await {
            Ok(()) => DeleteOutcome {
                deleted: ids.to_vec(),
                failed: Vec::new(),
            },
            Err(err) => DeleteOutcome::all_failed(ids, &failure_reason(err)),
        },
        _ => {
            let mut outcome = DeleteOutcome::default();
            for id in ids {
                match store.delete_by_id(id).await {
                    Ok(()) => outcome.deleted.push(id.clone()),
                    Err(err) => outcome.failed.push((id.clone(), failure_reason(err))),
                }
            }
            outcome
        }
    }
}

fn failure_reason(err: TrackerError) -> String {
    match err {
        TrackerError::DeleteFailed { reason, .. } => reason,
        other => other.to_string(),
    }
}
