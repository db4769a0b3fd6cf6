//! Item store holding the latest snapshot pushed by the remote feed.
//!
//! The store is the sole writer of the canonical record set. Every feed
//! notification replaces the snapshot wholesale; a feed failure flips the
//! connection state without discarding the last good snapshot.

use crate::domain::{MaterialRecord, Snapshot};
use super::filter::{category_counts, color_counts};
use std::collections::BTreeMap;

/// Visible connection status of the remote feed.
///
/// Loading, offline, and empty are three distinct states: an empty snapshot
/// while `Connected` means "no items", not "no connection".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No notification has arrived yet.
    #[default]
    Loading,
    /// The last notification was a snapshot.
    Connected,
    /// The last notification was a feed error.
    Disconnected,
}

/// Canonical record set plus the per-value counts the filter chips are built from.
#[derive(Debug, Clone, Default)]
pub struct ItemStore {
    snapshot: Snapshot,
    connection: ConnectionState,
    last_error: Option<String>,
    colors: BTreeMap<String, usize>,
    categories: BTreeMap<String, usize>,
    revision: u64,
}

impl ItemStore {
    /// Creates an empty store in the `Loading` state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically swaps in a new snapshot.
    ///
    /// Marks the feed connected, clears any connection error, and recomputes
    /// the color and category counts.
    pub fn replace(&mut self, records: Vec<MaterialRecord>) {
        let _span = tracing::debug_span!("item_store_replace", incoming = records.len()).entered();

        self.snapshot = Snapshot::from_records(records);
        self.colors = color_counts(self.snapshot.records());
        self.categories = category_counts(self.snapshot.records());
        self.connection = ConnectionState::Connected;
        self.last_error = None;
        self.revision = self.revision.wrapping_add(1);

        tracing::debug!(
            records = self.snapshot.len(),
            colors = self.colors.len(),
            categories = self.categories.len(),
            revision = self.revision,
            "snapshot replaced"
        );
    }

    /// Records a feed failure. The current snapshot is kept.
    pub fn connection_lost(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        tracing::warn!(reason = %reason, retained = self.snapshot.len(), "remote feed lost");
        self.connection = ConnectionState::Disconnected;
        self.last_error = Some(reason);
    }

    /// The current snapshot.
    #[must_use]
    pub const fn current(&self) -> &Snapshot {
        &self.snapshot
    }

    #[must_use]
    pub const fn connection(&self) -> ConnectionState {
        self.connection
    }

    /// Reason of the most recent feed failure, cleared by the next snapshot.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Occurrences of each color in the current snapshot.
    #[must_use]
    pub const fn colors(&self) -> &BTreeMap<String, usize> {
        &self.colors
    }

    /// Occurrences of each category in the current snapshot.
    #[must_use]
    pub const fn categories(&self) -> &BTreeMap<String, usize> {
        &self.categories
    }

    /// Number of snapshots received so far.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, color: &str, category: &str) -> MaterialRecord {
        MaterialRecord::new(id, color, 10, false, category)
    }

    #[test]
    fn starts_loading_and_empty() {
        let store = ItemStore::new();
        assert_eq!(store.connection(), ConnectionState::Loading);
        assert!(store.current().is_empty());
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn replace_recomputes_value_counts() {
        let mut store = ItemStore::new();
        store.replace(vec![
            record("1", "red", "scrap"),
            record("2", "blue", "sheet"),
            record("3", "red", "sheet"),
        ]);

        assert_eq!(store.connection(), ConnectionState::Connected);
        assert_eq!(store.colors().get("red"), Some(&2));
        assert_eq!(store.colors().keys().map(String::as_str).collect::<Vec<_>>(), ["blue", "red"]);
        assert_eq!(store.categories().keys().map(String::as_str).collect::<Vec<_>>(), ["scrap", "sheet"]);

        store.replace(vec![record("4", "green", "bar")]);
        assert_eq!(store.colors().keys().map(String::as_str).collect::<Vec<_>>(), ["green"]);
        assert_eq!(store.categories().get("bar"), Some(&1));
        assert_eq!(store.revision(), 2);
    }

    #[test]
    fn connection_loss_is_distinct_from_empty_and_clears_on_next_snapshot() {
        let mut store = ItemStore::new();
        store.replace(vec![record("1", "red", "scrap")]);
        store.connection_lost("socket closed");

        assert_eq!(store.connection(), ConnectionState::Disconnected);
        assert_eq!(store.last_error(), Some("socket closed"));
        assert_eq!(store.current().len(), 1);

        store.replace(vec![]);
        assert_eq!(store.connection(), ConnectionState::Connected);
        assert!(store.last_error().is_none());
        assert!(store.current().is_empty());
    }
}
