//! Reversible deletions with a timed undo window.
//!
//! # State Machine
//!
//! ```text
//!            delete                       deadline / new delete / navigate away
//!   Idle ─────────────► PendingDelete ─────────────────────────────────────► Committing
//!    ▲                      │                                                     │
//!    └──────── undo ────────┘                                                     │
//!    └──────────────────────────────── remote result ─────────────────────────────┘
//! ```
//!
//! At most one [`PendingDeletion`] exists. A new delete while one is pending
//! commits the outstanding batch first, then starts a fresh window.
//!
//! Every pending batch carries a generation number. The deadline timer reports
//! the generation it was armed for, and [`UndoManager::expire`] ignores stale
//! generations, so undo and expiry resolve a batch exclusively: whichever is
//! processed first takes it.

use crate::domain::{MaterialRecord, Snapshot};
use std::collections::{BTreeMap, HashSet};
use std::time::Duration;
use tokio::time::Instant;

/// Default undo window.
pub const DEFAULT_UNDO_WINDOW: Duration = Duration::from_millis(4000);

/// Items optimistically removed from the view, awaiting undo or commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDeletion {
    /// Identifies this batch for timer and commit bookkeeping.
    pub generation: u64,
    /// Captured records, in the order they were visible.
    pub items: Vec<MaterialRecord>,
    /// Instant after which the batch commits.
    pub deadline: Instant,
    /// Wall-clock time of capture, for display.
    pub captured_at: chrono::DateTime<chrono::Utc>,
}

impl PendingDeletion {
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|r| r.id.as_str())
    }

    /// Time left in the undo window, saturating at zero.
    #[must_use]
    pub fn remaining(&self, now: Instant) -> Duration {
        self.deadline.saturating_duration_since(now)
    }
}

/// Why a batch left the pending state for the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitReason {
    /// The undo window elapsed.
    Expired,
    /// Another delete was issued while this batch was pending.
    Superseded,
    /// The screen was left.
    NavigatedAway,
    /// Confirmed bulk clear of the whole snapshot.
    ClearAll,
    /// The pipeline is shutting down.
    Shutdown,
}

/// A batch handed to the remote store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitBatch {
    pub generation: u64,
    pub ids: Vec<String>,
    pub reason: CommitReason,
}

/// Coarse phase, for observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UndoPhase {
    #[default]
    Idle,
    PendingDelete,
    Committing,
}

/// Owner of the pending batch and of every identity hidden by a delete.
#[derive(Debug, Clone)]
pub struct UndoManager {
    window: Duration,
    pending: Option<PendingDeletion>,
    in_flight: BTreeMap<u64, Vec<String>>,
    awaiting_resync: HashSet<String>,
    next_generation: u64,
}

impl Default for UndoManager {
    fn default() -> Self {
        Self::new(DEFAULT_UNDO_WINDOW)
    }
}

impl UndoManager {
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
            in_flight: BTreeMap::new(),
            awaiting_resync: HashSet::new(),
            next_generation: 1,
        }
    }

    #[must_use]
    pub const fn window(&self) -> Duration {
        self.window
    }

    #[must_use]
    pub const fn pending(&self) -> Option<&PendingDeletion> {
        self.pending.as_ref()
    }

    #[must_use]
    pub fn phase(&self) -> UndoPhase {
        if self.pending.is_some() {
            UndoPhase::PendingDelete
        } else if self.in_flight.is_empty() {
            UndoPhase::Idle
        } else {
            UndoPhase::Committing
        }
    }

    /// Starts a new pending batch at `now`.
    ///
    /// If a batch is already pending it is moved to committing and returned so
    /// the caller can issue its remote delete before arming the new timer.
    pub fn begin(&mut self, items: Vec<MaterialRecord>, now: Instant) -> Option<CommitBatch> {
        let superseded = self.take_pending(CommitReason::Superseded);

        let generation = self.allocate_generation();
        tracing::debug!(
            generation = generation,
            count = items.len(),
            window_ms = u64::try_from(self.window.as_millis()).unwrap_or(u64::MAX),
            "deletion pending"
        );

        self.pending = Some(PendingDeletion {
            generation,
            items,
            deadline: now + self.window,
            captured_at: chrono::Utc::now(),
        });

        superseded
    }

    /// Restores the pending batch. Returns it, or `None` if nothing was pending.
    ///
    /// No remote call follows an undo.
    pub fn undo(&mut self) -> Option<PendingDeletion> {
        let restored = self.pending.take();
        if let Some(pending) = &restored {
            tracing::debug!(generation = pending.generation, count = pending.items.len(), "deletion undone");
        }
        restored
    }

    /// Handles the timer for `generation`.
    ///
    /// Returns the batch to commit, or `None` when that generation was already
    /// undone or committed.
    pub fn expire(&mut self, generation: u64) -> Option<CommitBatch> {
        match &self.pending {
            Some(pending) if pending.generation == generation => self.take_pending(CommitReason::Expired),
            _ => {
                tracing::debug!(generation = generation, "stale undo deadline ignored");
                None
            }
        }
    }

    /// Commits the pending batch immediately, if any.
    pub fn flush(&mut self, reason: CommitReason) -> Option<CommitBatch> {
        self.take_pending(reason)
    }

    /// Identities a bulk clear of `snapshot` would delete.
    ///
    /// Includes the pending batch. Excludes identities whose remote delete was
    /// already issued.
    #[must_use]
    pub fn clear_all_candidates(&self, snapshot: &Snapshot) -> Vec<String> {
        let issued: HashSet<&str> = self
            .in_flight
            .values()
            .flatten()
            .chain(self.awaiting_resync.iter())
            .map(String::as_str)
            .collect();
        snapshot
            .ids()
            .filter(|id| !issued.contains(id))
            .map(str::to_string)
            .collect()
    }

    /// Moves every identity of a confirmed bulk clear into committing.
    ///
    /// A pending batch is absorbed: its items are part of the snapshot and go
    /// out with the same request rather than separately.
    pub fn begin_clear_all(&mut self, snapshot: &Snapshot) -> CommitBatch {
        let ids = self.clear_all_candidates(snapshot);
        if let Some(pending) = self.pending.take() {
            tracing::debug!(generation = pending.generation, "pending batch absorbed by clear all");
        }

        let generation = self.allocate_generation();
        self.in_flight.insert(generation, ids.clone());

        CommitBatch {
            generation,
            ids,
            reason: CommitReason::ClearAll,
        }
    }

    /// Settles a committing batch after the remote call returns.
    ///
    /// Identities already gone from `snapshot` are released immediately. The
    /// rest stay hidden until the next feed notification, whether the delete
    /// succeeded or failed; the feed is authoritative.
    pub fn complete(&mut self, generation: u64, snapshot: &Snapshot) -> Vec<String> {
        let Some(ids) = self.in_flight.remove(&generation) else {
            tracing::debug!(generation = generation, "completion for unknown batch");
            return Vec::new();
        };

        for id in &ids {
            if snapshot.get(id).is_some() {
                self.awaiting_resync.insert(id.clone());
            }
        }
        ids
    }

    /// Called on every feed snapshot: the remote state now speaks for itself.
    pub fn on_resync(&mut self) {
        if !self.awaiting_resync.is_empty() {
            tracing::debug!(released = self.awaiting_resync.len(), "hidden ids released on resync");
            self.awaiting_resync.clear();
        }
    }

    /// Every identity currently hidden from the view.
    #[must_use]
    pub fn hidden_ids(&self) -> HashSet<&str> {
        let mut hidden: HashSet<&str> = self.awaiting_resync.iter().map(String::as_str).collect();
        hidden.extend(self.in_flight.values().flatten().map(String::as_str));
        if let Some(pending) = &self.pending {
            hidden.extend(pending.ids());
        }
        hidden
    }

    /// Generations sent to the remote store and not yet settled.
    pub fn in_flight(&self) -> impl Iterator<Item = u64> + '_ {
        self.in_flight.keys().copied()
    }

    fn take_pending(&mut self, reason: CommitReason) -> Option<CommitBatch> {
        let pending = self.pending.take()?;
        let ids: Vec<String> = pending.ids().map(str::to_string).collect();
        self.in_flight.insert(pending.generation, ids.clone());

        tracing::debug!(generation = pending.generation, count = ids.len(), reason = ?reason, "deletion committing");

        Some(CommitBatch {
            generation: pending.generation,
            ids,
            reason,
        })
    }

    fn allocate_generation(&mut self) -> u64 {
        let generation = self.next_generation;
        self.next_generation += 1;
        generation
    }
}
