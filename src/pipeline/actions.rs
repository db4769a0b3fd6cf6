//! Actions representing side effects to be executed by the pipeline worker.
//!
//! The event handler is a pure state transition; anything touching the remote
//! store, the preference store, the clock, or observers is returned as an
//! [`Action`] and executed by the worker in order.
//!
//! # Example
//!
//! ```rust
//! use material_tracker::pipeline::{Action, Notice};
//!
//! let actions = vec![
//!     Action::CancelUndoDeadline,
//!     Action::Notify(Notice::DeletionRestored { count: 2 }),
//! ];
//! assert_eq!(actions.len(), 2);
//! ```

use super::undo::CommitBatch;
use crate::domain::{TrackerError, UnitType};
use tokio::time::Instant;

/// Commands produced by the event handler for the worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Issues the remote delete for a batch that left the undo window.
    CommitDeletion(CommitBatch),

    /// Arms the undo timer, replacing any previously armed one.
    ScheduleUndoDeadline {
        /// Batch the timer belongs to.
        generation: u64,
        /// When the timer fires.
        deadline: Instant,
    },

    /// Disarms the undo timer.
    CancelUndoDeadline,

    /// Asks the external confirmation collaborator before a bulk clear.
    ConfirmClearAll {
        /// Request the answer must be tagged with.
        request: u64,
        /// Number of records that would be deleted.
        count: usize,
    },

    /// Drops any confirmation prompt still waiting for an answer.
    DismissClearAllPrompt,

    /// Persists the unit preference.
    PersistUnit(UnitType),

    /// Publishes a notice to observers.
    Notify(Notice),
}

/// Discrete outcomes surfaced to observers alongside the state stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// The remote feed failed; the last snapshot is still shown.
    ConnectionLost(String),
    /// The feed delivered a snapshot after a failure.
    Reconnected,
    /// Items were removed from view and can be undone.
    DeletionPending { generation: u64, count: usize },
    /// The pending batch was restored.
    DeletionRestored { count: usize },
    /// The remote store confirmed deletions.
    DeletionCommitted { generation: u64, count: usize },
    /// A remote delete failed; one notice per failed record.
    DeleteFailed(TrackerError),
    /// The user declined the bulk clear.
    ClearAllCancelled,
    /// Persisting the unit preference failed.
    PreferenceFailed(TrackerError),
}
