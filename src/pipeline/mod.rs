//! Derived-state pipeline for one material list screen.
//!
//! The pipeline turns the latest remote snapshot plus the user's view
//! parameters into the list that is rendered and the statistics shown next
//! to it, and owns the undoable-delete lifecycle.
//!
//! # Architecture
//!
//! ```text
//! Event ─► handle_event ─► PipelineState ─► apply_view ─► visible + summary
//!                │
//!                └─► Vec<Action> ─► worker (remote deletes, timers, notices)
//! ```
//!
//! # Modules
//!
//! - [`store`]: Item store and connection state
//! - [`filter`]: Filter engine and option lists
//! - [`sort`]: Sort engine with the tri-state header cycle
//! - [`stats`]: Statistics engine
//! - [`selection`]: Multi-select
//! - [`undo`]: Pending deletions and commit bookkeeping
//! - [`state`]: Single-writer state container
//! - [`handler`]: Event handling and state transitions
//! - [`actions`]: Side effects for the worker

pub mod actions;
pub mod filter;
pub mod handler;
pub mod selection;
pub mod sort;
pub mod state;
pub mod stats;
pub mod store;
pub mod undo;

pub use actions::{Action, Notice};
pub use filter::{FilterOption, FilterState, MetalFilter};
pub use handler::{handle_event, Event};
pub use selection::SelectionState;
pub use sort::{SortColumn, SortDirection, SortState};
pub use state::{PipelineState, PipelineView};
pub use stats::{StatsScope, WeightStatistics, WeightSummary};
pub use store::{ConnectionState, ItemStore};
pub use undo::{CommitBatch, CommitReason, PendingDeletion, UndoManager, UndoPhase, DEFAULT_UNDO_WINDOW};
