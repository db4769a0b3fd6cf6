//! Event handling and state transition logic.
//!
//! This module implements the core event handler that processes feed
//! notifications, user commands, timer expiries, and remote results,
//! translating them into state changes and action sequences.
//!
//! # Architecture
//!
//! The handler follows a unidirectional data flow pattern:
//! 1. Events arrive from the feed, the caller, the undo timer, or delete tasks
//! 2. [`handle_event`] pattern-matches the event type
//! 3. State mutations occur via `PipelineState` and its components
//! 4. Actions are collected and returned for the worker to execute
//!
//! # Event Types
//!
//! - **Feed**: `FeedSnapshot`, `FeedError`
//! - **View**: `ToggleColor`, `ToggleCategory`, `SetMetal`, `ClearFilters`, `SortBy`, `SetStatsScope`
//! - **Selection**: `ToggleSelection`, `SelectAllVisible`, `DeselectAll`
//! - **Deletion**: `DeleteItem`, `DeleteSelected`, `Undo`, `UndoWindowElapsed`, `NavigateAway`
//! - **Bulk clear**: `RequestClearAll`, `ClearAllDecision`
//! - **Unit**: `SetUnit`, `UnitLoaded`
//! - **Results**: `DeletionSettled`, `Shutdown`
//!
//! # Example
//!
//! ```rust
//! use material_tracker::domain::MaterialRecord;
//! use material_tracker::pipeline::{handle_event, Event, PipelineState};
//!
//! let mut state = PipelineState::default();
//! let records = vec![MaterialRecord::new("a", "red", 50, true, "scrap")];
//! let (changed, actions) = handle_event(&mut state, &Event::FeedSnapshot(records))?;
//! assert!(changed);
//! assert!(actions.is_empty());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use super::actions::{Action, Notice};
use super::filter::MetalFilter;
use super::sort::SortColumn;
use super::state::PipelineState;
use super::stats::StatsScope;
use super::store::ConnectionState;
use super::undo::{CommitBatch, CommitReason};
use crate::domain::{MaterialRecord, Result, UnitType};
use crate::remote::DeleteOutcome;
use tokio::time::Instant;

/// Everything that can change pipeline state.
///
/// The handler processes these sequentially, so transitions are deterministic
/// for a given event order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Full collection contents pushed by the feed.
    FeedSnapshot(Vec<MaterialRecord>),
    /// The feed reported a failure.
    FeedError(String),

    /// Adds or removes a color from the filter.
    ToggleColor(String),
    /// Adds or removes a category from the filter.
    ToggleCategory(String),
    SetMetal(MetalFilter),
    /// Resets every filter predicate.
    ClearFilters,
    /// Header click: advances the sort cycle for a column.
    SortBy(SortColumn),
    /// Chooses the collection the summary describes.
    SetStatsScope(StatsScope),

    /// Adds or removes a visible record from the selection.
    ToggleSelection(String),
    SelectAllVisible,
    DeselectAll,

    /// Optimistically removes one visible record.
    DeleteItem(String),
    /// Optimistically removes every selected record.
    DeleteSelected,
    /// Restores the pending batch.
    Undo,
    /// The undo timer armed for `generation` fired.
    UndoWindowElapsed {
        generation: u64,
    },
    /// The screen was left: commits any pending batch.
    NavigateAway,

    /// Starts a bulk clear, subject to confirmation.
    RequestClearAll,
    /// Answer from the confirmation collaborator for `request`.
    ClearAllDecision {
        request: u64,
        confirmed: bool,
    },

    /// User changed the display unit.
    SetUnit(UnitType),
    /// Persisted unit read at startup. Not written back.
    UnitLoaded(UnitType),

    /// A remote delete for `generation` returned.
    DeletionSettled {
        generation: u64,
        outcome: DeleteOutcome,
    },
    /// The pipeline is stopping: commits any pending batch.
    Shutdown,
}

/// Processes an event, mutates pipeline state, and returns actions to execute.
///
/// # Returns
///
/// `(changed, actions)`: `changed` is `true` when observers should see a new
/// view; `actions` are side effects to run in order.
///
/// # Errors
///
/// Currently infallible; the `Result` leaves room for transitions that
/// validate input.
///
/// # Tracing
///
/// Each call creates a debug-level span with the event.
#[allow(clippy::too_many_lines)]
pub fn handle_event(state: &mut PipelineState, event: &Event) -> Result<(bool, Vec<Action>)> {
    let _span = tracing::debug_span!("handle_event", event_type = ?event).entered();

    match event {
        Event::FeedSnapshot(records) => {
            let reconnected = state.store.connection() == ConnectionState::Disconnected;
            state.store.replace(records.clone());
            state.undo.on_resync();
            state.apply_view();

            tracing::debug!(item_count = records.len(), reconnected = reconnected, "snapshot applied");

            let actions = if reconnected {
                vec![Action::Notify(Notice::Reconnected)]
            } else {
                vec![]
            };
            Ok((true, actions))
        }
        Event::FeedError(reason) => {
            state.store.connection_lost(reason.clone());
            state.apply_view();
            Ok((true, vec![Action::Notify(Notice::ConnectionLost(reason.clone()))]))
        }

        Event::ToggleColor(color) => {
            state.filter.toggle_color(color);
            state.apply_view();
            Ok((true, vec![]))
        }
        Event::ToggleCategory(category) => {
            state.filter.toggle_category(category);
            state.apply_view();
            Ok((true, vec![]))
        }
        Event::SetMetal(metal) => {
            if state.filter.metal() == *metal {
                return Ok((false, vec![]));
            }
            state.filter.set_metal(*metal);
            state.apply_view();
            Ok((true, vec![]))
        }
        Event::ClearFilters => {
            if !state.filter.is_active() {
                return Ok((false, vec![]));
            }
            state.filter.clear();
            state.apply_view();
            Ok((true, vec![]))
        }
        Event::SortBy(column) => {
            state.sort.cycle(*column);
            state.apply_view();
            Ok((true, vec![]))
        }
        Event::SetStatsScope(scope) => {
            if state.stats_scope == *scope {
                return Ok((false, vec![]));
            }
            state.stats_scope = *scope;
            Ok((true, vec![]))
        }

        Event::ToggleSelection(id) => {
            if state.visible_record(id).is_none() {
                tracing::debug!(id = %id, "ignoring selection of non-visible record");
                return Ok((false, vec![]));
            }
            state.selection.toggle(id);
            Ok((true, vec![]))
        }
        Event::SelectAllVisible => {
            let ids: Vec<String> = state.visible.iter().map(|r| r.id.clone()).collect();
            state.selection.select_all(ids.iter().map(String::as_str));
            Ok((true, vec![]))
        }
        Event::DeselectAll => {
            if state.selection.is_empty() {
                return Ok((false, vec![]));
            }
            state.selection.clear();
            Ok((true, vec![]))
        }

        Event::DeleteItem(id) => {
            let Some(record) = state.visible_record(id).cloned() else {
                tracing::debug!(id = %id, "delete of non-visible record ignored");
                return Ok((false, vec![]));
            };
            Ok((true, start_deletion(state, vec![record])))
        }
        Event::DeleteSelected => {
            let items = state.selected_records();
            if items.is_empty() {
                tracing::debug!("delete selected with empty selection ignored");
                return Ok((false, vec![]));
            }
            state.selection.clear();
            Ok((true, start_deletion(state, items)))
        }
        Event::Undo => {
            let Some(restored) = state.undo.undo() else {
                tracing::debug!("nothing to undo");
                return Ok((false, vec![]));
            };
            state.apply_view();
            Ok((
                true,
                vec![
                    Action::CancelUndoDeadline,
                    Action::Notify(Notice::DeletionRestored {
                        count: restored.items.len(),
                    }),
                ],
            ))
        }
        Event::UndoWindowElapsed { generation } => match state.undo.expire(*generation) {
            Some(batch) => Ok((true, vec![Action::CommitDeletion(batch)])),
            None => Ok((false, vec![])),
        },
        Event::NavigateAway => {
            state.selection.clear();
            let mut actions = vec![];
            if let Some(request) = state.clear_request.take() {
                tracing::debug!(request, "clear all prompt dismissed by navigation");
                actions.push(Action::DismissClearAllPrompt);
            }
            actions.extend(flush_pending(state, CommitReason::NavigatedAway));
            state.apply_view();
            Ok((true, actions))
        }

        Event::RequestClearAll => {
            if let Some(request) = state.clear_request {
                tracing::debug!(request, "clear all already awaiting confirmation");
                return Ok((false, vec![]));
            }
            let count = state.undo.clear_all_candidates(state.store.current()).len();
            if count == 0 {
                tracing::debug!("clear all with nothing to delete ignored");
                return Ok((false, vec![]));
            }
            state.clear_requests_issued = state.clear_requests_issued.wrapping_add(1);
            let request = state.clear_requests_issued;
            state.clear_request = Some(request);
            Ok((true, vec![Action::ConfirmClearAll { request, count }]))
        }
        Event::ClearAllDecision { request, confirmed } => {
            if state.clear_request != Some(*request) {
                tracing::debug!(
                    request,
                    outstanding = ?state.clear_request,
                    "stale clear all decision ignored"
                );
                return Ok((false, vec![]));
            }
            state.clear_request = None;

            if !confirmed {
                tracing::debug!("clear all declined");
                return Ok((true, vec![Action::Notify(Notice::ClearAllCancelled)]));
            }

            let mut actions = vec![];
            if state.undo.pending().is_some() {
                actions.push(Action::CancelUndoDeadline);
            }
            let batch = state.undo.begin_clear_all(state.store.current());
            tracing::debug!(generation = batch.generation, item_count = batch.ids.len(), "clear all confirmed");

            state.selection.clear();
            state.apply_view();
            actions.push(Action::CommitDeletion(batch));
            Ok((true, actions))
        }

        Event::SetUnit(unit) => {
            if state.unit == *unit {
                return Ok((false, vec![]));
            }
            state.unit = *unit;
            Ok((true, vec![Action::PersistUnit(*unit)]))
        }
        Event::UnitLoaded(unit) => {
            if state.unit == *unit {
                return Ok((false, vec![]));
            }
            state.unit = *unit;
            Ok((true, vec![]))
        }

        Event::DeletionSettled { generation, outcome } => {
            state.undo.complete(*generation, state.store.current());
            state.apply_view();

            let mut actions = vec![];
            if !outcome.deleted.is_empty() {
                actions.push(Action::Notify(Notice::DeletionCommitted {
                    generation: *generation,
                    count: outcome.deleted.len(),
                }));
            }
            for error in outcome.errors() {
                tracing::warn!(generation = generation, error = %error, "remote delete failed");
                actions.push(Action::Notify(Notice::DeleteFailed(error)));
            }
            Ok((true, actions))
        }
        Event::Shutdown => {
            let actions = flush_pending(state, CommitReason::Shutdown);
            let changed = !actions.is_empty();
            if changed {
                state.apply_view();
            }
            Ok((changed, actions))
        }
    }
}

/// Moves `items` into a fresh pending batch, committing any outstanding one.
fn start_deletion(state: &mut PipelineState, items: Vec<MaterialRecord>) -> Vec<Action> {
    let count = items.len();
    let superseded = state.undo.begin(items, Instant::now());

    let mut actions = vec![];
    if let Some(batch) = superseded {
        actions.push(Action::CommitDeletion(batch));
    }
    if let Some(pending) = state.undo.pending() {
        actions.push(Action::ScheduleUndoDeadline {
            generation: pending.generation,
            deadline: pending.deadline,
        });
        actions.push(Action::Notify(Notice::DeletionPending {
            generation: pending.generation,
            count,
        }));
    }

    state.apply_view();
    actions
}

fn flush_pending(state: &mut PipelineState, reason: CommitReason) -> Vec<Action> {
    state
        .undo
        .flush(reason)
        .map(|batch: CommitBatch| vec![Action::CancelUndoDeadline, Action::CommitDeletion(batch)])
        .unwrap_or_default()
}
