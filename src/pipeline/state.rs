//! Pipeline state management and view model computation.
//!
//! This module defines [`PipelineState`], the single-writer container for one
//! material list screen. It owns the item store and every view parameter, and
//! derives the visible list from them.
//!
//! # Architecture
//!
//! `PipelineState` separates core data (snapshot, connection) from derived
//! state (`live`, `visible`). Derived state is recomputed by [`PipelineState::apply_view`]
//! after every mutation, so readers never observe a half-updated view.
//!
//! ```text
//! snapshot ─► minus hidden ids ─► live ─► filter ─► sort ─► visible
//!                                   │                          │
//!                                   └──── stats (All) ─────────┴── stats (Filtered)
//! ```
//!
//! # Example
//!
//! ```rust
//! use material_tracker::domain::MaterialRecord;
//! use material_tracker::pipeline::PipelineState;
//!
//! let mut state = PipelineState::default();
//! state.store.replace(vec![MaterialRecord::new("a", "red", 50, true, "bar")]);
//! state.apply_view();
//! assert_eq!(state.visible.len(), 1);
//! ```

use super::filter::{apply_filter, category_options, color_options, FilterOption, FilterState};
use super::selection::SelectionState;
use super::sort::{apply_sort, SortColumn, SortState};
use super::stats::{summarize, StatsScope, WeightSummary};
use super::store::{ConnectionState, ItemStore};
use super::undo::{PendingDeletion, UndoManager, UndoPhase};
use crate::domain::{MaterialRecord, Snapshot, UnitType};
use crate::ui::helpers::{format_variance, format_weight};
use crate::ui::viewmodel::{
    ColumnHeader, DisplayRow, EmptyKind, EmptyState, HeaderInfo, ListViewModel, SummaryCard,
    UndoBanner,
};
use std::collections::HashSet;
use std::time::Duration;
use tokio::time::Instant;

/// Central pipeline state container.
#[derive(Debug, Clone, Default)]
pub struct PipelineState {
    /// Canonical records and feed connection status.
    pub store: ItemStore,

    /// Active filter predicates.
    pub filter: FilterState,

    /// Active ordering.
    pub sort: SortState,

    /// Selected identities, always a subset of `visible`.
    pub selection: SelectionState,

    /// Pending and committing deletions.
    pub undo: UndoManager,

    /// Display unit for weights and statistics.
    pub unit: UnitType,

    /// Collection the summary card describes.
    pub stats_scope: StatsScope,

    /// Bulk clear request waiting for the confirmation collaborator.
    ///
    /// A decision is honoured only when it names this request.
    pub clear_request: Option<u64>,

    /// Last bulk clear request number handed out.
    pub clear_requests_issued: u64,

    /// Snapshot minus hidden ids, in snapshot order.
    ///
    /// Recomputed by `apply_view()`.
    pub live: Vec<MaterialRecord>,

    /// Filtered and sorted `live`, i.e. what the list renders.
    ///
    /// Recomputed by `apply_view()`.
    pub visible: Vec<MaterialRecord>,
}

impl PipelineState {
    /// Creates an empty state with the given undo window.
    #[must_use]
    pub fn new(undo_window: Duration) -> Self {
        Self {
            undo: UndoManager::new(undo_window),
            ..Self::default()
        }
    }

    /// Recomputes `live` and `visible` and prunes the selection.
    pub fn apply_view(&mut self) {
        let _span = tracing::debug_span!("apply_view",
            total = self.store.current().len(),
            filter_active = self.filter.is_active(),
            sort = ?self.sort.key()
        ).entered();

        let hidden = self.undo.hidden_ids();
        self.live = self
            .store
            .current()
            .records()
            .iter()
            .filter(|r| !hidden.contains(r.id.as_str()))
            .cloned()
            .collect();

        let filtered = apply_filter(&self.live, &self.filter);
        self.visible = apply_sort(&filtered, self.sort);

        let visible_ids: HashSet<&str> = self.visible.iter().map(|r| r.id.as_str()).collect();
        let dropped = self.selection.retain_visible(&visible_ids);

        tracing::debug!(
            hidden = hidden.len(),
            visible = self.visible.len(),
            selection_dropped = dropped,
            "view recomputed"
        );
    }

    /// Looks up a visible record by identity.
    #[must_use]
    pub fn visible_record(&self, id: &str) -> Option<&MaterialRecord> {
        self.visible.iter().find(|r| r.id == id)
    }

    /// Visible records that are selected, in visible order.
    #[must_use]
    pub fn selected_records(&self) -> Vec<MaterialRecord> {
        self.visible
            .iter()
            .filter(|r| self.selection.contains(&r.id))
            .cloned()
            .collect()
    }

    /// Statistics for the collection chosen by `stats_scope`.
    #[must_use]
    pub fn summary(&self) -> WeightSummary {
        match self.stats_scope {
            StatsScope::All => summarize(&self.live, self.unit),
            StatsScope::Filtered => summarize(&self.visible, self.unit),
        }
    }

    /// Captures a consistent copy of everything observers can see.
    #[must_use]
    pub fn view(&self) -> PipelineView {
        PipelineView {
            connection: self.store.connection(),
            last_error: self.store.last_error().map(str::to_string),
            snapshot: self.store.current().clone(),
            visible: self.visible.clone(),
            live_count: self.live.len(),
            filter: self.filter.clone(),
            sort: self.sort,
            selection: self.selection.clone(),
            color_options: color_options(self.store.colors(), &self.filter),
            category_options: category_options(self.store.categories(), &self.filter),
            unit: self.unit,
            stats_scope: self.stats_scope,
            summary: self.summary(),
            pending: self.undo.pending().cloned(),
            undo_phase: self.undo.phase(),
            awaiting_clear_confirmation: self.clear_request.is_some(),
        }
    }

    /// Computes a renderable view model at instant `now`.
    ///
    /// Shorthand for `self.view().compute_viewmodel(now)`.
    #[must_use]
    pub fn compute_viewmodel(&self, now: Instant) -> ListViewModel {
        self.view().compute_viewmodel(now)
    }
}

/// Consistent copy of pipeline state published to observers.
#[derive(Debug, Clone, Default)]
pub struct PipelineView {
    pub connection: ConnectionState,
    pub last_error: Option<String>,
    pub snapshot: Snapshot,
    pub visible: Vec<MaterialRecord>,
    /// Records not hidden by a deletion, before filtering.
    pub live_count: usize,
    pub filter: FilterState,
    pub sort: SortState,
    pub selection: SelectionState,
    pub color_options: Vec<FilterOption>,
    pub category_options: Vec<FilterOption>,
    pub unit: UnitType,
    pub stats_scope: StatsScope,
    pub summary: WeightSummary,
    pub pending: Option<PendingDeletion>,
    pub undo_phase: UndoPhase,
    pub awaiting_clear_confirmation: bool,
}

impl PipelineView {
    /// Identities of the visible list, in order.
    #[must_use]
    pub fn visible_ids(&self) -> Vec<&str> {
        self.visible.iter().map(|r| r.id.as_str()).collect()
    }

    /// Computes a renderable view model at instant `now`.
    ///
    /// `now` only affects the remaining time shown in the undo banner.
    #[must_use]
    pub fn compute_viewmodel(&self, now: Instant) -> ListViewModel {
        let rows = self
            .visible
            .iter()
            .map(|record| self.compute_display_row(record))
            .collect();

        ListViewModel {
            header: self.compute_header(),
            columns: self.compute_columns(),
            rows,
            summary: self.compute_summary_card(),
            undo_banner: self.pending.as_ref().map(|p| Self::compute_undo_banner(p, now)),
            empty_state: self.compute_empty_state(),
            offline_banner: self.last_error.as_ref().map(|reason| format!("Offline: {reason}")),
        }
    }

    fn compute_display_row(&self, record: &MaterialRecord) -> DisplayRow {
        #[allow(clippy::cast_precision_loss)]
        let grams = record.weight_grams as f64;
        DisplayRow {
            id: record.id.clone(),
            color: record.color.clone(),
            weight: format_weight(grams, self.unit),
            metal: if record.is_metal { "Yes" } else { "No" }.to_string(),
            category: record.category.clone(),
            is_selected: self.selection.contains(&record.id),
        }
    }

    fn compute_header(&self) -> HeaderInfo {
        let title = if self.filter.is_active() {
            format!(" Materials ({} of {}) ", self.visible.len(), self.live_count)
        } else {
            format!(" Materials ({}) ", self.visible.len())
        };
        HeaderInfo {
            title,
            selected_count: self.selection.len(),
        }
    }

    fn compute_columns(&self) -> Vec<ColumnHeader> {
        [
            (SortColumn::Color, "COLOR"),
            (SortColumn::Weight, "WEIGHT"),
            (SortColumn::Metal, "METAL"),
            (SortColumn::Category, "CATEGORY"),
        ]
        .into_iter()
        .map(|(column, label)| ColumnHeader {
            column,
            label,
            direction: self
                .sort
                .key()
                .filter(|(active, _)| *active == column)
                .map(|(_, direction)| direction),
        })
        .collect()
    }

    fn compute_summary_card(&self) -> SummaryCard {
        let summary = &self.summary;
        SummaryCard {
            scope: match self.stats_scope {
                StatsScope::All => "All materials",
                StatsScope::Filtered => "Filtered materials",
            },
            count: summary.count,
            mean: format_weight(summary.grams.mean, self.unit),
            std_dev: format_weight(summary.grams.std_dev, self.unit),
            variance: format_variance(summary.grams.variance, self.unit),
        }
    }

    fn compute_undo_banner(pending: &PendingDeletion, now: Instant) -> UndoBanner {
        let count = pending.items.len();
        let message = if count == 1 {
            "1 material deleted".to_string()
        } else {
            format!("{count} materials deleted")
        };
        UndoBanner {
            message,
            remaining_ms: u64::try_from(pending.remaining(now).as_millis()).unwrap_or(u64::MAX),
        }
    }

    fn compute_empty_state(&self) -> Option<EmptyState> {
        if !self.visible.is_empty() {
            return None;
        }

        let kind = match self.connection {
            ConnectionState::Loading => EmptyKind::Loading,
            ConnectionState::Disconnected if self.snapshot.is_empty() => EmptyKind::Offline,
            _ if self.live_count == 0 => EmptyKind::NoItems,
            _ => EmptyKind::NoMatches,
        };
        Some(EmptyState::for_kind(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::filter::MetalFilter;
    use crate::pipeline::sort::SortDirection;

    fn sample() -> Vec<MaterialRecord> {
        vec![
            MaterialRecord::new("1", "red", 50, true, "scrap"),
            MaterialRecord::new("2", "blue", 100, false, "sheet"),
            MaterialRecord::new("3", "red", 800, false, "sheet"),
        ]
    }

    fn loaded() -> PipelineState {
        let mut state = PipelineState::default();
        state.store.replace(sample());
        state.apply_view();
        state
    }

    #[test]
    fn filter_then_sort_feeds_visible() {
        let mut state = loaded();
        state.filter.toggle_color("red");
        state.sort = SortState::by(SortColumn::Weight, SortDirection::Desc);
        state.apply_view();

        let ids: Vec<&str> = state.visible.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["3", "1"]);
        assert_eq!(state.live.len(), 3);
    }

    #[test]
    fn selection_is_pruned_to_visible() {
        let mut state = loaded();
        state.selection.select_all(["1", "2"]);
        state.filter.set_metal(MetalFilter::Metal);
        state.apply_view();

        assert!(state.selection.contains("1"));
        assert!(!state.selection.contains("2"));
    }

    #[test]
    fn summary_follows_scope() {
        let mut state = loaded();
        state.filter.toggle_category("sheet");
        state.apply_view();

        assert_eq!(state.summary().count, 3);
        state.stats_scope = StatsScope::Filtered;
        let summary = state.summary();
        assert_eq!(summary.count, 2);
        assert!((summary.grams.mean - 450.0).abs() < 1e-9);
    }

    #[test]
    fn view_options_track_the_latest_snapshot() {
        let mut state = loaded();
        state.filter.toggle_color("blue");
        let chips = |v: &PipelineView| {
            v.color_options
                .iter()
                .map(|o| (o.value.clone(), o.count, o.selected))
                .collect::<Vec<_>>()
        };

        assert_eq!(
            chips(&state.view()),
            [("blue".to_string(), 1, true), ("red".to_string(), 2, false)]
        );

        state.store.replace(vec![MaterialRecord::new("4", "green", 5, true, "bar")]);
        state.apply_view();
        let view = state.view();
        assert_eq!(
            chips(&view),
            [("blue".to_string(), 0, true), ("green".to_string(), 1, false)]
        );
        assert_eq!(view.category_options.len(), 1);
        assert_eq!(view.category_options[0].value, "bar");
    }

    #[test]
    fn empty_states_are_distinct() {
        let mut state = PipelineState::default();
        state.apply_view();
        let kind = |s: &PipelineState| s.compute_viewmodel(Instant::now()).empty_state.map(|e| e.kind);

        assert_eq!(kind(&state), Some(EmptyKind::Loading));

        state.store.connection_lost("timeout");
        state.apply_view();
        assert_eq!(kind(&state), Some(EmptyKind::Offline));

        state.store.replace(vec![]);
        state.apply_view();
        assert_eq!(kind(&state), Some(EmptyKind::NoItems));

        state.store.replace(sample());
        state.filter.toggle_color("purple");
        state.apply_view();
        assert_eq!(kind(&state), Some(EmptyKind::NoMatches));
    }

    #[test]
    fn viewmodel_formats_rows_in_display_unit() {
        let mut state = loaded();
        state.unit = UnitType::Kilograms;
        state.selection.toggle("2");
        let vm = state.compute_viewmodel(Instant::now());

        assert_eq!(vm.rows.len(), 3);
        assert_eq!(vm.rows[2].weight, "0.800 kg");
        assert!(vm.rows[1].is_selected);
        assert_eq!(vm.header.selected_count, 1);
        assert_eq!(vm.summary.count, 3);
        assert!(vm.undo_banner.is_none());
    }

    #[test]
    fn column_headers_mark_the_active_sort() {
        let mut state = loaded();
        state.sort.cycle(SortColumn::Category);
        let vm = state.compute_viewmodel(Instant::now());
        let active: Vec<_> = vm.columns.iter().filter(|c| c.direction.is_some()).collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].column, SortColumn::Category);
        assert_eq!(active[0].direction, Some(SortDirection::Asc));
    }
}
