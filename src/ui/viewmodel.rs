//! View model types representing renderable list state.
//!
//! This module defines immutable view models computed from pipeline state,
//! following the MVVM pattern. View models are optimized for rendering and
//! contain pre-formatted display strings in the active unit.
//!
//! # Architecture
//!
//! View models are created via `PipelineState::compute_viewmodel()` and consumed
//! by the renderer. They contain no business logic, only display-ready data.
//!
//! # Example
//!
//! ```rust
//! use material_tracker::ui::viewmodel::{EmptyKind, EmptyState};
//!
//! let empty = EmptyState::for_kind(EmptyKind::NoMatches);
//! assert_eq!(empty.message, "No materials match the filters");
//! ```

use crate::pipeline::sort::{SortColumn, SortDirection};

/// Complete view model for one list screen.
#[derive(Debug, Clone)]
pub struct ListViewModel {
    /// Title and selection count.
    pub header: HeaderInfo,

    /// Column headers with sort indicators.
    pub columns: Vec<ColumnHeader>,

    /// Visible rows, in display order.
    pub rows: Vec<DisplayRow>,

    /// Statistics card for the chosen scope.
    pub summary: SummaryCard,

    /// Present while a deletion can still be undone.
    pub undo_banner: Option<UndoBanner>,

    /// Present when there are no rows to show.
    pub empty_state: Option<EmptyState>,

    /// Present while the feed is disconnected.
    pub offline_banner: Option<String>,
}

/// Display information for a single material row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayRow {
    pub id: String,
    pub color: String,

    /// Weight formatted in the display unit, e.g. `"0.800 kg"`.
    pub weight: String,

    /// `"Yes"` or `"No"`.
    pub metal: String,
    pub category: String,

    /// Whether this row is part of the multi-selection.
    pub is_selected: bool,
}

/// Header display information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderInfo {
    /// Title text, including visible and total counts.
    pub title: String,

    /// Number of selected rows.
    pub selected_count: usize,
}

/// One sortable column header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnHeader {
    pub column: SortColumn,
    pub label: &'static str,

    /// Sort direction when this column is the active key.
    pub direction: Option<SortDirection>,
}

impl ColumnHeader {
    /// Label with an arrow for the active direction.
    #[must_use]
    pub fn decorated(&self) -> String {
        match self.direction {
            Some(SortDirection::Asc) => format!("{} ▲", self.label),
            Some(SortDirection::Desc) => format!("{} ▼", self.label),
            None => self.label.to_string(),
        }
    }
}

/// Summary statistics card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryCard {
    /// Which collection the numbers describe.
    pub scope: &'static str,
    pub count: usize,
    pub mean: String,
    pub std_dev: String,
    pub variance: String,
}

/// Undo prompt shown while a deletion is pending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoBanner {
    /// e.g. `"3 materials deleted"`.
    pub message: String,

    /// Time left before the deletion commits.
    pub remaining_ms: u64,
}

/// Why the list has no rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyKind {
    /// No snapshot has arrived yet.
    Loading,
    /// The feed failed before delivering anything.
    Offline,
    /// The collection is empty.
    NoItems,
    /// Records exist but none pass the filters.
    NoMatches,
}

/// Empty state message display information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmptyState {
    pub kind: EmptyKind,

    /// Primary message (e.g., "No materials yet").
    pub message: String,

    /// Secondary explanatory text.
    pub subtitle: String,
}

impl EmptyState {
    /// Canonical copy for each empty kind.
    #[must_use]
    pub fn for_kind(kind: EmptyKind) -> Self {
        let (message, subtitle) = match kind {
            EmptyKind::Loading => ("Loading materials…", "Waiting for the first update"),
            EmptyKind::Offline => ("Cannot reach the materials store", "Retrying in the background"),
            EmptyKind::NoItems => ("No materials yet", "Add materials to get started"),
            EmptyKind::NoMatches => ("No materials match the filters", "Clear filters to see everything"),
        };
        Self {
            kind,
            message: message.to_string(),
            subtitle: subtitle.to_string(),
        }
    }
}
