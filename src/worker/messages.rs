//! Command envelopes crossing from callers into the pipeline task.
//!
//! Every command carries the caller's current [`tracing::Span`], so the spans the
//! worker opens while processing it are parented to the call site rather than
//! to the long-lived worker task.

use crate::domain::UnitType;
use crate::pipeline::{Event, MetalFilter, PipelineView, SortColumn, StatsScope};
use tokio::sync::oneshot;

/// A user command plus tracing origin and an acknowledgement channel.
#[derive(Debug)]
pub struct Command {
    /// The event to feed into the pipeline.
    pub event: Event,

    /// Span active where the command was issued.
    pub origin: tracing::Span,

    /// Receives the view right after the event was applied.
    pub ack: Option<oneshot::Sender<PipelineView>>,
}

impl Command {
    /// Wraps `event`, capturing the current span.
    #[must_use]
    pub fn new(event: Event) -> Self {
        Self {
            event,
            origin: tracing::Span::current(),
            ack: None,
        }
    }

    /// Attaches an acknowledgement channel.
    #[must_use]
    pub fn with_ack(mut self, ack: oneshot::Sender<PipelineView>) -> Self {
        self.ack = Some(ack);
        self
    }
}

/// Generates `Command` constructors for user-facing events.
macro_rules! command_builders {
    (
        $(
            $builder_name:ident($($arg:ident: $ty:ty),* $(,)?) => $event:expr
        ),* $(,)?
    ) => {
        impl Command {
            $(
                #[doc = concat!("Creates a `", stringify!($builder_name), "` command with the current span")]
                #[must_use]
                pub fn $builder_name($($arg: $ty),*) -> Self {
                    Self::new($event)
                }
            )*
        }
    };
}

command_builders! {
    toggle_color(color: String) => Event::ToggleColor(color),
    toggle_category(category: String) => Event::ToggleCategory(category),
    set_metal(metal: MetalFilter) => Event::SetMetal(metal),
    clear_filters() => Event::ClearFilters,
    sort_by(column: SortColumn) => Event::SortBy(column),
    set_stats_scope(scope: StatsScope) => Event::SetStatsScope(scope),
    toggle_selection(id: String) => Event::ToggleSelection(id),
    select_all_visible() => Event::SelectAllVisible,
    deselect_all() => Event::DeselectAll,
    delete_item(id: String) => Event::DeleteItem(id),
    delete_selected() => Event::DeleteSelected,
    undo() => Event::Undo,
    navigate_away() => Event::NavigateAway,
    clear_all() => Event::RequestClearAll,
    set_unit(unit: UnitType) => Event::SetUnit(unit),
    shutdown() => Event::Shutdown,
}
