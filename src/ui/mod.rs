//! Presentation layer: view models and plain-text rendering.
//!
//! # Architecture
//!
//! ```text
//! PipelineState → compute_viewmodel → ListViewModel → render_plain → String
//! ```
//!
//! # Modules
//!
//! - [`viewmodel`]: View model types representing renderable list state
//! - [`renderer`]: Fixed-width text layout
//! - [`helpers`]: Unit-aware weight formatting and cell layout

pub mod helpers;
pub mod renderer;
pub mod viewmodel;

pub use helpers::format_weight;
pub use renderer::render_plain;
pub use viewmodel::{
    ColumnHeader, DisplayRow, EmptyKind, EmptyState, HeaderInfo, ListViewModel, SummaryCard,
    UndoBanner,
};
