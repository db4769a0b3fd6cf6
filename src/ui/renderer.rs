//! Plain-text rendering of a [`ListViewModel`].
//!
//! The renderer follows a two-step process:
//!
//! 1. **View Model Computation**: `PipelineState::compute_viewmodel()`
//! 2. **Text Layout**: header, optional banners, table or empty state, summary
//!
//! Output is returned as a `String` rather than printed, so callers decide
//! where it goes.
//!
//! # Layout
//!
//! ```text
//!  Materials (3)                              1 selected
//! Offline: connection reset                   (while disconnected)
//!    COLOR        WEIGHT      METAL  CATEGORY
//! [x] red          50 g        Yes    scrap
//! [ ] blue         100 g       No     sheet
//! 1 material deleted (undo: 3.2s)             (while pending)
//! All materials: n=3 mean=317 g sd=342 g var=117222.22 g²
//! ```

use crate::ui::helpers::{center, fit};
use crate::ui::viewmodel::{DisplayRow, ListViewModel};
use std::fmt::Write;

const COLOR_WIDTH: usize = 14;
const WEIGHT_WIDTH: usize = 12;
const METAL_WIDTH: usize = 7;

/// Renders a view model as fixed-width text, `cols` characters wide.
#[must_use]
pub fn render_plain(vm: &ListViewModel, cols: usize) -> String {
    let mut out = String::new();

    let selected = if vm.header.selected_count > 0 {
        format!("{} selected", vm.header.selected_count)
    } else {
        String::new()
    };
    let gap = cols.saturating_sub(vm.header.title.chars().count() + selected.chars().count());
    let _ = writeln!(out, "{}{}{selected}", vm.header.title, " ".repeat(gap));

    if let Some(offline) = &vm.offline_banner {
        let _ = writeln!(out, "{offline}");
    }

    if let Some(empty) = &vm.empty_state {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", center(&empty.message, cols));
        let _ = writeln!(out, "{}", center(&empty.subtitle, cols));
    } else {
        render_table(&mut out, vm);
    }

    if let Some(banner) = &vm.undo_banner {
        #[allow(clippy::cast_precision_loss)]
        let seconds = banner.remaining_ms as f64 / 1000.0;
        let _ = writeln!(out, "{} (undo: {seconds:.1}s)", banner.message);
    }

    let s = &vm.summary;
    let _ = writeln!(
        out,
        "{}: n={} mean={} sd={} var={}",
        s.scope, s.count, s.mean, s.std_dev, s.variance
    );

    out
}

fn render_table(out: &mut String, vm: &ListViewModel) {
    let headers: Vec<String> = vm.columns.iter().map(|c| c.decorated()).collect();
    let header = |i: usize| headers.get(i).map_or("", String::as_str);

    let _ = writeln!(
        out,
        "    {}{}{}{}",
        fit(header(0), COLOR_WIDTH),
        fit(header(1), WEIGHT_WIDTH),
        fit(header(2), METAL_WIDTH),
        header(3)
    );

    for row in &vm.rows {
        render_row(out, row);
    }
}

fn render_row(out: &mut String, row: &DisplayRow) {
    let marker = if row.is_selected { "[x]" } else { "[ ]" };
    let _ = writeln!(
        out,
        "{marker} {}{}{}{}",
        fit(&row.color, COLOR_WIDTH),
        fit(&row.weight, WEIGHT_WIDTH),
        fit(&row.metal, METAL_WIDTH),
        row.category
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MaterialRecord;
    use crate::pipeline::PipelineState;
    use tokio::time::Instant;

    #[test]
    fn renders_rows_and_summary() {
        let mut state = PipelineState::default();
        state.store.replace(vec![
            MaterialRecord::new("1", "red", 50, true, "scrap"),
            MaterialRecord::new("2", "blue", 100, false, "sheet"),
        ]);
        state.apply_view();
        state.selection.toggle("1");

        let text = render_plain(&state.compute_viewmodel(Instant::now()), 60);
        assert!(text.starts_with(" Materials (2) "));
        assert!(text.contains("1 selected"));
        assert!(text.contains("[x] red"));
        assert!(text.contains("[ ] blue"));
        assert!(text.contains("All materials: n=2 mean=75 g"));
    }

    #[test]
    fn renders_empty_state_instead_of_table() {
        let mut state = PipelineState::default();
        state.apply_view();
        let text = render_plain(&state.compute_viewmodel(Instant::now()), 40);
        assert!(text.contains("Loading materials"));
        assert!(!text.contains("COLOR"));
    }
}
