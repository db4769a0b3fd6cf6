//! Sort engine: stable column ordering with a tri-state header cycle.
//!
//! Clicking a column header cycles `Asc → Desc → unsorted → Asc`. Clicking a
//! different column starts that column at `Asc`. The unsorted state shows
//! records in snapshot order.

use crate::domain::MaterialRecord;
use std::cmp::Ordering;

/// Sortable column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortColumn {
    Color,
    Weight,
    Metal,
    Category,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Active ordering, or `None` for snapshot order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortState {
    key: Option<(SortColumn, SortDirection)>,
}

impl SortState {
    /// Snapshot order.
    #[must_use]
    pub const fn unsorted() -> Self {
        Self { key: None }
    }

    #[must_use]
    pub const fn by(column: SortColumn, direction: SortDirection) -> Self {
        Self {
            key: Some((column, direction)),
        }
    }

    #[must_use]
    pub const fn key(&self) -> Option<(SortColumn, SortDirection)> {
        self.key
    }

    #[must_use]
    pub const fn is_sorted(&self) -> bool {
        self.key.is_some()
    }

    /// Advances the header cycle for a click on `column`.
    ///
    /// # Examples
    ///
    /// ```
    /// use material_tracker::pipeline::sort::{SortColumn, SortDirection, SortState};
    ///
    /// let mut sort = SortState::unsorted();
    /// sort.cycle(SortColumn::Weight);
    /// assert_eq!(sort.key(), Some((SortColumn::Weight, SortDirection::Asc)));
    /// sort.cycle(SortColumn::Weight);
    /// assert_eq!(sort.key(), Some((SortColumn::Weight, SortDirection::Desc)));
    /// sort.cycle(SortColumn::Weight);
    /// assert_eq!(sort.key(), None);
    /// ```
    pub fn cycle(&mut self, column: SortColumn) {
        self.key = match self.key {
            Some((current, SortDirection::Asc)) if current == column => {
                Some((column, SortDirection::Desc))
            }
            Some((current, SortDirection::Desc)) if current == column => None,
            _ => Some((column, SortDirection::Asc)),
        };
        tracing::debug!(column = ?column, key = ?self.key, "sort cycled");
    }
}

/// Ascending comparison for one column.
///
/// Weight is numeric, color and category are raw byte-wise string order,
/// and for metal `false < true`.
#[must_use]
pub fn compare(a: &MaterialRecord, b: &MaterialRecord, column: SortColumn) -> Ordering {
    match column {
        SortColumn::Color => a.color.cmp(&b.color),
        SortColumn::Weight => a.weight_grams.cmp(&b.weight_grams),
        SortColumn::Metal => a.is_metal.cmp(&b.is_metal),
        SortColumn::Category => a.category.cmp(&b.category),
    }
}

/// Derives the ordered view. Ties keep their relative input order.
#[must_use]
pub fn apply_sort(view: &[MaterialRecord], sort: SortState) -> Vec<MaterialRecord> {
    let mut ordered = view.to_vec();
    if let Some((column, direction)) = sort.key {
        match direction {
            SortDirection::Asc => ordered.sort_by(|a, b| compare(a, b, column)),
            SortDirection::Desc => ordered.sort_by(|a, b| compare(b, a, column)),
        }
    }
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<MaterialRecord> {
        vec![
            MaterialRecord::new("1", "red", 800, true, "sheet"),
            MaterialRecord::new("2", "Blue", 50, false, "bar"),
            MaterialRecord::new("3", "blue", 100, true, "scrap"),
            MaterialRecord::new("4", "red", 50, false, "bar"),
        ]
    }

    fn ids(view: &[MaterialRecord]) -> Vec<&str> {
        view.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn cycle_resets_to_ascending_on_new_column() {
        let mut sort = SortState::unsorted();
        sort.cycle(SortColumn::Color);
        sort.cycle(SortColumn::Color);
        assert_eq!(sort.key(), Some((SortColumn::Color, SortDirection::Desc)));

        sort.cycle(SortColumn::Category);
        assert_eq!(sort.key(), Some((SortColumn::Category, SortDirection::Asc)));
    }

    #[test]
    fn cycle_wraps_back_to_ascending() {
        let mut sort = SortState::unsorted();
        for _ in 0..3 {
            sort.cycle(SortColumn::Metal);
        }
        assert!(!sort.is_sorted());
        sort.cycle(SortColumn::Metal);
        assert_eq!(sort.key(), Some((SortColumn::Metal, SortDirection::Asc)));
    }

    #[test]
    fn unsorted_keeps_snapshot_order() {
        let records = sample();
        assert_eq!(ids(&apply_sort(&records, SortState::unsorted())), ["1", "2", "3", "4"]);
    }

    #[test]
    fn weight_sorts_numerically_and_stably() {
        let records = sample();
        let asc = apply_sort(&records, SortState::by(SortColumn::Weight, SortDirection::Asc));
        assert_eq!(ids(&asc), ["2", "4", "3", "1"]);

        let desc = apply_sort(&records, SortState::by(SortColumn::Weight, SortDirection::Desc));
        assert_eq!(ids(&desc), ["1", "3", "2", "4"]);
    }

    #[test]
    fn color_is_case_sensitive_lexicographic() {
        let records = sample();
        let asc = apply_sort(&records, SortState::by(SortColumn::Color, SortDirection::Asc));
        // uppercase sorts before lowercase in raw byte order
        assert_eq!(ids(&asc), ["2", "3", "1", "4"]);
    }

    #[test]
    fn metal_orders_false_before_true() {
        let records = sample();
        let asc = apply_sort(&records, SortState::by(SortColumn::Metal, SortDirection::Asc));
        assert_eq!(ids(&asc), ["2", "4", "1", "3"]);
    }

    #[test]
    fn category_descending_keeps_ties_in_input_order() {
        let records = sample();
        let desc = apply_sort(&records, SortState::by(SortColumn::Category, SortDirection::Desc));
        assert_eq!(ids(&desc), ["1", "3", "2", "4"]);
    }
}
