//! Filter engine: multi-criteria predicates over the snapshot.
//!
//! A record passes when it satisfies all three predicates:
//!
//! 1. **Color**: the color set is empty, or contains the record's color
//! 2. **Metal**: the tri-state is `All`, or agrees with `is_metal`
//! 3. **Category**: the category set is empty, or contains the record's category
//!
//! Filtering never mutates the snapshot; it derives a new view in `O(n)`.

use crate::domain::MaterialRecord;
use std::collections::{BTreeMap, BTreeSet};

/// Tri-state metal filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MetalFilter {
    /// No constraint on `is_metal`.
    #[default]
    All,
    /// Only metals.
    Metal,
    /// Only non-metals.
    NonMetal,
}

impl MetalFilter {
    fn admits(self, is_metal: bool) -> bool {
        match self {
            Self::All => true,
            Self::Metal => is_metal,
            Self::NonMetal => !is_metal,
        }
    }
}

/// Active filter parameters. Pure view state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    colors: BTreeSet<String>,
    metal: MetalFilter,
    categories: BTreeSet<String>,
}

impl FilterState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the color if absent, removes it if present.
    ///
    /// Returns `true` when the color is selected afterwards.
    pub fn toggle_color(&mut self, color: &str) -> bool {
        toggle(&mut self.colors, color)
    }

    /// Adds the category if absent, removes it if present.
    ///
    /// Returns `true` when the category is selected afterwards.
    pub fn toggle_category(&mut self, category: &str) -> bool {
        toggle(&mut self.categories, category)
    }

    pub fn set_metal(&mut self, metal: MetalFilter) {
        self.metal = metal;
    }

    /// Resets every predicate.
    pub fn clear(&mut self) {
        self.colors.clear();
        self.categories.clear();
        self.metal = MetalFilter::All;
    }

    #[must_use]
    pub const fn colors(&self) -> &BTreeSet<String> {
        &self.colors
    }

    #[must_use]
    pub const fn categories(&self) -> &BTreeSet<String> {
        &self.categories
    }

    #[must_use]
    pub const fn metal(&self) -> MetalFilter {
        self.metal
    }

    /// Returns `true` if any predicate constrains the view.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.colors.is_empty() || !self.categories.is_empty() || self.metal != MetalFilter::All
    }

    /// Evaluates the conjunction of all predicates against one record.
    #[must_use]
    pub fn matches(&self, record: &MaterialRecord) -> bool {
        (self.colors.is_empty() || self.colors.contains(&record.color))
            && self.metal.admits(record.is_metal)
            && (self.categories.is_empty() || self.categories.contains(&record.category))
    }
}

fn toggle(set: &mut BTreeSet<String>, value: &str) -> bool {
    if set.remove(value) {
        false
    } else {
        set.insert(value.to_string());
        true
    }
}

/// Derives the filtered view, preserving snapshot order.
///
/// # Examples
///
/// ```
/// use material_tracker::domain::MaterialRecord;
/// use material_tracker::pipeline::filter::{apply_filter, FilterState, MetalFilter};
///
/// let records = vec![
///     MaterialRecord::new("1", "red", 10, true, "bar"),
///     MaterialRecord::new("2", "red", 20, false, "bar"),
/// ];
/// let mut filter = FilterState::new();
/// filter.set_metal(MetalFilter::Metal);
/// let view = apply_filter(&records, &filter);
/// assert_eq!(view.len(), 1);
/// assert_eq!(view[0].id, "1");
/// ```
#[must_use]
pub fn apply_filter(records: &[MaterialRecord], filter: &FilterState) -> Vec<MaterialRecord> {
    if !filter.is_active() {
        return records.to_vec();
    }
    records.iter().filter(|r| filter.matches(r)).cloned().collect()
}

/// Occurrences of each color in the records, keyed in lexicographic order.
#[must_use]
pub fn color_counts(records: &[MaterialRecord]) -> BTreeMap<String, usize> {
    value_counts(records.iter().map(|r| r.color.as_str()))
}

/// Occurrences of each category in the records, keyed in lexicographic order.
#[must_use]
pub fn category_counts(records: &[MaterialRecord]) -> BTreeMap<String, usize> {
    value_counts(records.iter().map(|r| r.category.as_str()))
}

fn value_counts<'a>(values: impl Iterator<Item = &'a str>) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for value in values {
        *counts.entry(value.to_string()).or_insert(0) += 1;
    }
    counts
}

/// One selectable chip in a filter option list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOption {
    /// Raw value as it appears on records.
    pub value: String,
    /// Records in the snapshot carrying this value.
    pub count: usize,
    /// Whether the value is part of the active filter.
    pub selected: bool,
}

/// Color chips: observed colors plus active colors no longer observed.
///
/// `observed` is the output of [`color_counts`]. An active color that matches
/// zero current items stays listed and selected with a count of zero rather
/// than being silently dropped.
#[must_use]
pub fn color_options(observed: &BTreeMap<String, usize>, filter: &FilterState) -> Vec<FilterOption> {
    options(observed, filter.colors())
}

/// Category chips: observed categories plus active categories no longer observed.
#[must_use]
pub fn category_options(observed: &BTreeMap<String, usize>, filter: &FilterState) -> Vec<FilterOption> {
    options(observed, filter.categories())
}

fn options(observed: &BTreeMap<String, usize>, active: &BTreeSet<String>) -> Vec<FilterOption> {
    let mut counts: BTreeMap<&str, usize> =
        observed.iter().map(|(value, count)| (value.as_str(), *count)).collect();
    for value in active {
        counts.entry(value.as_str()).or_insert(0);
    }

    counts
        .into_iter()
        .map(|(value, count)| FilterOption {
            value: value.to_string(),
            count,
            selected: active.contains(value),
        })
        .collect()
}
