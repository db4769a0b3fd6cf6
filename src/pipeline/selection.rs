//! Multi-select state over the rendered view.

use std::collections::{BTreeSet, HashSet};

/// Set of selected record identities.
///
/// After every view recompute the selection is pruned to identities that are
/// still visible, so it never references a hidden or deleted record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    ids: BTreeSet<String>,
}

impl SelectionState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips membership of `id`. Returns `true` when selected afterwards.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.ids.remove(id) {
            false
        } else {
            self.ids.insert(id.to_string());
            true
        }
    }

    /// Selects every given identity.
    pub fn select_all<'a>(&mut self, ids: impl IntoIterator<Item = &'a str>) {
        self.ids.extend(ids.into_iter().map(str::to_string));
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Drops identities not present in `visible`. Returns how many were dropped.
    pub fn retain_visible(&mut self, visible: &HashSet<&str>) -> usize {
        let before = self.ids.len();
        self.ids.retain(|id| visible.contains(id.as_str()));
        before - self.ids.len()
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_and_prune() {
        let mut selection = SelectionState::new();
        assert!(selection.toggle("a"));
        assert!(selection.toggle("b"));
        assert!(!selection.toggle("a"));
        selection.select_all(["c", "d"]);
        assert_eq!(selection.len(), 3);

        let visible: HashSet<&str> = ["b", "d"].into_iter().collect();
        assert_eq!(selection.retain_visible(&visible), 1);
        assert_eq!(selection.ids().collect::<Vec<_>>(), ["b", "d"]);

        selection.clear();
        assert!(selection.is_empty());
    }
}
