//! Material record domain model.
//!
//! A [`MaterialRecord`] is the immutable value pushed by the remote feed. A
//! [`Snapshot`] is the full set of records last received, unique by identity.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single material as stored in the remote collection.
///
/// Records are never edited in place: a changed record arrives as a new value
/// that replaces the old one by `id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialRecord {
    /// Stable identity assigned by the remote store.
    pub id: String,
    /// Free-form color name, compared as a raw string.
    pub color: String,
    /// Weight in grams, the canonical unit.
    pub weight_grams: u64,
    /// Whether the material is a metal.
    pub is_metal: bool,
    /// Free-form category name, compared as a raw string.
    pub category: String,
}

impl MaterialRecord {
    /// Creates a record from its parts.
    ///
    /// # Examples
    ///
    /// ```
    /// use material_tracker::domain::MaterialRecord;
    ///
    /// let record = MaterialRecord::new("a1", "red", 120, true, "scrap");
    /// assert_eq!(record.weight_grams, 120);
    /// assert!(record.is_metal);
    /// ```
    pub fn new(
        id: impl Into<String>,
        color: impl Into<String>,
        weight_grams: u64,
        is_metal: bool,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            color: color.into(),
            weight_grams,
            is_metal,
            category: category.into(),
        }
    }
}

/// The full current set of records as last received from the remote feed.
///
/// Order is the order of first appearance in the feed payload; it is what an
/// unsorted view shows. Duplicate identities collapse to the last value seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    records: Vec<MaterialRecord>,
}

impl Snapshot {
    /// Builds a snapshot, collapsing duplicate ids.
    ///
    /// The first occurrence fixes the position, the last occurrence supplies the value.
    #[must_use]
    pub fn from_records(records: Vec<MaterialRecord>) -> Self {
        let mut positions: HashMap<String, usize> = HashMap::with_capacity(records.len());
        let mut unique: Vec<MaterialRecord> = Vec::with_capacity(records.len());

        for record in records {
            if let Some(&pos) = positions.get(&record.id) {
                tracing::trace!(id = %record.id, "duplicate id in feed payload, replacing");
                unique[pos] = record;
            } else {
                positions.insert(record.id.clone(), unique.len());
                unique.push(record);
            }
        }

        Self { records: unique }
    }

    /// Returns the records in snapshot order.
    #[must_use]
    pub fn records(&self) -> &[MaterialRecord] {
        &self.records
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the snapshot holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Looks up a record by identity.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&MaterialRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Iterates over all identities in snapshot order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_ids_keep_first_position_and_last_value() {
        let snapshot = Snapshot::from_records(vec![
            MaterialRecord::new("a", "red", 1, false, "x"),
            MaterialRecord::new("b", "blue", 2, false, "x"),
            MaterialRecord::new("a", "green", 3, true, "y"),
        ]);

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.ids().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(snapshot.get("a").map(|r| r.color.as_str()), Some("green"));
    }

    #[test]
    fn record_serializes_with_camel_case_fields() {
        let record = MaterialRecord::new("a", "red", 10, true, "scrap");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["weightGrams"], 10);
        assert_eq!(json["isMetal"], true);
    }
}
