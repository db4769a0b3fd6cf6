//! Wire models for remote documents.
//!
//! Documents arrive as loosely-typed JSON (camelCase keys, optional fields,
//! weights that may be encoded as floats). These types are separate from the
//! domain [`MaterialRecord`] to keep the leniency at the boundary.

use crate::domain::{MaterialRecord, Result, TrackerError};
use serde::{Deserialize, Serialize};

/// Fallback for documents without a color or category.
pub const UNKNOWN_LABEL: &str = "unknown";

/// A material document as stored remotely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MaterialDocument {
    /// Document identity. Required.
    pub id: Option<String>,

    pub color: Option<String>,

    /// Weight in grams. Required, finite and non-negative.
    pub weight_grams: Option<f64>,

    /// Missing means non-metal.
    pub is_metal: Option<bool>,

    pub category: Option<String>,
}

impl MaterialDocument {
    /// Converts into a domain record.
    ///
    /// Returns `None` when the identity or weight is missing or invalid.
    /// Fractional weights are rounded to the nearest gram.
    #[must_use]
    pub fn into_record(self) -> Option<MaterialRecord> {
        let id = self.id.filter(|id| !id.trim().is_empty())?;
        let weight = self.weight_grams.filter(|w| w.is_finite() && *w >= 0.0)?;

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let weight_grams = weight.round() as u64;

        Some(MaterialRecord {
            id,
            color: label(self.color),
            weight_grams,
            is_metal: self.is_metal.unwrap_or(false),
            category: label(self.category),
        })
    }
}

impl From<&MaterialRecord> for MaterialDocument {
    fn from(record: &MaterialRecord) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let weight = record.weight_grams as f64;
        Self {
            id: Some(record.id.clone()),
            color: Some(record.color.clone()),
            weight_grams: Some(weight),
            is_metal: Some(record.is_metal),
            category: Some(record.category.clone()),
        }
    }
}

fn label(value: Option<String>) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| UNKNOWN_LABEL.to_string())
}

/// Decodes a JSON array of documents into records.
///
/// Entries that are not objects or fail validation are skipped with a warning.
///
/// # Errors
///
/// Returns [`TrackerError::Storage`] if `json` is not a JSON array.
///
/// # Examples
///
/// ```
/// use material_tracker::remote::models::decode_documents;
///
/// let records = decode_documents(r#"[
///     {"id": "a", "color": "red", "weightGrams": 50, "isMetal": true, "category": "scrap"},
///     {"color": "blue", "weightGrams": 10}
/// ]"#).unwrap();
/// assert_eq!(records.len(), 1);
/// ```
pub fn decode_documents(json: &str) -> Result<Vec<MaterialRecord>> {
    let values: Vec<serde_json::Value> = serde_json::from_str(json)
        .map_err(|e| TrackerError::Storage(format!("Failed to parse documents: {e}")))?;

    let total = values.len();
    let records: Vec<MaterialRecord> = values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| {
            let record = serde_json::from_value::<MaterialDocument>(value)
                .ok()
                .and_then(MaterialDocument::into_record);
            if record.is_none() {
                tracing::warn!(index = index, "skipping malformed material document");
            }
            record
        })
        .collect();

    tracing::debug!(total = total, decoded = records.len(), "documents decoded");
    Ok(records)
}
