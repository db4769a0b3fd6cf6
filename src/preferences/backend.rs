//! Preference persistence abstraction.

use crate::domain::{Result, UnitType};
use async_trait::async_trait;

/// Abstraction over where the unit preference lives.
///
/// Reads never fail: a missing, unreadable, or unrecognised value yields
/// [`UnitType::Grams`]. Writes report failure so the caller can surface it.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    /// Loads the persisted unit, or grams.
    async fn get_unit(&self) -> UnitType;

    /// Persists `unit` so it survives a restart.
    ///
    /// # Errors
    ///
    /// Returns an error if the value could not be written.
    async fn set_unit(&self, unit: UnitType) -> Result<()>;
}
