//! In-memory preference store.

use super::backend::PreferenceStore;
use crate::domain::{Result, TrackerError, UnitType};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::Mutex;

/// Preference store that lives only as long as the process.
///
/// Writes can be made to fail, and are counted.
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    unit: Mutex<Option<UnitType>>,
    fail_writes: AtomicBool,
    writes: AtomicU64,
}

impl MemoryPreferences {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts with `unit` already stored.
    #[must_use]
    pub fn with_unit(unit: UnitType) -> Self {
        Self {
            unit: Mutex::new(Some(unit)),
            ..Self::default()
        }
    }

    /// Makes subsequent `set_unit` calls fail.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::Relaxed);
    }

    /// Number of `set_unit` calls received, failed ones included.
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    /// The stored unit, without the grams fallback.
    pub async fn stored(&self) -> Option<UnitType> {
        *self.unit.lock().await
    }
}

#[async_trait]
impl PreferenceStore for MemoryPreferences {
    async fn get_unit(&self) -> UnitType {
        self.unit.lock().await.unwrap_or_default()
    }

    async fn set_unit(&self, unit: UnitType) -> Result<()> {
        self.writes.fetch_add(1, Ordering::Relaxed);
        if self.fail_writes.load(Ordering::Relaxed) {
            return Err(TrackerError::Storage("preference write rejected".to_string()));
        }
        *self.unit.lock().await = Some(unit);
        Ok(())
    }
}
