//! Unit preference persistence.
//!
//! # Modules
//!
//! - `backend`: [`PreferenceStore`] trait
//! - `json`: JSON file store with atomic writes, survives restarts
//! - `memory`: Process-local store for tests

pub mod backend;
pub mod json;
pub mod memory;

pub use backend::PreferenceStore;
pub use json::{JsonPreferences, PREFERENCES_FILE};
pub use memory::MemoryPreferences;
