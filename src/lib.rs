//! Material Tracker: a reactive list pipeline over a live remote collection.
//!
//! Material Tracker keeps one screen's worth of derived state in sync with a
//! remote document collection:
//! - Conjunctive filtering by color, category, and metal flag
//! - Tri-state column sorting with stable ties
//! - Weight statistics in grams, kilograms, or pounds
//! - Multi-select and undoable deletes with a bounded undo window
//! - A confirmation-gated bulk clear
//! - A unit preference that survives restarts
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │  Demo binary (main.rs)                              │  ← Entry point
//! └─────────────────────────────────────────────────────┘
//!                        │
//! ┌─────────────────────────────────────────────────────┐
//! │  Worker Layer (worker/)                             │  ← Async driver
//! │  - Single tokio task owning the state               │
//! │  - Command channel, view watch, notice broadcast    │
//! └─────────────────────────────────────────────────────┘
//!                        │
//! ┌─────────────────────────────────────────────────────┐
//! │  Pipeline Layer (pipeline/)                         │  ← State machine
//! │  - Event handling and action dispatching            │
//! │  - Filter, sort, stats, selection, undo             │
//! └─────────────────────────────────────────────────────┘
//!         │                    │                    │
//! ┌───────────────┐   ┌───────────────┐   ┌───────────────┐
//! │ UI Layer      │   │ Remote Layer  │   │ Preferences   │
//! │ (ui/)         │   │ (remote/)     │   │ (preferences/)│
//! │ - View models │   │ - Feed        │   │ - JSON file   │
//! │ - Plain text  │   │ - Deletes     │   │ - Unit choice │
//! └───────────────┘   └───────────────┘   └───────────────┘
//!                        │
//! ┌─────────────────────────────────────────────────────┐
//! │  Infrastructure & Domain Layers                     │
//! │  - Data directory paths (infrastructure/)           │
//! │  - Records, units, errors (domain/)                 │
//! └─────────────────────────────────────────────────────┘
//!                        │
//! ┌─────────────────────────────────────────────────────┐
//! │  Observability (observability/)                     │
//! │  - tracing-subscriber JSON output, rotating file    │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`domain`]: Core domain types (records, units, errors)
//! - [`pipeline`]: Derived state and the event/action model
//! - [`remote`]: Document store collaborator and in-memory implementation
//! - [`preferences`]: Unit preference persistence
//! - [`worker`]: Async pipeline task and caller handle
//! - [`ui`]: View models and plain-text rendering
//! - [`infrastructure`]: Platform utilities (paths)
//! - [`observability`]: Tracing subscriber setup
//!
//! # Configuration
//!
//! Configuration comes from a TOML file or from `key=value` pairs:
//!
//! ```toml
//! collection_name = "materials"
//! undo_window_ms = 4000
//! data_dir = "~/.local/share/material-tracker"
//! trace_level = "debug"
//! ```
//!
//! # Examples
//!
//! ## Synchronous pipeline
//!
//! ```rust
//! use material_tracker::domain::MaterialRecord;
//! use material_tracker::{handle_event, initialize, Config, Event};
//!
//! let mut state = initialize(&Config::default());
//!
//! let snapshot = vec![
//!     MaterialRecord::new("a", "red", 50, true, "scrap"),
//!     MaterialRecord::new("b", "blue", 100, false, "sheet"),
//! ];
//! handle_event(&mut state, &Event::FeedSnapshot(snapshot))?;
//! handle_event(&mut state, &Event::ToggleColor("red".to_string()))?;
//!
//! assert_eq!(state.visible.len(), 1);
//! # Ok::<(), material_tracker::TrackerError>(())
//! ```
//!
//! ## Async pipeline
//!
//! See [`worker::spawn_pipeline`].

#![allow(clippy::multiple_crate_versions)]

pub mod domain;
pub mod infrastructure;
pub mod observability;
pub mod pipeline;
pub mod preferences;
pub mod remote;
pub mod ui;
pub mod worker;

pub use domain::{MaterialRecord, Result, Snapshot, TrackerError, UnitType};
pub use pipeline::{handle_event, Action, Event, Notice, PipelineState, PipelineView};
pub use worker::{spawn_pipeline, PipelineHandle};

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default remote collection.
pub const DEFAULT_COLLECTION: &str = "materials";

/// Default undo window in milliseconds.
pub const DEFAULT_UNDO_WINDOW_MS: u64 = 4000;

/// Runtime configuration.
///
/// # Example
///
/// ```toml
/// collection_name = "materials"
/// undo_window_ms = 5000
/// preferences_file = "/tmp/prefs.json"
/// trace_level = "debug"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Remote collection to subscribe to. Default: `"materials"`
    pub collection_name: String,

    /// How long a deletion stays undoable, in milliseconds. Default: `4000`
    pub undo_window_ms: u64,

    /// Explicit preference file path.
    ///
    /// Takes precedence over `data_dir`. Supports a leading `~`.
    pub preferences_file: Option<String>,

    /// Directory for preferences and traces.
    ///
    /// See [`infrastructure::paths::get_data_dir`] for the fallback order.
    pub data_dir: Option<String>,

    /// Tracing level.
    ///
    /// Options: `trace`, `debug`, `info`, `warn`, `error`. Default: `"info"`
    pub trace_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            collection_name: DEFAULT_COLLECTION.to_string(),
            undo_window_ms: DEFAULT_UNDO_WINDOW_MS,
            preferences_file: None,
            data_dir: None,
            trace_level: None,
        }
    }
}

impl Config {
    /// Parses configuration from a string map, e.g. `key=value` arguments.
    ///
    /// # Parsing Rules
    ///
    /// - `collection_name` / `collection`: blank values keep the default
    /// - `undo_window_ms`: String → `u64` (falls back to 4000 on parse error or zero)
    /// - `preferences_file`, `data_dir`, `trace_level`: String → `Option<String>`
    ///
    /// Unknown keys are ignored.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::collections::BTreeMap;
    /// use material_tracker::Config;
    ///
    /// let mut map = BTreeMap::new();
    /// map.insert("collection".to_string(), "offcuts".to_string());
    /// map.insert("undo_window_ms".to_string(), "soon".to_string());
    ///
    /// let config = Config::from_map(&map);
    /// assert_eq!(config.collection_name, "offcuts");
    /// assert_eq!(config.undo_window_ms, 4000);
    /// ```
    #[must_use]
    pub fn from_map(config: &BTreeMap<String, String>) -> Self {
        let collection_name = config
            .get("collection_name")
            .or_else(|| config.get("collection"))
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map_or_else(|| DEFAULT_COLLECTION.to_string(), String::from);

        let undo_window_ms = config
            .get("undo_window_ms")
            .and_then(|s| s.trim().parse::<u64>().ok())
            .filter(|ms| *ms > 0)
            .unwrap_or(DEFAULT_UNDO_WINDOW_MS);

        Self {
            collection_name,
            undo_window_ms,
            preferences_file: config.get("preferences_file").cloned(),
            data_dir: config.get("data_dir").cloned(),
            trace_level: config.get("trace_level").cloned(),
        }
    }

    /// Parses a TOML document. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Config`] if the document is not valid TOML, a
    /// value has the wrong type, or the undo window is zero.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source).map_err(|e| TrackerError::Config(e.to_string()))?;
        if config.undo_window_ms == 0 {
            return Err(TrackerError::Config("undo_window_ms must be positive".to_string()));
        }
        if config.collection_name.trim().is_empty() {
            return Err(TrackerError::Config("collection_name must not be empty".to_string()));
        }
        Ok(config)
    }

    /// Reads and parses a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Io`] if the file cannot be read, or
    /// [`TrackerError::Config`] if it does not parse.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&source)
    }

    #[must_use]
    pub const fn undo_window(&self) -> Duration {
        Duration::from_millis(self.undo_window_ms)
    }

    /// Where the unit preference is stored.
    #[must_use]
    pub fn preferences_path(&self) -> PathBuf {
        self.preferences_file.as_deref().map_or_else(
            || {
                infrastructure::paths::get_data_dir(self.data_dir.as_deref())
                    .join(preferences::PREFERENCES_FILE)
            },
            infrastructure::paths::expand_tilde,
        )
    }
}

/// Creates a fresh pipeline state for `config`.
///
/// The state starts with an empty snapshot, grams as the unit and no
/// filters. The first feed notification populates it.
///
/// # Example
///
/// ```rust
/// use material_tracker::{initialize, Config};
/// use std::time::Duration;
///
/// let config = Config {
///     undo_window_ms: 1500,
///     ..Default::default()
/// };
///
/// let state = initialize(&config);
/// assert_eq!(state.undo.window(), Duration::from_millis(1500));
/// assert!(state.visible.is_empty());
/// ```
#[must_use]
pub fn initialize(config: &Config) -> PipelineState {
    tracing::debug!(
        collection = %config.collection_name,
        undo_window_ms = config.undo_window_ms,
        "initializing material pipeline"
    );

    PipelineState::new(config.undo_window())
}
