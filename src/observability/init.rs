//! Tracing initialization and subscriber setup.
//!
//! Configures a `tracing-subscriber` registry that filters by level and
//! writes one JSON object per event to a rotating file in the data directory.

use super::file_writer::RotatingFileWriter;
use crate::infrastructure::paths::get_data_dir;
use crate::Config;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Name of the trace file inside the data directory.
pub const TRACE_FILE: &str = "material-tracker-traces.json";

/// Initializes the tracing subscriber with rotating JSON file output.
///
/// # Trace Level Resolution
///
/// 1. `RUST_LOG` if set and parseable
/// 2. `config.trace_level` if set
/// 3. Default: `"info"`
///
/// # Initialization Behavior
///
/// - Creates the data directory if it doesn't exist
/// - Returns `None` without installing anything if directory creation fails
/// - Idempotent: only the first successful call installs a subscriber, later
///   calls return `None`
///
/// # Example
///
/// ```rust
/// use material_tracker::observability::init_tracing;
/// use material_tracker::Config;
///
/// let dir = std::env::temp_dir().join("material-tracker-init-doc");
/// let config = Config {
///     trace_level: Some("debug".to_string()),
///     data_dir: Some(dir.to_string_lossy().into_owned()),
///     ..Default::default()
/// };
///
/// init_tracing(&config);
///
/// tracing::debug!("tracing is now active");
/// ```
pub fn init_tracing(config: &Config) -> Option<PathBuf> {
    let level = config
        .trace_level
        .clone()
        .unwrap_or_else(|| "info".to_string());

    let data_dir = get_data_dir(config.data_dir.as_deref());
    if std::fs::create_dir_all(&data_dir).is_err() {
        return None;
    }

    let trace_file = data_dir.join(TRACE_FILE);
    let writer = RotatingFileWriter::new(trace_file.clone());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_ansi(false)
        .with_writer(writer);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .ok()
        .map(|()| trace_file)
}
