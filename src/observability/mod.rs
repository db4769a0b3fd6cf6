//! Structured logging with file-based JSON output.
//!
//! Every `tracing` span and event in the crate flows through a single
//! subscriber:
//!
//! ```text
//! tracing macros → EnvFilter → fmt::layer().json() → RotatingFileWriter → JSON file
//! ```
//!
//! # Features
//!
//! - **File Output**: `<data dir>/material-tracker-traces.json`, one JSON object per line
//! - **Automatic Rotation**: Files rotate at 10MB with 3-backup retention
//! - **Span Context**: Each event carries its current span and span list
//!
//! # Configuration
//!
//! Trace level is controlled via:
//! 1. `RUST_LOG` environment variable (highest priority)
//! 2. `trace_level` config option
//! 3. Default: `"info"`
//!
//! # Modules
//!
//! - [`init`]: Subscriber setup
//! - [`file_writer`]: Rotating file writer with size-based rotation

pub mod file_writer;
pub mod init;

pub use file_writer::{RotatingFileWriter, MAX_BACKUP_FILES, MAX_FILE_SIZE_BYTES};
pub use init::{init_tracing, TRACE_FILE};
