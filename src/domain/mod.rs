//! Domain layer for the material tracker.
//!
//! Core types independent of any remote store, persistence, or runtime.
//!
//! # Organization
//!
//! - [`error`]: Error types and result aliases
//! - [`material`]: Material record and snapshot model
//! - [`units`]: Weight units and conversion factors
//!
//! # Examples
//!
//! ```
//! use material_tracker::domain::{MaterialRecord, Snapshot};
//!
//! let snapshot = Snapshot::from_records(vec![
//!     MaterialRecord::new("a", "red", 50, true, "scrap"),
//! ]);
//! assert_eq!(snapshot.len(), 1);
//! ```

pub mod error;
pub mod material;
pub mod units;

pub use error::{Result, TrackerError};
pub use material::{MaterialRecord, Snapshot};
pub use units::UnitType;
