//! Remote document collaborator.
//!
//! # Modules
//!
//! - `backend`: [`DocumentStore`] trait, feed subscription, per-item delete outcomes
//! - `models`: Wire documents and lenient decoding into domain records
//! - `memory`: In-process store used by tests and the demo binary

pub mod backend;
pub mod memory;
pub mod models;

pub use backend::{delete_records, DeleteOutcome, DocumentStore, FeedEvent, FeedSubscription};
pub use memory::InMemoryStore;
pub use models::{decode_documents, MaterialDocument};
