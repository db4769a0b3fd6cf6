//! Asynchronous driver for the pipeline.
//!
//! Runs the single-writer state container on a tokio task and exposes it to
//! callers through a command channel and observables.
//!
//! # Architecture
//!
//! - `messages`: Command envelopes with tracing span propagation
//! - `handler`: The pipeline task and its caller-side handle
//! - `confirm`: External confirmation collaborator for bulk clears

pub mod confirm;
pub mod handler;
pub mod messages;

pub use confirm::{ConfirmationPrompt, StaticConfirmation};
pub use handler::{spawn_pipeline, PipelineHandle};
pub use messages::Command;
