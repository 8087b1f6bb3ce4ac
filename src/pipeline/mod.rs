//! # Ingestion Pipeline
//!
//! Turns a stream of JSON lines into live per-identifier aggregates:
//! - Decodes each line through the `DecoderRegistry`
//! - Keeps a bounded history, count and inter-arrival mean per identifier
//! - Exposes a ranked snapshot for the dashboard
//!
//! ## Lifecycle
//!
//! The pipeline starts `Idle` and is attached (`Streaming`) once when the
//! event loop starts. Pausing detaches it again; attach and detach are no-ops
//! when already in the target state.
//!
//! ## Module Organization
//!
//! - `state` - Per-identifier history, counters, timing, `all_same` cache
//! - `engine` - `IngestionPipeline` (line → aggregates) and `Snapshot`
//! - `control` - Operator commands, operating modes, status indicators
//! - `ingestion` - Single-task event loop over source, timer and shutdown

pub mod control;
pub mod engine;
pub mod ingestion;
pub mod state;

pub use control::{Command, OperatingMode, StatusLine};
pub use engine::{IngestionMode, IngestionPipeline, Snapshot, SnapshotRow};
pub use ingestion::{run_event_loop, DashboardView, ExitReason, Renderer, Session};
pub use state::{AggregateState, IdentifierHistory};
