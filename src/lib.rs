//! CanFlow - live CAN-bus decoding and per-identifier statistics
//!
//! ```text
//! Transport (serial / TCP / replay file)
//!     ↓ one JSON line at a time
//! IngestionPipeline::ingest_line
//!     ↓
//! DecoderRegistry → DecoderVariant → DecodedRecord
//!     ├─→ RollingStats (per identifier)
//!     ↓
//! AggregateState (history, counts, inter-arrival timing)
//!     ↓ snapshot on a self re-arming timer
//! Dashboard
//! ```


pub mod config;
pub mod decoder_core;
pub mod error;
pub mod pipeline;
pub mod transport;
pub mod ui;

pub use config::Config;
pub use decoder_core::{DecodedRecord, DecoderRegistry, DecoderVariant, RawRecord, RollingStats};
pub use error::{ConfigError, DecodeError, RecordParseError, StatsError, TransportError};
pub use pipeline::{IngestionPipeline, Snapshot};
pub use transport::{LineSource, MemorySource, SourceKind, Transport};
