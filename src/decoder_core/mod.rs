//! Decoder Core - CAN payload decoding and per-identifier statistics
//!
//! # Architecture
//!
//! ```text
//! JSON line → RawRecord::from_json_line (normalizer)
//!     ↓
//! DecoderRegistry::decode (registry)
//!     ├─→ RollingStats::add_sample (window, one instance per identifier)
//!     ↓
//! DecoderVariant::process (variants)
//!     ↓
//! DecodedRecord (typed fields + residual bytes)
//! ```

pub mod normalizer;
pub mod registry;
pub mod variants;
pub mod window;

pub use normalizer::RawRecord;
pub use registry::{DecoderRegistry, RegistryEntry};
pub use variants::{
    CompassHeading, Decoded, DecodedFields, DecodedRecord, DecoderVariant, Door, DoorState,
    EngineGasReading, OdometerReading, WheelSpeeds,
};
pub use window::RollingStats;
