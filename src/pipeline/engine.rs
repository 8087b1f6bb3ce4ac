//! Ingestion engine - one line in, aggregates updated
//!
//! ```text
//! raw line
//!     ↓
//! RawRecord::from_json_line      (parse failure → errors += 1, skip)
//!     ↓
//! DecoderRegistry::decode        (identifier binding + RollingStats)
//!     ↓
//! AggregateState::record         (history, counters, timing)
//!     ↓
//! IngestionPipeline::snapshot    (ranked, read-only view for the renderer)
//! ```
//!
//! All mutation happens synchronously inside `ingest_line`, so the event loop
//! can call it from its read branch without any locking.

use super::state::{AggregateState, IdentifierHistory};
use crate::config::Config;
use crate::decoder_core::{DecodedRecord, DecoderRegistry, DecoderVariant, RawRecord, RollingStats};
use crate::error::RecordParseError;

/// Whether the pipeline is consuming transport data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestionMode {
    Idle,
    Streaming,
}

pub struct IngestionPipeline {
    registry: DecoderRegistry,
    state: AggregateState,
    mode: IngestionMode,
}

impl IngestionPipeline {
    pub fn new(window_depth: usize, history_limit: usize) -> Self {
        Self {
            registry: DecoderRegistry::new(window_depth),
            state: AggregateState::new(history_limit),
            mode: IngestionMode::Idle,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.window_depth, config.history_limit)
    }

    /// Parse, decode and aggregate one line
    ///
    /// Parse failures bump the error counter and leave every per-identifier
    /// aggregate untouched. A payload too short for its decoder is still
    /// recorded, and also counted as an error.
    pub fn ingest_line(&mut self, line: &str) -> Result<(), RecordParseError> {
        match RawRecord::from_json_line(line) {
            Ok(raw) => {
                self.ingest_record(raw);
                Ok(())
            }
            Err(e) => {
                self.state.record_error();
                log::debug!("Skipping unparseable line ({}): {}", e, line.trim_end());
                Err(e)
            }
        }
    }

    pub fn ingest_record(&mut self, raw: RawRecord) {
        let decoded = self.registry.decode(raw);
        if decoded.malformed.is_some() {
            self.state.record_error();
        }
        self.state.record(decoded);
    }

    /// Start consuming transport data; no-op when already streaming
    pub fn attach(&mut self) -> bool {
        let changed = self.mode == IngestionMode::Idle;
        self.mode = IngestionMode::Streaming;
        changed
    }

    /// Stop consuming transport data; no-op when already idle
    pub fn detach(&mut self) -> bool {
        let changed = self.mode == IngestionMode::Streaming;
        self.mode = IngestionMode::Idle;
        changed
    }

    pub fn toggle(&mut self) -> IngestionMode {
        match self.mode {
            IngestionMode::Idle => self.attach(),
            IngestionMode::Streaming => self.detach(),
        };
        self.mode
    }

    pub fn mode(&self) -> IngestionMode {
        self.mode
    }

    pub fn is_streaming(&self) -> bool {
        self.mode == IngestionMode::Streaming
    }

    pub fn state(&self) -> &AggregateState {
        &self.state
    }

    pub fn registry(&self) -> &DecoderRegistry {
        &self.registry
    }

    pub fn stats(&self, identifier: &str) -> Option<&RollingStats> {
        self.registry.stats(identifier)
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        let rows = self
            .state
            .ranked()
            .into_iter()
            .map(|history| SnapshotRow::build(history, self.registry.stats(&history.identifier)))
            .collect();

        let variant_counts = DecoderVariant::KNOWN
            .into_iter()
            .chain(std::iter::once(DecoderVariant::Generic))
            .map(|variant| (variant.name(), self.state.variant_count(variant)))
            .filter(|(_, count)| *count > 0)
            .collect();

        Snapshot {
            total_packets: self.state.total_packets(),
            errors: self.state.errors(),
            identifiers: self.state.identifier_count(),
            variant_counts,
            streaming: self.is_streaming(),
            rows,
        }
    }
}

/// Read-only view of the aggregates, rows ranked by count
#[derive(Debug, Clone)]
pub struct Snapshot<'a> {
    pub total_packets: u64,
    pub errors: u64,
    pub identifiers: usize,
    pub variant_counts: Vec<(&'static str, u64)>,
    pub streaming: bool,
    pub rows: Vec<SnapshotRow<'a>>,
}

impl Snapshot<'_> {
    /// Footer summary, e.g. "2 errors in 40 packets with 5 ids"
    pub fn summary(&self) -> String {
        format!(
            "{} errors in {} packets with {} ids",
            self.errors, self.total_packets, self.identifiers
        )
    }
}

#[derive(Debug, Clone)]
pub struct SnapshotRow<'a> {
    pub identifier: &'a str,
    pub variant_name: &'static str,
    pub count: u64,
    pub avg_duration: f64,
    pub all_same: bool,
    pub last: Option<&'a DecodedRecord>,
    /// Window maximum per payload slot; `None` for an empty slot
    pub maxs: Vec<Option<i64>>,
}

impl<'a> SnapshotRow<'a> {
    fn build(history: &'a IdentifierHistory, stats: Option<&RollingStats>) -> Self {
        let maxs = stats
            .map(|s| s.maxs().into_iter().map(Result::ok).collect())
            .unwrap_or_default();

        Self {
            identifier: &history.identifier,
            variant_name: history.variant.name(),
            count: history.count(),
            avg_duration: history.avg_duration(),
            all_same: history.all_same(),
            last: history.latest(),
            maxs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(id: &str, timestamp: i64, payload: &[&str]) -> String {
        serde_json::json!({
            "packet": {
                "status": "ok",
                "timestamp": timestamp,
                "payload": payload,
                "length": payload.len(),
                "id": id,
                "channel": 0,
            }
        })
        .to_string()
    }

    #[test]
    fn test_ingest_updates_aggregates() {
        let mut pipeline = IngestionPipeline::new(50, 100);

        pipeline
            .ingest_line(&line("4B0", 10, &["27", "10", "27", "10", "27", "10", "27", "10"]))
            .unwrap();
        pipeline.ingest_line(&line("433", 12, &["08", "00"])).unwrap();
        pipeline.ingest_line(&line("433", 20, &["08", "00"])).unwrap();

        let state = pipeline.state();
        assert_eq!(state.total_packets(), 3);
        assert_eq!(state.get("433").unwrap().count(), 2);
        assert_eq!(state.get("433").unwrap().avg_duration(), 8.0);
        assert_eq!(pipeline.stats("4B0").unwrap().accepted(), 1);
    }

    #[test]
    fn test_malformed_line_only_counts_error() {
        let mut pipeline = IngestionPipeline::new(50, 100);
        pipeline.ingest_line(&line("433", 1, &["08", "01"])).unwrap();

        assert!(pipeline.ingest_line("not json at all").is_err());
        assert!(pipeline.ingest_line(r#"{"nopacket": true}"#).is_err());

        let state = pipeline.state();
        assert_eq!(state.errors(), 2);
        assert_eq!(state.total_packets(), 1);
        assert_eq!(state.get("433").unwrap().count(), 1);
        assert_eq!(pipeline.stats("433").unwrap().accepted(), 1);
    }

    #[test]
    fn test_short_payload_counted_and_kept() {
        let mut pipeline = IngestionPipeline::new(50, 100);
        pipeline.ingest_line(&line("4B0", 1, &["01", "02"])).unwrap();

        let state = pipeline.state();
        assert_eq!(state.errors(), 1);
        assert_eq!(state.total_packets(), 1);
        let last = state.get("4B0").unwrap().latest().unwrap();
        assert!(last.malformed.is_some());
        assert_eq!(last.residual, vec![1, 2]);
    }

    #[test]
    fn test_attach_detach_idempotent() {
        let mut pipeline = IngestionPipeline::new(50, 100);
        assert_eq!(pipeline.mode(), IngestionMode::Idle);

        assert!(pipeline.attach());
        assert!(!pipeline.attach());
        assert!(pipeline.is_streaming());

        assert!(pipeline.detach());
        assert!(!pipeline.detach());
        assert_eq!(pipeline.toggle(), IngestionMode::Streaming);
        assert_eq!(pipeline.toggle(), IngestionMode::Idle);
    }

    #[test]
    fn test_snapshot_rows() {
        let mut pipeline = IngestionPipeline::new(50, 100);
        for t in [100, 150, 225] {
            pipeline.ingest_line(&line("2BA", t, &["0", "0", "0", "0", "5A"])).unwrap();
        }
        pipeline.ingest_line(&line("7DF", 1, &["01"])).unwrap();

        let snapshot = pipeline.snapshot();
        assert_eq!(snapshot.rows.len(), 2);
        assert_eq!(snapshot.summary(), "0 errors in 4 packets with 2 ids");
        assert_eq!(snapshot.variant_counts, vec![("Compass", 3), ("Generic", 1)]);

        let top = &snapshot.rows[0];
        assert_eq!(top.identifier, "2BA");
        assert_eq!(top.variant_name, "Compass");
        assert_eq!(top.count, 3);
        assert_eq!(top.avg_duration, 62.5);
        assert!(top.all_same);
        assert_eq!(top.maxs, vec![Some(0), Some(0), Some(0), Some(0), Some(0x5A)]);
        assert_eq!(top.last.unwrap().timestamp(), 225);
    }
}
