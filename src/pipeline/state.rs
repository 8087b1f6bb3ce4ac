//! Per-identifier aggregate state
//!
//! Holds the bounded decoded-record history, counters and inter-arrival
//! timing for every identifier seen, plus the global packet/error counters.

use crate::decoder_core::{DecodedRecord, DecoderVariant};
use std::cell::Cell;
use std::collections::{HashMap, VecDeque};

/// History and timing for one identifier
#[derive(Debug, Clone)]
pub struct IdentifierHistory {
    pub identifier: String,
    pub variant: DecoderVariant,

    /// Most recent decoded records, oldest first
    history: VecDeque<DecodedRecord>,
    history_limit: usize,

    /// Total records observed (not capped by the history limit)
    count: u64,

    /// Order in which the identifier was first seen, for stable ranking
    first_seen: u64,

    last_timestamp: Option<i64>,

    /// Mean gap between consecutive timestamps
    avg_duration: f64,

    /// Memoized "every retained record is the same"; cleared on append
    all_same_cache: Cell<Option<bool>>,
}

impl IdentifierHistory {
    pub fn new(
        identifier: String,
        variant: DecoderVariant,
        history_limit: usize,
        first_seen: u64,
    ) -> Self {
        Self {
            identifier,
            variant,
            history: VecDeque::with_capacity(history_limit.min(64)),
            history_limit,
            count: 0,
            first_seen,
            last_timestamp: None,
            avg_duration: 0.0,
            all_same_cache: Cell::new(None),
        }
    }

    /// Record one decoded message
    ///
    /// The first observation only stores its timestamp. Every later one folds
    /// `timestamp - last_timestamp` into the running mean of gaps.
    pub fn observe(&mut self, record: DecodedRecord) {
        self.count += 1;

        let timestamp = record.timestamp();
        match self.last_timestamp {
            None => self.avg_duration = 0.0,
            Some(previous) => {
                let gaps = (self.count - 1) as f64;
                // Widened so extreme timestamps cannot overflow the subtraction
                let duration = (i128::from(timestamp) - i128::from(previous)) as f64;
                self.avg_duration = (self.avg_duration * (gaps - 1.0) + duration) / gaps;
            }
        }
        self.last_timestamp = Some(timestamp);

        self.history.push_back(record);
        while self.history.len() > self.history_limit {
            self.history.pop_front();
        }
        self.all_same_cache.set(None);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn first_seen(&self) -> u64 {
        self.first_seen
    }

    pub fn avg_duration(&self) -> f64 {
        self.avg_duration
    }

    pub fn last_timestamp(&self) -> Option<i64> {
        self.last_timestamp
    }

    pub fn latest(&self) -> Option<&DecodedRecord> {
        self.history.back()
    }

    pub fn history(&self) -> impl Iterator<Item = &DecodedRecord> {
        self.history.iter()
    }

    pub fn retained(&self) -> usize {
        self.history.len()
    }

    /// Whether each retained record is the same as the next one
    ///
    /// Uses `DecodedRecord::same_as`; an undefined comparison counts as
    /// different, so records with no residual bytes are never "all same"
    /// once there are two of them.
    pub fn all_same(&self) -> bool {
        if let Some(cached) = self.all_same_cache.get() {
            return cached;
        }

        let result = self
            .history
            .iter()
            .zip(self.history.iter().skip(1))
            .all(|(a, b)| a.same_as(b) == Some(true));
        self.all_same_cache.set(Some(result));
        result
    }

    pub fn is_all_same_cached(&self) -> bool {
        self.all_same_cache.get().is_some()
    }

    /// (min, max) per residual position over the retained history
    ///
    /// Positions come from the oldest retained record; bytes beyond them in
    /// later records are ignored.
    pub fn residual_ranges(&self) -> Vec<(u8, u8)> {
        let Some(first) = self.history.front() else {
            return Vec::new();
        };

        let mut ranges = vec![(u8::MAX, u8::MIN); first.residual.len()];
        for record in &self.history {
            for (range, &byte) in ranges.iter_mut().zip(&record.residual) {
                range.0 = range.0.min(byte);
                range.1 = range.1.max(byte);
            }
        }
        ranges
    }

    /// Spread (max - min) per residual position
    pub fn residual_deltas(&self) -> Vec<u8> {
        self.residual_ranges()
            .into_iter()
            .map(|(min, max)| max.saturating_sub(min))
            .collect()
    }
}

/// Aggregates over every identifier
#[derive(Debug, Clone)]
pub struct AggregateState {
    by_identifier: HashMap<String, IdentifierHistory>,
    variant_counts: HashMap<DecoderVariant, u64>,
    total_packets: u64,
    errors: u64,
    history_limit: usize,
}

impl AggregateState {
    pub fn new(history_limit: usize) -> Self {
        Self {
            by_identifier: HashMap::new(),
            variant_counts: HashMap::new(),
            total_packets: 0,
            errors: 0,
            history_limit,
        }
    }

    /// Append a decoded record to its identifier's history
    pub fn record(&mut self, decoded: DecodedRecord) {
        self.total_packets += 1;
        *self.variant_counts.entry(decoded.variant).or_default() += 1;

        let next_seen = self.by_identifier.len() as u64;
        let history_limit = self.history_limit;
        self.by_identifier
            .entry(decoded.identifier().to_string())
            .or_insert_with(|| {
                IdentifierHistory::new(
                    decoded.identifier().to_string(),
                    decoded.variant,
                    history_limit,
                    next_seen,
                )
            })
            .observe(decoded);
    }

    pub fn record_error(&mut self) {
        self.errors += 1;
    }

    pub fn total_packets(&self) -> u64 {
        self.total_packets
    }

    pub fn errors(&self) -> u64 {
        self.errors
    }

    pub fn identifier_count(&self) -> usize {
        self.by_identifier.len()
    }

    pub fn get(&self, identifier: &str) -> Option<&IdentifierHistory> {
        self.by_identifier.get(identifier)
    }

    pub fn all_same(&self, identifier: &str) -> Option<bool> {
        self.get(identifier).map(IdentifierHistory::all_same)
    }

    pub fn variant_count(&self, variant: DecoderVariant) -> u64 {
        self.variant_counts.get(&variant).copied().unwrap_or(0)
    }

    /// Identifiers by descending count, ties in first-seen order
    pub fn ranked(&self) -> Vec<&IdentifierHistory> {
        let mut rows: Vec<&IdentifierHistory> = self.by_identifier.values().collect();
        rows.sort_by(|a, b| {
            b.count()
                .cmp(&a.count())
                .then(a.first_seen().cmp(&b.first_seen()))
        });
        rows
    }
}
