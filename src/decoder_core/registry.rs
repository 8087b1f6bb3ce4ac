//! Identifier → decoder binding with per-identifier statistics
//!
//! Bindings are created on first sight of an identifier and never change.
//! Every identifier owns its own `RollingStats`, including identifiers that
//! share the generic fallback decoder.

use super::normalizer::RawRecord;
use super::variants::{DecodedRecord, DecoderVariant};
use super::window::RollingStats;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct RegistryEntry {
    pub variant: DecoderVariant,
    pub stats: RollingStats,
}

impl RegistryEntry {
    fn bind(identifier: &str, window_depth: usize) -> Self {
        let variant = DecoderVariant::for_identifier(identifier);
        let stats = match variant.frame_width() {
            Some(width) => RollingStats::new(width, window_depth),
            None => RollingStats::with_lazy_arity(window_depth),
        };
        Self { variant, stats }
    }
}

#[derive(Debug, Clone)]
pub struct DecoderRegistry {
    entries: HashMap<String, RegistryEntry>,
    window_depth: usize,
}

impl DecoderRegistry {
    pub fn new(window_depth: usize) -> Self {
        Self {
            entries: HashMap::new(),
            window_depth,
        }
    }

    /// Get the binding for an identifier, creating it on first request
    pub fn resolve(&mut self, identifier: &str) -> &mut RegistryEntry {
        let window_depth = self.window_depth;
        self.entries
            .entry(identifier.to_string())
            .or_insert_with(|| {
                let entry = RegistryEntry::bind(identifier, window_depth);
                log::debug!(
                    "Bound identifier {} to {} decoder",
                    identifier,
                    entry.variant.name()
                );
                entry
            })
    }

    /// Decode a record and feed its payload into the identifier's stats
    pub fn decode(&mut self, raw: RawRecord) -> DecodedRecord {
        let entry = self.resolve(&raw.identifier);

        if let Err(e) = entry.stats.add_sample(raw.timestamp, &raw.samples()) {
            log::trace!("Stats sample dropped for {}: {}", raw.identifier, e);
        }

        let decoded = entry.variant.process(raw);
        if let Some(e) = &decoded.malformed {
            log::debug!("{} on identifier {}", e, decoded.identifier());
        }
        decoded
    }

    pub fn get(&self, identifier: &str) -> Option<&RegistryEntry> {
        self.entries.get(identifier)
    }

    pub fn variant_of(&self, identifier: &str) -> Option<DecoderVariant> {
        self.get(identifier).map(|entry| entry.variant)
    }

    pub fn stats(&self, identifier: &str) -> Option<&RollingStats> {
        self.get(identifier).map(|entry| &entry.stats)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
