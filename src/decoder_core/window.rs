//! Fixed-depth rolling statistics over per-slot sample windows
//!
//! One `RollingStats` tracks a single identifier. Each accepted sample pushes
//! one value into every slot window; a full window drops its oldest value.

use crate::error::StatsError;
use std::collections::{BTreeMap, VecDeque};

#[derive(Debug, Clone)]
pub struct RollingStats {
    /// Number of slots. `None` until the first sample fixes it.
    arity: Option<usize>,
    depth: usize,
    slots: Vec<VecDeque<i64>>,
    last_timestamp: Option<i64>,
    accepted: u64,
    rejected: u64,
}

impl RollingStats {
    /// Stats with a known arity
    pub fn new(arity: usize, depth: usize) -> Self {
        Self {
            arity: Some(arity),
            depth,
            slots: (0..arity).map(|_| VecDeque::with_capacity(depth)).collect(),
            last_timestamp: None,
            accepted: 0,
            rejected: 0,
        }
    }

    /// Stats whose arity is taken from the width of the first sample
    pub fn with_lazy_arity(depth: usize) -> Self {
        Self {
            arity: None,
            depth,
            slots: Vec::new(),
            last_timestamp: None,
            accepted: 0,
            rejected: 0,
        }
    }

    /// Push one value per slot
    ///
    /// A sample whose width differs from the arity is dropped without touching
    /// any window; the caller decides whether the error is worth reporting.
    /// An empty sample never fixes a lazy arity.
    pub fn add_sample(&mut self, timestamp: i64, values: &[i64]) -> Result<(), StatsError> {
        let arity = match self.arity {
            Some(arity) => arity,
            None if values.is_empty() => {
                self.last_timestamp = Some(timestamp);
                return Ok(());
            }
            None => {
                self.arity = Some(values.len());
                self.slots = (0..values.len())
                    .map(|_| VecDeque::with_capacity(self.depth))
                    .collect();
                values.len()
            }
        };

        if values.len() != arity {
            self.rejected += 1;
            return Err(StatsError::ArityMismatch {
                expected: arity,
                got: values.len(),
            });
        }

        for (window, &value) in self.slots.iter_mut().zip(values) {
            if window.len() == self.depth {
                window.pop_front();
            }
            window.push_back(value);
        }

        self.last_timestamp = Some(timestamp);
        self.accepted += 1;
        Ok(())
    }

    pub fn arity(&self) -> Option<usize> {
        self.arity
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn accepted(&self) -> u64 {
        self.accepted
    }

    pub fn rejected(&self) -> u64 {
        self.rejected
    }

    pub fn last_timestamp(&self) -> Option<i64> {
        self.last_timestamp
    }

    /// Current window contents for a slot, oldest first
    pub fn window(&self, slot: usize) -> Result<&VecDeque<i64>, StatsError> {
        self.slots.get(slot).ok_or(StatsError::SlotOutOfRange {
            slot,
            arity: self.slots.len(),
        })
    }

    fn non_empty(&self, slot: usize) -> Result<&VecDeque<i64>, StatsError> {
        let window = self.window(slot)?;
        if window.is_empty() {
            return Err(StatsError::EmptyWindow { slot });
        }
        Ok(window)
    }

    pub fn sum(&self, slot: usize) -> Result<i64, StatsError> {
        Ok(self.non_empty(slot)?.iter().sum())
    }

    pub fn avg(&self, slot: usize) -> Result<f64, StatsError> {
        let window = self.non_empty(slot)?;
        let sum: i64 = window.iter().sum();
        Ok(sum as f64 / window.len() as f64)
    }

    pub fn max(&self, slot: usize) -> Result<i64, StatsError> {
        self.non_empty(slot)?
            .iter()
            .copied()
            .max()
            .ok_or(StatsError::EmptyWindow { slot })
    }

    pub fn min(&self, slot: usize) -> Result<i64, StatsError> {
        self.non_empty(slot)?
            .iter()
            .copied()
            .min()
            .ok_or(StatsError::EmptyWindow { slot })
    }

    /// Most frequent value; ties go to the smallest value
    pub fn mode(&self, slot: usize) -> Result<i64, StatsError> {
        let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
        for &value in self.non_empty(slot)? {
            *counts.entry(value).or_default() += 1;
        }

        let mut best: Option<(i64, usize)> = None;
        for (value, count) in counts {
            if best.map_or(true, |(_, best_count)| count > best_count) {
                best = Some((value, count));
            }
        }
        best.map(|(value, _)| value)
            .ok_or(StatsError::EmptyWindow { slot })
    }

    /// Apply a per-slot accessor across every slot
    pub fn per_slot<T, F>(&self, accessor: F) -> Vec<Result<T, StatsError>>
    where
        F: Fn(&Self, usize) -> Result<T, StatsError>,
    {
        (0..self.slots.len()).map(|slot| accessor(self, slot)).collect()
    }

    pub fn sums(&self) -> Vec<Result<i64, StatsError>> {
        self.per_slot(Self::sum)
    }

    pub fn avgs(&self) -> Vec<Result<f64, StatsError>> {
        self.per_slot(Self::avg)
    }

    pub fn maxs(&self) -> Vec<Result<i64, StatsError>> {
        self.per_slot(Self::max)
    }

    pub fn mins(&self) -> Vec<Result<i64, StatsError>> {
        self.per_slot(Self::min)
    }

    pub fn modes(&self) -> Vec<Result<i64, StatsError>> {
        self.per_slot(Self::mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_keeps_last_depth_samples() {
        let mut stats = RollingStats::new(1, 5);
        for i in 0..8 {
            stats.add_sample(i, &[i * 10]).unwrap();
        }

        let window: Vec<i64> = stats.window(0).unwrap().iter().copied().collect();
        assert_eq!(window, vec![30, 40, 50, 60, 70]);
        assert_eq!(stats.max(0).unwrap(), 70);
        assert_eq!(stats.min(0).unwrap(), 30);
        assert_eq!(stats.sum(0).unwrap(), 250);
        assert_eq!(stats.avg(0).unwrap(), 50.0);
        assert_eq!(stats.accepted(), 8);
    }

    #[test]
    fn test_arity_mismatch_dropped_without_mutation() {
        let mut stats = RollingStats::new(2, 10);
        stats.add_sample(1, &[1, 2]).unwrap();

        let err = stats.add_sample(2, &[1, 2, 3]).unwrap_err();
        assert_eq!(err, StatsError::ArityMismatch { expected: 2, got: 3 });
        assert_eq!(stats.window(0).unwrap().len(), 1);
        assert_eq!(stats.window(1).unwrap().len(), 1);
        assert_eq!(stats.last_timestamp(), Some(1));
        assert_eq!(stats.rejected(), 1);
    }

    #[test]
    fn test_lazy_arity_fixed_by_first_sample() {
        let mut stats = RollingStats::with_lazy_arity(10);
        assert_eq!(stats.arity(), None);

        stats.add_sample(0, &[1, 2, 3]).unwrap();
        assert_eq!(stats.arity(), Some(3));
        assert!(stats.add_sample(1, &[1, 2]).is_err());
    }

    #[test]
    fn test_empty_window_fails() {
        let stats = RollingStats::new(3, 10);
        assert_eq!(stats.max(1), Err(StatsError::EmptyWindow { slot: 1 }));
        assert_eq!(stats.avg(0), Err(StatsError::EmptyWindow { slot: 0 }));
        assert_eq!(
            stats.sum(3),
            Err(StatsError::SlotOutOfRange { slot: 3, arity: 3 })
        );
    }

    #[test]
    fn test_mode_ties_pick_smallest() {
        let mut stats = RollingStats::new(1, 10);
        for v in [7, 3, 7, 3, 9] {
            stats.add_sample(0, &[v]).unwrap();
        }
        assert_eq!(stats.mode(0).unwrap(), 3);

        stats.add_sample(0, &[7]).unwrap();
        assert_eq!(stats.mode(0).unwrap(), 7);
    }

    #[test]
    fn test_plural_accessors_cover_every_slot() {
        let mut stats = RollingStats::new(3, 4);
        stats.add_sample(0, &[1, 5, 9]).unwrap();
        stats.add_sample(1, &[3, 5, 1]).unwrap();

        let maxs: Vec<i64> = stats.maxs().into_iter().map(Result::unwrap).collect();
        assert_eq!(maxs, vec![3, 5, 9]);
        let mins: Vec<i64> = stats.mins().into_iter().map(Result::unwrap).collect();
        assert_eq!(mins, vec![1, 5, 1]);
        assert_eq!(stats.sums().len(), 3);
        assert_eq!(stats.avgs()[0], Ok(2.0));
        assert_eq!(stats.modes()[1], Ok(5));
    }

    #[test]
    fn test_empty_sample_leaves_lazy_arity_open() {
        let mut stats = RollingStats::with_lazy_arity(10);
        assert!(stats.add_sample(1, &[]).is_ok());
        assert_eq!(stats.arity(), None);

        for t in 2..5 {
            assert!(stats.add_sample(t, &[t, 7]).is_ok());
        }
        assert_eq!(stats.arity(), Some(2));
        assert_eq!(stats.accepted(), 3);
        assert_eq!(stats.rejected(), 0);
        assert_eq!(stats.max(0), Ok(4));
    }
}
