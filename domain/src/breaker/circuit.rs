//! Circuit breaker with independent per-category counters.
//!
//! Each failure increments its category's counter. When a counter reaches
//! the threshold before a successful dispatch of that category, the breaker
//! trips and stays open until [`CircuitBreaker::reset`]. A success only
//! clears the categories it covers (see [`ErrorCategory::is_cleared_by`]);
//! other counters keep their value.

use crate::breaker::category::{ErrorCategory, ErrorRecord};
use crate::routing::tag::CapabilityTag;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Threshold used when none is configured.
pub const DEFAULT_THRESHOLD: u32 = 2;

/// Outcome of recording a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerStatus {
    /// Still closed; `remaining` more failures of this category trip it
    Closed { remaining: u32 },
    /// Tripped by this failure (or already open)
    Open { tripped_by: ErrorCategory },
}

impl BreakerStatus {
    pub fn is_open(&self) -> bool {
        matches!(self, BreakerStatus::Open { .. })
    }
}

/// Per-session failure tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitBreaker {
    threshold: u32,
    records: BTreeMap<ErrorCategory, ErrorRecord>,
    tripped_by: Option<ErrorCategory>,
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

impl CircuitBreaker {
    /// Create a breaker. A threshold of 0 is treated as 1.
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold: threshold.max(1),
            records: BTreeMap::new(),
            tripped_by: None,
        }
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn is_open(&self) -> bool {
        self.tripped_by.is_some()
    }

    pub fn tripped_by(&self) -> Option<ErrorCategory> {
        self.tripped_by
    }

    /// Current count for a category.
    pub fn count(&self, category: ErrorCategory) -> u32 {
        self.records.get(&category).map(|r| r.count).unwrap_or(0)
    }

    pub fn record(&self, category: ErrorCategory) -> Option<&ErrorRecord> {
        self.records.get(&category)
    }

    pub fn records(&self) -> impl Iterator<Item = &ErrorRecord> {
        self.records.values()
    }

    /// Record one failure at `turn`.
    pub fn record_failure(&mut self, category: ErrorCategory, turn: u64) -> BreakerStatus {
        if let Some(tripped_by) = self.tripped_by {
            return BreakerStatus::Open { tripped_by };
        }

        let record = self
            .records
            .entry(category)
            .or_insert_with(|| ErrorRecord::new(category));
        record.count += 1;
        record.last_seen_turn = turn;

        if record.count >= self.threshold {
            self.tripped_by = Some(category);
            BreakerStatus::Open {
                tripped_by: category,
            }
        } else {
            BreakerStatus::Closed {
                remaining: self.threshold - record.count,
            }
        }
    }

    /// Record a successful dispatch of `tag`, clearing the categories it covers.
    ///
    /// Has no effect once the breaker is open.
    pub fn record_success(&mut self, tag: CapabilityTag) {
        if self.is_open() {
            return;
        }
        for record in self.records.values_mut() {
            if record.category.is_cleared_by(tag) {
                record.count = 0;
            }
        }
    }

    /// Clear all counters and close the breaker.
    pub fn reset(&mut self) {
        self.records.clear();
        self.tripped_by = None;
    }
}
