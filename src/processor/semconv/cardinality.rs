// SPDX-License-Identifier: Apache-2.0

//! Cardinality tracking for benchmark mode.
//!
//! Two maps count distinct original span names and distinct produced
//! operation names. Each map is capped: once full, unseen names are tallied
//! in an overflow counter instead of being inserted, so memory stays
//! bounded no matter what flows through the pipeline.

use std::collections::HashMap;
use std::sync::Mutex;

use tracing::warn;

const MAX_TRACKED_NAMES: usize = 100_000;

#[derive(Default)]
struct NameCounts {
    counts: HashMap<String, u64>,
    overflow: u64,
}

impl NameCounts {
    /// Returns true when the name was newly inserted.
    fn observe(&mut self, name: &str, limit: usize, label: &'static str) -> bool {
        if let Some(count) = self.counts.get_mut(name) {
            *count += 1;
            return false;
        }

        if self.counts.len() >= limit {
            if self.overflow == 0 {
                warn!(
                    map = label,
                    limit, "cardinality tracker is full, further distinct names are not tracked"
                );
            }
            self.overflow += 1;
            return false;
        }

        self.counts.insert(name.to_string(), 1);
        true
    }
}

#[derive(Default)]
struct Inner {
    originals: NameCounts,
    produced: NameCounts,
}

pub(crate) struct CardinalityTracker {
    inner: Mutex<Inner>,
    limit: usize,
}

impl CardinalityTracker {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            limit: MAX_TRACKED_NAMES,
        }
    }

    #[cfg(test)]
    fn with_limit(limit: usize) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            limit,
        }
    }

    /// Records an original span name; true when seen for the first time.
    pub fn observe_original(&self, name: &str) -> bool {
        let mut inner = self.inner.lock().expect("tracker lock");
        inner.originals.observe(name, self.limit, "original_span_names")
    }

    /// Records a produced operation name; true when seen for the first time.
    pub fn observe_produced(&self, name: &str) -> bool {
        let mut inner = self.inner.lock().expect("tracker lock");
        inner.produced.observe(name, self.limit, "operation_names")
    }

    /// Current distinct counts: (original names, produced names).
    pub fn counts(&self) -> (u64, u64) {
        let inner = self.inner.lock().expect("tracker lock");
        (
            inner.originals.counts.len() as u64,
            inner.produced.counts.len() as u64,
        )
    }

    /// Drops all tracked state.
    pub fn clear(&self) {
        let mut inner = self.inner.lock().expect("tracker lock");
        *inner = Inner::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observe_reports_new_names_once() {
        let tracker = CardinalityTracker::new();
        assert!(tracker.observe_original("GET /users/1"));
        assert!(!tracker.observe_original("GET /users/1"));
        assert!(tracker.observe_original("GET /users/2"));

        assert!(tracker.observe_produced("GET /users/{id}"));
        assert!(!tracker.observe_produced("GET /users/{id}"));

        assert_eq!(tracker.counts(), (2, 1));
    }

    #[test]
    fn maps_are_independent() {
        let tracker = CardinalityTracker::new();
        assert!(tracker.observe_original("same"));
        assert!(tracker.observe_produced("same"));
        assert_eq!(tracker.counts(), (1, 1));
    }

    #[test]
    fn full_map_stops_growing() {
        let tracker = CardinalityTracker::with_limit(2);
        assert!(tracker.observe_original("a"));
        assert!(tracker.observe_original("b"));
        assert!(!tracker.observe_original("c"));
        assert!(!tracker.observe_original("d"));
        // Known names still count.
        assert!(!tracker.observe_original("a"));
        assert_eq!(tracker.counts(), (2, 0));
    }

    #[test]
    fn clear_resets_state() {
        let tracker = CardinalityTracker::new();
        tracker.observe_original("a");
        tracker.observe_produced("b");
        tracker.clear();
        assert_eq!(tracker.counts(), (0, 0));
        assert!(tracker.observe_original("a"));
    }
}
