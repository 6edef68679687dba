use rapier2d_f64::prelude::ColliderHandle;
use std::collections::HashMap;

/// Records when each pair of colliders started touching.
///
/// The engine reports one consistent ordering of `(a, b)` per physical
/// contact, so only one direction is ever populated; lookups try both.
/// This tracks *timing* only; whether two colliders are touching right now
/// is always answered by the live narrow-phase query, not by this ledger.
#[derive(Debug, Default)]
pub struct ContactLedger {
    started: HashMap<ColliderHandle, HashMap<ColliderHandle, f64>>,
}

impl ContactLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a begin-contact event at simulated time `time`.
    ///
    /// Ignored when either direction already has an entry for the pair, so
    /// the recorded time is always the earliest unmatched begin event.
    pub fn begin(&mut self, a: ColliderHandle, b: ColliderHandle, time: f64) {
        if self.impact_start(a, b).is_some() {
            return;
        }
        self.started.entry(a).or_default().insert(b, time);
    }

    /// Record an end-contact event for the pair.
    ///
    /// Removing an unknown pair is a no-op: the engine's collision system
    /// owns the pairing and its event ordering is tolerated as-is.
    pub fn end(&mut self, a: ColliderHandle, b: ColliderHandle) {
        for (outer, inner) in [(a, b), (b, a)] {
            if let Some(map) = self.started.get_mut(&outer) {
                if map.remove(&inner).is_some() {
                    if map.is_empty() {
                        self.started.remove(&outer);
                    }
                    return;
                }
            }
        }
    }

    /// Simulated time at which the pair started touching, in either
    /// direction. `None` means no unmatched begin event has been seen.
    pub fn impact_start(&self, a: ColliderHandle, b: ColliderHandle) -> Option<f64> {
        self.started
            .get(&a)
            .and_then(|m| m.get(&b))
            .or_else(|| self.started.get(&b).and_then(|m| m.get(&a)))
            .copied()
    }

    pub fn is_empty(&self) -> bool {
        self.started.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rapier2d_f64::prelude::{ColliderBuilder, ColliderSet};

    fn handles(n: usize) -> Vec<ColliderHandle> {
        let mut set = ColliderSet::new();
        (0..n).map(|_| set.insert(ColliderBuilder::ball(1.0))).collect()
    }

    #[test]
    fn test_begin_then_lookup_both_directions() {
        let h = handles(2);
        let mut ledger = ContactLedger::new();
        ledger.begin(h[0], h[1], 1.5);

        assert_eq!(ledger.impact_start(h[0], h[1]), Some(1.5));
        assert_eq!(ledger.impact_start(h[1], h[0]), Some(1.5));
    }

    #[test]
    fn test_zero_start_time_is_not_absence() {
        let h = handles(2);
        let mut ledger = ContactLedger::new();
        ledger.begin(h[0], h[1], 0.0);

        assert_eq!(ledger.impact_start(h[0], h[1]), Some(0.0));
    }

    #[test]
    fn test_end_clears_entry_in_either_direction() {
        let h = handles(2);
        let mut ledger = ContactLedger::new();

        ledger.begin(h[0], h[1], 2.0);
        ledger.end(h[1], h[0]);
        assert_eq!(ledger.impact_start(h[0], h[1]), None);
        assert!(ledger.is_empty());

        ledger.begin(h[0], h[1], 3.0);
        ledger.end(h[0], h[1]);
        assert_eq!(ledger.impact_start(h[0], h[1]), None);
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_end_without_begin_is_a_no_op() {
        let h = handles(2);
        let mut ledger = ContactLedger::new();
        ledger.end(h[0], h[1]);
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_duplicate_begin_keeps_earliest_time() {
        let h = handles(2);
        let mut ledger = ContactLedger::new();
        ledger.begin(h[0], h[1], 1.0);
        ledger.begin(h[1], h[0], 4.0);

        assert_eq!(ledger.impact_start(h[0], h[1]), Some(1.0));
    }

    #[test]
    fn test_pairs_are_independent() {
        let h = handles(3);
        let mut ledger = ContactLedger::new();
        ledger.begin(h[0], h[1], 1.0);
        ledger.begin(h[0], h[2], 2.0);

        ledger.end(h[0], h[1]);
        assert_eq!(ledger.impact_start(h[0], h[1]), None);
        assert_eq!(ledger.impact_start(h[0], h[2]), Some(2.0));
    }
}
