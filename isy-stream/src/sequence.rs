//! Sequence number tracking for one subscription

/// Result of checking an incoming sequence number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceCheck {
    /// Exactly one more than the previous event (or the first event)
    InOrder,
    /// Events `first..=last` never arrived
    Gap { first: u64, last: u64 },
    /// The number did not increase
    NonMonotonic { previous: u64 },
}

/// Tracks the last accepted sequence number. Gaps are reported but never
/// fatal; the tracker always resynchronizes to the newest number.
#[derive(Debug, Clone, Default)]
pub struct SequenceTracker {
    last: u64,
    seen_any: bool,
}

impl SequenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything; used when a new subscription starts
    pub fn reset(&mut self) {
        self.last = 0;
        self.seen_any = false;
    }

    pub fn last(&self) -> u64 {
        self.last
    }

    /// Record `seq` and report how it relates to the previous number
    pub fn observe(&mut self, seq: u64) -> SequenceCheck {
        let check = if seq > self.last.saturating_add(1) {
            SequenceCheck::Gap {
                first: self.last + 1,
                last: seq - 1,
            }
        } else if self.seen_any && seq <= self.last {
            SequenceCheck::NonMonotonic { previous: self.last }
        } else {
            SequenceCheck::InOrder
        };

        self.last = seq;
        self.seen_any = true;
        check
    }
}
