/// Sequence number gap detection
///
/// Walks sequence numbers in ascending order, starting from the expected first
/// sequence, and records every missing run as an inclusive range. Runs are
/// never expanded as a whole: a single packet with a huge sequence number
/// only costs one range.

#[derive(Debug, Clone)]
pub struct GapDetector {
    next_expected: i64,
    gaps: Vec<(i32, i32)>, // Vec of (start, end) ranges
    total_gap_count: u64,
}

impl GapDetector {
    pub fn new(first_sequence: i32) -> Self {
        GapDetector {
            next_expected: first_sequence as i64,
            gaps: Vec::new(),
            total_gap_count: 0,
        }
    }

    /// Build a detector from sequences already sorted ascending
    pub fn from_sorted<I>(first_sequence: i32, sequences: I) -> Self
    where
        I: IntoIterator<Item = i32>,
    {
        let mut detector = Self::new(first_sequence);
        for seq in sequences {
            detector.process(seq);
        }
        detector
    }

    /// Process the next sequence number; input must be ascending.
    /// Values at or below the last seen one (and below the first sequence)
    /// are ignored.
    pub fn process(&mut self, seq_num: i32) {
        let seq = seq_num as i64;
        if seq < self.next_expected {
            return;
        }
        if seq > self.next_expected {
            self.gaps.push((self.next_expected as i32, seq_num - 1));
            self.total_gap_count += (seq - self.next_expected) as u64;
        }
        self.next_expected = seq + 1;
    }

    /// Get all detected gaps as (start, end) tuples (inclusive)
    pub fn gaps(&self) -> &[(i32, i32)] {
        &self.gaps
    }

    /// Get total number of missing sequence numbers
    pub fn total_gaps(&self) -> u64 {
        self.total_gap_count
    }

    /// Get count of gap ranges detected
    pub fn gap_count(&self) -> usize {
        self.gaps.len()
    }

    /// Missing sequence numbers inside `[lo, hi]`, ascending.
    /// Allocates at most `hi - lo + 1` entries whatever the gaps look like.
    pub fn missing_within(&self, lo: i32, hi: i32) -> Vec<i32> {
        self.gaps
            .iter()
            .filter_map(|&(start, end)| {
                let from = start.max(lo);
                let to = end.min(hi);
                (from <= to).then_some(from..=to)
            })
            .flatten()
            .collect()
    }

    /// Parts of the gaps that fall outside `[lo, hi]`, as ranges
    pub fn gaps_outside(&self, lo: i32, hi: i32) -> Vec<(i32, i32)> {
        let mut outside = Vec::new();
        for &(start, end) in &self.gaps {
            if start < lo {
                outside.push((start, end.min(lo - 1)));
            }
            if end > hi {
                outside.push((start.max(hi + 1), end));
            }
        }
        outside
    }
}

/// Number of sequences in an inclusive range
pub fn range_len(&(start, end): &(i32, i32)) -> u64 {
    (end as i64 - start as i64 + 1) as u64
}
