//! Majority voting over a fixed window of per-frame candidates.
//!
//! The window fills one candidate at a time and resolves only when it is
//! exactly full. Resolution picks the most frequent sign, emits that
//! sign's first candidate in the window, and drains the whole window.

use handsign_sign_model::sign::Candidate;

/// Default number of candidates voted on at once.
pub const DEFAULT_WINDOW_CAPACITY: usize = 5;

/// Fixed-capacity voting window.
#[derive(Debug, Clone)]
pub struct TemporalVoter {
    window: Vec<Candidate>,
    capacity: usize,
}

impl TemporalVoter {
    /// Create a voter. A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            window: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Add one frame's result.
    ///
    /// `None` leaves the window untouched. Returns the winning candidate
    /// when this observation fills the window.
    pub fn observe(&mut self, candidate: Option<Candidate>) -> Option<Candidate> {
        self.window.push(candidate?);
        if self.window.len() < self.capacity {
            return None;
        }

        let winner = majority(&self.window);
        self.window.clear();
        winner
    }

    /// Candidates currently waiting in the window.
    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop all pending candidates.
    pub fn clear(&mut self) {
        self.window.clear();
    }
}

impl Default for TemporalVoter {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_CAPACITY)
    }
}

/// Most frequent sign id. On a tie the sign that appeared first wins.
fn majority(window: &[Candidate]) -> Option<Candidate> {
    // (sign_id, count, index of first occurrence), in first-seen order
    let mut tally: Vec<(&str, usize, usize)> = Vec::new();
    for (i, candidate) in window.iter().enumerate() {
        match tally.iter().position(|entry| entry.0 == candidate.sign_id) {
            Some(k) => tally[k].1 += 1,
            None => tally.push((candidate.sign_id.as_str(), 1, i)),
        }
    }

    let mut best: Option<(usize, usize)> = None;
    for &(_, count, first) in &tally {
        if best.map_or(true, |(best_count, _)| count > best_count) {
            best = Some((count, first));
        }
    }

    best.map(|(_, first)| window[first].clone())
}
