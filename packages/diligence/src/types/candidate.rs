//! Deduplicated, scored search hits.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::hit::Hit;

/// A unique-URL hit carrying its priority score.
///
/// `score` is the sum of the weights of every rule in `matched_signals`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub hit: Hit,
    pub score: u32,
    pub matched_signals: BTreeSet<String>,
}

impl ScoredCandidate {
    /// Whether a named signal contributed to the score.
    pub fn matched(&self, signal: &str) -> bool {
        self.matched_signals.contains(signal)
    }
}
